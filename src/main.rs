use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use axum_server::tls_rustls::RustlsConfig;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fileserve::render::ContentType;
use fileserve::units::SizeUnits;
use fileserve::{routes, AppState, Config};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Where log lines go: `stdout`, `stderr`, `none` or a file path.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LogOutput {
    Stdout,
    Stderr,
    None,
    File(PathBuf),
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err("log output must not be empty".to_string()),
            "stdout" => Ok(Self::Stdout),
            "stderr" => Ok(Self::Stderr),
            "none" => Ok(Self::None),
            path => Ok(Self::File(PathBuf::from(path))),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "fileserve")]
#[command(about = "Serve a directory as HTML, JSON or plain-text listings")]
#[command(version)]
struct Cli {
    /// Directory (or single file) to serve
    #[arg(env = "FILESERVE_PATH", default_value = ".")]
    path: PathBuf,

    /// Address to bind to
    #[arg(long, env = "FILESERVE_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on [default: 80, or 443 with TLS]
    #[arg(short, long, env = "FILESERVE_PORT")]
    port: Option<u16>,

    /// Config file path (optional)
    #[arg(short, long, env = "FILESERVE_CONFIG")]
    config: Option<PathBuf>,

    /// Hide paths with a segment matching this regex
    #[arg(long, env = "FILESERVE_EXCLUDE")]
    exclude: Option<String>,

    /// Serve entries whose name starts with a dot
    #[arg(long, env = "FILESERVE_INCLUDE_DOTFILES")]
    include_dotfiles: bool,

    /// Enabled content types; the first one is the default
    #[arg(long, env = "FILESERVE_CONTENT_TYPES", value_delimiter = ',')]
    content_types: Option<Vec<ContentType>>,

    /// Emit JSON without indentation
    #[arg(long, env = "FILESERVE_JSON_COMPACT")]
    json_compact: bool,

    /// Show root-relative paths in text listings
    #[arg(long, env = "FILESERVE_TEXT_FULL_PATH")]
    text_full_path: bool,

    /// Unit system for sizes (binary or metric)
    #[arg(long, env = "FILESERVE_SIZE_UNITS")]
    size_units: Option<SizeUnits>,

    /// Accept multipart uploads
    #[arg(long, env = "FILESERVE_UPLOADS")]
    uploads: bool,

    /// Directory uploads are written to
    #[arg(long, env = "FILESERVE_UPLOADS_DIR")]
    uploads_dir: Option<PathBuf>,

    /// Prefix uploaded names with a UTC timestamp
    #[arg(long, env = "FILESERVE_UPLOADS_TIMESTAMP")]
    uploads_timestamp: bool,

    /// Maximum upload size in bytes
    #[arg(long, env = "FILESERVE_MAX_UPLOAD_SIZE")]
    max_upload_size: Option<u64>,

    /// PEM certificate chain; enables TLS
    #[arg(long, env = "FILESERVE_TLS_CERT", requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    /// PEM private key
    #[arg(long, env = "FILESERVE_TLS_KEY", requires = "tls_cert")]
    tls_key: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, env = "FILESERVE_LOG_LEVEL", default_value = "info")]
    log_level: LevelFilter,

    /// Log line format
    #[arg(long, env = "FILESERVE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Log destination: stdout, stderr, none or a file path
    #[arg(long, env = "FILESERVE_LOG_OUTPUT", default_value = "stdout")]
    log_output: LogOutput,

    /// Disable logging entirely
    #[arg(short, long, env = "FILESERVE_QUIET")]
    quiet: bool,
}

impl Cli {
    /// Overlay flags on top of file (or default) configuration.
    fn apply(&self, config: &mut Config) {
        if let Some(exclude) = &self.exclude {
            config.exclude = Some(exclude.clone());
        }
        if self.include_dotfiles {
            config.include_dotfiles = true;
        }
        if let Some(content_types) = &self.content_types {
            config.content_types = content_types.clone();
        }
        if self.json_compact {
            config.json_indent = false;
        }
        if self.text_full_path {
            config.text_full_path = true;
        }
        if let Some(units) = self.size_units {
            config.size_units = units;
        }
        if self.uploads {
            config.uploads = true;
        }
        if let Some(dir) = &self.uploads_dir {
            config.uploads_dir = Some(dir.clone());
        }
        if self.uploads_timestamp {
            config.uploads_timestamp = true;
        }
        if let Some(limit) = self.max_upload_size {
            config.max_upload_size = limit;
        }
    }

    fn tls(&self) -> Option<(&PathBuf, &PathBuf)> {
        self.tls_cert.as_ref().zip(self.tls_key.as_ref())
    }

    fn port(&self) -> u16 {
        self.port
            .unwrap_or(if self.tls().is_some() { 443 } else { 80 })
    }

    fn init_logging(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.quiet {
            return Ok(());
        }

        let level = self.log_level.to_string().to_lowercase();
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("fileserve={level},tower_http={level}"))
        });

        let writer = match &self.log_output {
            LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
            LogOutput::None => BoxMakeWriter::new(std::io::sink),
            LogOutput::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                BoxMakeWriter::new(Mutex::new(file))
            }
        };
        let ansi = self.log_output == LogOutput::Stdout || self.log_output == LogOutput::Stderr;

        match self.log_format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                .try_init()
                .ok(),
            LogFormat::Text => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(ansi)
                        .with_writer(writer),
                )
                .try_init()
                .ok(),
        };

        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    cli.init_logging()?;

    // Load config from file if provided, otherwise use defaults
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };
    cli.apply(&mut config);

    if config.uploads {
        if let Some(dir) = &config.uploads_dir {
            std::fs::create_dir_all(dir)?;
        }
    }

    let state = AppState::new(&cli.path, config)?;

    info!("Serving files from: {}", state.root_dir.display());
    if state.config.uploads {
        info!("Uploads enabled into: {}", state.uploads_dir.display());
    }
    for route in routes::describe(state.root_is_dir) {
        info!("Route: {}", route);
    }

    let app = routes::app(state);

    let addr = tokio::net::lookup_host((cli.host.as_str(), cli.port()))
        .await?
        .next()
        .ok_or_else(|| format!("could not resolve host: {}", cli.host))?;

    match cli.tls() {
        Some((cert, key)) => {
            let tls_config = RustlsConfig::from_pem_file(cert, key).await?;
            info!("Starting fileserve on https://{}", addr);
            axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service_with_connect_info::<SocketAddr>())
                .await?;
        }
        None => {
            info!("Starting fileserve on http://{}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await?;
        }
    }

    Ok(())
}
