use std::io::Write;

use askama::Template;
use axum::http::StatusCode;

use super::{listing_url, status_text, ContentType, Render, RenderError};
use crate::error::FileServerError;
use crate::guard::ROOT_DIR;
use crate::listing::FileRecord;

/// A named link in the page chrome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub name: String,
    pub href: String,
}

struct Entry {
    name: String,
    href: String,
    size: String,
    is_dir: bool,
}

struct ErrorView {
    status: String,
    message: String,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    title: String,
    version: &'a str,
    uploads: bool,
    upload_action: String,
    formats: Vec<Link>,
    breadcrumbs: Vec<Link>,
    files: Vec<Entry>,
    error: Option<ErrorView>,
}

/// Split a directory path into cumulative links, starting with the root.
pub fn breadcrumbs(dir: &str) -> Vec<Link> {
    let mut links = vec![Link {
        name: "/".to_string(),
        href: listing_url(ContentType::Html, ROOT_DIR),
    }];

    if dir == ROOT_DIR {
        return links;
    }

    let mut prefix = String::new();
    for name in dir.split('/') {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(name);

        links.push(Link {
            name: name.to_string(),
            href: listing_url(ContentType::Html, &prefix),
        });
    }

    links
}

pub struct HtmlRenderer {
    content_types: Vec<ContentType>,
    uploads: bool,
    version: &'static str,
}

impl HtmlRenderer {
    pub fn new(content_types: Vec<ContentType>, uploads: bool, version: &'static str) -> Self {
        Self {
            content_types,
            uploads,
            version,
        }
    }

    fn page(&self, dir: &str) -> IndexTemplate<'_> {
        IndexTemplate {
            title: if dir == ROOT_DIR {
                "/".to_string()
            } else {
                format!("/{dir}")
            },
            version: self.version,
            uploads: self.uploads,
            upload_action: format!("/{}", ContentType::Html),
            formats: self
                .content_types
                .iter()
                .map(|ct| Link {
                    name: ct.to_string(),
                    href: listing_url(*ct, dir),
                })
                .collect(),
            breadcrumbs: breadcrumbs(dir),
            files: Vec::new(),
            error: None,
        }
    }
}

impl Render for HtmlRenderer {
    fn render_listing(
        &self,
        w: &mut dyn Write,
        dir: &str,
        records: &[FileRecord],
    ) -> Result<(), RenderError> {
        let mut page = self.page(dir);
        page.files = records
            .iter()
            .map(|record| Entry {
                name: record.name.clone(),
                href: listing_url(ContentType::Html, &record.path),
                size: record.size.clone().unwrap_or_default(),
                is_dir: record.is_dir,
            })
            .collect();

        w.write_all(page.render()?.as_bytes())?;
        Ok(())
    }

    fn render_error(
        &self,
        w: &mut dyn Write,
        err: &FileServerError,
        status: StatusCode,
    ) -> Result<(), RenderError> {
        let mut page = self.page(ROOT_DIR);
        page.title = status_text(status).to_string();
        page.uploads = false;
        page.error = Some(ErrorView {
            status: status_text(status).to_string(),
            message: err.to_string(),
        });

        w.write_all(page.render()?.as_bytes())?;
        Ok(())
    }
}
