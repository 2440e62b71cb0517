use std::io::Write;

use axum::http::StatusCode;

use super::{status_text, Render, RenderError};
use crate::error::FileServerError;
use crate::listing::FileRecord;

/// One entry per line; file sizes aligned one space past the longest file name.
pub struct TextRenderer {
    full_path: bool,
}

impl TextRenderer {
    pub fn new(full_path: bool) -> Self {
        Self { full_path }
    }

    fn label<'a>(&self, record: &'a FileRecord) -> &'a str {
        if self.full_path {
            &record.path
        } else {
            &record.name
        }
    }
}

impl Render for TextRenderer {
    fn render_listing(
        &self,
        w: &mut dyn Write,
        _dir: &str,
        records: &[FileRecord],
    ) -> Result<(), RenderError> {
        let width = records
            .iter()
            .filter(|record| !record.is_dir)
            .map(|record| self.label(record).chars().count())
            .max()
            .unwrap_or(0);

        for record in records {
            let label = self.label(record);
            if record.is_dir {
                writeln!(w, "{label}/")?;
            } else {
                writeln!(
                    w,
                    "{label:<width$} {}",
                    record.size.as_deref().unwrap_or_default()
                )?;
            }
        }

        Ok(())
    }

    fn render_error(
        &self,
        w: &mut dyn Write,
        err: &FileServerError,
        status: StatusCode,
    ) -> Result<(), RenderError> {
        writeln!(w, "{}\n{}", status_text(status), err)?;
        Ok(())
    }
}
