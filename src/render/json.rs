use std::io::Write;

use axum::http::StatusCode;
use serde::Serialize;

use super::{status_text, Render, RenderError};
use crate::error::FileServerError;
use crate::listing::FileRecord;

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

pub struct JsonRenderer {
    indent: bool,
}

impl JsonRenderer {
    pub fn new(indent: bool) -> Self {
        Self { indent }
    }

    fn encode<T: Serialize + ?Sized>(&self, w: &mut dyn Write, value: &T) -> Result<(), RenderError> {
        if self.indent {
            serde_json::to_writer_pretty(&mut *w, value)?;
        } else {
            serde_json::to_writer(&mut *w, value)?;
        }
        w.write_all(b"\n")?;
        Ok(())
    }
}

impl Render for JsonRenderer {
    fn render_listing(
        &self,
        w: &mut dyn Write,
        _dir: &str,
        records: &[FileRecord],
    ) -> Result<(), RenderError> {
        self.encode(w, records)
    }

    fn render_error(
        &self,
        w: &mut dyn Write,
        err: &FileServerError,
        status: StatusCode,
    ) -> Result<(), RenderError> {
        self.encode(
            w,
            &ErrorBody {
                status: status_text(status),
                message: err.to_string(),
            },
        )
    }
}
