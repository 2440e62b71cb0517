//! Access log middleware.
//!
//! One `info` event per request, emitted once the response body has been
//! fully sent or dropped, so `bytes` reflects what was actually produced.

use std::net::SocketAddr;
use std::time::Instant;

use axum::body::{Body, HttpBody};
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use http_body_util::BodyExt;
use tracing::info;

use crate::units::{format_duration, format_size, SizeUnits};

/// Pending access log entry for one request.
struct RequestLog {
    method: Method,
    path: String,
    address: String,
    status: StatusCode,
    bytes: u64,
    start: Instant,
}

impl Drop for RequestLog {
    fn drop(&mut self) {
        info!(
            method = %self.method,
            path = %self.path,
            address = %self.address,
            status = self.status.as_u16(),
            bytes = self.bytes,
            size = %format_size(self.bytes, SizeUnits::Binary),
            duration = %format_duration(self.start.elapsed()),
            "request"
        );
    }
}

pub async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let address = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    let response = next.run(req).await;
    let (mut parts, body) = response.into_parts();

    // Counting frames hides the size hint; keep the length hyper would send
    if let Some(len) = body.size_hint().exact() {
        if len > 0 && !parts.headers.contains_key(header::CONTENT_LENGTH) {
            parts
                .headers
                .insert(header::CONTENT_LENGTH, HeaderValue::from(len));
        }
    }

    let mut log = RequestLog {
        method,
        path,
        address,
        status: parts.status,
        bytes: 0,
        start,
    };

    // The closure owns the whole entry, so it is logged when the body is dropped
    let body = body.map_frame(move |frame| {
        let log = &mut log;
        if let Some(data) = frame.data_ref() {
            log.bytes += data.len() as u64;
        }
        frame
    });

    Response::from_parts(parts, Body::new(body))
}
