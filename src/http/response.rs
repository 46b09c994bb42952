//! Response lifecycle.
//!
//! # Responsibilities
//! - Hold the single terminal response of a request (`ResponseSink`)
//! - Reject a second terminal write instead of sending it
//! - Build the terse text responses used for errors
//! - Build the aborted response used when a handler never completed
//!
//! # Design Decisions
//! - A sink is either open or completed; completed is final
//! - Streaming bodies (static files, upstream responses) are handed over as a
//!   whole `Response`, so committing a response is a single write
//! - An abandoned response ends the connection instead of inventing a status

use std::io;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use futures_util::stream;
use thiserror::Error;

/// A terminal write was attempted on a sink that already holds a response.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    #[error("response already completed with status {0}")]
    AlreadyCompleted(StatusCode),
}

/// Outbound side of one request. Accepts exactly one terminal write.
#[derive(Debug, Default)]
pub struct ResponseSink {
    response: Option<Response>,
}

impl ResponseSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// True until a response has been written.
    pub fn is_open(&self) -> bool {
        self.response.is_none()
    }

    /// Status of the written response, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.response.as_ref().map(Response::status)
    }

    /// Write the terminal response.
    ///
    /// Fails without touching the stored response when the sink is already
    /// completed; the rejected response is dropped.
    pub fn complete(&mut self, response: Response) -> Result<(), SinkError> {
        match &self.response {
            Some(existing) => Err(SinkError::AlreadyCompleted(existing.status())),
            None => {
                self.response = Some(response);
                Ok(())
            }
        }
    }

    /// Take the written response, or `None` when the sink was never completed.
    pub fn into_response(self) -> Option<Response> {
        self.response
    }
}

/// Plain text response with the given status.
pub fn text_response(status: StatusCode, body: impl Into<String>) -> Response {
    let mut response = Response::new(Body::from(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// HTML document response with status 200.
pub fn html_response(document: String) -> Response {
    let mut response = Response::new(Body::from(document));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

/// Response used to close a sink nobody completed.
///
/// The body fails on first poll, so the server tears the connection down
/// rather than reporting a status that was never decided.
pub fn abandoned_response() -> Response {
    let body = stream::once(async {
        Err::<Bytes, io::Error>(io::Error::other("response abandoned by handler"))
    });
    Response::new(Body::from_stream(body))
}
