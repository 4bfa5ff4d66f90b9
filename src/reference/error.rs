use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceErrorKind {
    ServiceNotFound,
    UpstreamStatus,
    Transport,
    Decode,
    UnexpectedFormat,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ReferenceError {
    pub kind: ReferenceErrorKind,
    pub message: String,
    pub http_status: Option<u16>,
}

impl ReferenceError {
    pub fn new(kind: ReferenceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: None,
        }
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }
}

pub fn service_not_found(service: &str) -> ReferenceError {
    ReferenceError::new(
        ReferenceErrorKind::ServiceNotFound,
        format!("no matching service found for '{service}'"),
    )
}

pub fn map_http_status(status: u16, url: &str, body: &str) -> ReferenceError {
    let normalized_body = body.chars().take(240).collect::<String>();
    let mut message = format!("upstream {url} returned status {status}");
    if !normalized_body.is_empty() {
        message = format!("{message}: {normalized_body}");
    }
    ReferenceError::new(ReferenceErrorKind::UpstreamStatus, message).with_http_status(status)
}

pub fn transport_error(url: &str, err: impl std::fmt::Display) -> ReferenceError {
    ReferenceError::new(
        ReferenceErrorKind::Transport,
        format!("request to {url} failed: {err}"),
    )
}

pub fn decode_error(url: &str, err: impl std::fmt::Display) -> ReferenceError {
    ReferenceError::new(
        ReferenceErrorKind::Decode,
        format!("failed to decode payload from {url}: {err}"),
    )
}

pub fn unexpected_format(message: impl Into<String>) -> ReferenceError {
    ReferenceError::new(ReferenceErrorKind::UnexpectedFormat, message)
}
