//! Correlation-ID is a UUID to use for correlating the logs of one request

use hyper::HeaderMap;
use thiserror::*;
use uuid::{fmt::Hyphenated, Uuid};

/// Correlation-ID for correlating logs together
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct CorrelationId(Uuid);

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CorrelationId {
    fn from(c: Uuid) -> Self {
        CorrelationId(c)
    }
}

#[derive(Debug, Error)]
pub enum InvalidCorrelationId {
    #[error("correlation-id not found")]
    NotFound(),
    #[error("Invalid correlation-id string {0}")]
    InvalidString(String),
}

impl CorrelationId {
    pub const HEADER_NAME: &'static str = "correlation-id";

    pub fn new() -> Self {
        CorrelationId(Uuid::new_v4())
    }

    /// Extract correlation-id from a set of HTTP headers
    pub fn from_header_map(h: &HeaderMap) -> Result<Self, InvalidCorrelationId> {
        h.get(Self::HEADER_NAME)
            .ok_or(InvalidCorrelationId::NotFound())
            .and_then(|x| {
                x.to_str()
                    .map_err(|err| InvalidCorrelationId::InvalidString(err.to_string()))
            })
            .and_then(|x| {
                uuid::Uuid::parse_str(x)
                    .map_err(|err| InvalidCorrelationId::InvalidString(err.to_string()))
            })
            .map(|cid| cid.into())
    }

    /// The caller's correlation-id, or a fresh one when the header is absent or malformed.
    pub fn from_header_map_or_new(h: &HeaderMap) -> Self {
        Self::from_header_map(h).unwrap_or_else(|_| Self::new())
    }

    pub fn insert_into_header_map(&self, h: &mut HeaderMap) -> anyhow::Result<()> {
        h.insert(
            Self::HEADER_NAME,
            http::HeaderValue::from_str(
                self.as_hyphenated()
                    .encode_lower(&mut Uuid::encode_buffer()),
            )?,
        );
        Ok(())
    }

    pub fn as_hyphenated(&self) -> Hyphenated {
        self.0.hyphenated()
    }
}
