//! Classification types

use crate::error::Error;
use crate::pagination::Cursor;
use crate::types::{scalar_to_string, JsonObject};
use serde_json::Value;

/// Outcome of one response
#[derive(Debug)]
pub enum Classification {
    /// Records extracted; `next_cursor` is `None` when the entity is done
    Success {
        /// Extracted records
        records: Vec<Value>,
        /// Where to continue, if anywhere
        next_cursor: Option<Cursor>,
    },
    /// Nothing here; pagination ends for this entity
    Empty,
    /// The currency in the request is not configured on the tenant
    UnsupportedCurrency(String),
    /// Worth another attempt
    Retriable(RetryReason),
    /// Stops the stream
    Fatal(Error),
}

impl Classification {
    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Success { .. } => "success",
            Classification::Empty => "empty",
            Classification::UnsupportedCurrency(_) => "unsupported_currency",
            Classification::Retriable(_) => "retriable",
            Classification::Fatal(_) => "fatal",
        }
    }
}

/// Why a retriable outcome happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    /// Timeout, connection reset or unreadable body
    Transport(String),
    /// 5xx or a configured retry status
    Server {
        /// HTTP status
        status: u16,
        /// Request URL
        url: String,
        /// Redacted body excerpt
        body: String,
    },
    /// 2xx body that is not the expected JSON
    Malformed {
        /// Request URL
        url: String,
        /// Redacted, truncated body
        excerpt: String,
    },
}

impl RetryReason {
    /// Whether the server asked us to back off (shrinks the page size)
    pub fn is_overload(&self) -> bool {
        matches!(self, RetryReason::Server { .. })
    }

    /// Fatal error once the retry budget is spent
    pub fn into_error(self, max_attempts: u32) -> Error {
        match self {
            RetryReason::Transport(message) => Error::MaxRetriesExceeded {
                max_attempts,
                message,
            },
            RetryReason::Server { status, url, body } => Error::http_status(status, url, body),
            RetryReason::Malformed { url, excerpt } => Error::MalformedResponse { url, excerpt },
        }
    }
}

impl std::fmt::Display for RetryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryReason::Transport(message) => write!(f, "Transport error: {message}"),
            RetryReason::Server { status, url, .. } => {
                write!(f, "Request failed with {status} from {url}")
            }
            RetryReason::Malformed { url, .. } => write!(f, "Malformed response from {url}"),
        }
    }
}

/// OCAPI error envelope: `{"fault": {"type": ..., "message": ..., "arguments": {...}}}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fault {
    /// Fault type, e.g. `ProductNotFoundException`
    pub kind: String,
    /// Human-readable message
    pub message: Option<String>,
    /// Fault arguments
    pub arguments: JsonObject,
}

impl Fault {
    /// Read the fault from an error body, if it has one
    pub fn from_body(body: &Value) -> Option<Self> {
        let fault = body.get("fault")?;
        Some(Self {
            kind: fault.get("type")?.as_str()?.to_string(),
            message: fault
                .get("message")
                .and_then(Value::as_str)
                .map(ToString::to_string),
            arguments: fault
                .get("arguments")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        })
    }

    /// Argument value as a string
    pub fn argument(&self, name: &str) -> Option<String> {
        self.arguments.get(name).and_then(scalar_to_string)
    }

    /// Whether the fault has the given type
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }
}
