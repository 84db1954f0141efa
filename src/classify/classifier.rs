//! Response classifier implementation

use super::types::{Classification, Fault, RetryReason};
use crate::decode::JsonDecoder;
use crate::error::Error;
use crate::http::RawResponse;
use crate::pagination::{Cursor, PageMeta, PagingMode};
use crate::redact;
use crate::stream::StreamCapabilities;
use serde_json::Value;
use std::collections::HashSet;

/// Where the classified page sits, for next-cursor computation
#[derive(Debug, Clone, Copy)]
pub struct PagePosition<'a> {
    /// Paging mode of the stream
    pub mode: &'a PagingMode,
    /// Cursor the request was built from
    pub cursor: Option<Cursor>,
    /// Currencies removed earlier in the run
    pub removed: &'a HashSet<String>,
}

/// Classifies responses for one stream
pub struct ResponseClassifier<'a> {
    stream: &'a dyn StreamCapabilities,
    retry_statuses: &'a [u16],
    secrets: Vec<&'a str>,
    decoder: JsonDecoder,
}

impl<'a> ResponseClassifier<'a> {
    /// Create a classifier
    ///
    /// `secrets` are masked in every body excerpt this classifier produces.
    pub fn new(
        stream: &'a dyn StreamCapabilities,
        retry_statuses: &'a [u16],
        secrets: Vec<&'a str>,
    ) -> Self {
        Self {
            stream,
            retry_statuses,
            secrets,
            decoder: JsonDecoder::with_path(stream.records_path()),
        }
    }

    /// Classify one response
    pub fn classify(&self, response: &RawResponse, position: PagePosition<'_>) -> Classification {
        let status = response.status;

        if self.stream.empty_statuses().contains(&status) {
            return Classification::Empty;
        }

        if self.retry_statuses.contains(&status) || (500..600).contains(&status) {
            return Classification::Retriable(RetryReason::Server {
                status,
                url: response.url.clone(),
                body: self.excerpt(&response.body),
            });
        }

        let body: Value = match serde_json::from_str(&response.body) {
            Ok(body) => body,
            Err(_) if response.is_success() => {
                return Classification::Retriable(RetryReason::Malformed {
                    url: response.url.clone(),
                    excerpt: self.excerpt(&response.body),
                });
            }
            Err(_) => return self.fatal(response),
        };

        if !response.is_success() {
            let fault = Fault::from_body(&body).unwrap_or_default();
            return self
                .stream
                .refine(status, &fault)
                .unwrap_or_else(|| self.fatal(response));
        }

        let records = match self.decoder.extract(&body) {
            Ok(records) => records,
            Err(_) => {
                return Classification::Retriable(RetryReason::Malformed {
                    url: response.url.clone(),
                    excerpt: self.excerpt(&response.body),
                });
            }
        };

        let meta = PageMeta::from_body(&body);
        let next_cursor = position
            .mode
            .next_cursor(position.cursor, &meta, position.removed);

        Classification::Success {
            records,
            next_cursor,
        }
    }

    fn fatal(&self, response: &RawResponse) -> Classification {
        Classification::Fatal(Error::http_status(
            response.status,
            response.url.clone(),
            self.excerpt(&response.body),
        ))
    }

    fn excerpt(&self, body: &str) -> String {
        redact::excerpt(body, &self.secrets)
    }
}
