//! Request types

use crate::types::Method;
use serde_json::Value;

/// Header carrying the API client id on every OCAPI call
pub const CLIENT_ID_HEADER: &str = "x-dw-client-id";

/// Which OCAPI surface a stream lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiScope {
    /// Storefront API, `/s/{site_id}/dw/shop/{version}`
    Shop,
    /// Administrative API, `/s/-/dw/data/{version}`
    #[default]
    Data,
}

impl std::fmt::Display for ApiScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiScope::Shop => f.write_str("shop"),
            ApiScope::Data => f.write_str("data"),
        }
    }
}

/// A fully built request
#[derive(Clone, PartialEq)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Absolute URL without query string
    pub url: String,
    /// Headers in insertion order
    pub headers: Vec<(String, String)>,
    /// Query parameters in insertion order
    pub query: Vec<(String, String)>,
    /// JSON body for search requests
    pub body: Option<Value>,
}

impl Request {
    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Query parameter value by name
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                if k.eq_ignore_ascii_case("authorization") {
                    (k.as_str(), crate::redact::MASK)
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("query", &self.query)
            .field("body", &self.body)
            .finish()
    }
}
