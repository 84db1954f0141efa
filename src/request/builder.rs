//! Request builder implementation

use super::types::{ApiScope, Request, CLIENT_ID_HEADER};
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::pagination::{Cursor, IdPlacement};
use crate::stream::{PageRequest, StreamCapabilities};
use crate::template;
use crate::types::{Method, StringMap};
use url::Url;

/// Builds OCAPI requests for one tenant
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    config: &'a TapConfig,
}

impl<'a> RequestBuilder<'a> {
    /// Create a builder over a tap configuration
    pub fn new(config: &'a TapConfig) -> Self {
        Self { config }
    }

    /// Base URL for a scope
    ///
    /// Shop requests need a `site_id` in `vars`.
    pub fn base_url(&self, scope: ApiScope, vars: &StringMap) -> Result<String> {
        let host = self.config.host();
        let host = host.trim_end_matches('/');
        let version = &self.config.api_version;
        match scope {
            ApiScope::Shop => {
                let site_id = vars
                    .get("site_id")
                    .ok_or_else(|| Error::config("Shop API requests need a site_id"))?;
                Ok(format!("{host}/s/{site_id}/dw/shop/{version}"))
            }
            ApiScope::Data => Ok(format!("{host}/s/-/dw/data/{version}")),
        }
    }

    /// Build the request for one page
    pub fn build(
        &self,
        stream: &dyn StreamCapabilities,
        vars: &StringMap,
        token: &str,
        page: &PageRequest<'_>,
    ) -> Result<Request> {
        let base = self.base_url(stream.scope(), vars)?;
        let path = template::render(stream.path_template(), vars)?;
        let mut url = Url::parse(&format!("{base}{path}"))?;

        if let Some((id, IdPlacement::PathSegment)) = page.paging.id(page.cursor) {
            url.path_segments_mut()
                .map_err(|()| Error::config("Cannot append an id to a base URL"))?
                .pop_if_empty()
                .push(id);
        }

        Ok(Request {
            method: stream.method(),
            url: url.to_string(),
            headers: self.headers(token),
            query: self.query(stream, page),
            body: stream.build_body(page),
        })
    }

    fn headers(&self, token: &str) -> Vec<(String, String)> {
        let mut headers = vec![
            ("Authorization".to_string(), format!("Bearer {token}")),
            (CLIENT_ID_HEADER.to_string(), self.config.client_id.clone()),
        ];
        if let Some(ref agent) = self.config.user_agent {
            headers.push(("User-Agent".to_string(), agent.clone()));
            headers.push(("Accept".to_string(), "application/json".to_string()));
        }
        headers
    }

    fn query(&self, stream: &dyn StreamCapabilities, page: &PageRequest<'_>) -> Vec<(String, String)> {
        let options = stream.query_options();
        let mut query = Vec::new();

        if let Some(select) = options.select {
            query.push(("select".to_string(), select.to_string()));
        }
        if let Some(expand) = options.expand {
            query.push(("expand".to_string(), expand.to_string()));
        }
        if options.include_all {
            query.push(("include_all".to_string(), "true".to_string()));
        }

        // Search bodies carry their own paging
        if stream.method() == Method::GET {
            if options.count {
                query.push(("count".to_string(), page.page_size.to_string()));
            }
            if let Some(Cursor::Offset(start)) = page.cursor {
                if start > 0 {
                    query.push(("start".to_string(), start.to_string()));
                }
            }
        }

        if let Some(currency) = page.paging.currency(page.cursor) {
            query.push(("currency".to_string(), currency.to_string()));
        }

        query
    }
}
