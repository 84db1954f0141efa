//! Request construction module
//!
//! `RequestBuilder` turns a stream, its partition/entity values, a bearer
//! token and the current page position into a concrete `Request`.

mod builder;
mod types;

pub use builder::RequestBuilder;
pub use types::{ApiScope, Request, CLIENT_ID_HEADER};

#[cfg(test)]
mod tests;
