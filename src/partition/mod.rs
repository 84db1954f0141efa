//! Partition routing module
//!
//! Supports: configured site lists and parent-record child contexts
//!
//! # Overview
//!
//! A `PartitionKey` names one independent extraction lane. Site-scoped
//! streams get one key per configured site id; everything else runs under
//! a single implicit key. Within a lane, child streams iterate over
//! `EntityContext` values derived from their parent stream's records.

mod routers;
mod types;

pub use routers::{derive_context, extract_path, ContextField, ContextSource, SiteRouter};
pub use types::{EntityContext, PartitionKey, PartitionRouter};

#[cfg(test)]
mod tests;
