//! Response decoder module
//!
//! # Overview
//!
//! OCAPI returns JSON documents whose records sit at different places:
//! `data[*]` for list resources, `hits[*]` for searches, `hits[*].data`
//! for order search, and the document itself for single-object lookups.
//! `JsonDecoder` extracts them with a per-stream path.

mod decoders;

pub use decoders::JsonDecoder;
