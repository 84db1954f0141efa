//! Output module
//!
//! Serializes engine messages as JSON lines.
//!
//! # Overview
//!
//! Every message is one JSON object on its own line:
//!
//! - `RECORD` - `{"type":"RECORD","record":{"stream","data","emitted_at"}}`
//! - `STATE` - per-stream bookmarks under `state.stream.stream_state`
//! - `LOG` - `{"type":"LOG","log":{"level","message"}}`
//!
//! `MessageSink` is the seam the pagination driver writes to; the CLI uses
//! `JsonLinesSink` over stdout and tests use `CollectingSink`.

mod sink;

pub use sink::{message_to_json, CollectingSink, JsonLinesSink, MessageSink};
