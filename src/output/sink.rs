//! Message sinks

use crate::engine::Message;
use crate::error::Result;
use serde_json::{json, Value};
use std::io::{self, Write};

/// Destination for engine messages
pub trait MessageSink: Send {
    /// Write one message
    fn emit(&mut self, message: Message) -> Result<()>;
}

/// JSON value of a message in the wire layout
pub fn message_to_json(message: &Message) -> Value {
    match message {
        Message::Record {
            stream,
            data,
            emitted_at,
        } => json!({
            "type": "RECORD",
            "record": {
                "stream": stream,
                "data": data,
                "emitted_at": emitted_at
            }
        }),
        Message::State { stream, data } => json!({
            "type": "STATE",
            "state": {
                "type": "STREAM",
                "stream": {
                    "stream_descriptor": {
                        "name": stream
                    },
                    "stream_state": data
                }
            }
        }),
        Message::Log { level, message } => json!({
            "type": "LOG",
            "log": {
                "level": level.as_str(),
                "message": message
            }
        }),
    }
}

/// Writes one JSON document per line
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl JsonLinesSink<io::Stdout> {
    /// Sink over standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Sink over any writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write an arbitrary JSON document as a line
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        serde_json::to_writer(&mut self.writer, value)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Give back the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> MessageSink for JsonLinesSink<W> {
    fn emit(&mut self, message: Message) -> Result<()> {
        self.write_value(&message_to_json(&message))
    }
}

/// Keeps messages in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    /// Messages in emission order
    pub messages: Vec<Message>,
}

impl CollectingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Record payloads of one stream
    pub fn records(&self, stream: &str) -> Vec<&Value> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::Record {
                    stream: name, data, ..
                } if name == stream => Some(data),
                _ => None,
            })
            .collect()
    }

    /// State payloads as (stream, data)
    pub fn states(&self) -> Vec<(&str, &Value)> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::State { stream, data } => Some((stream.as_str(), data)),
                _ => None,
            })
            .collect()
    }

    /// Log messages
    pub fn logs(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::Log { message, .. } => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl MessageSink for CollectingSink {
    fn emit(&mut self, message: Message) -> Result<()> {
        self.messages.push(message);
        Ok(())
    }
}
