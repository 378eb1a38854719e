//! Protocol module containing the record type handed to message sinks.

pub mod record;

pub use record::SinkRecord;
