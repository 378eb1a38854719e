//! Message sink infrastructure.
//!
//! - [`redis_stream::RedisStreamSink`] appends records to a Redis stream with
//!   `XADD` over a multiplexed `redis` connection.
//! - [`logging::LoggingSink`] accepts everything and only logs it; selected
//!   with `type = "dummy"` for dry runs and pipeline diagnostics.

use std::sync::Arc;

use crate::application::capabilities::MessageSink;
use crate::infrastructure::storage::config::SinkConfig;

pub mod logging;
pub mod redis_stream;

use logging::LoggingSink;
use redis_stream::{RedisSettings, RedisStreamSink};

/// Builds the sink selected by a `[target]` or `[heartbeat]` section.
pub fn build_sink(config: &SinkConfig) -> Arc<dyn MessageSink> {
    match config {
        SinkConfig::Redis(redis) => Arc::new(RedisStreamSink::new(RedisSettings::from(redis))),
        SinkConfig::Dummy => Arc::new(LoggingSink::new()),
    }
}
