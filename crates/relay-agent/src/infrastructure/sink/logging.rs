//! Sink that accepts every record and only logs it.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use relay_core::SinkRecord;
use tracing::info;

use crate::application::capabilities::{MessageSink, SinkError};

/// Always-successful stand-in for a real target.
#[derive(Debug, Default)]
pub struct LoggingSink {
    appended: AtomicU64,
}

impl LoggingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records accepted so far.
    pub fn appended(&self) -> u64 {
        self.appended.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageSink for LoggingSink {
    async fn append(&self, stream: &str, record: &SinkRecord) -> Result<(), SinkError> {
        self.appended.fetch_add(1, Ordering::SeqCst);
        let fields: Vec<String> = record
            .iter()
            .map(|(name, value)| format!("{name}={}", value.escape_debug()))
            .collect();
        info!(stream, "{}", fields.join(" "));
        Ok(())
    }

    fn describe(&self) -> String {
        "dummy (log only)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_always_succeeds_and_counts() {
        // Arrange
        let sink = LoggingSink::new();
        let record = SinkRecord::new().with_field("code", "123\n");

        // Act
        let first = sink.append("scans", &record).await;
        let second = sink.append("heartbeats", &record).await;

        // Assert
        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(sink.appended(), 2);
    }
}
