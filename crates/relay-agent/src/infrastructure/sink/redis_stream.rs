//! Redis Streams sink.
//!
//! Each record becomes one `XADD <stream> * field value ...` sent over a
//! `redis` multiplexed async connection.  The connection is opened lazily on
//! the first append; when credentials are configured the client sends `AUTH`
//! as part of connection setup.
//!
//! # Connection handling
//!
//! ```text
//! append()
//!  ├─ no connection?  connect (connect timeout, AUTH if configured)
//!  ├─ XADD (I/O timeout)
//!  ├─ entry id            → Ok, keep connection
//!  ├─ error reply         → Rejected, keep connection
//!  └─ I/O / timeout / unexpected reply → drop connection, next append reconnects
//! ```
//!
//! The sink does not retry by itself; the scan sender owns the retry policy.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{
    Client, ConnectionAddr, ConnectionInfo, ErrorKind, RedisConnectionInfo, RedisError,
    RedisResult,
};
use relay_core::SinkRecord;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::application::capabilities::{MessageSink, SinkError};
use crate::infrastructure::storage::config::RedisConfig;

/// Connection parameters for [`RedisStreamSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub connect_timeout: Duration,
    pub io_timeout: Duration,
}

impl From<&RedisConfig> for RedisSettings {
    fn from(config: &RedisConfig) -> Self {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
        Self {
            host: config.host.clone(),
            port: config.port,
            username: non_empty(&config.username),
            password: non_empty(&config.password),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            io_timeout: Duration::from_millis(config.io_timeout_ms),
        }
    }
}

impl RedisSettings {
    fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: RedisConnectionInfo {
                username: self.username.clone(),
                password: self.password.clone(),
                ..RedisConnectionInfo::default()
            },
        }
    }
}

/// Appends records to Redis streams.
pub struct RedisStreamSink {
    settings: RedisSettings,
    connection: Mutex<Option<MultiplexedConnection>>,
}

impl RedisStreamSink {
    /// Creates the sink.  No connection is made until the first append.
    pub fn new(settings: RedisSettings) -> Self {
        Self {
            settings,
            connection: Mutex::new(None),
        }
    }

    async fn connect(&self) -> Result<MultiplexedConnection, SinkError> {
        let target = self.describe();
        let client = Client::open(self.settings.connection_info()).map_err(|e| {
            SinkError::Connect {
                target: target.clone(),
                reason: e.to_string(),
            }
        })?;

        let connection = timeout(
            self.settings.connect_timeout,
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| SinkError::Timeout)?
        .map_err(|e| {
            if is_rejection(&e) {
                SinkError::Rejected(e.to_string())
            } else {
                SinkError::Connect {
                    target: target.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        info!("connected to {target}");
        Ok(connection)
    }
}

/// `true` when the server answered with an error reply, as opposed to the
/// request never completing.
fn is_rejection(error: &RedisError) -> bool {
    error.kind() == ErrorKind::AuthenticationFailed || error.code().is_some()
}

fn xadd(stream: &str, record: &SinkRecord) -> redis::Cmd {
    let mut command = redis::cmd("XADD");
    command.arg(stream).arg("*");
    for (field, value) in record.iter() {
        command.arg(field).arg(value);
    }
    command
}

#[async_trait]
impl MessageSink for RedisStreamSink {
    async fn append(&self, stream: &str, record: &SinkRecord) -> Result<(), SinkError> {
        let mut slot = self.connection.lock().await;

        // Taken out of the slot; only put back while the connection is healthy.
        let mut connection = match slot.take() {
            Some(connection) => connection,
            None => self.connect().await?,
        };

        let command = xadd(stream, record);
        let reply: Result<RedisResult<String>, _> = timeout(
            self.settings.io_timeout,
            command.query_async(&mut connection),
        )
        .await;

        match reply {
            Ok(Ok(id)) => {
                debug!(stream, %id, "record appended");
                *slot = Some(connection);
                Ok(())
            }
            Ok(Err(e)) if is_rejection(&e) => {
                *slot = Some(connection);
                Err(SinkError::Rejected(e.to_string()))
            }
            Ok(Err(e)) if e.is_io_error() || e.is_connection_dropped() => {
                Err(SinkError::Io(io::Error::new(io::ErrorKind::Other, e)))
            }
            Ok(Err(e)) if e.is_timeout() => Err(SinkError::Timeout),
            Ok(Err(e)) => Err(SinkError::Protocol(e.to_string())),
            Err(_) => Err(SinkError::Timeout),
        }
    }

    fn describe(&self) -> String {
        format!("redis://{}:{}", self.settings.host, self.settings.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RedisConfig {
        RedisConfig {
            host: "127.0.0.1".to_string(),
            port: 6379,
            username: Some(String::new()),
            password: Some("hunter2".to_string()),
            connect_timeout_ms: 250,
            io_timeout_ms: 750,
        }
    }

    #[test]
    fn test_settings_treat_empty_credentials_as_absent() {
        // Arrange / Act
        let settings = RedisSettings::from(&config());

        // Assert
        assert_eq!(settings.username, None);
        assert_eq!(settings.password.as_deref(), Some("hunter2"));
        assert_eq!(settings.connect_timeout, Duration::from_millis(250));
        assert_eq!(settings.io_timeout, Duration::from_millis(750));
    }

    #[test]
    fn test_connection_info_carries_address_and_credentials() {
        // Arrange
        let settings = RedisSettings::from(&config());

        // Act
        let info = settings.connection_info();

        // Assert
        assert_eq!(info.addr, ConnectionAddr::Tcp("127.0.0.1".to_string(), 6379));
        assert_eq!(info.redis.username, None);
        assert_eq!(info.redis.password.as_deref(), Some("hunter2"));
        assert_eq!(info.redis.db, 0);
    }

    #[test]
    fn test_xadd_lists_fields_after_auto_id() {
        // Arrange
        let record = SinkRecord::new()
            .with_field("device", "scanner-a")
            .with_field("code", "42\n");

        // Act
        let packed = xadd("scans", &record).get_packed_command();

        // Assert
        let expected = b"*7\r\n$4\r\nXADD\r\n$5\r\nscans\r\n$1\r\n*\r\n\
$6\r\ndevice\r\n$9\r\nscanner-a\r\n$4\r\ncode\r\n$3\r\n42\n\r\n";
        assert_eq!(packed, expected.to_vec());
    }

    #[test]
    fn test_error_replies_are_rejections_but_io_failures_are_not() {
        // Arrange
        let reply = RedisError::from((ErrorKind::ResponseError, "server error"));
        let reset = RedisError::from(io::Error::from(io::ErrorKind::ConnectionReset));

        // Act / Assert
        assert!(is_rejection(&reply));
        assert!(!is_rejection(&reset));
    }

    #[tokio::test]
    async fn test_append_to_unreachable_server_fails_without_panicking() {
        // Arrange – bind then drop a listener to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);
        let sink = RedisStreamSink::new(RedisSettings {
            host: "127.0.0.1".to_string(),
            port,
            username: None,
            password: None,
            connect_timeout: Duration::from_millis(500),
            io_timeout: Duration::from_millis(500),
        });

        // Act
        let result = sink
            .append("scans", &SinkRecord::new().with_field("code", "1\n"))
            .await;

        // Assert
        assert!(matches!(
            result,
            Err(SinkError::Connect { .. }) | Err(SinkError::Timeout)
        ));
    }
}
