//! Infrastructure layer for the relay.
//!
//! Contains OS-facing adapters: keystroke sources (evdev on Linux), message
//! sinks (Redis Streams and a logging stand-in), and configuration storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `relay_core`, but MUST NOT be imported by the `application` layer outside
//! of tests.

pub mod keystroke_source;
pub mod sink;
pub mod storage;
