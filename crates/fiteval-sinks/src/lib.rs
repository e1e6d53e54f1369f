//! fiteval-sinks — Result sink implementations.
//!
//! Implements the `ResultSink` trait for an HTTP API and an in-memory
//! store, and loads the sink configuration used by the CLI.

pub mod config;
pub mod http;
pub mod mock;

pub use config::{
    create_named_sink, create_sink, load_config, load_config_from, FitevalConfig, SinkConfig,
};
pub use http::HttpSink;
pub use mock::MockSink;
