//! Configuration loading and CLI arguments.

pub mod app_config;
pub mod args;
pub mod storage;

pub use app_config::{CacheConfig, HttpConfig, LogLevel, LumenConfig};
pub use args::{ClearArgs, CliArgs, Command, Dimensions, LoadArgs};
pub use storage::{ConfigError, StorageManager};
