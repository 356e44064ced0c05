//! Process-wide compute runtime.
//!
//! A [`RuntimeBridge`] starts the compute context once and hands the same
//! [`RuntimeContext`] to every caller afterwards. Most code goes through
//! [`RuntimeBridge::global`]; tests and embedders can own a separate bridge.

mod backend;
mod bridge;
mod config;
mod staging;


pub use backend::{Backend, BACKEND_ENV};
pub use bridge::{RuntimeBridge, RuntimeContext};
pub use config::RuntimeConfig;
pub use staging::default_staging_dir;
