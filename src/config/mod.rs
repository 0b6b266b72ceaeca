//! Configuration module.
//!
//! Provides the environment snapshot store used by the client factory.

mod env;

pub use env::EnvStore;
