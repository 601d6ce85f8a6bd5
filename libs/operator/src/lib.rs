pub mod config;
pub mod controller;
pub mod deployment;
pub mod error;
pub mod finalizer;
pub mod metrics;
pub mod reconcile;
pub mod sweeper;

pub use error::{Error, Result};
