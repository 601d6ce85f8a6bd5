//! Runtime Worker (C5) framework: the long-lived process shape every
//! language runtime binds into. A binary picks one of [`UnaryHandler`] or
//! [`StreamingHandler`], loads a [`WorkerConfig`] from the environment, and
//! calls [`consumer::run`] as the last step of `main`.

pub mod config;
pub mod consumer;
pub mod handler;
pub mod metrics;
pub mod shell;

pub use config::{ConfigError, WorkerConfig};
pub use handler::{Handler, StreamingHandler, UnaryHandler};
pub use metrics::WorkerMetrics;
