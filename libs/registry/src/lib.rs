pub mod client;
pub mod crd;
pub mod error;

pub use client::Registry;
pub use crd::{Function, FunctionSpec, FunctionStatus};
pub use error::{Error, Result};
