// Application layer - the use cases exposed to callers (CLI, export, tests).

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
