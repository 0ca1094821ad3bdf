//! Models Module - Data Structures & Configuration
//!
//! Chain registry types, runtime config, errors and domain records.

pub mod config;
pub mod errors;
pub mod types;

pub use config::*;
pub use errors::*;
pub use types::*;
