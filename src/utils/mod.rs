//! Utils Module - Helper Functions & Shared Utilities

pub mod constants;
pub mod storage;
pub mod validator;

pub use constants::*;
pub use storage::*;
pub use validator::*;
