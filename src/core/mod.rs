//! Core Module - Business Logic
//!
//! Credentials, daily quota, the audit request service and the scan flow.

pub mod auditor;
pub mod credentials;
pub mod flow;
pub mod services;
pub mod usage;

pub use auditor::*;
pub use credentials::*;
pub use flow::*;
pub use services::*;
pub use usage::*;
