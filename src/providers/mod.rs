//! Providers Module - External Data Sources
//!
//! Block explorers (Etherscan family, Solscan) behind one retrieval service,
//! and the language model behind `LanguageModel`.

pub mod etherscan;
pub mod explorer;
pub mod gemini;
pub mod llm;
pub mod solscan;
pub mod transport;

pub use etherscan::*;
pub use explorer::*;
pub use gemini::*;
pub use llm::*;
pub use solscan::*;
pub use transport::*;
