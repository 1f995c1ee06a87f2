pub mod blockchain;
pub mod bot;
pub mod config;
pub mod dex;
pub mod error;
pub mod mempool;
pub mod relay;
pub mod sandwich;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::Config;
pub use error::{PipelineError, Rejection};
pub use types::*;
