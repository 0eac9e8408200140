//! # Feegate Config
//!
//! Process configuration for the feegate proxy, loaded from environment
//! variables at startup:
//!
//! | Variable | Required | Default |
//! |----------|----------|---------|
//! | `NETWORK` | yes | - |
//! | `INFURA_PROJECT_ID` | yes | - |
//! | `HOST` | no | `localhost` |
//! | `PORT` | no | `8080` |
//! | `LOG_LEVEL` | no | `INFO` |
//!
//! The upstream node URL is derived as
//! `https://<NETWORK>.infura.io/v3/<INFURA_PROJECT_ID>`.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;

// Re-export main types at crate root
pub use config::Config;
pub use error::{ConfigError, ConfigResult};
