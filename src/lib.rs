//! KrmPesan: Rust client for the KrmPesan messaging REST API.
//!
//! Sends template and freeform WhatsApp messages, manages templates, and
//! uploads media. The client keeps its bearer token fresh on its own: tokens
//! are refreshed inline before the call that needs them and, when a token
//! directory is configured, written back to `<dir>/token.json`.
//!
//! # Quick Start
//!
//! ```no_run
//! use krmpesan::prelude::*;
//!
//! # async fn example() -> krmpesan::Result<()> {
//! let client = KrmPesanClient::new(ClientConfig::token_directory("/var/lib/krmpesan")).await?;
//! client.send_reply_text("6281234", "hi").await?;
//! let url = client.upload("invoice.pdf").await?;
//! client.send_reply_document("6281234", &url).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod prelude;
pub mod transport;
pub mod upload;

#[cfg(feature = "cli")]
pub mod cli;

pub use client::KrmPesanClient;
pub use error::{KrmPesanError, Result};
