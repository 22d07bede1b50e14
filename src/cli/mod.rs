//! CLI entry point for KrmPesan.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// KrmPesan messaging CLI
#[derive(Parser, Debug)]
#[command(name = "krmpesan", version, about = "KrmPesan messaging API CLI")]
pub struct Cli {
    /// Directory holding token.json (overrides KRMPESAN_TOKEN_DIR)
    #[arg(long, global = true)]
    pub token_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the device bound to the credentials
    Device,
    /// List sent messages
    Messages,
    /// Send a plain text reply
    SendText(SendTextArgs),
    /// Send an image reply
    SendImage(SendImageArgs),
    /// Send a document reply
    SendDocument(SendDocumentArgs),
    /// Upload a file and print its public URL
    Upload(UploadArgs),
    /// Force a token refresh
    Refresh,
    /// Show the current token state
    Token,
}

#[derive(Parser, Debug)]
pub struct SendTextArgs {
    /// Recipient phone number, e.g. 6281234567890
    #[arg(long)]
    pub to: String,
    pub text: String,
}

#[derive(Parser, Debug)]
pub struct SendImageArgs {
    #[arg(long)]
    pub to: String,
    /// Public image URL (see `upload`)
    pub url: String,
    #[arg(long, default_value = "")]
    pub caption: String,
}

#[derive(Parser, Debug)]
pub struct SendDocumentArgs {
    #[arg(long)]
    pub to: String,
    /// Public document URL (see `upload`)
    pub url: String,
}

#[derive(Parser, Debug)]
pub struct UploadArgs {
    pub path: PathBuf,
}
