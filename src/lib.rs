//! Lydtrekk - Audio Extraction Service
//!
//! An HTTP service that pulls a video from a remote file host, extracts a
//! compressed audio track with ffmpeg, publishes it to an object store, and
//! returns a time-limited signed download link.
//!
//! The name combines the Norwegian "lyd" (sound) and "trekk ut" (extract).
//!
//! # Overview
//!
//! A single `POST /extract-audio` request runs a linear pipeline:
//! download → transcode → upload → respond. Every request stages its files in
//! a private working directory that is removed when the request finishes,
//! whether it succeeded or not.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Runtime configuration from flags and environment
//! - `fetch` - Remote file retrieval
//! - `transcode` - Audio extraction via external media tools
//! - `store` - Artifact publishing and signed URLs
//! - `pipeline` - Per-request orchestration
//! - `server` - HTTP surface
//!
//! # Example
//!
//! ```rust,no_run
//! use clap::Parser;
//! use lydtrekk::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::parse();
//!     lydtrekk::server::run_serve(settings).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod server;
pub mod store;
pub mod transcode;

pub use error::{LydtrekkError, Result};
