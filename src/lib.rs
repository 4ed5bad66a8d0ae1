//! Bees Prometheus Exporter
//!
//! Exposes the status files written by the bees deduplication daemon as
//! Prometheus metrics.
//!
//! # Overview
//!
//! bees writes one `<uuid>.status` file per deduplicated filesystem into its
//! work directory (`/run/bees` by default). Each scrape of `/metrics` lists
//! that directory, parses every status file and renders the counters and the
//! extent size progress table in Prometheus text format. Nothing is cached
//! between scrapes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   <uuid>.status    ┌──────────────────────┐
//! │    bees     │ ─────────────────► │       Exporter       │
//! │   daemon    │    /run/bees       │                      │
//! └─────────────┘                    │  ┌────────────────┐  │      HTTP      ┌────────────┐
//!                                    │  │ parser/collect │  │ ◄────────────► │ Prometheus │
//!                                    │  └────────────────┘  │   /metrics     └────────────┘
//!                                    │  ┌────────────────┐  │
//!                                    │  │    landlock    │  │
//!                                    │  └────────────────┘  │
//!                                    └──────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`bees`] - Status file model, grammar and directory enumeration
//! - [`collectors`] - Per-filesystem metric snapshots
//! - [`metrics`] - Prometheus text rendering
//! - [`sandbox`] - Landlock confinement
//! - [`server`] - HTTP server
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use bees_exporter::{bees::StatusDir, collectors, metrics};
//!
//! fn main() -> anyhow::Result<()> {
//!     let dir = StatusDir::open("/run/bees")?;
//!     let snapshots = collectors::collect(&dir);
//!     print!("{}", metrics::render(&collectors::samples(&snapshots))?);
//!     Ok(())
//! }
//! ```

pub mod bees;
pub mod collectors;
pub mod config;
pub mod error;
pub mod metrics;
pub mod sandbox;
pub mod server;
