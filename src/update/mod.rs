//! Update orchestration layer for installed plugins
//!
//! This module provides the core functionality for merging update targets,
//! resolving the latest release of each target, comparing versions and
//! replacing stale plugin files.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Target    │────▶│ Orchestrator│────▶│  Installer  │
//! │  (merge)    │     │   (pass)    │     │ (overwrite) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                        │       │
//!                        ▼       ▼
//!              ┌─────────────┐ ┌─────────────┐
//!              │   Source    │ │   Version   │
//!              │  (GitHub)   │ │  (compare)  │
//!              └─────────────┘ └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`target`]: Update targets and the dynamic registration registry
//! - [`source`]: Remote release source trait and release metadata types
//! - [`sources`]: Concrete release source implementations (GitHub)
//! - [`asset`]: Deterministic asset selection policy
//! - [`version`]: Dotted numeric version parsing and comparison
//! - [`installer`]: Download and file replacement
//! - [`installed`]: Host-supplied lookup of installed artifacts
//! - [`outcome`]: Per-target terminal outcomes of a pass
//! - [`orchestrator`]: Concurrent per-target pipelines
//! - [`service`]: Single-flight pass entry point owning the registry
//! - [`scheduler`]: Periodic pass trigger
//! - [`error`]: Error types for fetch, version and install operations

pub mod asset;
pub mod error;
pub mod installed;
pub mod installer;
pub mod orchestrator;
pub mod outcome;
pub mod scheduler;
pub mod service;
pub mod source;
pub mod sources;
pub mod target;
pub mod version;
