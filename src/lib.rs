//! CI-configuration extraction and PEP 725 external-dependency tooling for
//! Python projects.
//!
//! The crate reads a project's `pyproject.toml` and answers three questions:
//! what CI fragments (env blocks, install steps, optional jobs) should be
//! generated for it, how its legacy system-dependency declarations map onto
//! PEP 725 DepURLs, and what a failed CI log says about missing dependencies.

pub mod config;
pub mod depurl;
pub mod diagnostics;
pub mod doc;
pub mod logscan;
pub mod migration;
pub mod tables;
