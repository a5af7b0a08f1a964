//! Covgate - native code coverage extraction and gating
//!
//! This library turns the gcno/gcda counter files left behind by
//! instrumented test binaries into a consolidated trace file per test run,
//! and into filtered per-symbol line counts that can gate a build.

pub mod aggregate;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod executor;
pub mod filter;
pub mod process;
pub mod report;
pub mod session;
pub mod stager;
