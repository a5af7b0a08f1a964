//! Report generation commands built on the external tools
//!
//! - `lcov`: consolidated trace file from gcno/gcda counters via grcov
//! - `html`: merged profile data rendered to HTML via llvm-profdata/llvm-cov

pub mod html;
pub mod lcov;

use std::fmt::Display;

use crate::process::ToolCommand;

/// Print a command line the way `--verbose` shows it
pub(crate) fn echo_command(verbose: bool, command: &ToolCommand) {
    if verbose {
        eprintln!("Command Line:\n    {}\n", command);
    }
}

/// Print a human progress line, independent of `--debug`
pub(crate) fn progress(message: impl Display) {
    eprintln!("{message}");
}

/// "no executables found", "1 executable found", "3 executables found"
pub(crate) fn count_found(count: usize, noun: &str) -> String {
    match count {
        0 => format!("no {noun}s found"),
        1 => format!("1 {noun} found"),
        n => format!("{n} {noun}s found"),
    }
}
