//! HTML coverage view from LLVM source-based profiles
//!
//! Two blocking steps: `llvm-profdata merge` turns the raw profile into
//! profile data (skipped when it already exists, unless forced), then
//! `llvm-cov show --format html` renders it for a set of executables.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{count_found, echo_command, progress};
use crate::config::CoverageConfig;
use crate::error::{CoverageError, Result};
use crate::process::{CommandRunner, ToolCommand};

#[derive(Debug, Clone, Default)]
pub struct HtmlOptions {
    /// Directory holding the profiles and executables; defaults to the current dir
    pub bin_dir: Option<PathBuf>,
    pub profraw_filename: Option<String>,
    pub profdata_filename: Option<String>,
    /// Executables to render; discovered from `bin_dir` when empty
    pub executables: Vec<PathBuf>,
    pub source_dirs: Vec<PathBuf>,
    pub output_filename: Option<String>,
    /// Regenerate profile data even if it exists
    pub force: bool,
    /// Merge without `-sparse`
    pub no_sparse: bool,
    pub verbose: bool,
}

/// Merge (if needed) and render, returning the HTML file path
pub fn generate_html<R: CommandRunner + ?Sized>(
    runner: &R,
    config: &CoverageConfig,
    options: &HtmlOptions,
) -> Result<PathBuf> {
    let bin_dir = match &options.bin_dir {
        Some(dir) => dir.clone(),
        None => env::current_dir()?,
    };

    let profdata = bin_dir.join(
        options
            .profdata_filename
            .as_deref()
            .unwrap_or(&config.profdata_filename),
    );

    if options.force || !profdata.is_file() {
        let profraw = bin_dir.join(
            options
                .profraw_filename
                .as_deref()
                .unwrap_or(&config.profraw_filename),
        );
        if !profraw.is_file() {
            return Err(CoverageError::MissingArtifact {
                kind: "raw profile",
                path: profraw,
            });
        }

        progress(format_args!("Creating '{}'...", profdata.display()));
        if let Some(parent) = profdata.parent() {
            fs::create_dir_all(parent)?;
        }

        let command = merge_command(config, &profraw, &profdata, options.no_sparse);
        echo_command(options.verbose, &command);
        runner.run(&command)?.check(&config.llvm_profdata)?;
    }

    let output_file = bin_dir.join(
        options
            .output_filename
            .as_deref()
            .unwrap_or(&config.html_filename),
    );
    progress(format_args!("Creating '{}'...", output_file.display()));

    let executables = if options.executables.is_empty() {
        let found = discover_executables(&bin_dir)?;
        debug!(dir = %bin_dir.display(), count = found.len(), "discovered executables");
        progress(count_found(found.len(), "executable"));
        if found.is_empty() {
            warn!(dir = %bin_dir.display(), "no executables found");
        }
        found
    } else {
        options.executables.clone()
    };

    if let Some(parent) = output_file.parent() {
        fs::create_dir_all(parent)?;
    }

    let command = show_command(config, &executables, &profdata, &options.source_dirs);
    echo_command(options.verbose, &command);
    let output = runner.run(&command)?.check(&config.llvm_cov)?;
    fs::write(&output_file, &output.stdout)?;

    Ok(output_file)
}

pub fn merge_command(
    config: &CoverageConfig,
    profraw: &Path,
    profdata: &Path,
    no_sparse: bool,
) -> ToolCommand {
    let mut command = ToolCommand::new(&config.llvm_profdata).arg("merge");
    if !no_sparse {
        command = command.arg("-sparse");
    }
    command
        .arg("-o")
        .arg(profdata.as_os_str())
        .arg(profraw.as_os_str())
}

pub fn show_command(
    config: &CoverageConfig,
    executables: &[PathBuf],
    profdata: &Path,
    source_dirs: &[PathBuf],
) -> ToolCommand {
    ToolCommand::new(&config.llvm_cov)
        .arg("show")
        .args(executables.iter().map(|e| e.as_os_str().to_owned()))
        .arg(format!("-instr-profile={}", profdata.display()))
        .args(["-use-color", "--format", "html"])
        .args(source_dirs.iter().map(|d| d.as_os_str().to_owned()))
}

/// Executables directly inside `dir`, in name order
pub fn discover_executables(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && is_executable(&path)? {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(windows)]
fn is_executable(path: &Path) -> Result<bool> {
    Ok(path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("exe")))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::metadata(path)?.permissions().mode() & 0o111 != 0)
}

#[cfg(not(any(unix, windows)))]
fn is_executable(_path: &Path) -> Result<bool> {
    Ok(false)
}
