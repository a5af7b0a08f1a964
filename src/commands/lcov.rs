//! Consolidated trace file generation

use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use super::{echo_command, progress};
use crate::config::CoverageConfig;
use crate::error::{CoverageError, Result};
use crate::process::{CommandRunner, ToolCommand};

/// Inputs for a single grcov run
#[derive(Debug, Clone, Default)]
pub struct LcovOptions {
    /// Directories holding counter files; empty means the current directory
    pub bin_dirs: Vec<PathBuf>,
    /// Required when more than one bin dir is given
    pub output_dir: Option<PathBuf>,
    /// Defaults to the configured trace file name
    pub output_filename: Option<String>,
    /// grcov `-t` output type
    pub output_type: Option<String>,
    /// Omit `--llvm` (counters produced by GCC rather than Clang)
    pub not_llvm: bool,
    pub verbose: bool,
}

impl LcovOptions {
    /// Resolve bin dirs and the output file, rejecting ambiguous input
    ///
    /// Nothing is written or run before this succeeds.
    pub fn resolve(&self, config: &CoverageConfig) -> Result<(Vec<PathBuf>, PathBuf)> {
        let bin_dirs = if self.bin_dirs.is_empty() {
            vec![env::current_dir()?]
        } else {
            self.bin_dirs.clone()
        };

        let output_dir = match (&self.output_dir, bin_dirs.as_slice()) {
            (Some(dir), _) => dir.clone(),
            (None, [single]) => single.clone(),
            (None, _) => {
                return Err(CoverageError::Usage(
                    "An 'output_dir' must be provided when multiple 'bin_dirs' are parsed"
                        .to_string(),
                ))
            }
        };

        let filename = self
            .output_filename
            .as_deref()
            .unwrap_or(&config.lcov_filename);

        Ok((bin_dirs, output_dir.join(filename)))
    }
}

/// Build the grcov command line for resolved inputs
pub fn lcov_command(
    config: &CoverageConfig,
    options: &LcovOptions,
    bin_dirs: &[PathBuf],
    output_file: &std::path::Path,
) -> ToolCommand {
    let mut command = ToolCommand::new(&config.grcov)
        .args(bin_dirs.iter().map(|d| d.as_os_str().to_owned()))
        .arg("-o")
        .arg(output_file.as_os_str());

    if !options.not_llvm {
        command = command.arg("--llvm");
    }
    if let Some(output_type) = &options.output_type {
        command = command.arg("-t").arg(output_type);
    }
    command
}

/// Run grcov across `options.bin_dirs`, returning the trace file path
pub fn generate_lcov<R: CommandRunner + ?Sized>(
    runner: &R,
    config: &CoverageConfig,
    options: &LcovOptions,
) -> Result<PathBuf> {
    let (bin_dirs, output_file) = options.resolve(config)?;

    progress(format_args!("Creating '{}'...", output_file.display()));
    if let Some(parent) = output_file.parent() {
        fs::create_dir_all(parent)?;
    }

    let command = lcov_command(config, options, &bin_dirs, &output_file);
    echo_command(options.verbose, &command);
    runner.run(&command)?.check(&config.grcov)?;
    debug!(output = %output_file.display(), "trace file written");

    Ok(output_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ToolOutput;
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<ToolCommand>>,
        exit_code: i32,
    }

    impl CommandRunner for Recorder {
        fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
            self.calls.borrow_mut().push(command.clone());
            Ok(ToolOutput {
                exit_code: self.exit_code,
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_single_dir_defaults_output_dir() {
        let options = LcovOptions {
            bin_dirs: vec![PathBuf::from("/build/tests")],
            ..Default::default()
        };
        let (dirs, output) = options.resolve(&CoverageConfig::default()).unwrap();
        assert_eq!(dirs, [PathBuf::from("/build/tests")]);
        assert_eq!(output, PathBuf::from("/build/tests/lcov.info"));
    }

    #[test]
    fn test_multiple_dirs_need_output_dir() {
        let runner = Recorder::default();
        let options = LcovOptions {
            bin_dirs: vec![PathBuf::from("/a"), PathBuf::from("/b")],
            ..Default::default()
        };
        let err = generate_lcov(&runner, &CoverageConfig::default(), &options).unwrap_err();
        assert!(matches!(err, CoverageError::Usage(_)));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_command_shape() {
        let out = TempDir::new().unwrap();
        let runner = Recorder::default();
        let options = LcovOptions {
            bin_dirs: vec![PathBuf::from("/a"), PathBuf::from("/b")],
            output_dir: Some(out.path().join("cov")),
            output_filename: Some("all.info".to_string()),
            output_type: Some("ade".to_string()),
            ..Default::default()
        };
        let path = generate_lcov(&runner, &CoverageConfig::default(), &options).unwrap();
        assert_eq!(path, out.path().join("cov/all.info"));
        assert!(out.path().join("cov").is_dir());

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "grcov");
        assert_eq!(
            calls[0].arg_strings(),
            [
                "/a".to_string(),
                "/b".to_string(),
                "-o".to_string(),
                path.to_string_lossy().into_owned(),
                "--llvm".to_string(),
                "-t".to_string(),
                "ade".to_string(),
            ]
        );
    }

    #[test]
    fn test_not_llvm_drops_flag() {
        let options = LcovOptions {
            not_llvm: true,
            ..Default::default()
        };
        let command = lcov_command(
            &CoverageConfig::default(),
            &options,
            &[PathBuf::from("/a")],
            std::path::Path::new("/a/lcov.info"),
        );
        assert!(!command.arg_strings().contains(&"--llvm".to_string()));
    }

    #[test]
    fn test_failure_propagates_exit_code() {
        let out = TempDir::new().unwrap();
        let runner = Recorder {
            exit_code: 9,
            ..Default::default()
        };
        let options = LcovOptions {
            bin_dirs: vec![out.path().to_path_buf()],
            ..Default::default()
        };
        let err = generate_lcov(&runner, &CoverageConfig::default(), &options).unwrap_err();
        assert_eq!(err.exit_code(), 9);
    }
}
