//! Coverage session controller
//!
//! A [`CoverageExecutor`] drives one coverage toolchain through the test-run
//! lifecycle. State lives in a [`CoverageSession`] owned by the caller and
//! passed into each phase, so the executor itself holds only configuration.
//!
//! ```no_run
//! use covgate::executor::{CoverageExecutor, GrcovExecutor};
//! use covgate::filter::SymbolFilter;
//! use covgate::session::CoverageSession;
//! use std::path::Path;
//!
//! let executor = GrcovExecutor::system(Default::default());
//! let mut session = CoverageSession::new();
//! executor.preprocess_binary(&mut session, Path::new("build/tests/unit_test"))?;
//! executor.start_coverage(&mut session, Path::new("build/lcov.info"))?;
//! // ... run the test binaries ...
//! executor.stop_coverage(session)?;
//!
//! let filter = SymbolFilter::from_globs(&["ns::Foo::*"], &[]);
//! let result = executor.extract_coverage_info(Path::new("build/tests/unit_test"), &filter)?;
//! println!("{}/{} lines", result.covered, result.total());
//! # Ok::<(), covgate::error::CoverageError>(())
//! ```

use std::path::Path;
use tracing::{debug, info};

use crate::aggregate::{aggregate, AggregateResult};
use crate::commands::lcov::{generate_lcov, LcovOptions};
use crate::config::CoverageConfig;
use crate::error::{CoverageError, Result};
use crate::filter::SymbolFilter;
use crate::process::{CommandRunner, SystemRunner};
use crate::report;
use crate::session::{CoverageSession, SessionPhase};
use crate::stager::{self, StagedArtifacts};

/// grcov output type with one JSON record per line
pub const ADE_OUTPUT_TYPE: &str = "ade";

/// Lifecycle operations every coverage toolchain provides
pub trait CoverageExecutor {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// File name used for the consolidated report when none is given
    fn default_file_name(&self) -> &str;

    /// Unit of the counts returned by extraction
    fn units(&self) -> &'static str;

    /// Whether binaries built by `compiler` carry counters this executor reads
    fn supports_compiler(&self, compiler: &str) -> bool;

    /// Register the directory of a binary about to run
    fn preprocess_binary(&self, session: &mut CoverageSession, binary: &Path) -> Result<()>;

    /// Record where the consolidated report should be written
    fn start_coverage(&self, session: &mut CoverageSession, coverage_file: &Path) -> Result<()>;

    /// Collate counters and write the consolidated report
    fn stop_coverage(&self, session: CoverageSession) -> Result<()>;

    /// Filtered covered/uncovered counts for a single binary
    fn extract_coverage_info(
        &self,
        binary: &Path,
        filter: &SymbolFilter,
    ) -> Result<AggregateResult>;
}

/// Clang/GCC counter files processed with grcov
#[derive(Debug, Clone)]
pub struct GrcovExecutor<R> {
    runner: R,
    config: CoverageConfig,
    verbose: bool,
}

impl GrcovExecutor<SystemRunner> {
    /// Executor running real processes, honoring the configured timeout
    pub fn system(config: CoverageConfig) -> Self {
        let runner = SystemRunner::with_timeout(config.timeout());
        Self::new(runner, config)
    }
}

impl<R: CommandRunner> GrcovExecutor<R> {
    pub fn new(runner: R, config: CoverageConfig) -> Self {
        Self {
            runner,
            config,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn config(&self) -> &CoverageConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }
}

impl<R: CommandRunner> CoverageExecutor for GrcovExecutor<R> {
    fn name(&self) -> &'static str {
        "ClangCodeCoverage"
    }

    fn description(&self) -> &'static str {
        "Extracts code coverage information using Clang tools."
    }

    fn default_file_name(&self) -> &str {
        &self.config.lcov_filename
    }

    fn units(&self) -> &'static str {
        "lines"
    }

    fn supports_compiler(&self, compiler: &str) -> bool {
        compiler == "CMake"
    }

    fn preprocess_binary(&self, session: &mut CoverageSession, binary: &Path) -> Result<()> {
        if session.register_binary(binary) {
            debug!(binary = %binary.display(), "registered binary directory");
        }
        Ok(())
    }

    fn start_coverage(&self, session: &mut CoverageSession, coverage_file: &Path) -> Result<()> {
        session.set_target(coverage_file);
        Ok(())
    }

    fn stop_coverage(&self, session: CoverageSession) -> Result<()> {
        if !session.has_binaries() {
            debug!("no binaries registered, nothing to collect");
            return Ok(());
        }

        let target = match (session.phase(), session.target()) {
            (SessionPhase::Started, Some(target)) => target,
            _ => {
                return Err(CoverageError::Usage(
                    "coverage must be started before it is stopped".to_string(),
                ))
            }
        };
        let output_dir = stager::binary_dir(target);
        let output_filename = target
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        if output_dir.is_dir() {
            let copied = stager::collate_data_files(&output_dir, &self.config.data_extension)?;
            info!(copied, dir = %output_dir.display(), "collated coverage data");
        }

        let options = LcovOptions {
            bin_dirs: session.dirs().map(Path::to_path_buf).collect(),
            output_dir: Some(output_dir),
            output_filename,
            verbose: self.verbose,
            ..Default::default()
        };
        generate_lcov(&self.runner, &self.config, &options)?;
        Ok(())
    }

    fn extract_coverage_info(
        &self,
        binary: &Path,
        filter: &SymbolFilter,
    ) -> Result<AggregateResult> {
        let pair = stager::locate_pair(binary, &self.config)?;
        let staged = StagedArtifacts::stage(&pair)?;

        let options = LcovOptions {
            bin_dirs: vec![staged.path().to_path_buf()],
            output_type: Some(ADE_OUTPUT_TYPE.to_string()),
            verbose: self.verbose,
            ..Default::default()
        };
        let report_path = generate_lcov(&self.runner, &self.config, &options)?;
        if !report_path.is_file() {
            return Err(CoverageError::MissingArtifact {
                kind: "intermediate report",
                path: report_path,
            });
        }

        let records = report::parse_file(&report_path)?;
        let result = aggregate(&records, filter);
        debug!(
            binary = %binary.display(),
            records = records.len(),
            covered = result.covered,
            not_covered = result.not_covered,
            "extracted coverage"
        );
        Ok(result)
    }
}
