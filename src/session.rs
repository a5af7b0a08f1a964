//! State carried across Preprocess → Start → Stop for one test run

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::stager::binary_dir;

/// Where a session is in its lifecycle
///
/// There is no `Stopped` phase: stopping consumes the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Preprocessing,
    Started,
}

/// Binary directories and the consolidated output target for one test run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageSession {
    dirs: BTreeSet<PathBuf>,
    target: Option<PathBuf>,
    phase: SessionPhase,
}

impl CoverageSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the directory containing `binary`; returns false if it was
    /// already registered
    pub fn register_binary(&mut self, binary: &Path) -> bool {
        if self.phase == SessionPhase::Idle {
            self.phase = SessionPhase::Preprocessing;
        }
        self.dirs.insert(binary_dir(binary))
    }

    /// Set the consolidated report path; a later call replaces an earlier one
    pub fn set_target(&mut self, coverage_file: &Path) {
        self.target = Some(coverage_file.to_path_buf());
        self.phase = SessionPhase::Started;
    }

    pub fn dirs(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }

    pub fn dir_count(&self) -> usize {
        self.dirs.len()
    }

    pub fn has_binaries(&self) -> bool {
        !self.dirs.is_empty()
    }

    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let mut once = CoverageSession::new();
        once.register_binary(Path::new("/build/tests/a"));

        let mut twice = CoverageSession::new();
        assert!(twice.register_binary(Path::new("/build/tests/a")));
        assert!(!twice.register_binary(Path::new("/build/tests/a")));

        assert_eq!(once, twice);
        assert_eq!(twice.dir_count(), 1);
    }

    #[test]
    fn test_binaries_in_same_dir_share_entry() {
        let mut session = CoverageSession::new();
        session.register_binary(Path::new("/build/tests/a"));
        session.register_binary(Path::new("/build/tests/b"));
        session.register_binary(Path::new("/build/other/c"));

        let dirs: Vec<_> = session.dirs().collect();
        assert_eq!(dirs, [Path::new("/build/other"), Path::new("/build/tests")]);
    }

    #[test]
    fn test_phases() {
        let mut session = CoverageSession::new();
        assert_eq!(session.phase(), SessionPhase::Idle);
        session.register_binary(Path::new("/b/a"));
        assert_eq!(session.phase(), SessionPhase::Preprocessing);
        session.set_target(Path::new("/out/lcov.info"));
        assert_eq!(session.phase(), SessionPhase::Started);
        // Late registrations do not rewind the phase
        session.register_binary(Path::new("/b/c"));
        assert_eq!(session.phase(), SessionPhase::Started);
    }

    #[test]
    fn test_last_target_wins() {
        let mut session = CoverageSession::new();
        session.set_target(Path::new("/first/lcov.info"));
        session.set_target(Path::new("/second/lcov.info"));
        assert_eq!(session.target(), Some(Path::new("/second/lcov.info")));
    }
}
