//! Counter file discovery and isolation
//!
//! grcov parses every counter file in the directories it is given, so a
//! single-binary query copies that binary's gcno/gcda pair into a private
//! scratch directory first. The scratch directory is a [`TempDir`]: dropping
//! [`StagedArtifacts`] removes it on every exit path, including `?` unwinds.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::config::CoverageConfig;
use crate::error::{CoverageError, Result};

/// Definition (notes) and data counter files for one binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArtifactPair {
    pub definition: PathBuf,
    pub data: PathBuf,
}

/// Directory holding `binary`, treating a bare file name as the current dir
pub fn binary_dir(binary: &Path) -> PathBuf {
    match binary.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Find a file next to `binary` whose stem starts with the binary's stem and
/// whose extension is `extension`
///
/// Entries are scanned in name order so the pick is stable when several
/// files qualify.
pub fn locate_artifact(binary: &Path, extension: &str) -> Result<Option<PathBuf>> {
    let dir = binary_dir(binary);
    let prefix = match binary.file_stem() {
        Some(stem) => stem.to_string_lossy().into_owned(),
        None => return Ok(None),
    };

    let listing = match fs::read_dir(&dir) {
        Ok(listing) => listing,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut entries = listing
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    Ok(entries.into_iter().find(|path| {
        path.is_file()
            && path.extension().is_some_and(|ext| ext == extension)
            && path
                .file_stem()
                .is_some_and(|stem| stem.to_string_lossy().starts_with(&prefix))
    }))
}

/// Locate both counter files for `binary`; either one missing is fatal
pub fn locate_pair(binary: &Path, config: &CoverageConfig) -> Result<RawArtifactPair> {
    let find = |extension: &str, kind: &'static str| -> Result<PathBuf> {
        locate_artifact(binary, extension)?.ok_or_else(|| CoverageError::MissingArtifact {
            kind,
            path: binary_dir(binary).join(expected_name(binary, extension)),
        })
    };

    Ok(RawArtifactPair {
        definition: find(&config.definition_extension, "definition file")?,
        data: find(&config.data_extension, "data file")?,
    })
}

fn expected_name(binary: &Path, extension: &str) -> String {
    let stem = binary
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}*.{extension}")
}

/// A binary's counter files copied into an isolated scratch directory
#[derive(Debug)]
pub struct StagedArtifacts {
    dir: TempDir,
    pair: RawArtifactPair,
}

impl StagedArtifacts {
    /// Copy `pair` into a fresh scratch directory
    pub fn stage(pair: &RawArtifactPair) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("covgate-").tempdir()?;
        let staged = RawArtifactPair {
            definition: copy_into(&pair.definition, dir.path())?,
            data: copy_into(&pair.data, dir.path())?,
        };
        debug!(scratch = %dir.path().display(), "staged counter files");
        Ok(Self { dir, pair: staged })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The staged copies
    pub fn pair(&self) -> &RawArtifactPair {
        &self.pair
    }
}

fn copy_into(source: &Path, dir: &Path) -> Result<PathBuf> {
    let name = source.file_name().ok_or_else(|| CoverageError::MissingArtifact {
        kind: "counter file",
        path: source.to_path_buf(),
    })?;
    let dest = dir.join(name);
    fs::copy(source, &dest)?;
    Ok(dest)
}

/// Gather every data file found below `output_dir` into `output_dir` itself
///
/// Files already in place are skipped and an existing destination is never
/// overwritten. Returns the number of files copied.
pub fn collate_data_files(output_dir: &Path, data_extension: &str) -> Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(output_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| match e.into_io_error() {
            Some(io) => CoverageError::Io(io),
            None => CoverageError::Io(std::io::Error::other("filesystem loop during collation")),
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || !path.extension().is_some_and(|e| e == data_extension) {
            continue;
        }

        let Some(name) = path.file_name() else {
            continue;
        };
        let dest = output_dir.join(name);
        if dest == path {
            continue;
        }
        if dest.exists() {
            trace!(source = %path.display(), "destination exists, not overwriting");
            continue;
        }

        fs::copy(path, &dest)?;
        debug!(source = %path.display(), dest = %dest.display(), "collated data file");
        copied += 1;
    }

    Ok(copied)
}
