//! Assembles the output tree from source directories.
//!
//! A merge plan is an ordered list of sources. The first one may wipe the
//! output root; every later one copies a tree into it, overwriting whatever an
//! earlier source put at the same relative path.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid merge plan: {0}")]
    InvalidPlan(&'static str),
}

impl MergeError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        MergeError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeMode {
    /// Delete the output root if present and recreate it empty
    ReplaceRoot,
    /// Copy the source tree to `dest`, relative to the output root
    CopyTree { dest: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSource {
    pub source: PathBuf,
    pub mode: MergeMode,
}

impl MergeSource {
    pub fn replace_root() -> Self {
        Self {
            source: PathBuf::new(),
            mode: MergeMode::ReplaceRoot,
        }
    }

    pub fn copy_tree<S: AsRef<Path>, D: AsRef<Path>>(source: S, dest: D) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            mode: MergeMode::CopyTree {
                dest: dest.as_ref().to_path_buf(),
            },
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub files: usize,
    pub dirs: usize,
}

impl std::ops::AddAssign for MergeStats {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.dirs += other.dirs;
    }
}

pub fn merge_into<P: AsRef<Path>>(
    output_root: P,
    sources: &[MergeSource],
) -> Result<MergeStats, MergeError> {
    let output_root = output_root.as_ref();

    let replace_count = sources
        .iter()
        .filter(|s| s.mode == MergeMode::ReplaceRoot)
        .count();
    if replace_count > 1 {
        return Err(MergeError::InvalidPlan("root can only be replaced once"));
    }
    if replace_count == 1 && sources[0].mode != MergeMode::ReplaceRoot {
        return Err(MergeError::InvalidPlan("root replacement must come first"));
    }

    let mut stats = MergeStats::default();
    for source in sources {
        match &source.mode {
            MergeMode::ReplaceRoot => replace_root(output_root)?,
            MergeMode::CopyTree { dest } => {
                stats += copy_tree(&source.source, &output_root.join(dest))?;
            }
        }
    }

    Ok(stats)
}

pub fn replace_root<P: AsRef<Path>>(root: P) -> Result<(), MergeError> {
    let root = root.as_ref();
    if root.exists() {
        fs::remove_dir_all(root).map_err(|e| MergeError::io(root, e))?;
    }
    fs::create_dir_all(root).map_err(|e| MergeError::io(root, e))?;

    Ok(())
}

/// Recursively copies `src` into `dst`, following symlinks.
pub fn copy_tree<S: AsRef<Path>, D: AsRef<Path>>(src: S, dst: D) -> Result<MergeStats, MergeError> {
    let src = src.as_ref();
    let dst = dst.as_ref();
    let mut stats = MergeStats::default();

    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            MergeError::Io {
                path,
                source: e.into(),
            }
        })?;

        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| MergeError::InvalidPlan("walked outside of the source tree"))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| MergeError::io(&target, e))?;
            stats.dirs += 1;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| MergeError::io(parent, e))?;
            }
            fs::copy(entry.path(), &target).map_err(|e| MergeError::io(entry.path(), e))?;
            debug!(target: "merge", "{} -> {}", entry.path().display(), target.display());
            stats.files += 1;
        }
    }

    Ok(stats)
}
