//! Writes a [`SourceBundle`] to disk without ever overwriting an existing file.
//!
//! Every file is created with `create_new`, so an existing path is never truncated. Under
//! [`MaterializationPolicy::Merge`] a file that already exists with identical content is left
//! alone, and one with different content is kept while the new content goes to
//! `{stem}.conflict{N}.{ext}`.

use crate::SourceBundle;
use futures::future::join_all;
use srcfetch_common::{errors::FsPathError, fs as sfs};
use std::{
    ffi::OsString,
    fmt, io,
    path::{Path, PathBuf},
};
use tokio::{fs, io::AsyncWriteExt};

/// The highest conflict suffix tried before giving up.
pub const MAX_CONFLICT_SUFFIX: u32 = 1000;

/// How to treat a destination that already has content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaterializationPolicy {
    /// The destination must be absent or empty.
    #[default]
    Strict,
    /// Existing files are kept; identical files are skipped, different ones get a conflict
    /// variant next to them.
    Merge,
}

/// Errors returned by [`materialize`].
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    #[error("destination {0:?} is not empty; use --merge to write into it")]
    DestinationNotEmpty(PathBuf),
    #[error("too many conflicting variants of {0:?}")]
    TooManyConflicts(PathBuf),
    #[error("refusing to overwrite existing file {0:?}")]
    AlreadyExists(PathBuf),
    #[error("source path `{0}` does not name a file")]
    InvalidPath(String),
    #[error(transparent)]
    Fs(#[from] FsPathError),
}

/// What happened to a single file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file did not exist and was written.
    Written(PathBuf),
    /// The file existed with identical content and was left untouched.
    Unchanged(PathBuf),
    /// The file existed with different content; the new content was written next to it.
    Conflict {
        /// The existing file, unchanged.
        original: PathBuf,
        /// The conflict variant holding the new content.
        written: PathBuf,
    },
}

impl FileOutcome {
    /// Returns the path that holds the bundle's content for this file.
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(path) | Self::Unchanged(path) => path,
            Self::Conflict { written, .. } => written,
        }
    }
}

/// Per-file outcomes of a [`materialize`] run, in bundle order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    /// One outcome per bundle entry, `remappings.txt` last.
    pub outcomes: Vec<FileOutcome>,
}

impl MaterializeReport {
    /// Number of files newly created at their own path.
    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o, FileOutcome::Written(_))).count()
    }

    /// Number of files that already existed with identical content.
    pub fn unchanged(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o, FileOutcome::Unchanged(_))).count()
    }

    /// Returns `(original, written)` for every file whose content went to a conflict variant.
    pub fn conflicts(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.outcomes.iter().filter_map(|o| match o {
            FileOutcome::Conflict { original, written } => {
                Some((original.as_path(), written.as_path()))
            }
            _ => None,
        })
    }
}

impl fmt::Display for MaterializeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} written, {} unchanged, {} conflicting",
            self.written(),
            self.unchanged(),
            self.conflicts().count()
        )
    }
}

/// Writes every file of `bundle`, plus `remappings.txt` if it has remappings, below `root`.
///
/// All files are written concurrently. If any write fails, the first failure in bundle order is
/// returned once every write has finished; files written by the others stay on disk.
pub async fn materialize(
    bundle: &SourceBundle,
    root: &Path,
    policy: MaterializationPolicy,
) -> Result<MaterializeReport, MaterializeError> {
    if policy == MaterializationPolicy::Strict && !is_missing_or_empty_dir(root).await? {
        return Err(MaterializeError::DestinationNotEmpty(root.to_path_buf()));
    }

    let entries = bundle.entries();
    debug!(target: "srcfetch::materialize", root = %root.display(), files = entries.len(), ?policy, "writing bundle");

    let writes = entries.iter().map(|(path, content)| async move {
        let relative = sfs::sanitize_relative(path);
        if relative.as_os_str().is_empty() {
            return Err(MaterializeError::InvalidPath(path.to_string()));
        }
        write_file(root.join(relative), content.as_bytes(), policy).await
    });

    let outcomes = join_all(writes).await.into_iter().collect::<Result<Vec<_>, _>>()?;
    Ok(MaterializeReport { outcomes })
}

async fn write_file(
    target: PathBuf,
    contents: &[u8],
    policy: MaterializationPolicy,
) -> Result<FileOutcome, MaterializeError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).await.map_err(|err| FsPathError::create_dir(err, parent))?;
    }

    let mut suffix = 0;
    loop {
        let path = if suffix == 0 { target.clone() } else { conflict_path(&target, suffix) };
        match write_new(&path, contents).await {
            Ok(()) if suffix == 0 => {
                trace!(target: "srcfetch::materialize", path = %path.display(), "written");
                return Ok(FileOutcome::Written(path));
            }
            Ok(()) => {
                warn!(target: "srcfetch::materialize", original = %target.display(), written = %path.display(), "conflict");
                return Ok(FileOutcome::Conflict { original: target, written: path });
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                if policy == MaterializationPolicy::Strict {
                    return Err(MaterializeError::AlreadyExists(path));
                }
                if suffix == 0 && has_contents(&path, contents).await? {
                    trace!(target: "srcfetch::materialize", path = %path.display(), "unchanged");
                    return Ok(FileOutcome::Unchanged(path));
                }
            }
            Err(err) => return Err(FsPathError::write(err, path).into()),
        }

        suffix += 1;
        if suffix > MAX_CONFLICT_SUFFIX {
            return Err(MaterializeError::TooManyConflicts(target));
        }
    }
}

/// Returns `true` if `path` does not exist or has no entries. Hidden entries count.
async fn is_missing_or_empty_dir(path: &Path) -> Result<bool, FsPathError> {
    match fs::read_dir(path).await {
        Ok(mut entries) => {
            Ok(entries.next_entry().await.map_err(|err| FsPathError::read_dir(err, path))?.is_none())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(err) => Err(FsPathError::read_dir(err, path)),
    }
}

/// Creates `path` and writes `contents`, failing if `path` already exists.
async fn write_new(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = fs::OpenOptions::new().write(true).create_new(true).open(path).await?;
    file.write_all(contents).await?;
    file.flush().await
}

async fn has_contents(path: &Path, contents: &[u8]) -> Result<bool, FsPathError> {
    match fs::read(path).await {
        Ok(existing) => Ok(existing == contents),
        // a directory in the way is never identical
        Err(err) if err.kind() == io::ErrorKind::IsADirectory => Ok(false),
        Err(err) => Err(FsPathError::read(err, path)),
    }
}

/// Returns `path` with `.conflict{n}` inserted before its extension.
pub fn conflict_path(path: &Path, n: u32) -> PathBuf {
    let mut name = path.file_stem().map(OsString::from).unwrap_or_default();
    name.push(format!(".conflict{n}"));
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}
