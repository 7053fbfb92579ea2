//! Facilities for discovering annotation files and deriving their document ids.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use log::warn;
use walkdir::WalkDir;

use crate::allowlist::DocumentId;
use crate::config::WalkConfig;
use crate::error::{NerconvError, Result};

/// One eligible annotation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    /// Location on disk.
    pub path: PathBuf,
    /// Location relative to the walk root.
    pub relative: PathBuf,
    /// Id derived from the path.
    pub id: DocumentId,
}

impl CorpusEntry {
    /// Returns `true` when a directory named `segment` appears anywhere above the file.
    ///
    /// The full path is inspected, as for the id anchor, so a walk rooted inside a split
    /// directory such as `data/train` still sees that split.
    #[must_use]
    pub fn in_subtree(&self, segment: &str) -> bool {
        has_segment(&self.path, segment)
    }
}

/// Recursive, restartable enumeration of the annotation files under a corpus root.
///
/// Entries are sorted by file name within each directory so repeated walks over an unchanged
/// tree yield the same sequence.
#[derive(Debug, Clone)]
pub struct CorpusWalker {
    root: PathBuf,
    cfg: WalkConfig,
}

impl CorpusWalker {
    /// Creates a walker rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, cfg: WalkConfig) -> Self {
        Self {
            root: root.into(),
            cfg,
        }
    }

    /// Lazily yields eligible files paired with their document id.
    ///
    /// The root is resolved to an absolute path first when it exists. Files whose path lacks the
    /// configured anchor are yielded as [`NerconvError::PathDerivation`] so callers can count
    /// them and continue.
    pub fn walk(&self) -> impl Iterator<Item = Result<CorpusEntry>> + '_ {
        let root = self
            .root
            .canonicalize()
            .unwrap_or_else(|_| self.root.clone());
        WalkDir::new(&root)
            .follow_links(self.cfg.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => return Some(Err(NerconvError::from(err))),
                };
                if !entry.file_type().is_file() {
                    return None;
                }
                let path = entry.path();
                let relative = path.strip_prefix(&root).unwrap_or(path);
                if !is_eligible(relative, &self.cfg) {
                    return None;
                }
                Some(derive_document_id(path, &self.cfg).map(|id| CorpusEntry {
                    path: path.to_path_buf(),
                    relative: relative.to_path_buf(),
                    id,
                }))
            })
    }
}

fn has_segment(path: &Path, segment: &str) -> bool {
    path.parent().map_or(false, |parent| {
        parent
            .components()
            .any(|component| matches!(component, Component::Normal(name) if name == segment))
    })
}

fn strip_extension<'n>(file_name: &'n str, extension: &str) -> Option<&'n str> {
    file_name
        .strip_suffix(extension)
        .and_then(|rest| rest.strip_suffix('.'))
        .filter(|stem| !stem.is_empty())
}

/// Decides whether a file (path relative to the corpus root) takes part in conversion.
#[must_use]
pub fn is_eligible(relative: &Path, cfg: &WalkConfig) -> bool {
    let Some(name) = relative.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    if strip_extension(name, &cfg.extension).is_none() {
        return false;
    }
    if !cfg.language_segment.is_empty() && !has_segment(relative, &cfg.language_segment) {
        return false;
    }
    !cfg
        .excluded_segments
        .iter()
        .any(|segment| has_segment(relative, segment))
}

/// Derives the document id: everything from the anchor onwards plus the file stem.
pub fn derive_document_id(path: &Path, cfg: &WalkConfig) -> Result<DocumentId> {
    let derivation_err = || NerconvError::PathDerivation {
        path: path.to_path_buf(),
        anchor: cfg.anchor.clone(),
    };
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(derivation_err)?;
    let stem = strip_extension(name, &cfg.extension).unwrap_or(name);
    let parent = path
        .parent()
        .map(|parent| parent.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();
    let directory = format!("{}/", parent.trim_end_matches('/'));
    let start = directory.find(&cfg.anchor).ok_or_else(derivation_err)?;
    Ok(DocumentId::new(format!("{}{stem}", &directory[start..])))
}

/// Result of listing the document ids present in a corpus tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentListing {
    /// Ids in walk order.
    pub ids: Vec<DocumentId>,
    /// Files skipped because their path lacked the anchor.
    pub anomalies: usize,
}

/// Collects the ids of every file matching `cfg` under `root`.
pub fn list_document_ids(root: &Path, cfg: &WalkConfig) -> Result<DocumentListing> {
    if !root.is_dir() {
        return Err(NerconvError::InvalidConfig(format!(
            "corpus root {root:?} is not a directory"
        )));
    }
    let mut listing = DocumentListing::default();
    for entry in CorpusWalker::new(root, cfg.clone()).walk() {
        match entry {
            Ok(entry) => listing.ids.push(entry.id),
            Err(err) if err.is_recoverable() => {
                warn!("{err}");
                listing.anomalies += 1;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(listing)
}

/// Writes one id per line to `path`.
pub fn write_id_list(path: &Path, ids: &[DocumentId]) -> Result<()> {
    let io_err = |err| NerconvError::io(err, Some(path.to_path_buf()));
    let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
    for id in ids {
        writeln!(out, "{id}").map_err(io_err)?;
    }
    out.flush().map_err(io_err)
}
