//! Document-id lists gating which documents are converted and where they land.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::config::ListPaths;
use crate::error::{NerconvError, Result};

/// Path-derived identifier of one corpus document, e.g. `data/english/annotations/bc/cctv/00/cctv_0001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Wraps an already-normalised id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One loaded document-id list.
#[derive(Debug, Clone, Default)]
pub struct IdList {
    ids: FxHashSet<DocumentId>,
}

impl IdList {
    /// Loads a list file holding one id per line; trailing whitespace is trimmed and blank lines
    /// are ignored.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let list_err = |source| NerconvError::ListFile {
            source,
            path: path.to_path_buf(),
        };
        let file = File::open(path).map_err(list_err)?;
        let mut ids = FxHashSet::default();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(list_err)?;
            let id = line.trim_end();
            if !id.is_empty() {
                ids.insert(DocumentId::new(id));
            }
        }
        Ok(Self { ids })
    }

    /// Returns `true` when `id` is listed.
    #[must_use]
    pub fn contains(&self, id: &DocumentId) -> bool {
        self.ids.contains(id)
    }

    /// Number of distinct ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` when the list holds no ids.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<DocumentId> for IdList {
    fn from_iter<I: IntoIterator<Item = DocumentId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// The four lists consulted during conversion; read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct AllowlistSet {
    /// Documents carrying name annotation.
    pub named: IdList,
    /// Train split.
    pub train: IdList,
    /// Development split.
    pub dev: IdList,
    /// Test split.
    pub test: IdList,
}

impl AllowlistSet {
    /// Loads all four lists, failing on the first missing file.
    pub fn load(paths: &ListPaths) -> Result<Self> {
        let named = IdList::load(&paths.named)?;
        info!("number of documents with name notation: {}", named.len());
        let train = IdList::load(&paths.train)?;
        info!("number of train documents: {}", train.len());
        let dev = IdList::load(&paths.dev)?;
        info!("number of development documents: {}", dev.len());
        let test = IdList::load(&paths.test)?;
        info!("number of test documents: {}", test.len());
        Ok(Self {
            named,
            train,
            dev,
            test,
        })
    }

    /// Returns `true` when the document carries name annotation and may be converted at all.
    #[must_use]
    pub fn is_named(&self, id: &DocumentId) -> bool {
        self.named.contains(id)
    }
}
