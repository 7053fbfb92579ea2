//! Configuration builders controlling corpus discovery and conversion.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NerconvError, Result};

/// File name of the list of documents carrying name annotation.
pub const NAMES_LIST: &str = "names.list";
/// File name of the canonical train split document ids.
pub const TRAIN_IDS: &str = "english-ontonotes-5.0-train-document-ids.txt";
/// File name of the canonical development split document ids.
pub const DEV_IDS: &str = "english-ontonotes-5.0-development-document-ids.txt";
/// File name of the canonical CoNLL-2012 test split document ids.
pub const TEST_IDS: &str = "english-ontonotes-5.0-conll-2012-test-document-ids.txt";

/// Locations of the four document-id lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListPaths {
    /// Documents with name annotation; gates eligibility.
    pub named: PathBuf,
    /// Train split membership.
    pub train: PathBuf,
    /// Development split membership.
    pub dev: PathBuf,
    /// Test split membership.
    pub test: PathBuf,
}

impl ListPaths {
    /// Resolves the canonical list file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            named: dir.join(NAMES_LIST),
            train: dir.join(TRAIN_IDS),
            dev: dir.join(DEV_IDS),
            test: dir.join(TEST_IDS),
        }
    }
}

impl Default for ListPaths {
    fn default() -> Self {
        Self::in_dir(Path::new("data").join("sequenceLabelling").join("CoNLL-2012-NER"))
    }
}

/// Rules deciding which files of a corpus tree are converted and how their ids are derived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalkConfig {
    /// Substring locating the start of the document id inside a path.
    pub anchor: String,
    /// Extension (without the dot) of the annotation files to convert.
    pub extension: String,
    /// Directory name that must appear among a file's ancestors.
    pub language_segment: String,
    /// Directory names that disqualify a file when present among its ancestors.
    pub excluded_segments: Vec<String>,
    /// Follows symlinks encountered during traversal.
    pub follow_symlinks: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            anchor: "data/english/".into(),
            extension: "gold_conll".into(),
            language_segment: "english".into(),
            excluded_segments: vec!["pt".into(), "test".into()],
            follow_symlinks: false,
        }
    }
}

impl WalkConfig {
    /// Walk rules for discovering `.name` files when building the named-document list.
    #[must_use]
    pub fn names_listing() -> Self {
        Self {
            extension: "name".into(),
            language_segment: String::new(),
            excluded_segments: Vec::new(),
            ..Self::default()
        }
    }
}

/// Configuration for converting a CoNLL-2012 corpus tree into IOB2 partitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversionConfig {
    /// Root of the corpus tree.
    pub input: PathBuf,
    /// Directory receiving `eng.train`, `eng.dev` and `eng.test`.
    pub output: PathBuf,
    /// Document-id list locations.
    pub lists: ListPaths,
    /// File discovery rules.
    pub walk: WalkConfig,
    /// Turns counted anomalies into fatal errors.
    pub strict: bool,
    /// Appends to existing partition files instead of truncating them.
    pub append: bool,
    /// Number of documents converted in parallel before their output is flushed.
    pub batch_size: usize,
    /// Enables progress reporting through the `log` facade.
    pub show_progress: bool,
}

impl ConversionConfig {
    /// Returns a builder initialised with [`ConversionConfig::default`].
    #[must_use]
    pub fn builder() -> ConversionBuilder {
        ConversionBuilder::default()
    }

    /// Validates the invariants required before any file is touched.
    pub fn validate(&self) -> Result<()> {
        if self.input.as_os_str().is_empty() {
            return Err(NerconvError::InvalidConfig(
                "input path must not be empty".into(),
            ));
        }
        if self.output.as_os_str().is_empty() {
            return Err(NerconvError::InvalidConfig(
                "output path must not be empty".into(),
            ));
        }
        if same_location(&self.input, &self.output) {
            return Err(NerconvError::InvalidConfig(format!(
                "input and output path must be different: {}",
                self.input.display()
            )));
        }
        if self.walk.anchor.is_empty() {
            return Err(NerconvError::InvalidConfig(
                "path anchor must not be empty".into(),
            ));
        }
        if self.walk.extension.is_empty() {
            return Err(NerconvError::InvalidConfig(
                "data file extension must not be empty".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(NerconvError::InvalidConfig(
                "batch_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::new(),
            lists: ListPaths::default(),
            walk: WalkConfig::default(),
            strict: false,
            append: false,
            batch_size: 64,
            show_progress: true,
        }
    }
}

/// Compares two paths, resolving them on disk when both exist.
pub(crate) fn same_location(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug, Default, Clone)]
pub struct ConversionBuilder {
    cfg: ConversionConfig,
}

impl ConversionBuilder {
    /// Creates a builder with [`ConversionConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the corpus root.
    #[must_use]
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.cfg.input = path.into();
        self
    }

    /// Sets the output directory.
    #[must_use]
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.cfg.output = path.into();
        self
    }

    /// Overrides all four list locations.
    #[must_use]
    pub fn lists(mut self, lists: ListPaths) -> Self {
        self.cfg.lists = lists;
        self
    }

    /// Overrides the file discovery rules.
    #[must_use]
    pub fn walk(mut self, walk: WalkConfig) -> Self {
        self.cfg.walk = walk;
        self
    }

    /// Enables or disables strict validation.
    #[must_use]
    pub fn strict(mut self, enabled: bool) -> Self {
        self.cfg.strict = enabled;
        self
    }

    /// Enables or disables appending to existing partition files.
    #[must_use]
    pub fn append(mut self, enabled: bool) -> Self {
        self.cfg.append = enabled;
        self
    }

    /// Sets how many documents are converted in parallel per batch.
    #[must_use]
    pub fn batch_size(mut self, size: usize) -> Self {
        self.cfg.batch_size = size;
        self
    }

    /// Enables or disables follow-symlinks during traversal.
    #[must_use]
    pub fn follow_symlinks(mut self, enabled: bool) -> Self {
        self.cfg.walk.follow_symlinks = enabled;
        self
    }

    /// Enables or disables progress logging.
    #[must_use]
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.cfg.show_progress = enabled;
        self
    }

    /// Finalises the builder, returning a validated [`ConversionConfig`].
    pub fn build(self) -> Result<ConversionConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}
