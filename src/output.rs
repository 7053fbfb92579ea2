//! Routing of converted documents to the train/dev/test partition files.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::allowlist::{AllowlistSet, IdList};
use crate::corpus::CorpusEntry;
use crate::error::{NerconvError, Result};
use crate::span::Iob2Tag;

/// One of the three output splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    /// Training split.
    Train,
    /// Development split.
    Dev,
    /// Test split.
    Test,
}

impl Partition {
    /// All partitions in routing priority order.
    pub const ALL: [Partition; 3] = [Partition::Train, Partition::Dev, Partition::Test];

    /// Output file name.
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Train => "eng.train",
            Self::Dev => "eng.dev",
            Self::Test => "eng.test",
        }
    }

    /// Directory that must contain a document for it to land in this partition.
    #[must_use]
    pub fn subtree(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Dev => "development",
            Self::Test => "conll-2012-test",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Train => 0,
            Self::Dev => 1,
            Self::Test => 2,
        }
    }

    fn ids(self, lists: &AllowlistSet) -> &IdList {
        match self {
            Self::Train => &lists.train,
            Self::Dev => &lists.dev,
            Self::Test => &lists.test,
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Train => "train",
            Self::Dev => "dev",
            Self::Test => "test",
        })
    }
}

/// Selects the partition of a named document, or `None` when it belongs to no split.
///
/// A document qualifies for a partition when it sits under that partition's subtree and its id
/// is in the partition's list. Documents absent from the `named` list never route.
#[must_use]
pub fn route(entry: &CorpusEntry, lists: &AllowlistSet) -> Option<Partition> {
    if !lists.is_named(&entry.id) {
        return None;
    }
    Partition::ALL.into_iter().find(|partition| {
        entry.in_subtree(partition.subtree()) && partition.ids(lists).contains(&entry.id)
    })
}

/// One line of canonical IOB2 output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    /// `word<TAB>tag`.
    Token {
        /// Normalised word.
        word: String,
        /// IOB2 label.
        tag: Iob2Tag,
    },
    /// Blank line closing a sentence.
    SentenceBreak,
    /// Document-begin marker followed by a blank line.
    DocumentBegin(String),
}

impl OutputLine {
    /// Writes the line in the canonical text form.
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        match self {
            Self::Token { word, tag } => writeln!(out, "{word}\t{tag}"),
            Self::SentenceBreak => writeln!(out),
            Self::DocumentBegin(marker) => write!(out, "{marker}\n\n"),
        }
    }
}

/// The three partition files, opened once for the lifetime of a run.
///
/// Holding a `PartitionWriters` means exclusive ownership of the output files.
#[derive(Debug)]
pub struct PartitionWriters {
    dir: PathBuf,
    writers: [BufWriter<File>; 3],
}

impl PartitionWriters {
    /// Creates `dir` if needed and opens `eng.train`, `eng.dev` and `eng.test` inside it.
    ///
    /// Existing files are truncated unless `append` is set.
    pub fn create(dir: &Path, append: bool) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|err| NerconvError::io(err, Some(dir.to_path_buf())))?;
        let open = |partition: Partition| -> Result<BufWriter<File>> {
            let path = dir.join(partition.file_name());
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .append(append)
                .truncate(!append)
                .open(&path)
                .map_err(|err| NerconvError::io(err, Some(path)))?;
            Ok(BufWriter::new(file))
        };
        Ok(Self {
            dir: dir.to_path_buf(),
            writers: [
                open(Partition::Train)?,
                open(Partition::Dev)?,
                open(Partition::Test)?,
            ],
        })
    }

    /// Appends already-rendered document text to a partition.
    pub fn write(&mut self, partition: Partition, text: &[u8]) -> Result<()> {
        let path = self.dir.join(partition.file_name());
        self.writers[partition.index()]
            .write_all(text)
            .map_err(|err| NerconvError::io(err, Some(path)))
    }

    /// Flushes all partitions.
    pub fn finish(mut self) -> Result<()> {
        for partition in Partition::ALL {
            let path = self.dir.join(partition.file_name());
            self.writers[partition.index()]
                .flush()
                .map_err(|err| NerconvError::io(err, Some(path)))?;
        }
        Ok(())
    }
}
