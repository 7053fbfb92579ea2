//! Counters describing a conversion run.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::output::Partition;

/// Tokens, sentences and documents written to one partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PartitionCounts {
    /// Documents written.
    pub documents: usize,
    /// Sentence breaks written.
    pub sentences: usize,
    /// Token lines written.
    pub tokens: usize,
}

impl PartitionCounts {
    fn merge(&mut self, other: &Self) {
        self.documents += other.documents;
        self.sentences += other.sentences;
        self.tokens += other.tokens;
    }
}

/// Per-document tallies produced by converting one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocumentStats {
    /// Document-begin markers seen.
    pub documents: usize,
    /// Sentence breaks written.
    pub sentences: usize,
    /// Token lines written.
    pub tokens: usize,
    /// Lines skipped for a wrong column count.
    pub malformed_lines: usize,
    /// Irregular bracket notation (close without open, nesting, unclosed spans).
    pub span_anomalies: usize,
}

/// Diagnostics accumulated across a whole corpus conversion.
///
/// Each document produces its own [`DocumentStats`] which the single writer folds in, so no
/// counter is shared between conversion threads.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Eligible files discovered by the walker.
    pub files_seen: usize,
    /// Files written to a partition.
    pub files_converted: usize,
    /// Files skipped because their id is not in the named list.
    pub not_named: usize,
    /// Named files that belong to no partition.
    pub unpartitioned: usize,
    /// Files whose path lacked the id anchor.
    pub path_anomalies: usize,
    /// Lines skipped for a wrong column count.
    pub malformed_lines: usize,
    /// Irregular bracket notation.
    pub span_anomalies: usize,
    /// Output counts for the train partition.
    pub train: PartitionCounts,
    /// Output counts for the dev partition.
    pub dev: PartitionCounts,
    /// Output counts for the test partition.
    pub test: PartitionCounts,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl Diagnostics {
    /// Folds the stats of one converted document into the totals.
    pub fn record_document(&mut self, partition: Partition, stats: &DocumentStats) {
        self.files_converted += 1;
        self.malformed_lines += stats.malformed_lines;
        self.span_anomalies += stats.span_anomalies;
        self.partition_mut(partition).merge(&PartitionCounts {
            documents: stats.documents,
            sentences: stats.sentences,
            tokens: stats.tokens,
        });
    }

    /// Output counts for `partition`.
    #[must_use]
    pub fn partition(&self, partition: Partition) -> &PartitionCounts {
        match partition {
            Partition::Train => &self.train,
            Partition::Dev => &self.dev,
            Partition::Test => &self.test,
        }
    }

    fn partition_mut(&mut self, partition: Partition) -> &mut PartitionCounts {
        match partition {
            Partition::Train => &mut self.train,
            Partition::Dev => &mut self.dev,
            Partition::Test => &mut self.test,
        }
    }

    /// Sum of every anomaly counter.
    #[must_use]
    pub fn anomalies(&self) -> usize {
        self.path_anomalies + self.malformed_lines + self.span_anomalies
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "files converted {} of {} | not named {} | no partition {}",
            self.files_converted, self.files_seen, self.not_named, self.unpartitioned
        )?;
        for partition in Partition::ALL {
            let counts = self.partition(partition);
            writeln!(
                f,
                "{partition:<5}: {} documents, {} sentences, {} tokens",
                counts.documents, counts.sentences, counts.tokens
            )?;
        }
        write!(
            f,
            "anomalies: {} path, {} malformed lines, {} span | duration {:.2?}",
            self.path_anomalies, self.malformed_lines, self.span_anomalies, self.elapsed
        )
    }
}
