//! CoNLL-2012 to IOB2 conversion: one document at a time, then the whole corpus.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::allowlist::AllowlistSet;
use crate::config::ConversionConfig;
use crate::corpus::{CorpusEntry, CorpusWalker};
use crate::error::{NerconvError, Result};
use crate::output::{route, OutputLine, Partition, PartitionWriters};
use crate::record::{decode_line, normalize_word, parse_line, Line, LineError};
use crate::report::{Diagnostics, DocumentStats};
use crate::span::{SpanAnomaly, SpanTagger};

/// Converts the lines of one annotation file, writing canonical IOB2 text to `out`.
///
/// The span state lives for the duration of this call only. Malformed lines and irregular
/// bracket notation are skipped and counted, or returned as [`NerconvError::MalformedLine`]
/// when `strict` is set. `path` only serves error messages.
pub fn convert_document<R: BufRead, W: Write>(
    mut reader: R,
    out: &mut W,
    strict: bool,
    path: Option<&Path>,
) -> Result<DocumentStats> {
    let mut tagger = SpanTagger::new();
    let mut stats = DocumentStats::default();
    let io_err = |err| NerconvError::io(err, path.map(Path::to_path_buf));
    let malformed = |line: usize, reason: String| NerconvError::MalformedLine {
        path: path.map(Path::to_path_buf),
        line,
        reason,
    };
    let span_anomaly = |anomaly: Option<SpanAnomaly>,
                        line: usize,
                        stats: &mut DocumentStats|
     -> Result<()> {
        let Some(anomaly) = anomaly else {
            return Ok(());
        };
        let err = malformed(line, anomaly.to_string());
        if strict {
            return Err(err);
        }
        warn!("{err}");
        stats.span_anomalies += 1;
        Ok(())
    };
    // A skipped line also ends whatever span was open.
    let skip_line = |line_err: LineError,
                     line: usize,
                     tagger: &mut SpanTagger,
                     stats: &mut DocumentStats|
     -> Result<()> {
        let err = malformed(line, line_err.to_string());
        if strict {
            return Err(err);
        }
        warn!("{err}");
        stats.malformed_lines += 1;
        span_anomaly(tagger.reset(), line, stats)
    };

    let mut buf = Vec::new();
    let mut line_no = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).map_err(io_err)? == 0 {
            break;
        }
        line_no += 1;
        let parsed = decode_line(&buf).and_then(parse_line);
        let emitted = match parsed {
            Ok(Line::SentenceBoundary) => {
                span_anomaly(tagger.reset(), line_no, &mut stats)?;
                stats.sentences += 1;
                OutputLine::SentenceBreak
            }
            Ok(Line::DocumentBegin(marker)) => {
                span_anomaly(tagger.reset(), line_no, &mut stats)?;
                stats.documents += 1;
                OutputLine::DocumentBegin(marker)
            }
            Ok(Line::DocumentEnd) => {
                span_anomaly(tagger.reset(), line_no, &mut stats)?;
                continue;
            }
            Ok(Line::Record(record)) => {
                let transition = tagger.step(record.tag);
                span_anomaly(transition.anomaly, line_no, &mut stats)?;
                stats.tokens += 1;
                OutputLine::Token {
                    word: normalize_word(record.word).into_owned(),
                    tag: transition.tag,
                }
            }
            Err(line_err) => {
                skip_line(line_err, line_no, &mut tagger, &mut stats)?;
                continue;
            }
        };
        emitted.write_to(out).map_err(io_err)?;
    }
    span_anomaly(tagger.reset(), line_no, &mut stats)?;
    Ok(stats)
}

/// A converted file held in memory until its partition writer takes it.
#[derive(Debug, Clone)]
pub struct ConvertedDocument {
    /// Rendered IOB2 text.
    pub text: Vec<u8>,
    /// Tallies for the file.
    pub stats: DocumentStats,
}

/// Reads and converts one corpus file.
pub fn convert_file(path: &Path, strict: bool) -> Result<ConvertedDocument> {
    let file = File::open(path).map_err(|err| NerconvError::io(err, Some(path.to_path_buf())))?;
    let mut text = Vec::new();
    let stats = convert_document(BufReader::new(file), &mut text, strict, Some(path))?;
    Ok(ConvertedDocument { text, stats })
}

/// Documents selected for conversion, with the counters of the selection pass.
#[derive(Debug, Clone, Default)]
pub struct ConversionPlan {
    /// Routed documents in walk order.
    pub documents: Vec<(CorpusEntry, Partition)>,
    /// Selection counters (files seen, skipped, path anomalies).
    pub diagnostics: Diagnostics,
}

impl ConversionPlan {
    /// Number of documents to convert.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` when nothing will be converted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// High-level façade running a corpus conversion.
#[derive(Debug, Clone)]
pub struct Converter {
    cfg: ConversionConfig,
}

impl Converter {
    /// Creates a converter for the supplied configuration.
    #[must_use]
    pub fn new(cfg: ConversionConfig) -> Self {
        Self { cfg }
    }

    /// Returns an immutable reference to the underlying configuration.
    #[must_use]
    pub fn config(&self) -> &ConversionConfig {
        &self.cfg
    }

    /// Loads the lists, converts the corpus and returns the run diagnostics.
    pub fn run(&self) -> Result<Diagnostics> {
        let lists = AllowlistSet::load(&self.cfg.lists)?;
        let plan = self.plan(&lists)?;
        self.execute(plan, |_| {})
    }

    /// Walks the corpus and routes every eligible file.
    pub fn plan(&self, lists: &AllowlistSet) -> Result<ConversionPlan> {
        self.cfg.validate()?;
        if !self.cfg.input.is_dir() {
            return Err(NerconvError::InvalidConfig(format!(
                "corpus root {} is not a directory",
                self.cfg.input.display()
            )));
        }
        let mut plan = ConversionPlan::default();
        let walker = CorpusWalker::new(&self.cfg.input, self.cfg.walk.clone());
        for entry in walker.walk() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.is_recoverable() => {
                    warn!("{err}");
                    plan.diagnostics.path_anomalies += 1;
                    continue;
                }
                Err(err) => return Err(err),
            };
            plan.diagnostics.files_seen += 1;
            if !lists.is_named(&entry.id) {
                plan.diagnostics.not_named += 1;
                continue;
            }
            match route(&entry, lists) {
                Some(partition) => plan.documents.push((entry, partition)),
                None => {
                    debug!("{} belongs to no partition", entry.id);
                    plan.diagnostics.unpartitioned += 1;
                }
            }
        }
        info!("{} total files to convert", plan.len());
        Ok(plan)
    }

    /// Converts the planned documents, calling `on_document` after each one is written.
    ///
    /// Batches of documents are converted in parallel and written in walk order, so the output
    /// matches a sequential run.
    pub fn execute<F>(&self, plan: ConversionPlan, mut on_document: F) -> Result<Diagnostics>
    where
        F: FnMut(&CorpusEntry),
    {
        let start = Instant::now();
        let ConversionPlan {
            documents,
            mut diagnostics,
        } = plan;
        let mut writers = PartitionWriters::create(&self.cfg.output, self.cfg.append)?;
        let total = documents.len();
        let mut done = 0usize;
        for batch in documents.chunks(self.cfg.batch_size) {
            let converted: Vec<Result<ConvertedDocument>> = batch
                .par_iter()
                .map(|(entry, _)| convert_file(&entry.path, self.cfg.strict))
                .collect();
            for ((entry, partition), document) in batch.iter().zip(converted) {
                let document = document?;
                writers.write(*partition, &document.text)?;
                diagnostics.record_document(*partition, &document.stats);
                debug!(
                    "{} -> {partition}: {} tokens",
                    entry.id, document.stats.tokens
                );
                on_document(entry);
            }
            done += batch.len();
            if self.cfg.show_progress {
                info!("converted {done}/{total} documents");
            }
        }
        writers.finish()?;
        diagnostics.elapsed = start.elapsed();
        info!(
            "conversion complete: files={} anomalies={} duration={:.2?}",
            diagnostics.files_converted,
            diagnostics.anomalies(),
            diagnostics.elapsed
        );
        Ok(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::{DocumentId, IdList};
    use std::fs;
    use tempfile::tempdir;

    fn row(word: &str, tag: &str) -> String {
        format!("nw/doc/00/doc_0001 0 0 {word} NNP (TOP*) - - - Speaker#1 {tag} * -")
    }

    fn convert(lines: &[String], strict: bool) -> Result<(String, DocumentStats)> {
        let input = lines.join("\n");
        let mut out = Vec::new();
        let stats = convert_document(input.as_bytes(), &mut out, strict, None)?;
        Ok((String::from_utf8(out).expect("utf8"), stats))
    }

    #[test]
    fn converts_single_and_multi_token_spans() {
        let lines = vec![
            row("Japan", "(GPE)"),
            String::new(),
            row("Paris", "(GPE"),
            row("is", "*"),
            row("beautiful", "*)"),
            String::new(),
        ];
        let (out, stats) = convert(&lines, false).expect("convert");
        assert_eq!(
            out,
            "Japan\tB-GPE\n\nParis\tB-GPE\nis\tI-GPE\nbeautiful\tI-GPE\n\n"
        );
        assert_eq!(stats.tokens, 4);
        assert_eq!(stats.sentences, 2);
        assert_eq!(stats.span_anomalies, 0);
    }

    #[test]
    fn document_markers_are_echoed_or_dropped() {
        let lines = vec![
            "#begin document (nw/doc/00/doc_0001); part 000".to_string(),
            row("/said", "*"),
            String::new(),
            "#end document".to_string(),
        ];
        let (out, stats) = convert(&lines, false).expect("convert");
        assert_eq!(
            out,
            "#begin document (nw/doc/00/doc_0001); part 000\n\nsaid\tO\n\n"
        );
        assert_eq!(stats.documents, 1);
    }

    #[test]
    fn sentence_boundary_closes_dangling_span() {
        let lines = vec![
            row("New", "(GPE*"),
            String::new(),
            row("York", "*"),
        ];
        let (out, stats) = convert(&lines, false).expect("convert");
        assert_eq!(out, "New\tB-GPE\n\nYork\tO\n");
        assert_eq!(stats.span_anomalies, 1);
    }

    #[test]
    fn document_end_closes_dangling_span() {
        let lines = vec![
            row("New", "(GPE*"),
            "#end document".to_string(),
            row("York", "*"),
        ];
        let (out, stats) = convert(&lines, false).expect("convert");
        assert_eq!(out, "New\tB-GPE\nYork\tO\n");
        assert_eq!(stats.span_anomalies, 1);
    }

    #[test]
    fn close_without_open_is_counted() {
        let lines = vec![row("stray", "*)"), row("next", "*")];
        let (out, stats) = convert(&lines, false).expect("convert");
        assert_eq!(out, "stray\tO\nnext\tO\n");
        assert_eq!(stats.span_anomalies, 1);
    }

    #[test]
    fn short_line_is_skipped_and_resets_state() {
        let lines = vec![
            row("United", "(ORG*"),
            "nw/doc 0 1 broken".to_string(),
            row("Nations", "*"),
        ];
        let (out, stats) = convert(&lines, false).expect("convert");
        assert_eq!(out, "United\tB-ORG\nNations\tO\n");
        assert_eq!(stats.malformed_lines, 1);
        assert_eq!(stats.span_anomalies, 1);
        assert_eq!(stats.tokens, 2);
    }

    #[test]
    fn undecodable_line_is_skipped_not_fatal() {
        let mut input = row("Japan", "(GPE)").into_bytes();
        input.push(b'\n');
        let mut latin1 = row("cafX", "*").into_bytes();
        let marker = latin1.iter().position(|&b| b == b'X').expect("marker byte");
        latin1[marker] = 0xE9;
        input.extend_from_slice(&latin1);
        input.push(b'\n');
        input.extend_from_slice(row("Paris", "(GPE)").as_bytes());
        let mut out = Vec::new();
        let stats = convert_document(input.as_slice(), &mut out, false, None).expect("lenient");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "Japan\tB-GPE\nParis\tB-GPE\n"
        );
        assert_eq!(stats.malformed_lines, 1);
        assert_eq!(stats.tokens, 2);

        let mut out = Vec::new();
        let err = convert_document(input.as_slice(), &mut out, true, None).expect_err("strict");
        assert!(matches!(err, NerconvError::MalformedLine { line: 2, .. }));
    }

    #[test]
    fn strict_mode_rejects_anomalies() {
        let err = convert(&[row("stray", "*)")], true).expect_err("strict");
        assert!(matches!(err, NerconvError::MalformedLine { line: 1, .. }));
        let err = convert(&["too short".to_string()], true).expect_err("strict");
        assert!(matches!(err, NerconvError::MalformedLine { .. }));
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
        fs::write(path, "").expect("write file");
    }

    fn named_in_train(doc: &str) -> AllowlistSet {
        let list = || -> IdList { std::iter::once(DocumentId::new(doc)).collect() };
        AllowlistSet {
            named: list(),
            train: list(),
            ..AllowlistSet::default()
        }
    }

    fn plan_for(root: &Path, lists: &AllowlistSet) -> ConversionPlan {
        let cfg = ConversionConfig::builder()
            .input(root)
            .output(root.join("iob2"))
            .build()
            .expect("valid config");
        Converter::new(cfg).plan(lists).expect("plan")
    }

    #[test]
    fn plan_routes_documents_when_rooted_at_a_split() {
        let dir = tempdir().expect("tempdir");
        let split = dir.path().join("conll-2012/v4/data/train");
        touch(&split.join("data/english/annotations/nw/d1.gold_conll"));
        let plan = plan_for(&split, &named_in_train("data/english/annotations/nw/d1"));
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.documents[0].1, Partition::Train);
        assert_eq!(plan.diagnostics.unpartitioned, 0);
    }

    #[test]
    fn plan_counts_files_without_anchor() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path().join("corpus");
        touch(&root.join("train/data/english/annotations/nw/d1.gold_conll"));
        touch(&root.join("train/english/stray.gold_conll"));
        let plan = plan_for(&root, &named_in_train("data/english/annotations/nw/d1"));
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.diagnostics.files_seen, 1);
        assert_eq!(plan.diagnostics.path_anomalies, 1);
        assert_eq!(plan.diagnostics.anomalies(), 1);
    }
}
