//! Upgrade of the legacy CoNLL-2003 chunk corpus from IOB1 to IOB2.
//!
//! Data lines carry four columns (`word pos chunk tag`). In IOB1 a span may start with `I-`;
//! the repair rewrites such starts to `B-` by comparing each tag against the *original* tag of
//! the previous line.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::warn;
use serde::Serialize;

use crate::config::same_location;
use crate::error::{NerconvError, Result};
use crate::record::{decode_line, LineError};

/// Document-begin marker of the legacy corpus.
pub const DOCSTART: &str = "-DOCSTART-";
/// Number of columns in a legacy data line.
pub const LEGACY_FIELDS: usize = 4;

/// Outcome of repairing a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repaired {
    /// Line written unchanged (blank line or document marker).
    PassThrough(String),
    /// `word<TAB>tag`.
    Token {
        /// Rendered output line.
        text: String,
        /// Whether an `I-` start was rewritten to `B-`.
        rewritten: bool,
    },
}

impl Repaired {
    /// Output text without the trailing newline.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::PassThrough(text) | Self::Token { text, .. } => text,
        }
    }
}

/// Line-level IOB1 to IOB2 state machine.
#[derive(Debug, Clone)]
pub struct Iob1Repairer {
    previous: String,
}

impl Default for Iob1Repairer {
    fn default() -> Self {
        Self {
            previous: "O".into(),
        }
    }
}

impl Iob1Repairer {
    /// Creates a repairer whose previous tag is `O`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Original tag of the previous data line.
    #[must_use]
    pub fn previous_tag(&self) -> &str {
        &self.previous
    }

    /// Forgets the previous tag, as after a sentence boundary.
    pub fn reset(&mut self) {
        "O".clone_into(&mut self.previous);
    }

    /// Repairs one input line (trailing whitespace ignored).
    ///
    /// On failure the caller decides whether to skip or abort; the previous tag is reset either
    /// way.
    pub fn repair(&mut self, raw: &str) -> Result<Repaired, LineError> {
        let line = raw.trim_end();
        if line.is_empty() || line.starts_with(DOCSTART) {
            self.reset();
            return Ok(Repaired::PassThrough(line.to_owned()));
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [word, _pos, _chunk, tag] = fields[..] else {
            self.reset();
            return Err(LineError::FieldCount {
                found: fields.len(),
                expected: LEGACY_FIELDS,
            });
        };
        let repaired = repair_tag(tag, &self.previous);
        let rewritten = repaired != tag;
        tag.clone_into(&mut self.previous);
        Ok(Repaired::Token {
            text: format!("{word}\t{repaired}"),
            rewritten,
        })
    }
}

/// Rewrites an IOB1 tag given the previous line's original tag.
///
/// `O` and `B-` tags are kept. An `I-` tag stays a continuation only when the previous original
/// tag ends with the same type; otherwise it becomes `B-`. Other tags pass through.
#[must_use]
pub fn repair_tag(tag: &str, previous: &str) -> String {
    match tag.strip_prefix("I-") {
        Some(kind) if !previous.ends_with(kind) => format!("B-{kind}"),
        _ => tag.to_owned(),
    }
}

/// Counters gathered while converting a legacy file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LegacyReport {
    /// Token lines written.
    pub tokens: usize,
    /// `I-` tags rewritten to `B-`.
    pub repaired: usize,
    /// Lines skipped for a wrong column count.
    pub malformed_lines: usize,
}

/// Converts a whole legacy file, writing IOB2 output to `output`.
///
/// With `strict` set, the first malformed line aborts the conversion.
pub fn convert_legacy_file(input: &Path, output: &Path, strict: bool) -> Result<LegacyReport> {
    if same_location(input, output) {
        return Err(NerconvError::InvalidConfig(format!(
            "input and output path must be different: {}",
            input.display()
        )));
    }
    let reader =
        File::open(input).map_err(|err| NerconvError::io(err, Some(input.to_path_buf())))?;
    let writer =
        File::create(output).map_err(|err| NerconvError::io(err, Some(output.to_path_buf())))?;
    repair_stream(BufReader::new(reader), BufWriter::new(writer), strict).map_err(|err| match err {
        NerconvError::MalformedLine { line, reason, .. } => NerconvError::MalformedLine {
            path: Some(input.to_path_buf()),
            line,
            reason,
        },
        other => other,
    })
}

/// Streams legacy lines from `reader` to `writer`, repairing tags on the way.
pub fn repair_stream<R: BufRead, W: Write>(
    mut reader: R,
    mut writer: W,
    strict: bool,
) -> Result<LegacyReport> {
    let mut repairer = Iob1Repairer::new();
    let mut report = LegacyReport::default();
    let mut buf = Vec::new();
    let mut line_no = 0;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|err| NerconvError::io(err, None))?;
        if read == 0 {
            break;
        }
        line_no += 1;
        let outcome = decode_line(&buf).and_then(|line| repairer.repair(line));
        match outcome {
            Ok(repaired) => {
                if let Repaired::Token { rewritten, .. } = repaired {
                    report.tokens += 1;
                    report.repaired += usize::from(rewritten);
                }
                writeln!(writer, "{}", repaired.text())
                    .map_err(|err| NerconvError::io(err, None))?;
            }
            Err(line_err) => {
                repairer.reset();
                let err = NerconvError::MalformedLine {
                    path: None,
                    line: line_no,
                    reason: line_err.to_string(),
                };
                if strict {
                    return Err(err);
                }
                warn!("{err}");
                report.malformed_lines += 1;
            }
        }
    }
    writer.flush().map_err(|err| NerconvError::io(err, None))?;
    Ok(report)
}
