//! Parsing of CoNLL-2012 annotation lines and repair of word surface artefacts.
//!
//! A data line looks like
//!
//! ```text
//! bc/cctv/00/cctv_0001   0    5   Japanese   JJ   *   -   -   -   Speaker#1   (NORP)   *   *   -
//! ```
//!
//! where the fourth column holds the word and the eleventh the named-entity bracket tag.

use std::borrow::Cow;

use thiserror::Error;

/// Marker opening a document.
pub const DOCUMENT_BEGIN: &str = "#begin document";
/// Marker closing a document.
pub const DOCUMENT_END: &str = "#end document";
/// Minimum number of columns in a data line.
pub const MIN_FIELDS: usize = 11;

const WORD_FIELD: usize = 3;
const TAG_FIELD: usize = 10;
const WORD_MARKERS: [char; 3] = ['/', '%', '='];

/// The two columns of a data line the converter uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationRecord<'a> {
    /// Word surface, before normalisation.
    pub word: &'a str,
    /// Raw bracket tag, e.g. `(ORG*`, `*`, `*)`.
    pub tag: &'a str,
}

/// Classification of one corpus line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// Blank line between sentences.
    SentenceBoundary,
    /// `#begin document ...`, carried in whitespace-collapsed form.
    DocumentBegin(String),
    /// `#end document`.
    DocumentEnd,
    /// A token line.
    Record(AnnotationRecord<'a>),
}

/// Why a corpus line could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    /// A CoNLL-2012 data line with fewer than [`MIN_FIELDS`] columns.
    #[error("unexpected number of fields for line ({found}, expected at least {min})")]
    TooFewFields {
        /// Number of columns found.
        found: usize,
        /// Minimum accepted.
        min: usize,
    },
    /// A data line whose column count must match exactly.
    #[error("expected {expected} fields, found {found}")]
    FieldCount {
        /// Number of columns found.
        found: usize,
        /// Exact count required.
        expected: usize,
    },
    /// The raw bytes of the line are not UTF-8.
    #[error("line is not valid UTF-8")]
    Encoding,
}

/// Classifies a raw line, splitting data lines on runs of whitespace.
pub fn parse_line(raw: &str) -> Result<Line<'_>, LineError> {
    let line = raw.trim();
    if line.is_empty() {
        return Ok(Line::SentenceBoundary);
    }
    if line.starts_with(DOCUMENT_BEGIN) {
        return Ok(Line::DocumentBegin(collapse_whitespace(line)));
    }
    if line.starts_with(DOCUMENT_END) {
        return Ok(Line::DocumentEnd);
    }
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < MIN_FIELDS {
        return Err(LineError::TooFewFields {
            found: fields.len(),
            min: MIN_FIELDS,
        });
    }
    Ok(Line::Record(AnnotationRecord {
        word: fields[WORD_FIELD],
        tag: fields[TAG_FIELD],
    }))
}

/// Decodes one raw line of a corpus file.
pub fn decode_line(raw: &[u8]) -> Result<&str, LineError> {
    std::str::from_utf8(raw).map_err(|_| LineError::Encoding)
}

fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips dialogue markup from a word.
///
/// Each of `/` (turn punctuation such as `/.`), `%` (interjections such as `%uh`) and `=` is
/// removed once when it leads a word longer than one character. The rules run in that order,
/// each at most once.
#[must_use]
pub fn normalize_word(word: &str) -> Cow<'_, str> {
    let mut current = word;
    for marker in WORD_MARKERS {
        if let Some(rest) = current.strip_prefix(marker) {
            if !rest.is_empty() {
                current = rest;
            }
        }
    }
    if current.len() == word.len() {
        Cow::Borrowed(word)
    } else {
        Cow::Owned(current.to_owned())
    }
}
