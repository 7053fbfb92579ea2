//! Conversion of bracket-span entity notation into per-token IOB2 tags.
//!
//! OntoNotes marks a span with `(TYPE*` on its first token, `*` inside and `*)` on its last;
//! a single-token span is written `(TYPE)`. Spans never nest, so a single optional open type is
//! enough state.

use std::fmt;

use thiserror::Error;

/// An IOB2 label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Iob2Tag {
    /// Outside any entity.
    Outside,
    /// First token of an entity.
    Begin(String),
    /// Continuation of an entity.
    Inside(String),
}

impl fmt::Display for Iob2Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outside => f.write_str("O"),
            Self::Begin(kind) => write!(f, "B-{kind}"),
            Self::Inside(kind) => write!(f, "I-{kind}"),
        }
    }
}

/// Whether an entity span is currently open.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpanState {
    /// No open span.
    #[default]
    Closed,
    /// A span of the given type awaits continuation or closure.
    Open(String),
}

/// Irregular bracket notation seen while tagging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpanAnomaly {
    /// `*)` arrived with no open span.
    #[error("span closed with `*)` but none was open")]
    CloseWithoutOpen,
    /// A new span opened while another was still open.
    #[error("span {new} opened while span {open} was still open")]
    NestedOpen {
        /// Type of the span left dangling.
        open: String,
        /// Type of the span being opened.
        new: String,
    },
    /// A sentence or document ended with a span still open.
    #[error("span {0} was never closed")]
    Unclosed(String),
    /// An opening bracket carried no type, e.g. `(*`.
    #[error("span tag {0:?} carries no entity type")]
    EmptyType(String),
}

/// Result of feeding one raw tag to the [`SpanTagger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Label emitted for the token.
    pub tag: Iob2Tag,
    /// Irregularity noticed on this token, if any.
    pub anomaly: Option<SpanAnomaly>,
}

impl Transition {
    fn clean(tag: Iob2Tag) -> Self {
        Self { tag, anomaly: None }
    }
}

/// Per-document span state machine.
#[derive(Debug, Clone, Default)]
pub struct SpanTagger {
    state: SpanState,
}

impl SpanTagger {
    /// Creates a tagger with no open span.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current span state.
    #[must_use]
    pub fn state(&self) -> &SpanState {
        &self.state
    }

    /// Converts one raw bracket tag, updating the open span.
    pub fn step(&mut self, raw: &str) -> Transition {
        if let Some(body) = raw.strip_prefix('(') {
            if let Some(kind) = body.strip_suffix(')') {
                // `(TYPE)` stands alone; `(TYPE*)` is the same span written long-hand.
                let kind = kind.strip_suffix('*').unwrap_or(kind);
                return self.open(raw, kind, false);
            }
            let kind = body.strip_suffix('*').unwrap_or(body);
            return self.open(raw, kind, true);
        }
        match (raw, std::mem::take(&mut self.state)) {
            ("*", SpanState::Open(kind)) => {
                let tag = Iob2Tag::Inside(kind.clone());
                self.state = SpanState::Open(kind);
                Transition::clean(tag)
            }
            ("*)", SpanState::Open(kind)) => Transition::clean(Iob2Tag::Inside(kind)),
            ("*)", SpanState::Closed) => Transition {
                tag: Iob2Tag::Outside,
                anomaly: Some(SpanAnomaly::CloseWithoutOpen),
            },
            _ => Transition::clean(Iob2Tag::Outside),
        }
    }

    fn open(&mut self, raw: &str, kind: &str, stays_open: bool) -> Transition {
        let previous = std::mem::take(&mut self.state);
        if kind.is_empty() {
            return Transition {
                tag: Iob2Tag::Outside,
                anomaly: Some(SpanAnomaly::EmptyType(raw.to_owned())),
            };
        }
        let anomaly = match previous {
            SpanState::Open(open) => Some(SpanAnomaly::NestedOpen {
                open,
                new: kind.to_owned(),
            }),
            SpanState::Closed => None,
        };
        if stays_open {
            self.state = SpanState::Open(kind.to_owned());
        }
        Transition {
            tag: Iob2Tag::Begin(kind.to_owned()),
            anomaly,
        }
    }

    /// Closes the state at a sentence or document boundary, reporting a dangling span.
    pub fn reset(&mut self) -> Option<SpanAnomaly> {
        match std::mem::take(&mut self.state) {
            SpanState::Open(kind) => Some(SpanAnomaly::Unclosed(kind)),
            SpanState::Closed => None,
        }
    }
}
