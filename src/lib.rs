//! Named-entity corpus normaliser and `nerconv` CLI.
//!
//! The crate converts two annotated corpora into a single canonical IOB2 scheme, one
//! `word<TAB>tag` line per token with blank lines between sentences:
//!
//! * the OntoNotes 5.0 CoNLL-2012 release, whose bracket-span entity column is tracked across
//!   lines and whose documents are split into `eng.train`, `eng.dev` and `eng.test` from the
//!   canonical document-id lists;
//! * the CoNLL-2003 chunk corpus, whose IOB1 entity tags are upgraded to IOB2.
//!
//! ```no_run
//! use nerconv::{ConversionConfig, Converter, ListPaths};
//!
//! # fn main() -> nerconv::Result<()> {
//! let cfg = ConversionConfig::builder()
//!     .input("/data/ontonotes/conll-2012/")
//!     .output("/data/ontonotes/conll-2012/iob2/")
//!     .lists(ListPaths::in_dir("data/sequenceLabelling/CoNLL-2012-NER"))
//!     .build()?;
//! let diagnostics = Converter::new(cfg).run()?;
//! println!("{diagnostics}");
//! # Ok(())
//! # }
//! ```
//!
//! The CLI is enabled by default through the `cli` feature.  Users targeting the
//! library portion only can disable default features to avoid the CLI
//! dependencies: `nerconv = { version = "...", default-features = false }`.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown
)]

pub mod allowlist;
pub mod config;
pub mod converter;
pub mod corpus;
pub mod error;
pub mod iob1;
pub mod output;
pub mod record;
pub mod report;
pub mod span;

pub use allowlist::{AllowlistSet, DocumentId, IdList};
pub use config::{ConversionBuilder, ConversionConfig, ListPaths, WalkConfig};
pub use converter::{convert_document, ConversionPlan, Converter};
pub use error::{NerconvError, Result};
pub use iob1::{convert_legacy_file, Iob1Repairer, LegacyReport};
pub use output::Partition;
pub use report::Diagnostics;
pub use span::{Iob2Tag, SpanState, SpanTagger};
