//! # Stagekit
//!
//! Building blocks for **staged dataset pipelines**: turn raw source files into
//! labeled record collections, split them into training and test sets, and
//! train a classifier on the result. Each step is a *stage* that reads files,
//! writes files and reports a single [`StageResult`].
//!
//! ## Stages
//!
//! - [`Extractor`] - raw source → serialized record collection (JSON array)
//! - [`Loader`] - record collection → `<prefix>.train.tsv` + `<prefix>.test.tsv`
//! - [`Classifier`] - training and test sets → model artifact
//!
//! Every stage runs the same lifecycle through [`Stage::run`]:
//! `Init → <work> → Save → Cleanup`, stopping at the first failure. Input
//! checks, overwrite policy, optional compression and logging are handled by
//! the stages; the source-specific parts are plug-ins:
//!
//! - [`RecordExtractor`] - how records are pulled out of a source file
//! - [`RecordWriter`] / [`RecordReader`] - the on-disk format of record sets
//! - [`Trainer`] - the learning algorithm and model format
//!
//! ## Quick Start
//!
//! ```no_run
//! use stagekit::*;
//! use std::io::BufRead;
//!
//! # fn main() -> anyhow::Result<()> {
//! logging::init_tracing();
//!
//! // 1. Extract `label<TAB>text` lines into records.
//! let parse = StreamExtractor::new(|input: &mut dyn BufRead, _req: &ExtractRequest| {
//!     let mut records = Vec::new();
//!     for (i, line) in input.lines().enumerate() {
//!         let line = line?;
//!         if let Some((label, text)) = line.split_once('\t') {
//!             records.push(LabeledRecord::labeled(label, vec![text.to_string()]).with_id(i as u64));
//!         }
//!     }
//!     Ok(records)
//! });
//! let opts = StageOptions::default()
//!     .with_input_file("snippets.txt")
//!     .with_output_file("out/snippets.json.gz")
//!     .with_compress(true);
//! let status = Extractor::new(&opts, parse)?.run();
//! if !status.is_success() {
//!     std::process::exit(status.exit_code());
//! }
//!
//! // 2. Split into training and test sets.
//! let opts = StageOptions::default()
//!     .with_input_file("out/snippets.json.gz")
//!     .with_output_prefix("out/snippets")
//!     .with_split(8);
//! let status = Loader::<LabeledRecord<String>, _>::new(&opts, Delimited::tsv())?.run();
//! std::process::exit(status.exit_code());
//! # }
//! ```
//!
//! ## Configuration
//!
//! All stages are configured from one flat [`StageOptions`] set, built in code
//! or loaded with [`StageOptions::load`] from a config file and environment
//! variables.
//!
//! ## Feature Flags
//!
//! - `compression-gzip` (default) - gzip input/output via `flate2`
//! - `compression-zstd` (default) - zstd input/output via `zstd`

pub mod classifier;
pub mod extractor;
pub mod feature;
pub mod io;
pub mod loader;
pub mod logging;
pub mod options;
pub mod record;
pub mod result;
pub mod stage;
pub mod testing;

pub use classifier::{Classifier, Trainer};
pub use extractor::{ExtractRequest, Extractor, RecordExtractor, StreamExtractor};
pub use feature::Feature;
pub use io::{
    Delimited, JsonArray, JsonLines, RecordReader, RecordWriter, WriterOptions, reader_fn,
    writer_fn,
};
pub use loader::{LoadRequest, Loader, split_records};
pub use options::{DEFAULT_SPLIT, OptionsError, StageOptions};
pub use record::{LabeledRecord, Record};
pub use result::StageResult;
pub use stage::{Stage, check_input, check_output};
