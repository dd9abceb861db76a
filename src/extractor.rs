//! Extraction: raw source file in, serialized record collection out.
//!
//! The [`Extractor`] stage owns the lifecycle (input checks, overwrite policy,
//! persistence) and delegates the source-specific parsing to a
//! [`RecordExtractor`] plug-in. Extracted records are written as one indented
//! JSON array, optionally through a compressing stream.
//!
//! An extraction that yields no records is not an error: the run succeeds,
//! a warning is logged and no output file is written.
//!
//! ```no_run
//! use stagekit::{Extractor, LabeledRecord, Stage, StageOptions, StreamExtractor};
//! use std::io::BufRead;
//!
//! let lines = StreamExtractor::new(|input: &mut dyn BufRead, _req: &_| {
//!     let mut out = Vec::new();
//!     for (i, line) in input.lines().enumerate() {
//!         out.push(LabeledRecord::new(vec![line?]).with_id(i as u64));
//!     }
//!     Ok(out)
//! });
//! let opts = StageOptions::default()
//!     .with_input_file("corpus.txt")
//!     .with_output_file("corpus.json.gz")
//!     .with_compress(true);
//! let mut stage = Extractor::new(&opts, lines)?;
//! let result = stage.run();
//! std::process::exit(result.exit_code());
//! # Ok::<(), stagekit::OptionsError>(())
//! ```

use crate::io::WriterOptions;
use crate::io::compression::open_input;
use crate::io::json::write_json_array;
use crate::options::{OptionsError, StageOptions};
use crate::record::Record;
use crate::result::StageResult;
use crate::stage::{Stage, check_input, check_output, save_file};
use anyhow::{Context, Result};
use std::io::BufRead;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Parameters of one extraction: `Extract(batchSize?, limit?, options?)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractRequest {
    /// Hint for plug-ins that process their source in batches.
    pub batch_size: Option<usize>,
    /// Upper bound on the number of records kept.
    pub limit: Option<usize>,
    pub options: WriterOptions,
}

impl ExtractRequest {
    pub fn from_options(options: &StageOptions) -> Self {
        Self {
            batch_size: options.batch_size,
            limit: options.limit,
            options: options.writer.clone(),
        }
    }
}

/// Source-specific extraction logic plugged into an [`Extractor`].
pub trait RecordExtractor {
    type Record: Record;

    /// Read `input` and produce records. An error is reported as
    /// [`StageResult::InputError`].
    fn extract(&mut self, input: &Path, request: &ExtractRequest) -> Result<Vec<Self::Record>>;
}

/// A [`RecordExtractor`] that parses records from the input stream.
///
/// The input is opened with transparent decompression (by extension or magic
/// bytes) and handed to the parse closure as a buffered reader.
pub struct StreamExtractor<R, F> {
    parse: F,
    _record: PhantomData<fn() -> R>,
}

impl<R, F> StreamExtractor<R, F>
where
    R: Record,
    F: FnMut(&mut dyn BufRead, &ExtractRequest) -> Result<Vec<R>>,
{
    pub fn new(parse: F) -> Self {
        Self {
            parse,
            _record: PhantomData,
        }
    }
}

impl<R, F> RecordExtractor for StreamExtractor<R, F>
where
    R: Record,
    F: FnMut(&mut dyn BufRead, &ExtractRequest) -> Result<Vec<R>>,
{
    type Record = R;

    fn extract(&mut self, input: &Path, request: &ExtractRequest) -> Result<Vec<R>> {
        let mut rdr = open_input(input)?;
        (self.parse)(&mut *rdr, request)
            .with_context(|| format!("read records from {}", input.display()))
    }
}

/// Stage turning a raw input file into a serialized record collection.
pub struct Extractor<S: RecordExtractor> {
    source: S,
    input_file: PathBuf,
    output_file: PathBuf,
    overwrite: bool,
    codec: Option<String>,
    request: ExtractRequest,
    extracted: Vec<S::Record>,
    status: StageResult,
}

impl<S: RecordExtractor> Extractor<S> {
    /// Resolve options for an extraction run. Requires `input-file` and `output-file`.
    pub fn new(options: &StageOptions, source: S) -> Result<Self, OptionsError> {
        let input_file = StageOptions::require_path(&options.input_file, "input-file")?;
        let output_file = StageOptions::require_path(&options.output_file, "output-file")?;
        let codec = options.output_codec()?;
        Ok(Self {
            source,
            input_file,
            output_file,
            overwrite: options.overwrite,
            codec,
            request: ExtractRequest::from_options(options),
            extracted: Vec::new(),
            status: StageResult::Init,
        })
    }

    pub fn input_file(&self) -> &Path {
        &self.input_file
    }

    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    /// Records produced by the last extraction.
    pub fn extracted_records(&self) -> &[S::Record] {
        &self.extracted
    }

    pub fn into_records(self) -> Vec<S::Record> {
        self.extracted
    }

    /// Run the plug-in with the configured request.
    pub fn extract(&mut self) -> StageResult {
        let request = self.request.clone();
        self.extract_with(&request)
    }

    /// Run the plug-in with an explicit request, replacing any previously
    /// extracted records.
    pub fn extract_with(&mut self, request: &ExtractRequest) -> StageResult {
        let mut records = match self.source.extract(&self.input_file, request) {
            Ok(records) => records,
            Err(e) => {
                error!(
                    path = %self.input_file.display(),
                    error = %format!("{e:#}"),
                    "Failed to extract records from {}.",
                    self.input_file.display()
                );
                return StageResult::InputError;
            }
        };
        if let Some(limit) = request.limit
            && records.len() > limit
        {
            debug!(extracted = records.len(), limit, "truncating to record limit");
            records.truncate(limit);
        }
        info!(
            records = records.len(),
            "Extracted {} records from {}.",
            records.len(),
            self.input_file.display()
        );
        self.extracted = records;
        StageResult::Success
    }
}

impl<S: RecordExtractor> Stage for Extractor<S> {
    fn name(&self) -> &'static str {
        "extractor"
    }

    fn work_phase(&self) -> &'static str {
        "extract"
    }

    fn status(&self) -> StageResult {
        self.status
    }

    fn status_mut(&mut self) -> &mut StageResult {
        &mut self.status
    }

    fn init(&mut self) -> StageResult {
        let r = check_input(&self.input_file, "input");
        if !r.is_success() {
            return r;
        }
        check_output(&self.output_file, "output", self.overwrite)
    }

    fn work(&mut self) -> StageResult {
        self.extract()
    }

    fn save(&mut self) -> StageResult {
        if self.extracted.is_empty() {
            warn!(
                path = %self.input_file.display(),
                "0 records extracted from file {}. Not writing to output file.",
                self.input_file.display()
            );
            return StageResult::Success;
        }
        let records = &self.extracted;
        let r = save_file(
            &self.output_file,
            "output",
            self.overwrite,
            self.codec.as_deref(),
            |out| write_json_array(out, records, true),
        );
        if r.is_success() {
            info!(
                records = records.len(),
                path = %self.output_file.display(),
                "Wrote {} records to {}.",
                records.len(),
                self.output_file.display()
            );
        }
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LabeledRecord;

    struct Fixed(Vec<LabeledRecord<i64>>);

    impl RecordExtractor for Fixed {
        type Record = LabeledRecord<i64>;

        fn extract(&mut self, _input: &Path, _request: &ExtractRequest) -> Result<Vec<Self::Record>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_requires_paths() {
        let opts = StageOptions::default().with_input_file("in.txt");
        let err = Extractor::new(&opts, Fixed(vec![])).err();
        assert!(matches!(err, Some(OptionsError::Missing("output-file"))));
    }

    #[test]
    fn test_limit_truncates() {
        let recs = (0..10).map(|i| LabeledRecord::new(vec![i])).collect();
        let opts = StageOptions::default()
            .with_input_file("in.txt")
            .with_output_file("out.json")
            .with_limit(3);
        let mut stage = Extractor::new(&opts, Fixed(recs)).expect("valid options");
        assert_eq!(stage.extract(), StageResult::Success);
        assert_eq!(stage.extracted_records().len(), 3);
        assert_eq!(stage.extracted_records()[2].features, vec![2]);
    }
}
