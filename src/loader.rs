//! Loading: a serialized record collection in, training and test sets out.
//!
//! The Loader runs `Init -> Read -> Load -> Save -> Cleanup`. `Read`
//! deserializes the JSON array the Extractor wrote; `Load` partitions it with
//! [`split_records`]; `Save` writes both sets through an injected
//! [`RecordWriter`], so the on-disk format is the caller's choice.
//!
//! Output names are derived from the `output-prefix` option:
//! `<prefix>.train.tsv` and `<prefix>.test.tsv`. The names stay the same when
//! output is compressed; readers detect compression from the content.

use crate::extractor::ExtractRequest;
use crate::io::compression::open_input;
use crate::io::json::read_json_array;
use crate::io::{RecordWriter, WriterOptions};
use crate::options::{OptionsError, StageOptions};
use crate::record::Record;
use crate::result::StageResult;
use crate::stage::{Stage, check_input, check_output, save_file};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Parameters of one load: `Load(batchSize?, limit?, options?)`.
///
/// `limit` caps how many input records take part in the split; `options`
/// are passed to the record writer.
pub type LoadRequest = ExtractRequest;

/// Split `records` into `(test, training)` at `floor(len / split)`.
///
/// **The split is positional, not random.** The first `len / split` records
/// become the test set and the rest the training set, in their existing order,
/// so `test ++ training == records`. Shuffle beforehand if a random or
/// stratified sample is needed.
///
/// ```
/// use stagekit::loader::split_records;
///
/// let records: Vec<u32> = (0..100).collect();
/// let (test, train) = split_records(&records, 8);
/// assert_eq!((test.len(), train.len()), (12, 88));
/// assert_eq!(test[0], 0);
/// assert_eq!(train[0], 12);
/// ```
///
/// `split` must be non-zero; stage options reject anything below 2.
pub fn split_records<R: Clone>(records: &[R], split: u32) -> (Vec<R>, Vec<R>) {
    let split_count = records.len() / split as usize;
    let (test, training) = records.split_at(split_count);
    (test.to_vec(), training.to_vec())
}

/// Training file name for an output prefix.
pub fn training_file_name(prefix: &str) -> PathBuf {
    PathBuf::from(format!("{prefix}.train.tsv"))
}

/// Test file name for an output prefix.
pub fn test_file_name(prefix: &str) -> PathBuf {
    PathBuf::from(format!("{prefix}.test.tsv"))
}

/// Stage splitting a record collection into training and test files.
pub struct Loader<R: Record, W: RecordWriter<R>> {
    writer: W,
    input_file: PathBuf,
    training_file: PathBuf,
    test_file: PathBuf,
    split: u32,
    overwrite: bool,
    codec: Option<String>,
    request: LoadRequest,
    writer_options: WriterOptions,
    input: Vec<R>,
    training: Vec<R>,
    test: Vec<R>,
    status: StageResult,
}

impl<R: Record, W: RecordWriter<R>> Loader<R, W> {
    /// Resolve options for a load run. Requires `input-file`, `output-prefix`
    /// and a split ratio of at least 2.
    pub fn new(options: &StageOptions, writer: W) -> Result<Self, OptionsError> {
        let input_file = StageOptions::require_path(&options.input_file, "input-file")?;
        let prefix = match options.output_prefix.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => return Err(OptionsError::Missing("output-prefix")),
        };
        let split = options.require_split()?;
        let codec = options.output_codec()?;
        let request = LoadRequest::from_options(options);
        Ok(Self {
            writer,
            input_file,
            training_file: training_file_name(&prefix),
            test_file: test_file_name(&prefix),
            split,
            overwrite: options.overwrite,
            codec,
            writer_options: request.options.clone(),
            request,
            input: Vec::new(),
            training: Vec::new(),
            test: Vec::new(),
            status: StageResult::Init,
        })
    }

    pub fn input_file(&self) -> &Path {
        &self.input_file
    }

    pub fn training_file(&self) -> &Path {
        &self.training_file
    }

    pub fn test_file(&self) -> &Path {
        &self.test_file
    }

    pub fn input_records(&self) -> &[R] {
        &self.input
    }

    pub fn training_records(&self) -> &[R] {
        &self.training
    }

    pub fn test_records(&self) -> &[R] {
        &self.test
    }

    /// Deserialize the input collection.
    pub fn read(&mut self) -> StageResult {
        match self.read_input() {
            Ok(records) if records.is_empty() => {
                error!(
                    path = %self.input_file.display(),
                    "The input file {} contains no records.",
                    self.input_file.display()
                );
                StageResult::InputError
            }
            Ok(records) => {
                info!(
                    records = records.len(),
                    "Read {} records from {}.",
                    records.len(),
                    self.input_file.display()
                );
                self.input = records;
                StageResult::Success
            }
            Err(e) => {
                error!(
                    path = %self.input_file.display(),
                    error = %format!("{e:#}"),
                    "Could not read records from {}.",
                    self.input_file.display()
                );
                StageResult::InputError
            }
        }
    }

    fn read_input(&self) -> Result<Vec<R>> {
        let mut rdr = open_input(&self.input_file)?;
        read_json_array(&mut rdr)
    }

    /// Split the input with the configured request.
    pub fn load(&mut self) -> StageResult {
        let request = self.request.clone();
        self.load_with(&request)
    }

    /// Split the input into test and training sets.
    pub fn load_with(&mut self, request: &LoadRequest) -> StageResult {
        if self.input.is_empty() {
            error!("No input records to split; Read must succeed first.");
            return StageResult::InputError;
        }
        let considered = match request.limit {
            Some(limit) if limit < self.input.len() => {
                debug!(records = self.input.len(), limit, "splitting only the first records");
                &self.input[..limit]
            }
            _ => &self.input[..],
        };
        let (test, training) = split_records(considered, self.split);
        info!(
            split = self.split,
            test = test.len(),
            training = training.len(),
            "Split {} records into {} training and {} test records.",
            considered.len(),
            training.len(),
            test.len()
        );
        self.test = test;
        self.training = training;
        self.writer_options = request.options.clone();
        StageResult::Success
    }

    fn check_set(path: &Path, what: &str, records: &[R]) -> StageResult {
        if records.is_empty() {
            error!(
                path = %path.display(),
                "The {what} set is empty; not writing {}.",
                path.display()
            );
            return StageResult::InputError;
        }
        StageResult::Success
    }

    fn save_set(&self, path: &Path, what: &str, records: &[R]) -> StageResult {
        let writer = &self.writer;
        let options = &self.writer_options;
        let r = save_file(path, what, self.overwrite, self.codec.as_deref(), |out| {
            writer.write_records(out, records, options)
        });
        if r.is_success() {
            info!(
                records = records.len(),
                path = %path.display(),
                "Wrote {} {what} records to {}.",
                records.len(),
                path.display()
            );
        }
        r
    }
}

impl<R: Record, W: RecordWriter<R>> Stage for Loader<R, W> {
    fn name(&self) -> &'static str {
        "loader"
    }

    fn work_phase(&self) -> &'static str {
        "load"
    }

    fn status(&self) -> StageResult {
        self.status
    }

    fn status_mut(&mut self) -> &mut StageResult {
        &mut self.status
    }

    fn init(&mut self) -> StageResult {
        let mut r = check_input(&self.input_file, "input");
        if r.is_success() {
            r = check_output(&self.training_file, "training", self.overwrite);
        }
        if r.is_success() {
            r = check_output(&self.test_file, "test", self.overwrite);
        }
        r
    }

    fn work(&mut self) -> StageResult {
        let r = self.read();
        if !r.is_success() {
            return r;
        }
        self.load()
    }

    fn save(&mut self) -> StageResult {
        // Neither file is written unless both sets have records.
        let mut r = Self::check_set(&self.training_file, "training", &self.training);
        if r.is_success() {
            r = Self::check_set(&self.test_file, "test", &self.test);
        }
        if r.is_success() {
            r = self.save_set(&self.training_file, "training", &self.training);
        }
        if r.is_success() {
            r = self.save_set(&self.test_file, "test", &self.test);
        }
        r
    }
}
