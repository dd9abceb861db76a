//! Classification: training and test sets in, model artifact out.
//!
//! The Classifier runs `Init -> Train -> Save -> Cleanup`. The learning
//! algorithm and the model format belong to the [`Trainer`] plug-in; the stage
//! reads both record sets through a [`RecordReader`], hands them over and
//! persists whatever the trainer writes.

use crate::io::compression::open_input;
use crate::io::{RecordReader, WriterOptions};
use crate::options::{OptionsError, StageOptions};
use crate::record::Record;
use crate::result::StageResult;
use crate::stage::{Stage, check_input, check_output, save_file};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// A learning algorithm plugged into a [`Classifier`].
pub trait Trainer {
    type Record: Record;

    /// Fit a model on `training`, evaluating against `test` if the algorithm
    /// does so. An error is reported as [`StageResult::InputError`].
    fn train(
        &mut self,
        training: &[Self::Record],
        test: &[Self::Record],
        options: &WriterOptions,
    ) -> Result<()>;

    /// Serialize the trained model.
    fn write_model(&self, out: &mut dyn Write) -> Result<()>;
}

/// Stage training a model from the Loader's output files.
pub struct Classifier<T: Trainer, F: RecordReader<T::Record>> {
    trainer: T,
    reader: F,
    training_file: PathBuf,
    test_file: PathBuf,
    model_file: PathBuf,
    overwrite: bool,
    codec: Option<String>,
    options: WriterOptions,
    trained: bool,
    status: StageResult,
}

impl<T: Trainer, F: RecordReader<T::Record>> Classifier<T, F> {
    /// Resolve options for a training run. Requires `training-file`,
    /// `test-file`, `model-file` and the `train` operation.
    pub fn new(options: &StageOptions, trainer: T, reader: F) -> Result<Self, OptionsError> {
        let training_file = StageOptions::require_path(&options.training_file, "training-file")?;
        let test_file = StageOptions::require_path(&options.test_file, "test-file")?;
        let model_file = StageOptions::require_path(&options.model_file, "model-file")?;
        if !options.train {
            return Err(OptionsError::NoOperation);
        }
        let codec = options.output_codec()?;
        Ok(Self {
            trainer,
            reader,
            training_file,
            test_file,
            model_file,
            overwrite: options.overwrite,
            codec,
            options: options.writer.clone(),
            trained: false,
            status: StageResult::Init,
        })
    }

    pub fn model_file(&self) -> &Path {
        &self.model_file
    }

    pub fn trainer(&self) -> &T {
        &self.trainer
    }

    pub fn into_trainer(self) -> T {
        self.trainer
    }

    fn read_set(&self, path: &Path, what: &str) -> Result<Vec<T::Record>, StageResult> {
        let read = open_input(path)
            .and_then(|mut rdr| self.reader.read_records(&mut *rdr, &self.options))
            .with_context(|| format!("read {what} records from {}", path.display()));
        match read {
            Ok(records) if records.is_empty() => {
                error!(path = %path.display(), "The {what} file {} contains no records.", path.display());
                Err(StageResult::InputError)
            }
            Ok(records) => {
                info!(records = records.len(), "Read {} {what} records from {}.", records.len(), path.display());
                Ok(records)
            }
            Err(e) => {
                error!(path = %path.display(), error = %format!("{e:#}"), "Could not read the {what} file {}.", path.display());
                Err(StageResult::InputError)
            }
        }
    }

    /// Read both record sets and run the trainer: `Train(options?)`.
    pub fn train(&mut self) -> StageResult {
        let training = match self.read_set(&self.training_file, "training") {
            Ok(records) => records,
            Err(r) => return r,
        };
        let test = match self.read_set(&self.test_file, "test") {
            Ok(records) => records,
            Err(r) => return r,
        };
        if let Err(e) = self.trainer.train(&training, &test, &self.options) {
            error!(error = %format!("{e:#}"), "Training failed.");
            return StageResult::InputError;
        }
        info!(
            training = training.len(),
            test = test.len(),
            "Trained model on {} records.",
            training.len()
        );
        self.trained = true;
        StageResult::Success
    }
}

impl<T: Trainer, F: RecordReader<T::Record>> Stage for Classifier<T, F> {
    fn name(&self) -> &'static str {
        "classifier"
    }

    fn work_phase(&self) -> &'static str {
        "train"
    }

    fn status(&self) -> StageResult {
        self.status
    }

    fn status_mut(&mut self) -> &mut StageResult {
        &mut self.status
    }

    fn init(&mut self) -> StageResult {
        let mut r = check_input(&self.training_file, "training");
        if r.is_success() {
            r = check_input(&self.test_file, "test");
        }
        if r.is_success() {
            r = check_output(&self.model_file, "model", self.overwrite);
        }
        r
    }

    fn work(&mut self) -> StageResult {
        self.train()
    }

    fn save(&mut self) -> StageResult {
        if !self.trained {
            error!("No trained model to save.");
            return StageResult::InputError;
        }
        let trainer = &self.trainer;
        let r = save_file(&self.model_file, "model", self.overwrite, self.codec.as_deref(), |out| {
            trainer.write_model(out)
        });
        if r.is_success() {
            info!(path = %self.model_file.display(), "Saved model to {}.", self.model_file.display());
        }
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Delimited;
    use crate::record::LabeledRecord;

    #[derive(Default)]
    struct Counter {
        seen: usize,
    }

    impl Trainer for Counter {
        type Record = LabeledRecord<i64>;

        fn train(&mut self, training: &[Self::Record], test: &[Self::Record], _options: &WriterOptions) -> Result<()> {
            self.seen = training.len() + test.len();
            Ok(())
        }

        fn write_model(&self, out: &mut dyn Write) -> Result<()> {
            writeln!(out, "{}", self.seen)?;
            Ok(())
        }
    }

    fn opts() -> StageOptions {
        StageOptions::default()
            .with_training_file("p.train.tsv")
            .with_test_file("p.test.tsv")
            .with_model_file("p.model")
    }

    #[test]
    fn test_train_operation_required() {
        let err = Classifier::new(&opts(), Counter::default(), Delimited::tsv()).err();
        assert!(matches!(err, Some(OptionsError::NoOperation)));
        assert!(Classifier::new(&opts().with_train(true), Counter::default(), Delimited::tsv()).is_ok());
    }

    #[test]
    fn test_model_file_required() {
        let o = StageOptions::default()
            .with_training_file("a")
            .with_test_file("b")
            .with_train(true);
        let err = Classifier::new(&o, Counter::default(), Delimited::tsv()).err();
        assert!(matches!(err, Some(OptionsError::Missing("model-file"))));
    }

    #[test]
    fn test_save_without_training() {
        let mut c = Classifier::new(&opts().with_train(true), Counter::default(), Delimited::tsv())
            .expect("valid options");
        assert_eq!(c.save(), StageResult::InputError);
    }
}
