//! Stage configuration.
//!
//! [`StageOptions`] is the flat option set every stage is constructed from.
//! It is resolved once, at construction, and each stage kind checks the
//! options it requires before anything touches the filesystem. A violated
//! requirement is an [`OptionsError`], which a stage reports as
//! [`StageResult::InvalidOptions`].
//!
//! Options can be built in code:
//!
//! ```
//! use stagekit::StageOptions;
//!
//! let opts = StageOptions::default()
//!     .with_input_file("data/records.json.gz")
//!     .with_output_prefix("data/langs")
//!     .with_split(10)
//!     .with_overwrite(true);
//! assert_eq!(opts.split, 10);
//! ```
//!
//! or loaded from a file layered under environment variables with
//! [`StageOptions::load`]. Keys use the option names (`input-file`,
//! `output-prefix`, `split`, ...); the snake_case spelling is accepted too so
//! environment variables such as `STAGEKIT_OUTPUT_PREFIX` map onto them.

use crate::io::WriterOptions;
use crate::io::compression::{DEFAULT_CODEC, codec_by_name};
use crate::result::StageResult;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default train/test split ratio: one record in eight goes to the test set.
pub const DEFAULT_SPLIT: u32 = 8;

/// A malformed or incomplete stage configuration.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("required option `{0}` is missing or empty")]
    Missing(&'static str),
    #[error("split ratio must be at least 2, got {0}")]
    InvalidSplit(u32),
    #[error("unknown compression codec {0:?}")]
    UnknownCodec(String),
    #[error("no classifier operation selected (set `train`)")]
    NoOperation,
    #[error("failed to load stage configuration")]
    Config(#[from] config::ConfigError),
}

impl OptionsError {
    /// The stage outcome this error is reported as.
    pub fn result(&self) -> StageResult {
        StageResult::InvalidOptions
    }
}

impl From<OptionsError> for StageResult {
    fn from(e: OptionsError) -> Self {
        e.result()
    }
}

fn default_split() -> u32 {
    DEFAULT_SPLIT
}

fn default_codec() -> String {
    DEFAULT_CODEC.to_string()
}

/// Flat set of named options shared by all stage kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StageOptions {
    /// Raw source (Extractor) or serialized record collection (Loader).
    #[serde(alias = "input_file")]
    pub input_file: Option<PathBuf>,
    /// Serialized record collection written by the Extractor.
    #[serde(alias = "output_file")]
    pub output_file: Option<PathBuf>,
    /// Loader output prefix; see [`Loader`](crate::loader::Loader) for the derived names.
    #[serde(alias = "output_prefix")]
    pub output_prefix: Option<String>,
    #[serde(alias = "training_file")]
    pub training_file: Option<PathBuf>,
    #[serde(alias = "test_file")]
    pub test_file: Option<PathBuf>,
    #[serde(alias = "model_file")]
    pub model_file: Option<PathBuf>,
    #[serde(default = "default_split")]
    pub split: u32,
    pub overwrite: bool,
    pub compress: bool,
    /// Codec used when `compress` is set.
    #[serde(default = "default_codec")]
    pub compression: String,
    /// Classifier operation: train a model and save it.
    pub train: bool,
    #[serde(alias = "batch_size")]
    pub batch_size: Option<usize>,
    pub limit: Option<usize>,
    /// Pass-through options for record writers and readers.
    pub writer: WriterOptions,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            input_file: None,
            output_file: None,
            output_prefix: None,
            training_file: None,
            test_file: None,
            model_file: None,
            split: DEFAULT_SPLIT,
            overwrite: false,
            compress: false,
            compression: default_codec(),
            train: false,
            batch_size: None,
            limit: None,
            writer: WriterOptions::new(),
        }
    }
}

impl StageOptions {
    /// Load options from an optional config file (format chosen by extension),
    /// overridden by `<PREFIX>_*` environment variables.
    ///
    /// Nested writer options use a double underscore:
    /// `STAGEKIT_WRITER__HEADER=true`.
    pub fn load(file: Option<&Path>, env_prefix: &str) -> Result<Self, OptionsError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn with_input_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_file = Some(path.into());
        self
    }

    pub fn with_output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    pub fn with_output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_prefix = Some(prefix.into());
        self
    }

    pub fn with_training_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.training_file = Some(path.into());
        self
    }

    pub fn with_test_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.test_file = Some(path.into());
        self
    }

    pub fn with_model_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_file = Some(path.into());
        self
    }

    pub fn with_split(mut self, split: u32) -> Self {
        self.split = split;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_compression(mut self, codec: impl Into<String>) -> Self {
        self.compression = codec.into();
        self
    }

    pub fn with_train(mut self, train: bool) -> Self {
        self.train = train;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_writer_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.writer.insert(key.into(), value.into());
        self
    }

    /// A path option that must be present and non-empty.
    pub(crate) fn require_path(
        value: &Option<PathBuf>,
        name: &'static str,
    ) -> Result<PathBuf, OptionsError> {
        match value {
            Some(p) if !p.as_os_str().is_empty() => Ok(p.clone()),
            _ => Err(OptionsError::Missing(name)),
        }
    }

    /// Validated split ratio.
    pub(crate) fn require_split(&self) -> Result<u32, OptionsError> {
        if self.split < 2 {
            return Err(OptionsError::InvalidSplit(self.split));
        }
        Ok(self.split)
    }

    /// The codec output is compressed with, or `None` for plain output.
    pub(crate) fn output_codec(&self) -> Result<Option<String>, OptionsError> {
        if !self.compress {
            return Ok(None);
        }
        let name = self.compression.trim();
        match codec_by_name(name) {
            Some(codec) => Ok(Some(codec.name().to_string())),
            None => Err(OptionsError::UnknownCodec(name.to_string())),
        }
    }
}
