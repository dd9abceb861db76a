//! The lifecycle shared by every stage.
//!
//! A stage performs one file-to-file transformation:
//!
//! ```text
//! Init -> <work> -> Save -> Cleanup
//! ```
//!
//! Phases run strictly in order and the first result other than
//! [`StageResult::Success`] ends the run. `Cleanup` only runs after a
//! successful `Save`. A stage instance is single-use: [`Stage::run`] refuses to
//! run twice, so each invocation constructs a fresh instance.
//!
//! The checks every `Init` performs on inputs and outputs live here too:
//! [`check_input`] and [`check_output`].

use crate::io::compression::write_output;
use crate::result::StageResult;
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info_span, warn};

/// A single unit of pipeline work with a fixed lifecycle.
///
/// Implementors provide the phases; [`run`](Stage::run) sequences them.
pub trait Stage {
    /// Stage name used in log spans.
    fn name(&self) -> &'static str;

    /// Name of the stage-specific work phase, for logs.
    fn work_phase(&self) -> &'static str {
        "work"
    }

    /// Result of the last run, or [`StageResult::Init`] if the stage has not run.
    fn status(&self) -> StageResult;

    /// Storage for [`status`](Stage::status); written by [`run`](Stage::run).
    fn status_mut(&mut self) -> &mut StageResult;

    /// Validate inputs and output policy. Must not have side effects.
    fn init(&mut self) -> StageResult;

    /// The stage-specific work between `Init` and `Save`.
    fn work(&mut self) -> StageResult;

    /// Persist the stage output.
    fn save(&mut self) -> StageResult;

    /// Release anything the run acquired. Only called after a successful
    /// `Save`; must be safe to call when there is nothing to do.
    fn cleanup(&mut self) -> StageResult {
        StageResult::Success
    }

    /// Run the full lifecycle once and return the first non-success result,
    /// or `Success`.
    fn run(&mut self) -> StageResult {
        let span = info_span!("stage", stage = self.name());
        let _enter = span.enter();

        if self.status() != StageResult::Init {
            error!(
                previous = %self.status(),
                "Stage {} already ran; construct a fresh instance for each run.",
                self.name()
            );
            return StageResult::InvalidOptions;
        }
        let result = run_phases(self);
        *self.status_mut() = result;
        result
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Init,
    Work,
    Save,
    Cleanup,
}

fn run_phases<S: Stage + ?Sized>(stage: &mut S) -> StageResult {
    for phase in [Phase::Init, Phase::Work, Phase::Save, Phase::Cleanup] {
        let (label, r) = match phase {
            Phase::Init => ("init", stage.init()),
            Phase::Work => (stage.work_phase(), stage.work()),
            Phase::Save => ("save", stage.save()),
            Phase::Cleanup => ("cleanup", stage.cleanup()),
        };
        debug!(phase = label, result = %r, "phase finished");
        if !r.is_success() {
            return r;
        }
    }
    StageResult::Success
}

/// Check that a required input file exists, is a regular file and can be
/// opened for reading.
///
/// `what` names the file in the log message ("input", "training data", ...).
pub fn check_input(path: &Path, what: &str) -> StageResult {
    match path.metadata() {
        Ok(meta) if meta.is_file() => match std::fs::File::open(path) {
            Ok(_) => StageResult::Success,
            Err(e) => {
                error!(path = %path.display(), error = %e, "The {what} file {} cannot be read.", path.display());
                StageResult::InputError
            }
        },
        Ok(_) => {
            error!(path = %path.display(), "The {what} file {} is not a regular file.", path.display());
            StageResult::InputError
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "The {what} file {} does not exist or cannot be read.", path.display());
            StageResult::InputError
        }
    }
}

/// Apply the overwrite policy to an output path.
///
/// An existing output without `overwrite` is an [`StageResult::OutputError`];
/// with `overwrite` it is a warning.
pub fn check_output(path: &Path, what: &str, overwrite: bool) -> StageResult {
    if !path.exists() {
        return StageResult::Success;
    }
    if !overwrite {
        error!(
            path = %path.display(),
            "The {what} file {} exists but the overwrite option was not specified.",
            path.display()
        );
        return StageResult::OutputError;
    }
    warn!(path = %path.display(), "The {what} file {} exists and will be overwritten.", path.display());
    StageResult::Success
}

/// Write one output file under the overwrite policy, mapping failures to
/// [`StageResult::OutputError`].
pub(crate) fn save_file<F>(
    path: &Path,
    what: &str,
    overwrite: bool,
    codec: Option<&str>,
    body: F,
) -> StageResult
where
    F: FnOnce(&mut dyn Write) -> anyhow::Result<()>,
{
    let r = check_output(path, what, overwrite);
    if !r.is_success() {
        return r;
    }
    match write_output(path, codec, body) {
        Ok(()) => StageResult::Success,
        Err(e) => {
            error!(path = %path.display(), error = %format!("{e:#}"), "Failed to write the {what} file {}.", path.display());
            StageResult::OutputError
        }
    }
}
