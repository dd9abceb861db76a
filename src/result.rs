//! The closed outcome vocabulary returned by every stage phase.

use std::fmt;

/// Outcome of a stage lifecycle phase.
///
/// Exactly one value is produced per phase; anything other than
/// [`StageResult::Success`] short-circuits the remaining phases of
/// [`Stage::run`](crate::stage::Stage::run).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StageResult {
    /// The stage has not run yet.
    #[default]
    Init,
    Success,
    /// A required input is missing, unreadable or empty.
    InputError,
    /// An output cannot be written, e.g. an existing file without the overwrite option.
    OutputError,
    /// The stage configuration is malformed.
    InvalidOptions,
}

impl StageResult {
    /// Canonical upper-case name, as printed in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            StageResult::Init => "INIT",
            StageResult::Success => "SUCCESS",
            StageResult::InputError => "INPUT_ERROR",
            StageResult::OutputError => "OUTPUT_ERROR",
            StageResult::InvalidOptions => "INVALID_OPTIONS",
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, StageResult::Success)
    }

    /// Process exit code a hosting binary should terminate with.
    ///
    /// `Init` maps to a generic failure: a stage that never left its initial
    /// state did not do its job.
    pub fn exit_code(&self) -> i32 {
        match self {
            StageResult::Success => 0,
            StageResult::Init => 1,
            StageResult::InputError => 2,
            StageResult::OutputError => 3,
            StageResult::InvalidOptions => 4,
        }
    }
}

impl fmt::Display for StageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_init() {
        assert_eq!(StageResult::default(), StageResult::Init);
        assert!(!StageResult::Init.is_success());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(StageResult::Success.to_string(), "SUCCESS");
        assert_eq!(StageResult::InputError.to_string(), "INPUT_ERROR");
        assert_eq!(StageResult::OutputError.to_string(), "OUTPUT_ERROR");
        assert_eq!(StageResult::InvalidOptions.to_string(), "INVALID_OPTIONS");
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let all = [
            StageResult::Init,
            StageResult::Success,
            StageResult::InputError,
            StageResult::OutputError,
            StageResult::InvalidOptions,
        ];
        let mut codes: Vec<i32> = all.iter().map(StageResult::exit_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
        assert_eq!(StageResult::Success.exit_code(), 0);
    }
}
