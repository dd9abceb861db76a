//! Record serialization formats and the strategy traits stages plug them in through.
//!
//! Stages never hard-code a file format for their intermediate outputs. The
//! [`Loader`](crate::loader::Loader) writes its training and test sets through a
//! [`RecordWriter`], and the [`Classifier`](crate::classifier::Classifier) reads
//! them back through a [`RecordReader`]. Built-in formats:
//!
//! - [`Delimited`] - TSV (default) or CSV rows via [`Record::to_row`](crate::record::Record::to_row)
//! - [`JsonLines`] - one compact JSON value per line
//! - [`JsonArray`] - a single JSON array, indented by default
//!
//! Closures with the right shape are writers too; see [`writer_fn`].
//!
//! Compression is orthogonal and lives in [`compression`].

pub mod compression;
pub mod delimited;
pub mod json;
pub mod jsonl;

pub use delimited::Delimited;
pub use json::JsonArray;
pub use jsonl::JsonLines;

use anyhow::Result;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// Free-form `key -> value` options passed through to writers and readers.
pub type WriterOptions = BTreeMap<String, String>;

/// Look up a boolean flag in writer options. Accepts `true`/`1`/`yes`.
pub fn option_flag(options: &WriterOptions, key: &str) -> bool {
    options
        .get(key)
        .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
}

/// Serializes a record set onto an already opened (and possibly compressing) stream.
pub trait RecordWriter<R> {
    fn write_records(&self, out: &mut dyn Write, records: &[R], options: &WriterOptions)
    -> Result<()>;
}

/// Deserializes a record set from an already opened (and decompressed) stream.
pub trait RecordReader<R> {
    fn read_records(&self, input: &mut dyn BufRead, options: &WriterOptions) -> Result<Vec<R>>;
}

impl<R, F> RecordWriter<R> for F
where
    F: Fn(&mut dyn Write, &[R], &WriterOptions) -> Result<()>,
{
    fn write_records(
        &self,
        out: &mut dyn Write,
        records: &[R],
        options: &WriterOptions,
    ) -> Result<()> {
        self(out, records, options)
    }
}

impl<R, F> RecordReader<R> for F
where
    F: Fn(&mut dyn BufRead, &WriterOptions) -> Result<Vec<R>>,
{
    fn read_records(&self, input: &mut dyn BufRead, options: &WriterOptions) -> Result<Vec<R>> {
        self(input, options)
    }
}

/// Pin a closure to the [`RecordWriter`] signature so its argument types are inferred.
///
/// ```
/// use stagekit::io::writer_fn;
/// use stagekit::LabeledRecord;
///
/// let w = writer_fn(|out, records: &[LabeledRecord<String>], _opts| {
///     for r in records {
///         writeln!(out, "{}", r.label.as_deref().unwrap_or("?"))?;
///     }
///     Ok(())
/// });
/// # let _ = w;
/// ```
pub fn writer_fn<R, F>(f: F) -> F
where
    F: Fn(&mut dyn Write, &[R], &WriterOptions) -> Result<()>,
{
    f
}

/// Pin a closure to the [`RecordReader`] signature.
pub fn reader_fn<R, F>(f: F) -> F
where
    F: Fn(&mut dyn BufRead, &WriterOptions) -> Result<Vec<R>>,
{
    f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_flag() {
        let mut o = WriterOptions::new();
        assert!(!option_flag(&o, "header"));
        o.insert("header".into(), "TRUE".into());
        assert!(option_flag(&o, "header"));
        o.insert("header".into(), "0".into());
        assert!(!option_flag(&o, "header"));
    }

    #[test]
    fn test_closure_writer() -> Result<()> {
        let w = writer_fn(|out, records: &[u32], _o| {
            for r in records {
                writeln!(out, "{r}")?;
            }
            Ok(())
        });
        let records: &[u32] = &[1, 2, 3];
        let mut buf = Vec::new();
        RecordWriter::<u32>::write_records(&w, &mut buf, records, &WriterOptions::new())?;
        assert_eq!(String::from_utf8(buf)?, "1\n2\n3\n");
        Ok(())
    }
}
