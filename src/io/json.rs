//! Whole-collection JSON: a record set stored as a single JSON array.
//!
//! This is the hand-off format between the Extractor and the Loader. The
//! Extractor writes indented output so the file stays human-readable.

use super::{RecordReader, RecordWriter, WriterOptions, option_flag};
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{BufRead, Write};

/// Serialize `records` as one JSON array, indented when `pretty` is set.
pub fn write_json_array<T: Serialize>(out: &mut dyn Write, records: &[T], pretty: bool) -> Result<()> {
    let written = if pretty {
        serde_json::to_writer_pretty(&mut *out, records)
    } else {
        serde_json::to_writer(&mut *out, records)
    };
    written.with_context(|| format!("serialize {} records as a JSON array", records.len()))?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Deserialize a JSON array of records.
///
/// A JSON `null` document is read as an empty collection.
pub fn read_json_array<T: DeserializeOwned>(input: &mut dyn BufRead) -> Result<Vec<T>> {
    let records: Option<Vec<T>> =
        serde_json::from_reader(input).context("parse JSON record array")?;
    Ok(records.unwrap_or_default())
}

/// [`RecordWriter`]/[`RecordReader`] over a single JSON array.
///
/// Output is indented unless the `pretty` option is `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonArray;

impl<R: Serialize> RecordWriter<R> for JsonArray {
    fn write_records(
        &self,
        out: &mut dyn Write,
        records: &[R],
        options: &WriterOptions,
    ) -> Result<()> {
        let pretty = !options.contains_key("pretty") || option_flag(options, "pretty");
        write_json_array(out, records, pretty)
    }
}

impl<R: DeserializeOwned> RecordReader<R> for JsonArray {
    fn read_records(&self, input: &mut dyn BufRead, _options: &WriterOptions) -> Result<Vec<R>> {
        read_json_array(input)
    }
}
