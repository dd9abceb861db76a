//! JSON Lines (JSONL) record I/O.
//!
//! Files are newline-delimited JSON; empty/whitespace-only lines are skipped on
//! read and parse errors carry the offending line number.

use super::{RecordReader, RecordWriter, WriterOptions};
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{BufRead, Write};

/// Read newline-delimited JSON into a typed `Vec<T>`.
pub fn read_jsonl<T: DeserializeOwned>(input: &mut dyn BufRead) -> Result<Vec<T>> {
    let mut out = Vec::<T>::new();
    for (i, line) in input.lines().enumerate() {
        let line = line.with_context(|| format!("read line {}", i + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let v: T = serde_json::from_str(&line)
            .with_context(|| format!("parse JSONL line {}: {}", i + 1, line))?;
        out.push(v);
    }
    Ok(out)
}

/// Write one compact JSON value per line. Returns the number of items written.
pub fn write_jsonl<T: Serialize>(out: &mut dyn Write, data: &[T]) -> Result<usize> {
    for (i, item) in data.iter().enumerate() {
        serde_json::to_writer(&mut *out, item)
            .with_context(|| format!("serialize item #{i}"))?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(data.len())
}

/// [`RecordWriter`]/[`RecordReader`] for JSON Lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonLines;

impl<R: Serialize> RecordWriter<R> for JsonLines {
    fn write_records(
        &self,
        out: &mut dyn Write,
        records: &[R],
        _options: &WriterOptions,
    ) -> Result<()> {
        write_jsonl(out, records).map(|_| ())
    }
}

impl<R: DeserializeOwned> RecordReader<R> for JsonLines {
    fn read_records(&self, input: &mut dyn BufRead, _options: &WriterOptions) -> Result<Vec<R>> {
        read_jsonl(input)
    }
}
