//! Delimited text records (TSV, CSV).
//!
//! Rows come from [`Record::to_row`] and go back through [`Record::from_row`],
//! so any record type can be written without a serde-flattened shape. Cells
//! containing the delimiter, quotes or newlines are quoted by the `csv` writer
//! and unquoted again on read.
//!
//! # Options
//! - `header=true` - write a header row (`id`, `label`, `feature_1`, ...) /
//!   skip the first row when reading.

use super::{RecordReader, RecordWriter, WriterOptions, option_flag};
use crate::record::Record;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::io::{BufRead, Write};

/// Delimited row format. [`Delimited::tsv`] is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimited {
    delimiter: u8,
}

impl Delimited {
    pub const fn tsv() -> Self {
        Self { delimiter: b'\t' }
    }

    pub const fn csv() -> Self {
        Self { delimiter: b',' }
    }

    pub const fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

impl Default for Delimited {
    fn default() -> Self {
        Self::tsv()
    }
}

/// Header cells for a row of `width` cells in [`LabeledRecord`](crate::record::LabeledRecord) layout.
fn header_row(width: usize) -> Vec<String> {
    let mut h = vec!["id".to_string(), "label".to_string()];
    h.extend((1..=width.saturating_sub(2)).map(|i| format!("feature_{i}")));
    h
}

impl<R: Record> RecordWriter<R> for Delimited {
    fn write_records(
        &self,
        out: &mut dyn Write,
        records: &[R],
        options: &WriterOptions,
    ) -> Result<()> {
        let mut wtr = WriterBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .has_headers(false)
            .from_writer(out);
        if option_flag(options, "header") {
            let width = records.iter().map(|r| r.to_row().len()).max().unwrap_or(2);
            wtr.write_record(header_row(width))
                .context("write header row")?;
        }
        for (i, rec) in records.iter().enumerate() {
            wtr.write_record(rec.to_row())
                .with_context(|| format!("write row #{}", i + 1))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl<R: Record> RecordReader<R> for Delimited {
    fn read_records(&self, input: &mut dyn BufRead, options: &WriterOptions) -> Result<Vec<R>> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .has_headers(option_flag(options, "header"))
            .from_reader(input);
        let mut out = Vec::<R>::new();
        for (i, row) in rdr.records().enumerate() {
            let row = row.with_context(|| format!("read row #{}", i + 1))?;
            let cells: Vec<String> = row.iter().map(str::to_string).collect();
            let rec = R::from_row(&cells).with_context(|| format!("parse row #{}", i + 1))?;
            out.push(rec);
        }
        Ok(out)
    }
}
