//! Extractor -> Loader -> Classifier over one scratch directory.

use anyhow::{Result, anyhow};
use ordered_float::OrderedFloat;
use stagekit::testing::{Workspace, assert_split_preserves_order};
use stagekit::{
    Classifier, Delimited, ExtractRequest, Extractor, Feature, LabeledRecord, Loader, Stage,
    StageOptions, StageResult, StreamExtractor, Trainer, WriterOptions,
};
use std::io::{BufRead, Write};

type Rec = LabeledRecord<String>;

/// Remembers how many records it saw.
#[derive(Default)]
struct Tally(usize, usize);

impl Trainer for Tally {
    type Record = Rec;

    fn train(&mut self, training: &[Rec], test: &[Rec], _options: &WriterOptions) -> Result<()> {
        self.0 = training.len();
        self.1 = test.len();
        Ok(())
    }

    fn write_model(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "training={} test={}", self.0, self.1)?;
        Ok(())
    }
}

fn source_text(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("{}\tline {i}\n", ["en", "fr", "de", "es"][i % 4]))
        .collect()
}

fn run_chain(ws: &Workspace, compress: bool) -> Result<Vec<Rec>> {
    let input = ws.write_text("corpus.txt", &source_text(50))?;
    let extracted = ws.path("corpus.json");
    let prefix = ws.path("corpus").to_string_lossy().into_owned();

    let extract_opts = StageOptions::default()
        .with_input_file(&input)
        .with_output_file(&extracted)
        .with_compress(compress);
    let parse = StreamExtractor::new(|input: &mut dyn BufRead, _req: &ExtractRequest| {
        let mut out = Vec::new();
        for (i, line) in input.lines().enumerate() {
            let line = line?;
            if let Some((label, text)) = line.split_once('\t') {
                out.push(LabeledRecord::labeled(label, vec![text.to_string()]).with_id(i as u64));
            }
        }
        Ok(out)
    });
    let mut extractor = Extractor::new(&extract_opts, parse)?;
    assert_eq!(extractor.run(), StageResult::Success);
    let records = extractor.into_records();

    let load_opts = StageOptions::default()
        .with_input_file(&extracted)
        .with_output_prefix(prefix.clone())
        .with_split(5)
        .with_compress(compress);
    let mut loader = Loader::<Rec, _>::new(&load_opts, Delimited::tsv())?;
    assert_eq!(loader.run(), StageResult::Success);
    assert_split_preserves_order(&records, loader.test_records(), loader.training_records(), 5);

    let train_opts = StageOptions::default()
        .with_training_file(loader.training_file())
        .with_test_file(loader.test_file())
        .with_model_file(format!("{prefix}.model"))
        .with_train(true);
    let mut classifier = Classifier::new(&train_opts, Tally::default(), Delimited::tsv())?;
    assert_eq!(classifier.run(), StageResult::Success);
    assert_eq!(
        std::fs::read_to_string(classifier.model_file())?,
        "training=40 test=10\n"
    );
    Ok(records)
}

#[test]
fn test_plain_chain() -> Result<()> {
    let ws = Workspace::new()?;
    let records = run_chain(&ws, false)?;
    assert_eq!(records.len(), 50);
    assert_eq!(records[3].label.as_deref(), Some("es"));
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn test_compressed_chain() -> Result<()> {
    let ws = Workspace::new()?;
    let records = run_chain(&ws, true)?;
    assert_eq!(records.len(), 50);
    // the hand-off file is gzip despite its .json name
    assert_eq!(&std::fs::read(ws.path("corpus.json"))?[..2], &[0x1f, 0x8b]);
    Ok(())
}

type Point = LabeledRecord<OrderedFloat<f64>>;

/// Counts the non-finite feature values it was trained on.
#[derive(Default)]
struct NonFinite(usize);

impl Trainer for NonFinite {
    type Record = Point;

    fn train(&mut self, training: &[Point], test: &[Point], _options: &WriterOptions) -> Result<()> {
        self.0 = training
            .iter()
            .chain(test)
            .flat_map(|r| &r.features)
            .filter(|v| !v.0.is_finite())
            .count();
        Ok(())
    }

    fn write_model(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "non-finite={}", self.0)?;
        Ok(())
    }
}

#[test]
fn test_float_chain_keeps_non_finite_values() -> Result<()> {
    let ws = Workspace::new()?;
    let special = ["inf", "-inf", "NaN"];
    let source: String = (0..20)
        .map(|i| {
            let y = if i % 5 == 4 { special[(i / 5) % 3].to_string() } else { format!("{}", i as f64 * 0.25) };
            format!("{}\t{i}\t{y}\n", if i % 2 == 0 { "even" } else { "odd" })
        })
        .collect();
    let input = ws.write_text("points.txt", &source)?;
    let extracted = ws.path("points.json");
    let prefix = ws.path("points").to_string_lossy().into_owned();

    let parse = StreamExtractor::new(|input: &mut dyn BufRead, _req: &ExtractRequest| {
        let mut out: Vec<Point> = Vec::new();
        for (i, line) in input.lines().enumerate() {
            let line = line?;
            let mut cells = line.split('\t');
            let label = cells.next().unwrap_or_default().to_string();
            let features = cells
                .map(|c| OrderedFloat::<f64>::from_text(c).ok_or_else(|| anyhow!("bad value {c:?}")))
                .collect::<Result<Vec<_>>>()?;
            out.push(LabeledRecord::labeled(label, features).with_id(i as u64));
        }
        Ok(out)
    });
    let extract_opts = StageOptions::default()
        .with_input_file(&input)
        .with_output_file(&extracted);
    let mut extractor = Extractor::new(&extract_opts, parse)?;
    assert_eq!(extractor.run(), StageResult::Success);
    let records = extractor.into_records();
    assert_eq!(records[9].features[1], OrderedFloat(f64::NEG_INFINITY));

    let load_opts = StageOptions::default()
        .with_input_file(&extracted)
        .with_output_prefix(prefix.clone())
        .with_split(4);
    let mut loader = Loader::<Point, _>::new(&load_opts, Delimited::tsv())?;
    assert_eq!(loader.run(), StageResult::Success);
    assert_eq!(loader.input_records(), records.as_slice());

    let train_opts = StageOptions::default()
        .with_training_file(loader.training_file())
        .with_test_file(loader.test_file())
        .with_model_file(format!("{prefix}.model"))
        .with_train(true);
    let mut classifier = Classifier::new(&train_opts, NonFinite::default(), Delimited::tsv())?;
    assert_eq!(classifier.run(), StageResult::Success);
    assert_eq!(std::fs::read_to_string(classifier.model_file())?, "non-finite=4\n");
    Ok(())
}
