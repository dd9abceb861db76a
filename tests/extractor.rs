use anyhow::{Result, bail};
use stagekit::io::json::read_json_array;
use stagekit::testing::{Workspace, assert_files_identical, read_decoded, tagged_lines};
use stagekit::{
    ExtractRequest, Extractor, LabeledRecord, RecordExtractor, Stage, StageOptions, StageResult,
    StreamExtractor,
};
use std::io::{BufRead, Read};
use std::path::Path;

type Rec = LabeledRecord<String>;

fn tagged_line_parser() -> impl RecordExtractor<Record = Rec> {
    StreamExtractor::new(|input: &mut dyn BufRead, _req: &ExtractRequest| {
        let mut out = Vec::new();
        for (i, line) in input.lines().enumerate() {
            let line = line?;
            match line.split_once('\t') {
                Some((label, text)) => {
                    out.push(LabeledRecord::labeled(label, vec![text.to_string()]).with_id(i as u64))
                }
                None => bail!("line {} has no label", i + 1),
            }
        }
        Ok(out)
    })
}

fn options(ws: &Workspace, input: &Path, output: &str) -> StageOptions {
    StageOptions::default()
        .with_input_file(input)
        .with_output_file(ws.path(output))
}

#[test]
fn test_extracts_to_json_array() -> Result<()> {
    let ws = Workspace::new()?;
    let input = ws.write_text("snippets.txt", tagged_lines())?;
    let opts = options(&ws, &input, "snippets.json");

    let mut stage = Extractor::new(&opts, tagged_line_parser())?;
    assert_eq!(stage.run(), StageResult::Success);
    assert_eq!(stage.status(), StageResult::Success);

    let text = std::fs::read_to_string(ws.path("snippets.json"))?;
    assert!(text.starts_with("[\n  {"), "output should be indented: {text}");
    let back: Vec<Rec> = read_json_array(&mut text.as_bytes())?;
    assert_eq!(back.len(), 5);
    assert_eq!(back, stage.extracted_records());
    assert_eq!(back[1].label.as_deref(), Some("rust"));
    Ok(())
}

#[test]
fn test_empty_extraction_writes_nothing() -> Result<()> {
    let ws = Workspace::new()?;
    let input = ws.write_text("empty.txt", "")?;
    let opts = options(&ws, &input, "empty.json");

    let mut stage = Extractor::new(&opts, tagged_line_parser())?;
    assert_eq!(stage.run(), StageResult::Success);
    assert!(!ws.path("empty.json").exists());
    Ok(())
}

#[test]
fn test_missing_input() -> Result<()> {
    let ws = Workspace::new()?;
    let opts = options(&ws, &ws.path("nope.txt"), "out.json");
    let mut stage = Extractor::new(&opts, tagged_line_parser())?;
    assert_eq!(stage.run(), StageResult::InputError);
    assert!(!ws.path("out.json").exists());
    Ok(())
}

#[test]
fn test_plugin_error_is_input_error() -> Result<()> {
    let ws = Workspace::new()?;
    let input = ws.write_text("bad.txt", "no tab here\n")?;
    let opts = options(&ws, &input, "bad.json");
    let mut stage = Extractor::new(&opts, tagged_line_parser())?;
    assert_eq!(stage.run(), StageResult::InputError);
    assert!(!ws.path("bad.json").exists());
    Ok(())
}

#[test]
fn test_existing_output_without_overwrite() -> Result<()> {
    let ws = Workspace::new()?;
    let input = ws.write_text("snippets.txt", tagged_lines())?;
    let existing = ws.write_text("snippets.json", "keep me")?;
    let opts = options(&ws, &input, "snippets.json");

    let mut stage = Extractor::new(&opts, tagged_line_parser())?;
    assert_eq!(stage.run(), StageResult::OutputError);
    assert_eq!(std::fs::read_to_string(existing)?, "keep me");
    Ok(())
}

#[test]
fn test_overwrite_is_reproducible() -> Result<()> {
    let ws = Workspace::new()?;
    let input = ws.write_text("snippets.txt", tagged_lines())?;
    let opts = options(&ws, &input, "snippets.json").with_overwrite(true);

    assert_eq!(Extractor::new(&opts, tagged_line_parser())?.run(), StageResult::Success);
    let first = ws.path("first.json");
    std::fs::copy(ws.path("snippets.json"), &first)?;
    assert_eq!(Extractor::new(&opts, tagged_line_parser())?.run(), StageResult::Success);
    assert_files_identical(&first, &ws.path("snippets.json"));
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn test_compressed_output_matches_plain() -> Result<()> {
    let ws = Workspace::new()?;
    let input = ws.write_text("snippets.txt", tagged_lines())?;

    let plain = options(&ws, &input, "snippets.json");
    assert_eq!(Extractor::new(&plain, tagged_line_parser())?.run(), StageResult::Success);

    let gz = options(&ws, &input, "snippets.json.gz").with_compress(true);
    assert_eq!(Extractor::new(&gz, tagged_line_parser())?.run(), StageResult::Success);

    assert_eq!(
        read_decoded(&ws.path("snippets.json.gz")),
        std::fs::read(ws.path("snippets.json"))?
    );
    Ok(())
}

#[test]
fn test_limit_caps_records() -> Result<()> {
    let ws = Workspace::new()?;
    let input = ws.write_text("snippets.txt", tagged_lines())?;
    let opts = options(&ws, &input, "snippets.json").with_limit(2);

    let mut stage = Extractor::new(&opts, tagged_line_parser())?;
    assert_eq!(stage.run(), StageResult::Success);
    let back: Vec<Rec> = read_json_array(&mut std::fs::read(ws.path("snippets.json"))?.as_slice())?;
    assert_eq!(back.len(), 2);
    Ok(())
}

#[test]
fn test_unknown_codec_is_invalid_options() {
    let opts = StageOptions::default()
        .with_input_file("in.txt")
        .with_output_file("out.json")
        .with_compress(true)
        .with_compression("rar");
    let err = Extractor::new(&opts, tagged_line_parser()).err().map(|e| e.result());
    assert_eq!(err, Some(StageResult::InvalidOptions));
}

#[test]
fn test_second_run_refused() -> Result<()> {
    let ws = Workspace::new()?;
    let input = ws.write_text("snippets.txt", tagged_lines())?;
    let opts = options(&ws, &input, "snippets.json").with_overwrite(true);
    let mut stage = Extractor::new(&opts, tagged_line_parser())?;
    assert_eq!(stage.run(), StageResult::Success);
    assert_eq!(stage.run(), StageResult::InvalidOptions);
    Ok(())
}

#[test]
fn test_request_reaches_plugin() -> Result<()> {
    let ws = Workspace::new()?;
    let input = ws.write_text("bytes.bin", "0123456789")?;
    // one record per batch, carrying the batch length
    let batches = StreamExtractor::new(|input: &mut dyn BufRead, req: &ExtractRequest| {
        let size = req.batch_size.unwrap_or(1);
        let mut body = Vec::new();
        input.read_to_end(&mut body)?;
        let tag = req.options.get("tag").cloned().unwrap_or_default();
        Ok(body
            .chunks(size)
            .map(|c| LabeledRecord::labeled(tag.clone(), vec![c.len() as u64]))
            .collect::<Vec<_>>())
    });
    let opts = options(&ws, &input, "bytes.json")
        .with_batch_size(4)
        .with_writer_option("tag", "chunk");

    let mut stage = Extractor::new(&opts, batches)?;
    assert_eq!(stage.run(), StageResult::Success);
    let lens: Vec<Vec<u64>> = stage.extracted_records().iter().map(|r| r.features.clone()).collect();
    assert_eq!(lens, vec![vec![4], vec![4], vec![2]]);
    assert_eq!(stage.extracted_records()[0].label.as_deref(), Some("chunk"));
    Ok(())
}
