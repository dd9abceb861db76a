//! Pre-built record sets for stage tests.

use crate::record::LabeledRecord;
use ordered_float::OrderedFloat;

/// `n` records with ids `0..n`, labels cycling through three languages and a
/// single text feature.
///
/// # Example
///
/// ```
/// use stagekit::testing::numbered_records;
///
/// let records = numbered_records(100);
/// assert_eq!(records.len(), 100);
/// assert_eq!(records[7].id, Some(7));
/// ```
#[must_use]
pub fn numbered_records(n: usize) -> Vec<LabeledRecord<String>> {
    const LABELS: [&str; 3] = ["python", "rust", "c"];
    (0..n)
        .map(|i| {
            LabeledRecord::labeled(LABELS[i % LABELS.len()], vec![format!("snippet {i}")])
                .with_id(i as u64)
        })
        .collect()
}

/// Numeric records (`[i, i * i]`) without labels, for formats that only care
/// about feature values.
#[must_use]
pub fn numeric_records(n: usize) -> Vec<LabeledRecord<i64>> {
    (0..n as i64)
        .map(|i| LabeledRecord::new(vec![i, i * i]).with_id(i as u64))
        .collect()
}

/// Labeled float records (`[i / 2, sqrt(i)]`). Every fourth record carries a
/// non-finite value: `inf`, `-inf` and `NaN` in turn.
#[must_use]
pub fn float_records(n: usize) -> Vec<LabeledRecord<OrderedFloat<f64>>> {
    const SPECIAL: [f64; 3] = [f64::INFINITY, f64::NEG_INFINITY, f64::NAN];
    (0..n)
        .map(|i| {
            let x = i as f64;
            let second = if i % 4 == 3 { SPECIAL[(i / 4) % SPECIAL.len()] } else { x.sqrt() };
            let label = if i % 2 == 0 { "even" } else { "odd" };
            LabeledRecord::labeled(label, vec![OrderedFloat(x / 2.0), OrderedFloat(second)])
                .with_id(i as u64)
        })
        .collect()
}

/// Source text for extractor tests: one `label<TAB>text` pair per line.
#[must_use]
pub fn tagged_lines() -> &'static str {
    "python\tprint('hello')\n\
     rust\tfn main() {}\n\
     c\tint main(void) { return 0; }\n\
     rust\tlet x = 1;\n\
     python\timport os\n"
}
