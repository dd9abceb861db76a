//! Assertion functions for stage outputs.

use crate::io::compression::open_input;
use std::fmt::Debug;
use std::io::Read;
use std::path::Path;

/// Assert that `test ++ training` reproduces `original`, in order, and that
/// the test set holds `original.len() / split` records.
///
/// # Panics
///
/// Panics with both sets in the message if the partition is wrong.
///
/// # Example
///
/// ```
/// use stagekit::loader::split_records;
/// use stagekit::testing::assert_split_preserves_order;
///
/// let data: Vec<u32> = (0..20).collect();
/// let (test, train) = split_records(&data, 4);
/// assert_split_preserves_order(&data, &test, &train, 4);
/// ```
pub fn assert_split_preserves_order<T: Debug + PartialEq>(
    original: &[T],
    test: &[T],
    training: &[T],
    split: u32,
) {
    let expected_test = original.len() / split as usize;
    assert_eq!(
        test.len(),
        expected_test,
        "Test set size mismatch for {} records at split {split}:\n  Expected: {expected_test}\n  Actual: {}",
        original.len(),
        test.len()
    );
    assert_eq!(
        test.len() + training.len(),
        original.len(),
        "Split lost or duplicated records:\n  Test: {test:?}\n  Training: {training:?}"
    );
    for (i, (a, e)) in test.iter().chain(training).zip(original).enumerate() {
        assert_eq!(
            a, e,
            "Order mismatch at index {i}:\n  Expected: {e:?}\n  Actual: {a:?}"
        );
    }
}

/// Assert that two files hold identical bytes.
///
/// # Panics
///
/// Panics if either file cannot be read or the contents differ.
pub fn assert_files_identical(a: &Path, b: &Path) {
    let left = std::fs::read(a).unwrap_or_else(|e| panic!("read {}: {e}", a.display()));
    let right = std::fs::read(b).unwrap_or_else(|e| panic!("read {}: {e}", b.display()));
    assert!(
        left == right,
        "Files differ:\n  {} ({} bytes)\n  {} ({} bytes)",
        a.display(),
        left.len(),
        b.display(),
        right.len()
    );
}

/// Read a file through the same decompression the stages use.
///
/// # Panics
///
/// Panics if the file cannot be opened or decoded.
#[must_use]
pub fn read_decoded(path: &Path) -> Vec<u8> {
    let mut rdr = open_input(path).unwrap_or_else(|e| panic!("open {}: {e:#}", path.display()));
    let mut buf = Vec::new();
    rdr.read_to_end(&mut buf)
        .unwrap_or_else(|e| panic!("decode {}: {e}", path.display()));
    buf
}
