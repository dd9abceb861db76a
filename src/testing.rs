//! Testing utilities for stages and their plug-ins.
//!
//! - **Fixtures**: ready-made record sets ([`numbered_records`], [`numeric_records`])
//! - **Assertions**: split and file checks ([`assert_split_preserves_order`],
//!   [`assert_files_identical`], [`read_decoded`])
//! - **Workspace**: a self-cleaning scratch directory for stage inputs and outputs
//!
//! # Quick Start
//!
//! ```no_run
//! use stagekit::testing::*;
//! use stagekit::{Delimited, LabeledRecord, Loader, Stage, StageOptions, StageResult};
//!
//! # fn main() -> anyhow::Result<()> {
//! let ws = Workspace::new()?;
//! let input = ws.write_records("records.json", &numbered_records(100))?;
//! let opts = StageOptions::default()
//!     .with_input_file(input)
//!     .with_output_prefix(ws.path("langs").to_string_lossy());
//! let mut loader = Loader::<LabeledRecord<String>, _>::new(&opts, Delimited::tsv())?;
//! assert_eq!(loader.run(), StageResult::Success);
//! assert_eq!(loader.test_records().len(), 12);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod workspace;

pub use assertions::*;
pub use fixtures::*;
pub use workspace::*;
