//! Report renderers for resolved licenses.
//!
//! - [`terminal`]: colored, tabular output with summary box; respects `--verbose` / `--quiet`.
//! - [`json`]: pretty-printed array of [`ReportEntry`](crate::models::ReportEntry).

pub mod json;
pub mod terminal;
