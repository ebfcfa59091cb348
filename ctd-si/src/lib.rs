//! ctd-si library - Sheet Ingest module
//!
//! Pulls the source workbook from the Sheets API, coerces cell values, and
//! fully replaces the assessment store contents in one transaction.

pub mod sheets;
pub mod sync;

pub use sheets::{SheetSet, SheetTable, SheetsClient};
pub use sync::{full_refresh, is_populated, run_sync};
