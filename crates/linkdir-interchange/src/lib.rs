//! Conversion between stored links and external bookmark formats.
//!
//! Parsing is all-or-nothing per file and yields unvalidated
//! [`LinkCandidate`]s; record-level validation happens at import time.
//! Both formats are lossy.

pub mod csv;
pub mod error;
pub mod html;

pub use csv::{export_csv, parse_csv};
pub use error::InterchangeError;
pub use html::{export_bookmarks_html, parse_bookmarks_html};

use linkdir_core::LinkCandidate;

/// Candidates recovered from one import file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parsed {
    pub links: Vec<LinkCandidate>,
    /// Rows or anchors discarded for lacking a name or URL.
    pub dropped: usize,
}
