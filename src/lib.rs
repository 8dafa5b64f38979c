//! # Laudo
//!
//! Print pagination for inspection reports.
//!
//! Inspection reports (CFTV, sprinklers, hydrants, access control, fire
//! alarm panels, air conditioning) are printed as A4 sheets. Each section
//! of a report opens on a page that also carries the section header and
//! column headings; the rest continue on plain pages. Items with many
//! photos spill over several pages.
//!
//! Laudo decides what goes on which sheet before anything is drawn:
//! content is packed INTO pages of known capacity, in source order, and
//! the renderer only lays out what it is handed.
//!
//! ## Architecture
//!
//! ```text
//! Report record (JSON)
//!       ↓
//!   [model]    : sections, items, photos, defaults resolved
//!       ↓
//!   [layout::blocks]  : flatten to weighed blocks, chunk photos
//!       ↓
//!   [layout]   : greedy page packer, page numbering
//!       ↓
//! ReportLayout → renderer
//! ```
//!
//! [`profile`] holds the per-report-type capacities and weights.
//! [`store`], [`upload`] and [`prefs`] are the collaborators around the
//! viewer: record access, file uploads, and user preferences.

pub mod error;
pub mod layout;
pub mod model;
pub mod prefs;
pub mod profile;
pub mod store;
pub mod upload;

pub use error::{LaudoError, Result};

use layout::{Paginator, ReportLayout};
use model::Report;
use profile::PaginationProfile;

/// Paginate a report with the built-in profile for its kind.
///
/// This is the primary entry point.
pub fn paginate(report: &Report) -> ReportLayout {
    Paginator::for_kind(report.kind).paginate(report)
}

/// Paginate a report with an explicit profile.
pub fn paginate_with(report: &Report, profile: PaginationProfile) -> Result<ReportLayout> {
    Ok(Paginator::new(profile)?.paginate(report))
}

/// Paginate a report described as JSON.
pub fn paginate_json(json: &str) -> Result<ReportLayout> {
    let report: Report = serde_json::from_str(json)?;
    Ok(paginate(&report))
}
