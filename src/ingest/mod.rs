/// Ingest clients for external data feeds.
///
/// Submodules:
/// - `ovation` — NOAA SWPC OVATION aurora probability grid.

use crate::model::{FeedError, GridSample};

pub mod ovation;

/// The feed seam consumed by the evaluation engine: one call, one grid.
///
/// The production implementation is `ovation::OvationSource`; tests supply
/// canned grids or forced failures.
pub trait GridSource {
    fn fetch(&self) -> Result<Vec<GridSample>, FeedError>;
}
