/// Alert decision logic.
///
/// Submodules:
/// - `dedup` — the notify/suppress policy applied to each alert per cycle.

pub mod dedup;
