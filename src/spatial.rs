/// Nearest-sample resolution for alert coordinates.
///
/// The OVATION grid is global and dense (one sample per degree cell), so an
/// exhaustive scan per alert is fine at the expected scale of hundreds of
/// alerts against low thousands of samples. A spatial index could replace
/// the scan without changing the contract here.

use crate::model::GridSample;

/// Mean Earth radius in kilometers, as used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points, in kilometers.
///
/// Haversine is accurate to well under a kilometer at grid-cell scale,
/// which is far finer than the one-degree spacing of the feed. Longitudes
/// may be in either 0–360 (feed) or -180–180 (alerts) convention; the
/// trigonometry is periodic so no normalization is needed.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Returns the sample nearest to `(lat, lon)`, or `None` for an empty grid.
///
/// Ties resolve to the first sample in input order reaching the minimum.
/// Exact ties are measure-zero in practice, so the stable first-wins rule is
/// enough; what matters is that the result is deterministic for a given feed.
pub fn nearest<'a>(samples: &'a [GridSample], lat: f64, lon: f64) -> Option<&'a GridSample> {
    let mut best: Option<(&GridSample, f64)> = None;

    for sample in samples {
        let dist = haversine_km(lat, lon, sample.latitude, sample.longitude);
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((sample, dist)),
        }
    }

    best.map(|(sample, _)| sample)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
