/// NOAA SWPC OVATION Aurora Forecast client
///
/// Retrieves the latest aurora probability grid from the Space Weather
/// Prediction Center. The feed is a single JSON document republished every
/// few minutes; one fetch covers the whole globe, so the engine calls this
/// exactly once per evaluation cycle.
///
/// Feed: https://services.swpc.noaa.gov/json/ovation_aurora_latest.json

use std::time::Duration;

use serde::Deserialize;

use crate::model::{FeedError, GridSample};

/// Default OVATION feed endpoint. Overridable via configuration, mainly so
/// tests can point at a local fixture server.
pub const OVATION_LATEST_URL: &str =
    "https://services.swpc.noaa.gov/json/ovation_aurora_latest.json";

// ============================================================================
// SWPC API Response Structures
// ============================================================================

/// Top-level OVATION response.
///
/// The grid lives in `coordinates` as `[longitude, latitude, probability]`
/// triples (longitudes 0–359, latitudes -90–90, probabilities 0–100). The
/// timestamps are carried through for logging only.
#[derive(Debug, Deserialize)]
pub struct OvationResponse {
    #[serde(rename = "Observation Time")]
    pub observation_time: Option<String>,
    #[serde(rename = "Forecast Time")]
    pub forecast_time: Option<String>,
    #[serde(default)]
    pub coordinates: Vec<(f64, f64, i32)>,
}

// ============================================================================
// API Client Functions
// ============================================================================

/// Fetch the latest probability grid.
///
/// A single GET with a hard timeout; no retry here — the scheduler's next
/// tick is the retry. Any failure mode (transport, non-2xx, unparseable
/// body, missing or empty grid) is a `FeedError` that aborts the cycle.
pub fn fetch_grid(
    client: &reqwest::blocking::Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<GridSample>, FeedError> {
    let response = client
        .get(url)
        .header("Accept", "application/json")
        .timeout(timeout)
        .send()
        .map_err(|e| FeedError::RequestFailed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(FeedError::HttpError(response.status().as_u16()));
    }

    let body = response
        .text()
        .map_err(|e| FeedError::RequestFailed(e.to_string()))?;

    parse_grid_response(&body)
}

/// Parse an OVATION JSON document into grid samples.
///
/// Split out from `fetch_grid` so parsing can be tested against captured
/// payloads without a network round-trip.
pub fn parse_grid_response(body: &str) -> Result<Vec<GridSample>, FeedError> {
    let parsed: OvationResponse =
        serde_json::from_str(body).map_err(|e| FeedError::ParseError(e.to_string()))?;

    if parsed.coordinates.is_empty() {
        return Err(FeedError::EmptyGrid);
    }

    let samples = parsed
        .coordinates
        .into_iter()
        .map(|(longitude, latitude, value)| GridSample {
            longitude,
            latitude,
            value,
        })
        .collect();

    Ok(samples)
}

// ============================================================================
// GridSource Implementation
// ============================================================================

/// Production grid source: a configured HTTP client pointed at the feed.
pub struct OvationSource {
    client: reqwest::blocking::Client,
    url: String,
    timeout: Duration,
}

impl OvationSource {
    pub fn new(client: reqwest::blocking::Client, url: String, timeout: Duration) -> Self {
        Self {
            client,
            url,
            timeout,
        }
    }
}

impl crate::ingest::GridSource for OvationSource {
    fn fetch(&self) -> Result<Vec<GridSample>, FeedError> {
        fetch_grid(&self.client, &self.url, self.timeout)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed_response() {
        let body = r#"{
            "Observation Time": "2026-03-01T12:05:00Z",
            "Forecast Time": "2026-03-01T12:35:00Z",
            "Data Format": "[Longitude, Latitude, Aurora]",
            "coordinates": [[0, -90, 3], [270, 65, 42], [359, 89, 7]]
        }"#;

        let samples = parse_grid_response(body).expect("valid payload should parse");
        assert_eq!(samples.len(), 3);
        assert_eq!(
            samples[1],
            GridSample {
                longitude: 270.0,
                latitude: 65.0,
                value: 42
            }
        );
    }

    #[test]
    fn test_parse_preserves_feed_order() {
        // Nearest-sample tie-breaking is first-wins, so input order matters.
        let body = r#"{"coordinates": [[10, 10, 1], [20, 20, 2], [30, 30, 3]]}"#;
        let samples = parse_grid_response(body).unwrap();
        let values: Vec<i32> = samples.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_coordinates_is_a_feed_error() {
        let body = r#"{"Observation Time": "2026-03-01T12:05:00Z", "coordinates": []}"#;
        assert_eq!(parse_grid_response(body), Err(FeedError::EmptyGrid));
    }

    #[test]
    fn test_missing_coordinates_is_a_feed_error() {
        // Some SWPC outages serve a document with the grid field absent
        // entirely; treat that the same as an empty grid.
        let body = r#"{"Observation Time": "2026-03-01T12:05:00Z"}"#;
        assert_eq!(parse_grid_response(body), Err(FeedError::EmptyGrid));
    }

    #[test]
    fn test_non_json_body_is_a_parse_error() {
        let result = parse_grid_response("<html>503 Service Unavailable</html>");
        assert!(
            matches!(result, Err(FeedError::ParseError(_))),
            "HTML error page should be a parse error, got {:?}",
            result
        );
    }

    #[test]
    fn test_malformed_triple_is_a_parse_error() {
        let body = r#"{"coordinates": [[10, 10], [20, 20, 2]]}"#;
        assert!(matches!(
            parse_grid_response(body),
            Err(FeedError::ParseError(_))
        ));
    }
}
