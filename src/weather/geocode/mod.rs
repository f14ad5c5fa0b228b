
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::GeocodingConfig;
use crate::{AugurError, Result};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// A resolved place: coordinates plus a human-readable name
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

/// Resolves free-text locations and US zip codes to coordinates.
///
/// Five ASCII digits dispatch to the zip lookup backend; anything else
/// goes to the free-text geocoder, first candidate wins.
pub struct LocationResolver {
    agent: ureq::Agent,
    zip_endpoint: Url,
    search_endpoint: Url,
    user_agent: String,
}

#[derive(Debug, Deserialize)]
struct ZipResponse {
    places: Vec<ZipPlace>,
}

#[derive(Debug, Deserialize)]
struct ZipPlace {
    #[serde(rename = "place name")]
    place_name: String,
    state: String,
    latitude: String,
    longitude: String,
}

#[derive(Debug, Deserialize)]
struct SearchCandidate {
    lat: String,
    lon: String,
    display_name: String,
}

fn is_us_zip(location: &str) -> bool {
    location.len() == 5 && location.chars().all(|c| c.is_ascii_digit())
}

fn parse_coordinate(raw: &str) -> Result<f64> {
    raw.parse()
        .map_err(|_| AugurError::MalformedResponse(format!("unparseable coordinate: {raw:?}")))
}

impl LocationResolver {
    #[inline]
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let zip_endpoint = config
            .zip_endpoint_url()
            .map_err(|e| AugurError::Config(e.to_string()))?;
        let search_endpoint = config
            .search_endpoint_url()
            .map_err(|e| AugurError::Config(e.to_string()))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            agent,
            zip_endpoint,
            search_endpoint,
            user_agent: config.user_agent.clone(),
        })
    }

    #[inline]
    pub fn resolve(&self, location: &str) -> Result<Location> {
        if is_us_zip(location) {
            self.resolve_zip(location)
        } else {
            self.resolve_free_text(location)
        }
    }

    fn resolve_zip(&self, zip: &str) -> Result<Location> {
        let url = self
            .zip_endpoint
            .join(&format!("us/{zip}"))
            .map_err(|e| AugurError::Config(format!("invalid zip lookup URL: {e}")))?;

        debug!("Resolving zip code {} via {}", zip, url);

        let body = self.get(&url, zip)?;
        let response: ZipResponse = serde_json::from_str(&body).map_err(|e| {
            AugurError::MalformedResponse(format!("invalid zip lookup payload: {e}"))
        })?;

        let place = response
            .places
            .first()
            .ok_or_else(|| AugurError::NotFound(format!("no places returned for zip {zip}")))?;

        Ok(Location {
            latitude: parse_coordinate(&place.latitude)?,
            longitude: parse_coordinate(&place.longitude)?,
            display_name: format!("{}, {}", place.place_name, place.state),
        })
    }

    fn resolve_free_text(&self, location: &str) -> Result<Location> {
        let mut url = self
            .search_endpoint
            .join("search")
            .map_err(|e| AugurError::Config(format!("invalid geocoding URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("q", location)
            .append_pair("format", "json")
            .append_pair("limit", "1");

        debug!("Geocoding {:?} via {}", location, url);

        let body = self.get(&url, location)?;
        let candidates: Vec<SearchCandidate> = serde_json::from_str(&body).map_err(|e| {
            AugurError::MalformedResponse(format!("invalid geocoding payload: {e}"))
        })?;

        let candidate = candidates
            .into_iter()
            .next()
            .ok_or_else(|| AugurError::NotFound(format!("no geocoding match for {location:?}")))?;

        Ok(Location {
            latitude: parse_coordinate(&candidate.lat)?,
            longitude: parse_coordinate(&candidate.lon)?,
            display_name: candidate.display_name,
        })
    }

    fn get(&self, url: &Url, location: &str) -> Result<String> {
        self.agent
            .get(url.as_str())
            .header("User-Agent", self.user_agent.as_str())
            .call()
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| AugurError::NotFound(format!("lookup failed for {location:?}: {e}")))
    }
}
