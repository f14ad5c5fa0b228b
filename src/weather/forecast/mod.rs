
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::geocode::Location;
use crate::config::ForecastConfig;
use crate::{AugurError, Result};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Current conditions for a resolved location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub temperature: f64,
    pub humidity: f64,
    pub condition: String,
    pub unit: String,
    pub location: String,
}

/// Fetches current conditions from the forecast service
pub struct WeatherFetcher {
    agent: ureq::Agent,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    weather_code: u32,
}

/// Human-readable label for a WMO weather code, per the forecast
/// provider's published table
#[inline]
pub fn describe_weather_code(code: u32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

fn unit_label(use_fahrenheit: bool) -> &'static str {
    if use_fahrenheit { "°F" } else { "°C" }
}

impl WeatherFetcher {
    #[inline]
    pub fn new(config: &ForecastConfig) -> Result<Self> {
        let endpoint = config
            .endpoint_url()
            .map_err(|e| AugurError::Config(e.to_string()))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self { agent, endpoint })
    }

    #[inline]
    pub fn fetch(&self, location: &Location, use_fahrenheit: bool) -> Result<WeatherReport> {
        let temperature_unit = if use_fahrenheit { "fahrenheit" } else { "celsius" };

        let mut url = self
            .endpoint
            .join("v1/forecast")
            .map_err(|e| AugurError::Config(format!("invalid forecast URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("latitude", &location.latitude.to_string())
            .append_pair("longitude", &location.longitude.to_string())
            .append_pair("current", "temperature_2m,relative_humidity_2m,weather_code")
            .append_pair("temperature_unit", temperature_unit)
            .append_pair("forecast_days", "1");

        debug!("Fetching current conditions via {}", url);

        let body = self
            .agent
            .get(url.as_str())
            .call()
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| {
                AugurError::Fetch(format!(
                    "forecast lookup failed for {}: {e}",
                    location.display_name
                ))
            })?;

        let response: ForecastResponse = serde_json::from_str(&body)
            .map_err(|e| AugurError::MalformedResponse(format!("invalid forecast payload: {e}")))?;

        Ok(WeatherReport {
            temperature: response.current.temperature_2m,
            humidity: response.current.relative_humidity_2m,
            condition: describe_weather_code(response.current.weather_code).to_string(),
            unit: unit_label(use_fahrenheit).to_string(),
            location: location.display_name.clone(),
        })
    }
}
