#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests for geocoding, forecast lookup, and the weather
// tool-calling round trip, all against mock servers

use augur::AugurError;
use augur::config::{ForecastConfig, GeocodingConfig, MistralConfig};
use augur::mistral::MistralClient;
use augur::weather::{Location, LocationResolver, WeatherAssistant, WeatherFetcher};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn geocoding_config(server: &MockServer) -> GeocodingConfig {
    GeocodingConfig {
        zip_endpoint: server.uri(),
        search_endpoint: server.uri(),
        user_agent: "augur-test/0.0".to_string(),
    }
}

fn new_york_zip_payload() -> serde_json::Value {
    json!({
        "post code": "10001",
        "country": "United States",
        "places": [
            {
                "place name": "New York",
                "state": "New York",
                "state abbreviation": "NY",
                "latitude": "40.7484",
                "longitude": "-73.9967"
            }
        ]
    })
}

async fn mount_zip_lookup(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/us/10001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(new_york_zip_payload()))
        .mount(server)
        .await;
}

async fn mount_forecast(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("current", "temperature_2m,relative_humidity_2m,weather_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "latitude": 40.75,
            "longitude": -74.0,
            "current": {
                "time": "2026-08-04T12:00",
                "temperature_2m": 72.5,
                "relative_humidity_2m": 40.0,
                "weather_code": 0
            }
        })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn zip_codes_resolve_via_the_zip_backend() {
    let server = MockServer::start().await;
    mount_zip_lookup(&server).await;

    let resolver = LocationResolver::new(&geocoding_config(&server)).expect("resolver should build");
    let location = tokio::task::spawn_blocking(move || resolver.resolve("10001"))
        .await
        .expect("task should not panic")
        .expect("zip should resolve");

    assert!((location.latitude - 40.75).abs() < 0.05);
    assert!((location.longitude - -73.99).abs() < 0.05);
    assert!(location.display_name.contains("New York"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn free_text_resolves_via_the_search_backend() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Paris"))
        .and(query_param("format", "json"))
        .and(query_param("limit", "1"))
        .and(header("User-Agent", "augur-test/0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "lat": "48.8566",
                "lon": "2.3522",
                "display_name": "Paris, Île-de-France, France"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = LocationResolver::new(&geocoding_config(&server)).expect("resolver should build");
    let location = tokio::task::spawn_blocking(move || resolver.resolve("Paris"))
        .await
        .expect("task should not panic")
        .expect("free text should resolve");

    assert!((location.latitude - 48.8566).abs() < 1e-6);
    assert_eq!(location.display_name, "Paris, Île-de-France, France");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_zip_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/us/00000"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let resolver = LocationResolver::new(&geocoding_config(&server)).expect("resolver should build");
    let result = tokio::task::spawn_blocking(move || resolver.resolve("00000"))
        .await
        .expect("task should not panic");

    assert!(matches!(result, Err(AugurError::NotFound(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_candidate_list_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let resolver = LocationResolver::new(&geocoding_config(&server)).expect("resolver should build");
    let result = tokio::task::spawn_blocking(move || resolver.resolve("Nowhereville"))
        .await
        .expect("task should not panic");

    assert!(matches!(result, Err(AugurError::NotFound(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn garbled_coordinates_are_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/us/10001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "places": [
                { "place name": "New York", "state": "New York", "latitude": "north", "longitude": "west" }
            ]
        })))
        .mount(&server)
        .await;

    let resolver = LocationResolver::new(&geocoding_config(&server)).expect("resolver should build");
    let result = tokio::task::spawn_blocking(move || resolver.resolve("10001"))
        .await
        .expect("task should not panic");

    assert!(matches!(result, Err(AugurError::MalformedResponse(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn forecast_builds_a_report() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("temperature_unit", "fahrenheit"))
        .and(query_param("forecast_days", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "current": {
                "temperature_2m": 72.5,
                "relative_humidity_2m": 40.0,
                "weather_code": 2
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = WeatherFetcher::new(&ForecastConfig {
        endpoint: server.uri(),
    })
    .expect("fetcher should build");

    let location = Location {
        latitude: 40.7484,
        longitude: -73.9967,
        display_name: "New York, New York".to_string(),
    };

    let report = tokio::task::spawn_blocking(move || fetcher.fetch(&location, true))
        .await
        .expect("task should not panic")
        .expect("fetch should succeed");

    assert_eq!(report.temperature, 72.5);
    assert_eq!(report.humidity, 40.0);
    assert_eq!(report.condition, "Partly cloudy");
    assert_eq!(report.unit, "°F");
    assert_eq!(report.location, "New York, New York");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn forecast_failure_is_a_fetch_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = WeatherFetcher::new(&ForecastConfig {
        endpoint: server.uri(),
    })
    .expect("fetcher should build");

    let location = Location {
        latitude: 40.7484,
        longitude: -73.9967,
        display_name: "New York, New York".to_string(),
    };

    let result = tokio::task::spawn_blocking(move || fetcher.fetch(&location, false))
        .await
        .expect("task should not panic");

    assert!(matches!(result, Err(AugurError::Fetch(_))));
}

fn test_assistant(server: &MockServer) -> WeatherAssistant {
    let mistral = MistralConfig {
        endpoint: server.uri(),
        ..MistralConfig::default()
    };
    let client = Arc::new(
        MistralClient::new(&mistral, "test-key")
            .expect("failed to create client")
            .with_timeout(Duration::from_secs(5))
            .with_retry_attempts(1),
    );
    let resolver = LocationResolver::new(&geocoding_config(server)).expect("resolver should build");
    let fetcher = WeatherFetcher::new(&ForecastConfig {
        endpoint: server.uri(),
    })
    .expect("fetcher should build");

    WeatherAssistant::new(client, resolver, fetcher)
}

fn tool_call_reply(arguments: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [
            {
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {
                            "id": "call-1",
                            "function": {
                                "name": "get_weather",
                                "arguments": arguments
                            }
                        }
                    ]
                }
            }
        ]
    }))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tool_round_trip_produces_an_answer() {
    let server = MockServer::start().await;

    // first call declares the tool; the model elects to invoke it
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("\"tools\""))
        .respond_with(tool_call_reply("{\"location\": \"10001\"}"))
        .expect(1)
        .mount(&server)
        .await;

    mount_zip_lookup(&server).await;
    mount_forecast(&server).await;

    // second call carries the tool result back for the final answer
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("tool_call_id"))
        .and(body_string_contains("Clear sky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                {
                    "message": {
                        "role": "assistant",
                        "content": "It's a clear 72.5°F in New York right now."
                    }
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let assistant = test_assistant(&server);
    let answer = tokio::task::spawn_blocking(move || assistant.ask("10001", true))
        .await
        .expect("task should not panic")
        .expect("weather question should succeed");

    assert_eq!(answer.answer, "It's a clear 72.5°F in New York right now.");
    assert_eq!(answer.report.condition, "Clear sky");
    assert_eq!(answer.report.unit, "°F");
    assert!(answer.report.location.contains("New York"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn declined_tool_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                { "message": { "role": "assistant", "content": "I cannot help with that." } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let assistant = test_assistant(&server);
    let result = tokio::task::spawn_blocking(move || assistant.ask("10001", false))
        .await
        .expect("task should not panic");

    assert!(matches!(result, Err(AugurError::NoToolInvocation)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn undeclared_tool_name_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                {
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [
                            {
                                "id": "call-1",
                                "function": { "name": "launch_rockets", "arguments": "{}" }
                            }
                        ]
                    }
                }
            ]
        })))
        .mount(&server)
        .await;

    let assistant = test_assistant(&server);
    let result = tokio::task::spawn_blocking(move || assistant.ask("10001", false))
        .await
        .expect("task should not panic");

    assert!(matches!(result, Err(AugurError::MalformedResponse(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn garbage_tool_arguments_are_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(tool_call_reply("not json at all"))
        .mount(&server)
        .await;

    let assistant = test_assistant(&server);
    let result = tokio::task::spawn_blocking(move || assistant.ask("10001", false))
        .await
        .expect("task should not panic");

    assert!(matches!(result, Err(AugurError::MalformedResponse(_))));
}
