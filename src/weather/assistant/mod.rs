#[cfg(test)]
mod tests;

use anyhow::Context;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use super::forecast::{WeatherFetcher, WeatherReport};
use super::geocode::LocationResolver;
use crate::mistral::{ChatMessage, MistralClient, Tool};
use crate::{AugurError, Result};

pub const WEATHER_TOOL_NAME: &str = "get_weather";

/// The single tool declared to the model
#[inline]
pub fn weather_tool() -> Tool {
    Tool::function(
        WEATHER_TOOL_NAME,
        "Get the current weather for a location",
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The city name or ZIP code, e.g. New York or 10001"
                }
            },
            "required": ["location"]
        }),
    )
}

/// Tool arguments as the model produces them; parsed as untrusted input
#[derive(Debug, Deserialize)]
struct WeatherArguments {
    location: String,
}

/// The model's final answer plus the structured report it was grounded in
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherAnswer {
    pub answer: String,
    pub report: WeatherReport,
}

/// Runs the weather tool-calling round trip: question with a declared
/// tool, tool execution, then a second completion over the tool result
pub struct WeatherAssistant {
    llm: Arc<MistralClient>,
    resolver: LocationResolver,
    fetcher: WeatherFetcher,
}

impl WeatherAssistant {
    #[inline]
    pub fn new(llm: Arc<MistralClient>, resolver: LocationResolver, fetcher: WeatherFetcher) -> Self {
        Self {
            llm,
            resolver,
            fetcher,
        }
    }

    /// Ask about the weather at `location`. The model decides whether to
    /// call the tool; declining is reported as `NoToolInvocation` with no
    /// fallback heuristic.
    #[inline]
    pub fn ask(&self, location: &str, use_fahrenheit: bool) -> Result<WeatherAnswer> {
        let unit_name = if use_fahrenheit { "Fahrenheit" } else { "Celsius" };
        let question = format!(
            "What's the weather like in {location}? Please provide the temperature in {unit_name}."
        );

        let mut messages = vec![ChatMessage::user(question)];
        let assistant = self
            .llm
            .complete_with_tools(&messages, &[weather_tool()])?;

        let call = assistant
            .tool_calls
            .as_ref()
            .and_then(|calls| calls.first())
            .cloned()
            .ok_or(AugurError::NoToolInvocation)?;

        if call.function.name != WEATHER_TOOL_NAME {
            return Err(AugurError::MalformedResponse(format!(
                "model called undeclared tool {:?}",
                call.function.name
            )));
        }

        let arguments: WeatherArguments =
            serde_json::from_str(&call.function.arguments).map_err(|e| {
                AugurError::MalformedResponse(format!("invalid tool arguments: {e}"))
            })?;

        debug!("Model requested weather for {:?}", arguments.location);

        let resolved = self.resolver.resolve(&arguments.location)?;
        let report = self.fetcher.fetch(&resolved, use_fahrenheit)?;

        let payload =
            serde_json::to_string(&report).context("Failed to serialize weather report")?;

        messages.push(assistant);
        messages.push(ChatMessage::tool(WEATHER_TOOL_NAME, payload, call.id));

        let answer = self.llm.complete(&messages)?;

        info!("Completed weather answer for {}", report.location);
        Ok(WeatherAnswer { answer, report })
    }
}
