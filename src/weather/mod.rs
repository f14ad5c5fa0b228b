// Weather assistant module
// Location resolution, current-conditions lookup, and the tool-calling
// round trip that ties them to the chat model

pub mod assistant;
pub mod forecast;
pub mod geocode;

pub use assistant::{WeatherAnswer, WeatherAssistant};
pub use forecast::{WeatherFetcher, WeatherReport, describe_weather_code};
pub use geocode::{Location, LocationResolver};
