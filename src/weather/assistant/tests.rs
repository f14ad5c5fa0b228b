use super::*;

#[test]
fn tool_declaration_shape() {
    let tool = weather_tool();
    let value = serde_json::to_value(&tool).expect("serialization should succeed");

    assert_eq!(value["type"], "function");
    assert_eq!(value["function"]["name"], WEATHER_TOOL_NAME);
    assert_eq!(
        value["function"]["parameters"]["required"],
        serde_json::json!(["location"])
    );
    assert_eq!(
        value["function"]["parameters"]["properties"]["location"]["type"],
        "string"
    );
}

#[test]
fn tool_arguments_parse() {
    let arguments: WeatherArguments =
        serde_json::from_str(r#"{"location": "10001"}"#).expect("arguments should parse");
    assert_eq!(arguments.location, "10001");
}

#[test]
fn missing_location_argument_is_an_error() {
    let result = serde_json::from_str::<WeatherArguments>(r#"{"city": "New York"}"#);
    assert!(result.is_err());
}

#[test]
fn garbage_arguments_are_an_error() {
    let result = serde_json::from_str::<WeatherArguments>("not json");
    assert!(result.is_err());
}
