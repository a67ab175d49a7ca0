//! Weather tool: canned conditions for a handful of cities.
//!
//! Deterministic so that ReAct runs and crew demos can be exercised end to end
//! without network access.

use async_trait::async_trait;
use crewflow_core::error::ToolError;
use crewflow_core::tool::{Arguments, ParamType, Tool, ToolParam, str_arg};
use serde_json::Value;

pub struct WeatherTool;

/// Current conditions for `city`.
pub fn weather_for(city: &str) -> &'static str {
    match city.trim() {
        "Paris" => "Sunny, 22°C",
        "London" => "Cloudy, 18°C",
        "New York" => "Rainy, 16°C",
        _ => "Weather data not available.",
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Returns the current weather for a given city."
    }

    fn parameters(&self) -> Vec<ToolParam> {
        vec![ToolParam::new("city", ParamType::String)]
    }

    async fn execute(&self, arguments: &Arguments) -> Result<Value, ToolError> {
        let city = str_arg(arguments, "city")?;
        Ok(Value::String(weather_for(city).to_string()))
    }
}
