//! Picnic food suggestions per city.

use crewflow_core::tool::{FnTool, ParamType, str_arg};
use serde_json::Value;

/// Foods to pack for a picnic in `city`.
pub fn food_for(city: &str) -> &'static str {
    match city.trim() {
        "Paris" => "Baguette, cheese, grapes, macarons",
        "London" => "Sandwiches, scones, strawberries, tea",
        "New York" => "Bagels, pretzels, cheesecake, hot dogs",
        _ => "No food recommendations available.",
    }
}

/// The `recommend_food` tool.
pub fn recommend_food() -> FnTool {
    FnTool::new(
        "recommend_food",
        "Suggests picnic-friendly foods for a given city.",
        |args| Ok(Value::String(food_for(str_arg(args, "city")?).to_string())),
    )
    .param("city", ParamType::String)
}
