//! Average distance from Earth to a few planets.

use crewflow_core::tool::{FnTool, ParamType, str_arg};
use serde_json::Value;

pub fn distance_to(planet: &str) -> &'static str {
    match planet.trim() {
        "Mars" => "225 million km",
        "Venus" => "261 million km",
        _ => "Unknown",
    }
}

/// The `get_planet_distance` tool.
pub fn planet_distance() -> FnTool {
    FnTool::new(
        "get_planet_distance",
        "Returns the average distance from Earth to the given planet.",
        |args| Ok(Value::String(distance_to(str_arg(args, "planet")?).to_string())),
    )
    .param("planet", ParamType::String)
}
