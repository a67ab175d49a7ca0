//! Built-in tool implementations for crewflow.
//!
//! Small, deterministic tools used by the CLI demos and by crew manifests:
//! canned weather reports, picnic food suggestions, planet distances, and
//! the area of a circle.

pub mod food;
pub mod geometry;
pub mod planets;
pub mod weather;

use crewflow_core::error::ToolError;
use crewflow_core::tool::{Tool, ToolRegistry};

/// Names of all built-in tools, in registration order.
pub const BUILTIN_TOOLS: &[&str] = &[
    "get_weather",
    "calculate_area",
    "recommend_food",
    "get_planet_distance",
];

fn builtin(name: &str) -> Option<Box<dyn Tool>> {
    match name {
        "get_weather" => Some(Box::new(weather::WeatherTool)),
        "calculate_area" => Some(Box::new(geometry::CircleAreaTool)),
        "recommend_food" => Some(Box::new(food::recommend_food())),
        "get_planet_distance" => Some(Box::new(planets::planet_distance())),
        _ => None,
    }
}

/// Create a registry with every built-in tool.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for tool in BUILTIN_TOOLS.iter().filter_map(|name| builtin(name)) {
        registry.register(tool);
    }
    registry
}

/// Create a registry holding only the named built-in tools, in the given order.
pub fn registry_with<S: AsRef<str>>(names: &[S]) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    for name in names {
        let name = name.as_ref();
        let tool = builtin(name).ok_or_else(|| ToolError::NotBuiltin {
            name: name.to_string(),
            available: BUILTIN_TOOLS.join(", "),
        })?;
        registry.register(tool);
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_all_builtins() {
        let registry = default_registry();
        assert_eq!(registry.names(), BUILTIN_TOOLS);
        assert_eq!(registry.signatures().lines().count(), BUILTIN_TOOLS.len());
    }

    #[test]
    fn registry_with_selects_in_order() {
        let registry = registry_with(&["recommend_food", "get_weather"]).unwrap();
        assert_eq!(registry.names(), ["recommend_food", "get_weather"]);
    }

    #[test]
    fn registry_with_rejects_unknown() {
        let err = registry_with(&["teleport"]).err().unwrap();
        assert!(matches!(&err, ToolError::NotBuiltin { name, .. } if name == "teleport"));
        assert!(err.to_string().contains("get_weather"));
    }

    #[test]
    fn empty_selection_is_empty_registry() {
        let registry = registry_with::<&str>(&[]).unwrap();
        assert!(registry.is_empty());
    }
}
