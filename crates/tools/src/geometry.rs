//! Circle area tool.

use async_trait::async_trait;
use crewflow_core::error::ToolError;
use crewflow_core::tool::{Arguments, ParamType, Tool, ToolParam, f64_arg};
use serde_json::Value;
use std::f64::consts::PI;

pub struct CircleAreaTool;

#[async_trait]
impl Tool for CircleAreaTool {
    fn name(&self) -> &str {
        "calculate_area"
    }

    fn description(&self) -> &str {
        "Calculates the area of a circle given its radius."
    }

    fn parameters(&self) -> Vec<ToolParam> {
        vec![ToolParam::new("radius", ParamType::Float)]
    }

    async fn execute(&self, arguments: &Arguments) -> Result<Value, ToolError> {
        let radius = f64_arg(arguments, "radius")?;
        if radius < 0.0 {
            return Err(ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: format!("radius must not be negative, got {radius}"),
            });
        }
        Ok(Value::from(PI * radius * radius))
    }
}
