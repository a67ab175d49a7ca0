//! Tool trait, signatures, and argument validation.
//!
//! Tools are callables with a declared name, description, and typed
//! parameters. The registry derives a [`ToolSpec`] once per tool at
//! registration time, renders it as a JSON signature for the model, checks
//! and coerces the arguments of every [`ToolCall`] against it, and dispatches
//! the call by name.

use async_trait::async_trait;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::error::ToolError;

/// Arguments of a tool call, keyed by parameter name.
pub type Arguments = Map<String, Value>;

// ── Parameter types ──

/// The primitive types a tool parameter may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Integer,
    String,
    Boolean,
    Float,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Float => "float",
        }
    }

    /// Whether `value` already has this type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Float => value.is_f64(),
        }
    }

    /// Convert `value` to this type, or `None` when no sensible conversion exists.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        if self.matches(value) {
            return Some(value.clone());
        }
        match (self, value) {
            (Self::Integer, Value::Number(n)) => n.as_f64().and_then(truncate),
            (Self::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
            (Self::Integer, Value::Bool(b)) => Some(Value::from(i64::from(*b))),

            (Self::Float, Value::Number(n)) => n.as_f64().map(Value::from),
            (Self::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::from),
            (Self::Float, Value::Bool(b)) => Some(Value::from(if *b { 1.0 } else { 0.0 })),

            (Self::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (Self::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
            (Self::String, Value::Array(_) | Value::Object(_)) => {
                serde_json::to_string(value).ok().map(Value::String)
            }

            (Self::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(Value::Bool(true)),
                "false" | "no" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            (Self::Boolean, Value::Number(n)) => n.as_f64().map(|f| Value::Bool(f != 0.0)),

            _ => None,
        }
    }
}

fn truncate(f: f64) -> Option<Value> {
    let t = f.trunc();
    (t.is_finite() && t >= i64::MIN as f64 && t <= i64::MAX as f64).then(|| Value::from(t as i64))
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared tool parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolParam {
    pub name: String,
    pub kind: ParamType,
}

impl ToolParam {
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self { name: name.into(), kind }
    }
}

// ── Signatures ──

/// The immutable signature of a registered tool.
///
/// Serializes to
/// `{"name":..,"description":..,"parameters":{"properties":{"<param>":{"type":"<tag>"}}}}`
/// with parameters in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParam>,
}

impl ToolSpec {
    /// Look up a declared parameter by name.
    pub fn param(&self, name: &str) -> Option<&ToolParam> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// The JSON signature line shown to the model.
    pub fn signature(&self) -> String {
        // Serializing strings and nested maps cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Serialize for ToolSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ToolSpec", 3)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("description", &self.description)?;
        s.serialize_field("parameters", &Parameters(&self.parameters))?;
        s.end()
    }
}

struct Parameters<'a>(&'a [ToolParam]);

struct Properties<'a>(&'a [ToolParam]);

struct TypeTag(ParamType);

impl Serialize for Parameters<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("properties", &Properties(self.0))?;
        map.end()
    }
}

impl Serialize for Properties<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for param in self.0 {
            map.serialize_entry(&param.name, &TypeTag(param.kind))?;
        }
        map.end()
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("type", self.0.as_str())?;
        map.end()
    }
}

// ── Calls and observations ──

/// A tool invocation requested by the model inside a `<tool_call>` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to execute
    pub name: String,

    /// Raw arguments keyed by parameter name
    #[serde(default)]
    pub arguments: Arguments,

    /// Call id, increasing within one model reply
    pub id: i64,
}

/// Tool results of one round, keyed by call id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Observation(BTreeMap<i64, Value>);

impl Observation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, call_id: i64, result: Value) {
        self.0.insert(call_id, result);
    }

    pub fn get(&self, call_id: i64) -> Option<&Value> {
        self.0.get(&call_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON text fed back to the model, e.g. `{"0":"Sunny, 22°C"}`.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".into())
    }
}

// ── Tool trait ──

/// The core Tool trait.
///
/// Implementors declare their parameters; the registry turns the declaration
/// into a [`ToolSpec`] and only ever passes arguments that were validated
/// against it.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "get_weather").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// Declared parameters, in order.
    fn parameters(&self) -> Vec<ToolParam>;

    /// Execute the tool with validated arguments.
    async fn execute(&self, arguments: &Arguments) -> Result<Value, ToolError>;

    /// Derive the signature of this tool.
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().trim().to_string(),
            parameters: self.parameters(),
        }
    }
}

type Handler = Arc<dyn Fn(&Arguments) -> Result<Value, ToolError> + Send + Sync>;

/// A tool backed by a plain closure.
///
/// ```ignore
/// let area = FnTool::new("calculate_area", "Area of a circle", |args| {
///     let r = crewflow_core::tool::f64_arg(args, "radius")?;
///     Ok(json!(std::f64::consts::PI * r * r))
/// })
/// .param("radius", ParamType::Float);
/// ```
pub struct FnTool {
    name: String,
    description: String,
    params: Vec<ToolParam>,
    handler: Handler,
}

impl FnTool {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Value, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Declare the next parameter.
    pub fn param(mut self, name: impl Into<String>, kind: ParamType) -> Self {
        self.params.push(ToolParam::new(name, kind));
        self
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Vec<ToolParam> {
        self.params.clone()
    }

    async fn execute(&self, arguments: &Arguments) -> Result<Value, ToolError> {
        (self.handler)(arguments)
    }
}

/// Read a required string argument.
pub fn str_arg<'a>(arguments: &'a Arguments, name: &str) -> Result<&'a str, ToolError> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing string argument '{name}'")))
}

/// Read a required numeric argument.
pub fn f64_arg(arguments: &Arguments, name: &str) -> Result<f64, ToolError> {
    arguments
        .get(name)
        .and_then(Value::as_f64)
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing numeric argument '{name}'")))
}

// ── Validation ──

/// Check every argument of `call` against `spec`, coercing values that are
/// not already of the declared type.
///
/// Validating a call whose arguments are already correctly typed returns it
/// unchanged.
pub fn validate(mut call: ToolCall, spec: &ToolSpec) -> Result<ToolCall, ToolError> {
    for (argument, value) in call.arguments.iter_mut() {
        let Some(param) = spec.param(argument) else {
            return Err(ToolError::UnknownArgument {
                call_id: call.id,
                tool: call.name.clone(),
                argument: argument.clone(),
            });
        };
        if param.kind.matches(value) {
            continue;
        }
        match param.kind.coerce(value) {
            Some(coerced) => *value = coerced,
            None => {
                return Err(ToolError::TypeMismatch {
                    call_id: call.id,
                    tool: call.name.clone(),
                    argument: argument.clone(),
                    expected: param.kind.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }
    Ok(call)
}

// ── Registry ──

struct Registered {
    spec: ToolSpec,
    tool: Box<dyn Tool>,
}

/// A registry of available tools, kept in registration order.
pub struct ToolRegistry {
    tools: Vec<Registered>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool and return its derived signature.
    ///
    /// Replaces any existing tool with the same name in place.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> ToolSpec {
        let spec = tool.spec();
        let entry = Registered { spec: spec.clone(), tool };
        match self.tools.iter_mut().find(|r| r.spec.name == spec.name) {
            Some(existing) => {
                warn!(tool = %spec.name, "Replacing previously registered tool");
                *existing = entry;
            }
            None => self.tools.push(entry),
        }
        spec
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.entry(name).map(|r| r.tool.as_ref())
    }

    /// Get the signature of a tool by name.
    pub fn spec(&self, name: &str) -> Option<&ToolSpec> {
        self.entry(name).map(|r| &r.spec)
    }

    /// All signatures, in registration order.
    pub fn specs(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.iter().map(|r| &r.spec)
    }

    /// Newline-joined JSON signatures, substituted into `{tools}` prompts.
    pub fn signatures(&self) -> String {
        self.specs().map(ToolSpec::signature).collect::<Vec<_>>().join("\n")
    }

    /// Validate a call against the signature of the tool it names.
    pub fn validate(&self, call: ToolCall) -> Result<ToolCall, ToolError> {
        match self.spec(&call.name) {
            Some(spec) => validate(call, spec),
            None => Err(ToolError::UnknownTool {
                call_id: call.id,
                name: call.name,
            }),
        }
    }

    /// Invoke the named tool and return its result verbatim.
    pub async fn dispatch(&self, call: &ToolCall) -> Result<Value, ToolError> {
        let tool = self.get(&call.name).ok_or_else(|| ToolError::UnknownTool {
            call_id: call.id,
            name: call.name.clone(),
        })?;
        tool.execute(&call.arguments).await
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|r| r.spec.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    fn entry(&self, name: &str) -> Option<&Registered> {
        self.tools.iter().find(|r| r.spec.name == name)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn area_tool() -> FnTool {
        FnTool::new("area", "Area of a circle.", |args| {
            let r = f64_arg(args, "radius")?;
            Ok(json!(std::f64::consts::PI * r * r))
        })
        .param("radius", ParamType::Float)
    }

    fn echo_tool() -> FnTool {
        FnTool::new("echo", "  Echoes back the input  ", |args| {
            Ok(json!(str_arg(args, "text")?))
        })
        .param("text", ParamType::String)
        .param("times", ParamType::Integer)
        .param("loud", ParamType::Boolean)
    }

    fn call(raw: &str) -> ToolCall {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn register_returns_spec_in_declaration_order() {
        let mut registry = ToolRegistry::new();
        let spec = registry.register(Box::new(echo_tool()));
        assert_eq!(spec.description, "Echoes back the input");
        let names: Vec<_> = spec.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["text", "times", "loud"]);
    }

    #[test]
    fn signature_json_is_stable() {
        let spec = area_tool().spec();
        assert_eq!(
            spec.signature(),
            r#"{"name":"area","description":"Area of a circle.","parameters":{"properties":{"radius":{"type":"float"}}}}"#
        );
    }

    #[test]
    fn signatures_follow_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(echo_tool()));
        registry.register(Box::new(area_tool()));
        let sigs = registry.signatures();
        let lines: Vec<_> = sigs.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"echo\""));
        assert!(lines[1].contains("\"area\""));
    }

    #[test]
    fn reregistering_replaces_in_place() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(area_tool()));
        registry.register(Box::new(echo_tool()));
        registry.register(Box::new(
            FnTool::new("area", "Square area", |_| Ok(json!(0))).param("side", ParamType::Float),
        ));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), ["area", "echo"]);
        assert!(registry.spec("area").unwrap().param("side").is_some());
    }

    #[test]
    fn string_coerced_to_float() {
        let spec = area_tool().spec();
        let validated = validate(
            call(r#"{"name":"area","arguments":{"radius":"2"},"id":0}"#),
            &spec,
        )
        .unwrap();
        assert_eq!(validated.arguments["radius"], json!(2.0));
        assert!(validated.arguments["radius"].is_f64());
    }

    #[test]
    fn integer_literal_coerced_to_float() {
        let spec = area_tool().spec();
        let validated = validate(
            call(r#"{"name":"area","arguments":{"radius":3},"id":1}"#),
            &spec,
        )
        .unwrap();
        assert!(validated.arguments["radius"].is_f64());
    }

    #[test]
    fn validation_is_idempotent() {
        let spec = echo_tool().spec();
        let typed = call(
            r#"{"name":"echo","arguments":{"text":"hi","times":2,"loud":true},"id":4}"#,
        );
        let once = validate(typed.clone(), &spec).unwrap();
        assert_eq!(once, typed);
        let twice = validate(once.clone(), &spec).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn mixed_arguments_coerce_per_type() {
        let spec = echo_tool().spec();
        let validated = validate(
            call(r#"{"name":"echo","arguments":{"text":42,"times":"3","loud":"Yes"},"id":0}"#),
            &spec,
        )
        .unwrap();
        assert_eq!(validated.arguments["text"], json!("42"));
        assert_eq!(validated.arguments["times"], json!(3));
        assert_eq!(validated.arguments["loud"], json!(true));
    }

    #[test]
    fn float_truncated_to_integer() {
        assert_eq!(ParamType::Integer.coerce(&json!(2.9)), Some(json!(2)));
        assert_eq!(ParamType::Integer.coerce(&json!(-2.9)), Some(json!(-2)));
        assert_eq!(ParamType::Integer.coerce(&json!("2.5")), None);
        assert_eq!(ParamType::Boolean.coerce(&json!(0)), Some(json!(false)));
        assert_eq!(ParamType::String.coerce(&json!(null)), None);
    }

    #[test]
    fn non_numeric_string_is_type_mismatch() {
        let spec = area_tool().spec();
        let err = validate(
            call(r#"{"name":"area","arguments":{"radius":"wide"},"id":7}"#),
            &spec,
        )
        .unwrap_err();
        match err {
            ToolError::TypeMismatch { call_id, argument, expected, .. } => {
                assert_eq!(call_id, 7);
                assert_eq!(argument, "radius");
                assert_eq!(expected, "float");
            }
            other => panic!("Expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn undeclared_argument_is_rejected() {
        let spec = area_tool().spec();
        let err = validate(
            call(r#"{"name":"area","arguments":{"diameter":4},"id":2}"#),
            &spec,
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::UnknownArgument { call_id: 2, .. }));
    }

    #[test]
    fn missing_arguments_field_defaults_to_empty() {
        let parsed = call(r#"{"name":"area","id":0}"#);
        assert!(parsed.arguments.is_empty());
    }

    #[tokio::test]
    async fn registry_dispatches_validated_call() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(area_tool()));
        let validated = registry
            .validate(call(r#"{"name":"area","arguments":{"radius":"1"},"id":0}"#))
            .unwrap();
        let result = registry.dispatch(&validated).await.unwrap();
        let area = result.as_f64().unwrap();
        assert!((area - std::f64::consts::PI).abs() < 1e-9);
    }

    #[tokio::test]
    async fn unknown_tool_reports_call_id() {
        let registry = ToolRegistry::new();
        let c = call(r#"{"name":"nonexistent","arguments":{},"id":5}"#);
        let err = registry.dispatch(&c).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool { call_id: 5, .. }));
        let err = registry.validate(c).unwrap_err();
        assert_eq!(err.call_id(), Some(5));
    }

    #[test]
    fn observation_serializes_ids_as_keys() {
        let mut obs = Observation::new();
        obs.insert(1, json!("Cloudy, 18°C"));
        obs.insert(0, json!(3.5));
        assert_eq!(obs.len(), 2);
        assert_eq!(obs.to_json(), r#"{"0":3.5,"1":"Cloudy, 18°C"}"#);
    }
}
