//! Tool domain entities

use super::names;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Definition of a tool an expert can call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "search_code")
    pub name: String,
    /// Human-readable description, shown to the model
    pub description: String,
    /// Parameter specifications
    pub parameters: Vec<ToolParameter>,
}

/// Parameter specification for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub description: String,
    pub required: bool,
    /// Parameter type hint ("string", "path", "integer", "number")
    pub param_type: String,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    /// Function-calling schema for this tool.
    ///
    /// `"path"` hints map to `"string"`; unknown hints default to `"string"`.
    pub fn to_json_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let schema_type = match param.param_type.as_str() {
                "number" => "number",
                "integer" => "integer",
                "boolean" => "boolean",
                _ => "string",
            };
            properties.insert(
                param.name.clone(),
                serde_json::json!({ "type": schema_type, "description": param.description }),
            );
            if param.required {
                required.push(serde_json::json!(param.name));
            }
        }

        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        })
    }
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            param_type: "string".to_string(),
        }
    }

    pub fn with_type(mut self, param_type: impl Into<String>) -> Self {
        self.param_type = param_type.into();
        self
    }
}

/// The set of tools known to the orchestrator.
///
/// Registration order is preserved so that prompts and schemas are stable.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDefinition>,
    /// Alias → canonical name mapping (e.g. "grep" → "search_code")
    aliases: HashMap<String, String>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any earlier definition with the same name
    pub fn register(mut self, tool: ToolDefinition) -> Self {
        self.tools.retain(|t| t.name != tool.name);
        self.tools.push(tool);
        self
    }

    pub fn register_aliases(
        mut self,
        mappings: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        for (alias, canonical) in mappings {
            self.aliases.insert(alias.into(), canonical.into());
        }
        self
    }

    /// Resolve a requested name to its canonical tool name.
    ///
    /// Registered names win over aliases. `remote:<procedure>` names resolve
    /// to themselves; whether they may be called is up to the allow-list.
    pub fn resolve<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if self.tools.iter().any(|t| t.name == name) || names::is_remote(name) {
            Some(name)
        } else {
            self.aliases.get(name).map(|s| s.as_str())
        }
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn all(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.name.as_str())
    }

    /// Definitions for the tools in `allowed`, in catalog order.
    ///
    /// Remote procedures are described with a generic definition since their
    /// arguments are opaque to the orchestrator.
    pub fn subset(&self, allowed: &[String]) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .iter()
            .filter(|t| allowed.iter().any(|a| a == &t.name))
            .cloned()
            .collect();
        for name in allowed.iter().filter(|a| names::is_remote(a)) {
            let procedure = name.strip_prefix(names::REMOTE_PREFIX).unwrap_or(name);
            let description = format!("Invoke the remote procedure `{}`", procedure);
            defs.push(ToolDefinition::new(name.clone(), description).with_parameter(
                ToolParameter::new("arguments", "JSON-encoded arguments for the procedure", false),
            ));
        }
        defs
    }

    /// The built-in expert tool set
    pub fn builtin() -> Self {
        Self::new()
            .register(
                ToolDefinition::new(
                    names::SEARCH_CODE,
                    "Search the codebase for a regex or keyword. \
                     Returns matching lines with file and line number.",
                )
                .with_parameter(ToolParameter::new("query", "Regex or keyword to search for", true))
                .with_parameter(path_param(
                    "path",
                    "Directory or glob to restrict the search to",
                    false,
                ))
                .with_parameter(limit_param("Maximum number of matches (default 20)")),
            )
            .register(
                ToolDefinition::new(
                    names::GET_SYMBOLS,
                    "List the functions, types and traits defined in a file.",
                )
                .with_parameter(path_param("file_path", "File to inspect", true)),
            )
            .register(
                ToolDefinition::new(
                    names::READ_FILE,
                    "Read a file, optionally restricted to a line range.",
                )
                .with_parameter(path_param("file_path", "File to read", true))
                .with_parameter(
                    ToolParameter::new("start_line", "First line to return (1-based)", false)
                        .with_type("integer"),
                )
                .with_parameter(
                    ToolParameter::new("end_line", "Last line to return (inclusive)", false)
                        .with_type("integer"),
                ),
            )
            .register(
                ToolDefinition::new(names::FIND_CALLERS, "Find call sites of a function.")
                    .with_parameter(ToolParameter::new("function_name", "Function to find", true))
                    .with_parameter(limit_param("Maximum number of call sites (default 20)")),
            )
            .register(
                ToolDefinition::new(
                    names::FIND_CALLEES,
                    "Find the functions called from inside a function body.",
                )
                .with_parameter(ToolParameter::new("function_name", "Function to inspect", true))
                .with_parameter(limit_param("Maximum number of callees (default 20)")),
            )
            .register(
                ToolDefinition::new(
                    names::RECALL,
                    "Recall stored project knowledge and past decisions.",
                )
                .with_parameter(ToolParameter::new("query", "What to recall", true))
                .with_parameter(limit_param("Maximum number of memories (default 5)")),
            )
            .register(
                ToolDefinition::new(
                    names::WEB_SEARCH,
                    "Search the web for documentation, advisories or best practices.",
                )
                .with_parameter(ToolParameter::new("query", "Search query", true))
                .with_parameter(limit_param("Maximum number of results (default 5)")),
            )
            .register(
                ToolDefinition::new(
                    names::STORE_FINDING,
                    "Record a finding for the council. Other experts will review it.",
                )
                .with_parameter(ToolParameter::new(
                    "category",
                    "Short category (e.g. security, architecture)",
                    true,
                ))
                .with_parameter(ToolParameter::new(
                    "description",
                    "What you found and why it matters",
                    true,
                ))
                .with_parameter(ToolParameter::new(
                    "severity",
                    "critical, high, medium or low",
                    true,
                ))
                .with_parameter(ToolParameter::new(
                    "location",
                    "path:line the finding refers to",
                    false,
                ))
                .with_parameter(
                    ToolParameter::new("confidence", "Confidence between 0 and 1", false)
                        .with_type("number"),
                ),
            )
            .register_aliases([
                ("grep", names::SEARCH_CODE),
                ("search", names::SEARCH_CODE),
                ("symbols", names::GET_SYMBOLS),
                ("cat", names::READ_FILE),
                ("callers", names::FIND_CALLERS),
                ("callees", names::FIND_CALLEES),
                ("memory", names::RECALL),
                ("web", names::WEB_SEARCH),
            ])
    }
}

/// A call to a tool, as requested by a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, echoed back with the result
    pub id: String,
    pub tool_name: String,
    pub arguments: HashMap<String, serde_json::Value>,
}

fn path_param(name: &str, description: &str, required: bool) -> ToolParameter {
    ToolParameter::new(name, description, required).with_type("path")
}

/// The optional `limit` parameter most lookups take
fn limit_param(description: &str) -> ToolParameter {
    ToolParameter::new("limit", description, false).with_type("integer")
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            tool_name: tool_name.into(),
            arguments: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Get a required string argument or return an error message
    pub fn require_string(&self, key: &str) -> Result<&str, String> {
        self.get_string(key)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| format!("Missing required argument: {}", key))
    }

    /// Get an optional integer argument, accepting numeric strings
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.arguments.get(key)? {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get an optional float argument, accepting numeric strings
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.arguments.get(key)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Arguments as a JSON object, for audit records
    pub fn input_json(&self) -> serde_json::Value {
        let mut keys: Vec<&String> = self.arguments.keys().collect();
        keys.sort();
        let map: serde_json::Map<String, serde_json::Value> = keys
            .into_iter()
            .map(|k| (k.clone(), self.arguments[k].clone()))
            .collect();
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_has_expert_tools() {
        let catalog = ToolCatalog::builtin();
        for name in [
            names::SEARCH_CODE,
            names::GET_SYMBOLS,
            names::READ_FILE,
            names::FIND_CALLERS,
            names::FIND_CALLEES,
            names::RECALL,
            names::WEB_SEARCH,
            names::STORE_FINDING,
        ] {
            assert!(catalog.get(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn test_resolve_aliases_and_remote() {
        let catalog = ToolCatalog::builtin();
        assert_eq!(catalog.resolve("grep"), Some(names::SEARCH_CODE));
        assert_eq!(catalog.resolve(names::READ_FILE), Some(names::READ_FILE));
        assert_eq!(catalog.resolve("remote:jira.search"), Some("remote:jira.search"));
        assert_eq!(catalog.resolve("remote:"), None);
        assert_eq!(catalog.resolve("rm_rf"), None);
    }

    #[test]
    fn test_register_replaces_same_name() {
        let catalog = ToolCatalog::new()
            .register(ToolDefinition::new("recall", "old"))
            .register(ToolDefinition::new("recall", "new"));
        assert_eq!(catalog.names().count(), 1);
        assert_eq!(catalog.get("recall").unwrap().description, "new");
    }

    #[test]
    fn test_subset_keeps_catalog_order_and_describes_remote() {
        let catalog = ToolCatalog::builtin();
        let allowed = vec![
            names::RECALL.to_string(),
            names::SEARCH_CODE.to_string(),
            "remote:tickets".to_string(),
        ];
        let subset = catalog.subset(&allowed);
        let got: Vec<&str> = subset.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(got, vec![names::SEARCH_CODE, names::RECALL, "remote:tickets"]);
    }

    #[test]
    fn test_json_schema_maps_types() {
        let tool = ToolDefinition::new("read_file", "Read")
            .with_parameter(ToolParameter::new("file_path", "File", true).with_type("path"))
            .with_parameter(ToolParameter::new("start_line", "Start", false).with_type("integer"));
        let schema = tool.to_json_schema();
        assert_eq!(schema["parameters"]["properties"]["file_path"]["type"], "string");
        assert_eq!(schema["parameters"]["properties"]["start_line"]["type"], "integer");
        assert_eq!(schema["parameters"]["required"], serde_json::json!(["file_path"]));
    }

    #[test]
    fn test_tool_call_argument_accessors() {
        let call = ToolCall::new(names::READ_FILE)
            .with_id("call_1")
            .with_arg("file_path", "src/lib.rs")
            .with_arg("start_line", "10")
            .with_arg("blank", "  ");
        assert_eq!(call.get_string("file_path"), Some("src/lib.rs"));
        assert_eq!(call.get_u64("start_line"), Some(10));
        assert!(call.require_string("blank").is_err());
        assert!(call.require_string("missing").is_err());
        assert_eq!(call.input_json()["file_path"], "src/lib.rs");
    }
}
