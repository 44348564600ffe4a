//! Tool registration and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::types::{GatewayError, GatewayResult, ToolCallResult, ToolDefinition};

use super::{Tool, ToolContext};

/// Immutable set of tools, built once at startup and shared behind `Arc`.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

/// Collects tools before the registry is frozen.
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistryBuilder {
    pub fn register<T: Tool + 'static>(self, tool: T) -> Self {
        self.register_arc(Arc::new(tool))
    }

    pub fn register_arc(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Freeze the registry. Two tools sharing a name is a startup error.
    pub fn build(self) -> GatewayResult<ToolRegistry> {
        let mut index = HashMap::with_capacity(self.tools.len());
        for (position, tool) in self.tools.iter().enumerate() {
            let name = tool.definition().name;
            if index.insert(name.clone(), position).is_some() {
                return Err(GatewayError::InternalError(format!(
                    "Tool '{name}' registered twice"
                )));
            }
        }

        tracing::debug!("Tool registry built with {} tools", self.tools.len());
        Ok(ToolRegistry {
            tools: self.tools,
            index,
        })
    }
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Public descriptors in registration order.
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    pub fn resolve(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&position| &self.tools[position])
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolve, validate and invoke a tool, awaiting its completion.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<Value>,
        ctx: &ToolContext,
    ) -> GatewayResult<ToolCallResult> {
        let tool = self
            .resolve(name)
            .ok_or_else(|| GatewayError::ToolNotFound(name.to_string()))?;

        let args = arguments.unwrap_or_else(|| Value::Object(Map::new()));
        validate_arguments(&tool.definition().input_schema, &args)?;

        let value = tool.invoke(args, ctx).await?;
        Ok(ToolCallResult::from_value(value))
    }
}

/// Check arguments against the object schema of a tool: the value must be an
/// object, every `required` property must be present, and properties with a
/// declared primitive `type` must match it.
pub fn validate_arguments(schema: &Value, args: &Value) -> GatewayResult<()> {
    let Some(args) = args.as_object() else {
        return Err(GatewayError::InvalidParams(
            "Tool arguments must be an object".to_string(),
        ));
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if !args.contains_key(field) {
                return Err(GatewayError::InvalidParams(format!(
                    "Missing required argument '{field}'"
                )));
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (field, value) in args {
        let expected = properties
            .get(field)
            .and_then(|p| p.get("type"))
            .and_then(Value::as_str);
        if let Some(expected) = expected {
            if !matches_type(expected, value) {
                return Err(GatewayError::InvalidParams(format!(
                    "Argument '{field}' must be of type {expected}"
                )));
            }
        }
    }

    Ok(())
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolResult;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        name: &'static str,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Tool for Counting {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.name.to_string(),
                description: None,
                input_schema: json!({
                    "type": "object",
                    "properties": {"name": {"type": "string"}},
                    "required": ["name"]
                }),
            }
        }

        async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(args["name"].clone())
        }
    }

    fn counting(name: &'static str) -> (Counting, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Counting {
                name,
                calls: calls.clone(),
            },
            calls,
        )
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let (a, _) = counting("echo");
        let (b, _) = counting("echo");
        let result = ToolRegistry::builder().register(a).register(b).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_list_order_and_resolve() {
        let (a, _) = counting("zeta");
        let (b, _) = counting("alpha");
        let registry = ToolRegistry::builder().register(a).register(b).build().unwrap();

        let names: Vec<String> = registry.list().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);

        let first = registry.resolve("alpha").unwrap();
        let second = registry.resolve("alpha").unwrap();
        assert!(Arc::ptr_eq(first, second));
        assert!(registry.resolve("ALPHA").is_none());
    }

    #[tokio::test]
    async fn test_call_validates_before_invoking() {
        let (tool, calls) = counting("echo");
        let registry = ToolRegistry::builder().register(tool).build().unwrap();
        let ctx = ToolContext::default();

        let err = registry.call("echo", Some(json!({})), &ctx).await.unwrap_err();
        assert_eq!(err.code(), crate::types::error_codes::INVALID_PARAMS);

        let err = registry
            .call("echo", Some(json!({"name": 5})), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::types::error_codes::INVALID_PARAMS);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let result = registry
            .call("echo", Some(json!({"name": "Ada"})), &ctx)
            .await
            .unwrap();
        assert_eq!(result.content.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::builder().build().unwrap();
        let err = registry
            .call("nonexistent_tool", None, &ToolContext::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Tool 'nonexistent_tool' not found");
    }

    #[test]
    fn test_validate_non_object() {
        let schema = json!({"type": "object"});
        assert!(validate_arguments(&schema, &json!([1, 2])).is_err());
        assert!(validate_arguments(&schema, &json!({"extra": true})).is_ok());
    }
}
