//! The model-facing side of the registry.

use runtime::{ToolCall, ToolError, ToolHost, ToolSpec};
use serde_json::Value;

use crate::registry::FunctionDescriptor;

/// Executes model tool calls against the model-facing functions.
///
/// Holds its own copies of the descriptors so the tool set is fixed when the
/// registry is assembled, and the schema is generated once.
#[derive(Debug)]
pub struct ProjectTools {
    functions: Vec<FunctionDescriptor>,
    specs: Vec<ToolSpec>,
}

impl ProjectTools {
    /// Keep only the model-facing entries of `functions`.
    pub fn new<'a>(functions: impl IntoIterator<Item = &'a FunctionDescriptor>) -> Self {
        let functions: Vec<FunctionDescriptor> = functions
            .into_iter()
            .filter(|f| f.is_model_facing())
            .cloned()
            .collect();
        let specs = functions.iter().map(FunctionDescriptor::tool_spec).collect();
        Self { functions, specs }
    }

    fn resolve(&self, name: &str) -> Result<&FunctionDescriptor, ToolError> {
        self.functions
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }
}

/// Order named arguments by the declared parameter list.
fn positional(function: &FunctionDescriptor, call: &ToolCall) -> Result<Vec<Value>, ToolError> {
    let empty = serde_json::Map::new();
    let named = match &call.arguments {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            return Err(ToolError::InvalidInput(format!(
                "arguments for {} must be an object, got {other}",
                call.name
            )));
        }
    };

    function
        .parameter_order()
        .map(|parameter| {
            named
                .get(parameter)
                .cloned()
                .ok_or_else(|| ToolError::MissingArgument {
                    tool: call.name.clone(),
                    parameter: parameter.to_string(),
                })
        })
        .collect()
}

impl ToolHost for ProjectTools {
    fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    async fn execute(&self, call: &ToolCall) -> Result<Value, ToolError> {
        let function = self.resolve(&call.name)?;
        let args = positional(function, call)?;
        tracing::debug!(tool = %call.name, ?args, "executing tool call");
        function
            .invoke(args)
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::tests::fixture;
    use crate::workspace::Workspace;
    use crate::{arithmetic, project};
    use serde_json::json;
    use std::sync::Arc;

    fn tools(root: &std::path::Path) -> ProjectTools {
        let workspace = Arc::new(Workspace::new(root));
        let functions: Vec<_> = project::functions(&workspace)
            .into_iter()
            .chain(arithmetic::functions())
            .collect();
        ProjectTools::new(&functions)
    }

    #[test]
    fn schema_covers_only_model_facing_functions() {
        let tools = tools(std::path::Path::new("/"));
        let mut names: Vec<_> = tools.specs().iter().map(|s| s.name.as_str()).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "get_dependency_license",
                "get_dependency_list",
                "get_licensing_for_my_project"
            ]
        );
    }

    #[tokio::test]
    async fn named_arguments_are_passed_positionally() {
        let dir = fixture();
        let tools = tools(dir.path());
        let call = ToolCall::new("get_dependency_license", json!({"dependency": "gson"}));

        let output = tools.execute(&call).await.unwrap();

        assert_eq!(
            output,
            json!("<licenses><license><id>Apache-2.0</id></license></licenses>")
        );
    }

    #[tokio::test]
    async fn arguments_follow_declared_order_not_call_order() {
        let functions: Vec<_> = arithmetic::functions()
            .into_iter()
            .map(FunctionDescriptor::model_facing)
            .collect();
        let tools = ProjectTools::new(&functions);
        let call = ToolCall::new("subtract", json!({"b": 10, "a": 3}));

        assert_eq!(tools.execute(&call).await.unwrap(), json!(-7));
    }

    #[tokio::test]
    async fn null_arguments_mean_none() {
        let dir = fixture();
        let tools = tools(dir.path());
        let call = ToolCall::new("get_dependency_list", Value::Null);
        assert_eq!(
            tools.execute(&call).await.unwrap(),
            json!("Dependencies used: gson, junit, slf4j-api")
        );
    }

    #[tokio::test]
    async fn host_only_functions_are_not_tools() {
        let tools = tools(std::path::Path::new("/"));
        let call = ToolCall::new("add", json!({"a": 1, "b": 2}));
        assert_eq!(
            tools.execute(&call).await.unwrap_err(),
            ToolError::NotFound("add".into())
        );
    }

    #[tokio::test]
    async fn missing_and_malformed_arguments() {
        let tools = tools(std::path::Path::new("/"));

        let missing = ToolCall::new("get_dependency_license", json!({}));
        assert_eq!(
            tools.execute(&missing).await.unwrap_err(),
            ToolError::MissingArgument {
                tool: "get_dependency_license".into(),
                parameter: "dependency".into(),
            }
        );

        let malformed = ToolCall::new("get_dependency_license", json!("gson"));
        assert!(matches!(
            tools.execute(&malformed).await.unwrap_err(),
            ToolError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn handler_failures_become_execution_errors() {
        let tools = tools(std::path::Path::new("/"));
        let call = ToolCall::new("get_dependency_license", json!({"dependency": 7}));
        assert!(matches!(
            tools.execute(&call).await.unwrap_err(),
            ToolError::Execution(_)
        ));
    }
}
