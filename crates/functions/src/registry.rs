//! The function registry: name → handler and declared parameter order.
//!
//! The table is built once at startup and never changes. Connection workers
//! share it read-only.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use runtime::ToolSpec;
use serde_json::{Map, Value, json};

use crate::{CallError, Result};

/// JSON type of a parameter, as advertised in the tool schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Array,
}

impl ParamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Array => "array",
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, Copy)]
pub struct Parameter {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
}

impl Parameter {
    pub const fn new(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
        }
    }
}

/// Positional arguments, already checked against the declared arity.
#[derive(Debug)]
pub struct Args {
    function: &'static str,
    parameters: &'static [Parameter],
    values: Vec<Value>,
}

impl Args {
    fn new(function: &'static str, parameters: &'static [Parameter], values: Vec<Value>) -> Result<Self> {
        if values.len() != parameters.len() {
            return Err(CallError::Arity {
                function,
                expected: parameters.len(),
                given: values.len(),
            });
        }
        Ok(Self {
            function,
            parameters,
            values,
        })
    }

    pub fn value(&self, index: usize) -> &Value {
        &self.values[index]
    }

    pub fn str(&self, index: usize) -> Result<&str> {
        self.value(index)
            .as_str()
            .ok_or_else(|| self.mismatch(index, "a string"))
    }

    pub fn number(&self, index: usize) -> Result<&serde_json::Number> {
        match self.value(index) {
            Value::Number(n) => Ok(n),
            _ => Err(self.mismatch(index, "a number")),
        }
    }

    /// Take ownership of one argument, leaving `null` behind.
    pub fn take(&mut self, index: usize) -> Value {
        self.values[index].take()
    }

    pub fn mismatch(&self, index: usize, expected: &'static str) -> CallError {
        CallError::InvalidArgument {
            function: self.function,
            parameter: self.parameters[index].name,
            expected,
            found: type_name(&self.values[index]).to_string(),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The body of a registered function.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, args: Args) -> Result<Value>;
}

/// A registered function.
#[derive(Clone)]
pub struct FunctionDescriptor {
    name: &'static str,
    description: &'static str,
    parameters: &'static [Parameter],
    model_facing: bool,
    handler: Arc<dyn Handler>,
}

impl std::fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("name", &self.name)
            .field("parameters", &self.parameter_order().collect::<Vec<_>>())
            .field("model_facing", &self.model_facing)
            .finish_non_exhaustive()
    }
}

impl FunctionDescriptor {
    pub fn new(
        name: &'static str,
        description: &'static str,
        parameters: &'static [Parameter],
        handler: impl Handler + 'static,
    ) -> Self {
        Self {
            name,
            description,
            parameters,
            model_facing: false,
            handler: Arc::new(handler),
        }
    }

    /// Offer this function to the model as a tool.
    pub fn model_facing(mut self) -> Self {
        self.model_facing = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parameters(&self) -> &'static [Parameter] {
        self.parameters
    }

    pub fn parameter_order(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.parameters.iter().map(|p| p.name)
    }

    pub fn is_model_facing(&self) -> bool {
        self.model_facing
    }

    /// Invoke with positional arguments in declared order.
    pub async fn invoke(&self, args: Vec<Value>) -> Result<Value> {
        let args = Args::new(self.name, self.parameters, args)?;
        self.handler.call(args).await
    }

    /// The model-facing schema entry for this function.
    pub fn tool_spec(&self) -> ToolSpec {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.to_string(),
                    json!({"type": p.kind.as_str(), "description": p.description}),
                )
            })
            .collect();
        let required: Vec<&str> = self.parameter_order().collect();

        ToolSpec {
            name: self.name.to_string(),
            description: self.description.to_string(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }
}

/// Static table of callable functions.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    functions: BTreeMap<&'static str, FunctionDescriptor>,
}

impl Registry {
    pub fn new(functions: impl IntoIterator<Item = FunctionDescriptor>) -> Self {
        functions.into_iter().collect()
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Look up `name` and invoke it.
    pub async fn invoke(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        let function = self
            .get(name)
            .ok_or_else(|| CallError::UnknownFunction(name.to_string()))?;
        function.invoke(args).await
    }

    /// Schema entries of every model-facing function, in name order.
    pub fn tool_specs(&self) -> Vec<ToolSpec> {
        self.functions
            .values()
            .filter(|f| f.is_model_facing())
            .map(FunctionDescriptor::tool_spec)
            .collect()
    }
}

impl FromIterator<FunctionDescriptor> for Registry {
    fn from_iter<I: IntoIterator<Item = FunctionDescriptor>>(iter: I) -> Self {
        Self {
            functions: iter.into_iter().map(|f| (f.name, f)).collect(),
        }
    }
}

impl Extend<FunctionDescriptor> for Registry {
    fn extend<I: IntoIterator<Item = FunctionDescriptor>>(&mut self, iter: I) {
        self.functions
            .extend(iter.into_iter().map(|f| (f.name, f)));
    }
}
