//! Request and response messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// Error string sent for a frame that is not valid JSON.
pub const INVALID_JSON: &str = "Invalid JSON";

/// Error string sent when the requested function is not registered.
pub const UNKNOWN_FUNCTION: &str = "Unknown function";

/// Result string sent when a registered function fails.
///
/// Clients read this under the `result` key, so a failure looks like a
/// success by key name alone. Treat any result string starting with `Error`
/// as a soft failure.
pub const DEGRADED_RESULT: &str = "Error... please check server console for more details";

/// A client request: `{"function": <name>, "args": [<value>...]}`.
///
/// Members other than `function` and `args` are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub function: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Value>>,
}

impl Request {
    pub fn new(function: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            function: function.into(),
            args: Some(args),
        }
    }

    /// Positional arguments; absent or `null` means none.
    pub fn args(&self) -> &[Value] {
        self.args.as_deref().unwrap_or_default()
    }

    pub fn into_args(self) -> Vec<Value> {
        self.args.unwrap_or_default()
    }

    /// Encode as a newline-terminated line.
    pub fn to_line(&self) -> Result<Vec<u8>> {
        encode_line(self)
    }
}

/// A frame that is valid JSON, sorted by how well it fits a [`Request`].
///
/// Only malformed JSON fails to parse. A frame with the wrong shape still
/// parses so the server can answer it like any other bad call.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A string `function` with `args` that are an array, `null` or absent.
    Request(Request),
    /// An object without a string `function` member. Holds the member, if any.
    NoFunction(Option<Value>),
    /// An object naming a function whose `args` are not an array.
    BadArgs {
        function: String,
        kind: &'static str,
    },
    /// Valid JSON that is not an object.
    NotAnObject { kind: &'static str },
}

impl Inbound {
    /// Parse one frame (without its trailing newline).
    pub fn parse(frame: &[u8]) -> Result<Self> {
        let mut object = match serde_json::from_slice::<Value>(frame)? {
            Value::Object(object) => object,
            other => {
                return Ok(Self::NotAnObject {
                    kind: json_kind(&other),
                });
            }
        };
        let function = match object.remove("function") {
            Some(Value::String(function)) => function,
            other => return Ok(Self::NoFunction(other)),
        };
        let args = match object.remove("args") {
            None | Some(Value::Null) => None,
            Some(Value::Array(args)) => Some(args),
            Some(other) => {
                return Ok(Self::BadArgs {
                    function,
                    kind: json_kind(&other),
                });
            }
        };
        Ok(Self::Request(Request { function, args }))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A server response: exactly one of `{"result": ...}` or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    #[serde(rename = "result")]
    Success(Value),
    #[serde(rename = "error")]
    Failure(String),
}

impl Response {
    pub fn success(value: impl Into<Value>) -> Self {
        Self::Success(value.into())
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }

    pub fn invalid_json() -> Self {
        Self::failure(INVALID_JSON)
    }

    pub fn unknown_function() -> Self {
        Self::failure(UNKNOWN_FUNCTION)
    }

    pub fn degraded() -> Self {
        Self::success(DEGRADED_RESULT)
    }

    /// Parse one response frame (without its trailing newline).
    pub fn parse(frame: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(frame)?)
    }

    /// Whether the client would see a soft failure: an `error` member, or a
    /// string `result` starting with `Error`.
    pub fn is_soft_failure(&self) -> bool {
        match self {
            Self::Failure(_) => true,
            Self::Success(Value::String(s)) => s.starts_with("Error"),
            Self::Success(_) => false,
        }
    }

    /// Encode as a newline-terminated line.
    pub fn to_line(&self) -> Result<Vec<u8>> {
        encode_line(self)
    }
}

fn encode_line<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(frame: &[u8]) -> Request {
        match Inbound::parse(frame).unwrap() {
            Inbound::Request(request) => request,
            other => panic!("expected a request, got {other:?}"),
        }
    }

    #[test]
    fn args_default_to_empty() {
        let req = request(br#"{"function":"get_dependency_list"}"#);
        assert_eq!(req.function, "get_dependency_list");
        assert!(req.args().is_empty());

        assert!(request(br#"{"function":"x","args":null}"#).args().is_empty());
    }

    #[test]
    fn extra_members_are_ignored() {
        let request = request(br#"{"function":"promptModel","args":["m","p"],"history":[]}"#);
        assert_eq!(request.args(), &[json!("m"), json!("p")]);
    }

    #[test]
    fn only_malformed_json_fails_to_parse() {
        assert!(Inbound::parse(b"not-json").is_err());
        assert!(Inbound::parse(b"").is_err());
        assert!(Inbound::parse(b"  ").is_err());
        assert!(Inbound::parse(br#"{"function":"add""#).is_err());
    }

    #[test]
    fn wrong_shapes_are_classified() {
        assert_eq!(
            Inbound::parse(b"[1,2]").unwrap(),
            Inbound::NotAnObject { kind: "an array" }
        );
        assert_eq!(
            Inbound::parse(br#"{"args":[1]}"#).unwrap(),
            Inbound::NoFunction(None)
        );
        assert_eq!(
            Inbound::parse(br#"{"function":5}"#).unwrap(),
            Inbound::NoFunction(Some(json!(5)))
        );
        assert_eq!(
            Inbound::parse(br#"{"function":"add","args":"oops"}"#).unwrap(),
            Inbound::BadArgs {
                function: "add".to_string(),
                kind: "a string"
            }
        );
    }

    #[test]
    fn response_wire_shapes() {
        assert_eq!(Response::success(5).to_line().unwrap(), b"{\"result\":5}\n");
        assert_eq!(
            Response::unknown_function().to_line().unwrap(),
            b"{\"error\":\"Unknown function\"}\n"
        );
        assert_eq!(
            Response::invalid_json().to_line().unwrap(),
            b"{\"error\":\"Invalid JSON\"}\n"
        );
        assert_eq!(
            Response::success(Value::Null).to_line().unwrap(),
            b"{\"result\":null}\n"
        );
    }

    #[test]
    fn soft_failure_detection() {
        assert!(Response::degraded().is_soft_failure());
        assert!(Response::invalid_json().is_soft_failure());
        assert!(!Response::success("Dependencies used: serde").is_soft_failure());
        assert!(!Response::success(3).is_soft_failure());
    }

    #[test]
    fn response_parses_back() {
        let response = Response::parse(br#"{"error":"Unknown function"}"#).unwrap();
        assert_eq!(response, Response::unknown_function());
    }
}
