//! Request dispatch.
//!
//! Internally every failure is a [`DispatchError`]. Only the conversion to
//! [`Response`] produces the legacy wire shapes: framing and lookup failures
//! become `error` members, execution failures a degraded `result` string.
//! Only malformed JSON is a framing failure. A frame of the wrong shape is
//! answered as a failed call.

use std::error::Error as StdError;
use std::sync::Arc;

use functions::{CallError, Registry};
use protocol::{Inbound, Request, Response};
use serde_json::Value;
use thiserror::Error;

/// Coarse class of a dispatch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The frame is not valid JSON.
    Framing,
    /// No function is registered under the requested name.
    Lookup,
    /// The function ran and failed.
    Execution,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    #[error("invalid request frame")]
    Framing(#[source] protocol::Error),

    #[error("unknown function '{0}'")]
    Lookup(String),

    #[error("{function} failed")]
    Execution {
        function: String,
        #[source]
        source: CallError,
    },

    #[error("request is {0}, not an object")]
    NotAnObject(&'static str),

    #[error("{function} failed: args must be an array, got {kind}")]
    ArgsNotArray {
        function: String,
        kind: &'static str,
    },
}

impl DispatchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Framing(_) => ErrorCategory::Framing,
            Self::Lookup(_) => ErrorCategory::Lookup,
            Self::Execution { .. } | Self::NotAnObject(_) | Self::ArgsNotArray { .. } => {
                ErrorCategory::Execution
            }
        }
    }
}

impl From<&DispatchError> for Response {
    fn from(err: &DispatchError) -> Self {
        match err.category() {
            ErrorCategory::Framing => Response::invalid_json(),
            ErrorCategory::Lookup => Response::unknown_function(),
            ErrorCategory::Execution => Response::degraded(),
        }
    }
}

impl From<DispatchError> for Response {
    fn from(err: DispatchError) -> Self {
        Response::from(&err)
    }
}

/// The error and all of its sources, outermost first.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

/// Routes requests to the registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Turn a parsed frame into a call of a registered function.
    ///
    /// A missing or non-string `function` is a lookup failure. A frame that
    /// is not an object, or that names a registered function with `args`
    /// that are not an array, is an execution failure.
    pub fn accept(&self, inbound: Inbound) -> Result<Request, DispatchError> {
        match inbound {
            Inbound::Request(request) => Ok(request),
            Inbound::NotAnObject { kind } => Err(DispatchError::NotAnObject(kind)),
            Inbound::NoFunction(member) => Err(DispatchError::Lookup(
                member.map(|m| m.to_string()).unwrap_or_default(),
            )),
            Inbound::BadArgs { function, kind } => match self.registry.get(&function) {
                Some(_) => Err(DispatchError::ArgsNotArray { function, kind }),
                None => Err(DispatchError::Lookup(function)),
            },
        }
    }

    /// Look up and invoke the requested function.
    pub async fn dispatch(&self, request: Request) -> Result<Value, DispatchError> {
        let Some(function) = self.registry.get(&request.function) else {
            return Err(DispatchError::Lookup(request.function));
        };
        let name = request.function.clone();
        function
            .invoke(request.into_args())
            .await
            .map_err(|source| DispatchError::Execution {
                function: name,
                source,
            })
    }

    /// Handle one frame end to end and produce the response to send.
    pub async fn handle_frame(&self, frame: &[u8]) -> Response {
        let text = String::from_utf8_lossy(frame);
        let inbound = match Inbound::parse(frame) {
            Ok(inbound) => inbound,
            Err(e) => {
                let err = DispatchError::Framing(e);
                tracing::warn!(frame = %text, error = %error_chain(&err), "rejected frame");
                return err.into();
            }
        };

        tracing::info!(request = %text, "received");
        let outcome = match self.accept(inbound) {
            Ok(request) => self.dispatch(request).await,
            Err(err) => Err(err),
        };

        let response = match outcome {
            Ok(value) => Response::Success(value),
            Err(err) => {
                match err.category() {
                    ErrorCategory::Execution => tracing::error!(
                        request = %text,
                        error = %error_chain(&err),
                        "function failed"
                    ),
                    _ => tracing::warn!(error = %err, "request rejected"),
                }
                err.into()
            }
        };
        tracing::info!(?response, "responding");
        response
    }
}
