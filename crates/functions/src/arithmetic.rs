//! `add(a, b)` and `subtract(a, b)`.
//!
//! Integers stay integers while the result fits in an `i64`; anything else is
//! computed in `f64`.

use async_trait::async_trait;
use serde_json::{Number, Value};

use crate::registry::{Args, FunctionDescriptor, Handler, ParamKind, Parameter};
use crate::Result;

const OPERANDS: &[Parameter] = &[
    Parameter::new("a", ParamKind::Number, "Left operand."),
    Parameter::new("b", ParamKind::Number, "Right operand."),
];

#[derive(Debug, Clone, Copy)]
enum Op {
    Add,
    Subtract,
}

impl Op {
    fn integer(self, a: i64, b: i64) -> Option<i64> {
        match self {
            Op::Add => a.checked_add(b),
            Op::Subtract => a.checked_sub(b),
        }
    }

    fn float(self, a: f64, b: f64) -> f64 {
        match self {
            Op::Add => a + b,
            Op::Subtract => a - b,
        }
    }

    fn apply(self, a: &Number, b: &Number) -> Value {
        if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64())
            && let Some(n) = self.integer(a, b)
        {
            return Value::from(n);
        }
        let (a, b) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
        // Non-finite results have no JSON representation.
        Number::from_f64(self.float(a, b))
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

struct Arithmetic(Op);

#[async_trait]
impl Handler for Arithmetic {
    async fn call(&self, args: Args) -> Result<Value> {
        Ok(self.0.apply(args.number(0)?, args.number(1)?))
    }
}

pub fn functions() -> Vec<FunctionDescriptor> {
    vec![
        FunctionDescriptor::new("add", "Return a + b.", OPERANDS, Arithmetic(Op::Add)),
        FunctionDescriptor::new(
            "subtract",
            "Return a - b.",
            OPERANDS,
            Arithmetic(Op::Subtract),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CallError, Registry};
    use serde_json::json;

    async fn call(name: &str, a: Value, b: Value) -> Result<Value> {
        Registry::new(functions()).invoke(name, vec![a, b]).await
    }

    #[tokio::test]
    async fn integers_stay_integers() {
        assert_eq!(call("add", json!(2), json!(3)).await.unwrap(), json!(5));
        assert_eq!(call("subtract", json!(2), json!(3)).await.unwrap(), json!(-1));
    }

    #[tokio::test]
    async fn mixed_operands_use_floats() {
        assert_eq!(call("add", json!(1.5), json!(2)).await.unwrap(), json!(3.5));
        assert_eq!(call("subtract", json!(1), json!(0.25)).await.unwrap(), json!(0.75));
    }

    #[tokio::test]
    async fn overflow_falls_back_to_float() {
        let value = call("add", json!(i64::MAX), json!(1)).await.unwrap();
        assert!(value.is_f64());
    }

    #[tokio::test]
    async fn non_numbers_are_rejected() {
        let err = call("add", json!("2"), json!(3)).await.unwrap_err();
        assert!(matches!(
            err,
            CallError::InvalidArgument { parameter: "a", .. }
        ));
    }
}
