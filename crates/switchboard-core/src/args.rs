//! Helpers for pulling typed values out of a tool's JSON arguments.
//!
//! Required-value helpers reject with `InvalidArgument` before the handler
//! touches any credential or network resource.

use crate::error::{GatewayError, GatewayResult};
use serde_json::Value;

/// A required, non-empty string argument.
pub fn required_str<'a>(args: &'a Value, name: &str) -> GatewayResult<&'a str> {
    match args.get(name).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(GatewayError::InvalidArgument(format!("{name} is required"))),
    }
}

/// An optional string argument; absent, null, or wrong-typed yields `None`.
pub fn optional_str<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

/// An optional unsigned integer argument with a default.
pub fn u64_or(args: &Value, name: &str, default: u64) -> u64 {
    args.get(name).and_then(Value::as_u64).unwrap_or(default)
}

/// An optional boolean argument with a default.
pub fn bool_or(args: &Value, name: &str, default: bool) -> bool {
    args.get(name).and_then(Value::as_bool).unwrap_or(default)
}
