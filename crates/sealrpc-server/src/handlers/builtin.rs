// ============================================
// File: crates/sealrpc-server/src/handlers/builtin.rs
// ============================================
//! # Built-in Methods
//!
//! ## Creation Reason
//! Gives a freshly started server something to answer, so deployments can
//! be smoke-tested with `sealrpc-call` before any application is wired in.
//!
//! ## Main Functionality
//! - `Calc.Add`: `{"A": 5, "B": 3}` → `{"Sum": 8}`
//! - `Diagnostics.Echo`: returns its argument bytes unchanged
//!
//! ## Last Modified
//! v0.1.0 - Initial built-in methods

use anyhow::Context;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::registry::MethodRegistry;

/// Name of the addition method.
pub const CALC_ADD: &str = "Calc.Add";

/// Name of the echo method.
pub const DIAGNOSTICS_ECHO: &str = "Diagnostics.Echo";

/// Arguments of `Calc.Add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddArgs {
    /// Left operand.
    #[serde(rename = "A")]
    pub a: i64,
    /// Right operand.
    #[serde(rename = "B")]
    pub b: i64,
}

/// Reply of `Calc.Add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddReply {
    /// `A + B`.
    #[serde(rename = "Sum")]
    pub sum: i64,
}

/// Adds the two operands of a JSON `AddArgs` payload.
///
/// # Errors
/// Fails on malformed JSON or when the sum overflows `i64`.
pub fn calc_add(args: Bytes) -> anyhow::Result<Vec<u8>> {
    let args: AddArgs = serde_json::from_slice(&args).context("invalid Calc.Add arguments")?;
    let sum = args
        .a
        .checked_add(args.b)
        .context("Calc.Add overflowed")?;
    Ok(serde_json::to_vec(&AddReply { sum })?)
}

/// Returns the argument bytes unchanged.
///
/// # Errors
/// Never fails.
pub fn echo(args: Bytes) -> anyhow::Result<Vec<u8>> {
    Ok(args.to_vec())
}

/// Registers every built-in method.
///
/// # Errors
/// Returns `DuplicateMethod` if one of the names is already taken.
pub fn register_builtin(registry: &MethodRegistry) -> Result<()> {
    registry.register(CALC_ADD, calc_add)?;
    registry.register(DIAGNOSTICS_ECHO, echo)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_add() {
        let reply = calc_add(Bytes::from_static(br#"{"A":5,"B":3}"#)).unwrap();
        let reply: AddReply = serde_json::from_slice(&reply).unwrap();
        assert_eq!(reply.sum, 8);
    }

    #[test]
    fn test_calc_add_rejects_bad_input() {
        assert!(calc_add(Bytes::from_static(b"not json")).is_err());
        let overflow = format!(r#"{{"A":{},"B":1}}"#, i64::MAX);
        assert!(calc_add(Bytes::from(overflow)).is_err());
    }

    #[test]
    fn test_register_builtin_twice() {
        let registry = MethodRegistry::new();
        register_builtin(&registry).unwrap();
        assert_eq!(registry.names(), vec![CALC_ADD, DIAGNOSTICS_ECHO]);
        assert!(register_builtin(&registry).is_err());
    }
}
