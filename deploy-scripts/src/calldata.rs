//! Construction of contract creation calldata from plan arguments

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier},
    json_abi::JsonAbi,
    primitives::Bytes,
};
use serde_json::Value;

use crate::{errors::ScriptError, types::ResolvedArg};

/// Coerce the resolved arguments against the ABI's constructor inputs and
/// ABI-encode them.
///
/// Returns the typed arguments alongside their encoding.
pub fn encode_constructor_args(
    spec_key: &str,
    abi: &JsonAbi,
    args: &[ResolvedArg],
) -> Result<(Vec<DynSolValue>, Bytes), ScriptError> {
    let invalid = |cause: String| ScriptError::InvalidConstructorArgs {
        spec: spec_key.to_string(),
        cause,
    };

    let Some(constructor) = abi.constructor() else {
        if !args.is_empty() {
            return Err(invalid(format!(
                "contract has no constructor but {} arguments were given",
                args.len()
            )));
        }
        return Ok((vec![], Bytes::new()));
    };

    if constructor.inputs.len() != args.len() {
        return Err(invalid(format!(
            "expected {} arguments, got {}",
            constructor.inputs.len(),
            args.len()
        )));
    }

    let values = constructor
        .inputs
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty = param.resolve().map_err(|e| invalid(e.to_string()))?;
            coerce_arg(&ty, arg).map_err(|e| invalid(format!("`{}`: {}", param.name, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let encoded = constructor
        .abi_encode_input(&values)
        .map_err(|e| invalid(e.to_string()))?;

    Ok((values, encoded.into()))
}

/// The full creation code for a contract: its bytecode followed by its
/// encoded constructor arguments
pub fn creation_code(bytecode: &Bytes, encoded_args: &Bytes) -> Bytes {
    [bytecode.as_ref(), encoded_args.as_ref()].concat().into()
}

/// Coerce a single resolved argument to the given Solidity type
fn coerce_arg(ty: &DynSolType, arg: &ResolvedArg) -> Result<DynSolValue, String> {
    match arg {
        ResolvedArg::Address(address) if *ty == DynSolType::Address => {
            Ok(DynSolValue::Address(*address))
        }
        ResolvedArg::Address(_) => Err(format!(
            "a contract reference cannot be passed as `{}`",
            ty.sol_type_name()
        )),
        ResolvedArg::Literal(value) => coerce_json(ty, value),
    }
}

/// Coerce a JSON value to the given Solidity type.
///
/// Arrays and tuples are walked element-wise; scalars are handed to the
/// ABI's string coercion, so both `"1000"` and `1000` are valid `uint256`s.
pub fn coerce_json(ty: &DynSolType, value: &Value) -> Result<DynSolValue, String> {
    match (ty, value) {
        (DynSolType::Array(inner), Value::Array(items)) => items
            .iter()
            .map(|item| coerce_json(inner, item))
            .collect::<Result<_, _>>()
            .map(DynSolValue::Array),
        (DynSolType::FixedArray(inner, len), Value::Array(items)) => {
            if items.len() != *len {
                return Err(format!("expected {} elements, got {}", len, items.len()));
            }
            items
                .iter()
                .map(|item| coerce_json(inner, item))
                .collect::<Result<_, _>>()
                .map(DynSolValue::FixedArray)
        }
        (DynSolType::Tuple(types), Value::Array(items)) => {
            if items.len() != types.len() {
                return Err(format!(
                    "expected a tuple of {}, got {} elements",
                    types.len(),
                    items.len()
                ));
            }
            types
                .iter()
                .zip(items)
                .map(|(ty, item)| coerce_json(ty, item))
                .collect::<Result<_, _>>()
                .map(DynSolValue::Tuple)
        }
        (_, Value::String(s)) => ty.coerce_str(s).map_err(|e| e.to_string()),
        (_, Value::Number(n)) => ty.coerce_str(&n.to_string()).map_err(|e| e.to_string()),
        (_, Value::Bool(b)) => ty.coerce_str(&b.to_string()).map_err(|e| e.to_string()),
        _ => Err(format!("cannot use {} as `{}`", value, ty.sol_type_name())),
    }
}
