use crate::error::CompileError;
use crate::gocode::Expr;
use crate::project::{Input, InputValue, Scalar, ShadowStatus};

/// Turns an input slot into a Go expression.
///
/// Literals in a plain shadow become Go literals; with `to_number` set, text
/// literals must parse as a float. A broadcast becomes its id as a string.
/// Everything else, most importantly a nested reporter block, yields `None`:
/// reporters are not compiled yet, and callers decide how to degrade (see
/// [`Input::reporter_id`] for the block to resolve).
pub fn resolve_input(input: &Input, to_number: bool) -> Result<Option<Expr>, CompileError> {
    if input.shadow == ShadowStatus::Shadow {
        if let InputValue::Literal { value, .. } = &input.value {
            return match value {
                Scalar::Number(n) => Ok(Some(Expr::Number(*n))),
                Scalar::Text(s) if to_number => parse_number(s).map(|n| Some(Expr::Number(n))),
                Scalar::Text(s) => Ok(Some(Expr::Text(s.clone()))),
            };
        }
    }
    if let InputValue::Broadcast { id, .. } = &input.value {
        return Ok(Some(Expr::Text(id.clone())));
    }
    Ok(None)
}

fn parse_number(literal: &str) -> Result<f64, CompileError> {
    literal
        .parse::<f64>()
        .map_err(|_| CompileError::InvalidNumericLiteral {
            literal: literal.to_string(),
        })
}
