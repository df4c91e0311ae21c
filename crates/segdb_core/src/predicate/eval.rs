//! Tree-walking evaluator for compiled expressions.

use super::ast::{BinaryOp, Expr, LogicalOp, Operand, UnaryOp};
use super::Attributes;
use segdb_codec::Value;
use std::borrow::Cow;
use std::cmp::Ordering;
use thiserror::Error;

/// Reasons an evaluation did not produce a value.
///
/// These never leave the predicate engine as errors; they only turn a
/// match into a non-match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum EvalError {
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
    #[error("cannot apply `{op}` to {lhs} and {rhs}")]
    TypeMismatch {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("`{op}` expects {expected}, got {found}")]
    BadOperand {
        op: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
}

type EvalResult<'e> = Result<Cow<'e, Operand>, EvalError>;

/// Evaluates `expr` against `attrs`.
pub(crate) fn eval<'e, A>(expr: &'e Expr, attrs: &A) -> EvalResult<'e>
where
    A: Attributes + ?Sized,
{
    match expr {
        Expr::Literal(operand) => Ok(Cow::Borrowed(operand)),
        Expr::Variable(name) => attrs
            .attribute(name)
            .map(|value| Cow::Owned(from_value(value)))
            .ok_or_else(|| EvalError::UnknownVariable(name.clone())),
        Expr::Array { items, .. } => items
            .iter()
            .map(|item| eval(item, attrs).map(Cow::into_owned))
            .collect::<Result<Vec<_>, _>>()
            .map(|items| Cow::Owned(Operand::Array(items))),
        Expr::Logical { op, terms, .. } => {
            let (name, decisive) = match op {
                LogicalOp::And => ("&&", false),
                LogicalOp::Or => ("||", true),
            };
            for term in terms {
                let value = eval(term, attrs)?;
                if expect_bool(name, &value)? == decisive {
                    return Ok(Cow::Owned(Operand::Bool(decisive)));
                }
            }
            Ok(Cow::Owned(Operand::Bool(!decisive)))
        }
        Expr::Unary { op, operand, .. } => {
            let operand = eval(operand, attrs)?;
            unary(*op, &operand).map(Cow::Owned)
        }
        Expr::Binary { op, lhs, rhs, .. } => {
            let lhs = eval(lhs, attrs)?;
            let rhs = eval(rhs, attrs)?;
            binary(*op, &lhs, &rhs).map(Cow::Owned)
        }
    }
}

fn from_value(value: &Value) -> Operand {
    match value {
        Value::Bool(b) => Operand::Bool(*b),
        Value::Integer(n) => Operand::Int(*n),
        Value::Float(f) => Operand::Float(*f),
        Value::Text(s) => Operand::Str(s.clone()),
    }
}

fn expect_bool(op: &'static str, operand: &Operand) -> Result<bool, EvalError> {
    match operand {
        Operand::Bool(b) => Ok(*b),
        other => Err(EvalError::BadOperand {
            op,
            expected: "bool",
            found: other.type_name(),
        }),
    }
}

fn unary(op: UnaryOp, operand: &Operand) -> Result<Operand, EvalError> {
    match (op, operand) {
        (UnaryOp::Not, Operand::Bool(b)) => Ok(Operand::Bool(!b)),
        (UnaryOp::Neg, Operand::Int(n)) => n.checked_neg().map(Operand::Int).ok_or(EvalError::Overflow),
        (UnaryOp::Neg, Operand::Float(f)) => Ok(Operand::Float(-f)),
        (UnaryOp::Not, other) => Err(EvalError::BadOperand {
            op: "!",
            expected: "bool",
            found: other.type_name(),
        }),
        (UnaryOp::Neg, other) => Err(EvalError::BadOperand {
            op: "-",
            expected: "a number",
            found: other.type_name(),
        }),
    }
}

fn binary(op: BinaryOp, lhs: &Operand, rhs: &Operand) -> Result<Operand, EvalError> {
    let result = match op {
        BinaryOp::Eq => Operand::Bool(equals(lhs, rhs)),
        BinaryOp::Ne => Operand::Bool(!equals(lhs, rhs)),
        BinaryOp::Lt => Operand::Bool(compare("<", lhs, rhs)? == Ordering::Less),
        BinaryOp::Le => Operand::Bool(compare("<=", lhs, rhs)? != Ordering::Greater),
        BinaryOp::Gt => Operand::Bool(compare(">", lhs, rhs)? == Ordering::Greater),
        BinaryOp::Ge => Operand::Bool(compare(">=", lhs, rhs)? != Ordering::Less),
        BinaryOp::In => Operand::Bool(member("in", lhs, rhs)?),
        BinaryOp::NotIn => Operand::Bool(!member("not in", lhs, rhs)?),
        BinaryOp::Contains => Operand::Bool(text_op("contains", lhs, rhs, |l, r| l.contains(r))?),
        BinaryOp::StartsWith => {
            Operand::Bool(text_op("startsWith", lhs, rhs, |l, r| l.starts_with(r))?)
        }
        BinaryOp::EndsWith => Operand::Bool(text_op("endsWith", lhs, rhs, |l, r| l.ends_with(r))?),
        BinaryOp::Add => match (lhs, rhs) {
            (Operand::Str(l), Operand::Str(r)) => Operand::Str(format!("{l}{r}")),
            _ => arithmetic("+", lhs, rhs, i64::checked_add, |l, r| l + r)?,
        },
        BinaryOp::Sub => arithmetic("-", lhs, rhs, i64::checked_sub, |l, r| l - r)?,
        BinaryOp::Mul => arithmetic("*", lhs, rhs, i64::checked_mul, |l, r| l * r)?,
        BinaryOp::Div => {
            let (l, r) = as_floats("/", lhs, rhs)?;
            if r == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Operand::Float(l / r)
        }
        BinaryOp::Rem => match (lhs, rhs) {
            (Operand::Int(_), Operand::Int(0)) => return Err(EvalError::DivisionByZero),
            (Operand::Int(l), Operand::Int(r)) => {
                Operand::Int(l.checked_rem(*r).ok_or(EvalError::Overflow)?)
            }
            _ => return Err(mismatch("%", lhs, rhs)),
        },
    };
    Ok(result)
}

fn mismatch(op: &'static str, lhs: &Operand, rhs: &Operand) -> EvalError {
    EvalError::TypeMismatch {
        op,
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    }
}

/// Equality never fails: operands of unrelated types are simply unequal.
fn equals(lhs: &Operand, rhs: &Operand) -> bool {
    match (lhs, rhs) {
        (Operand::Nil, Operand::Nil) => true,
        (Operand::Bool(l), Operand::Bool(r)) => l == r,
        (Operand::Int(l), Operand::Int(r)) => l == r,
        (Operand::Str(l), Operand::Str(r)) => l == r,
        (Operand::Array(l), Operand::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| equals(a, b))
        }
        (Operand::Int(_) | Operand::Float(_), Operand::Int(_) | Operand::Float(_)) => {
            numeric_cmp(lhs, rhs) == Some(Ordering::Equal)
        }
        _ => false,
    }
}

fn compare(op: &'static str, lhs: &Operand, rhs: &Operand) -> Result<Ordering, EvalError> {
    match (lhs, rhs) {
        (Operand::Str(l), Operand::Str(r)) => Ok(l.cmp(r)),
        _ => numeric_cmp(lhs, rhs).ok_or_else(|| mismatch(op, lhs, rhs)),
    }
}

#[allow(clippy::cast_precision_loss)]
fn numeric_cmp(lhs: &Operand, rhs: &Operand) -> Option<Ordering> {
    match (lhs, rhs) {
        (Operand::Int(l), Operand::Int(r)) => Some(l.cmp(r)),
        (Operand::Int(l), Operand::Float(r)) => (*l as f64).partial_cmp(r),
        (Operand::Float(l), Operand::Int(r)) => l.partial_cmp(&(*r as f64)),
        (Operand::Float(l), Operand::Float(r)) => l.partial_cmp(r),
        _ => None,
    }
}

fn member(op: &'static str, needle: &Operand, haystack: &Operand) -> Result<bool, EvalError> {
    match haystack {
        Operand::Array(items) => Ok(items.iter().any(|item| equals(needle, item))),
        other => Err(EvalError::BadOperand {
            op,
            expected: "an array",
            found: other.type_name(),
        }),
    }
}

fn text_op(
    op: &'static str,
    lhs: &Operand,
    rhs: &Operand,
    f: impl FnOnce(&str, &str) -> bool,
) -> Result<bool, EvalError> {
    match (lhs, rhs) {
        (Operand::Str(l), Operand::Str(r)) => Ok(f(l, r)),
        _ => Err(mismatch(op, lhs, rhs)),
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_floats(op: &'static str, lhs: &Operand, rhs: &Operand) -> Result<(f64, f64), EvalError> {
    let widen = |operand: &Operand| match operand {
        Operand::Int(n) => Some(*n as f64),
        Operand::Float(f) => Some(*f),
        _ => None,
    };
    match (widen(lhs), widen(rhs)) {
        (Some(l), Some(r)) => Ok((l, r)),
        _ => Err(mismatch(op, lhs, rhs)),
    }
}

fn arithmetic(
    op: &'static str,
    lhs: &Operand,
    rhs: &Operand,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Operand, EvalError> {
    if let (Operand::Int(l), Operand::Int(r)) = (lhs, rhs) {
        return int_op(*l, *r).map(Operand::Int).ok_or(EvalError::Overflow);
    }
    let (l, r) = as_floats(op, lhs, rhs)?;
    Ok(Operand::Float(float_op(l, r)))
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse;
    use super::*;
    use std::collections::HashMap;

    fn ctx(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn run(source: &str, attrs: &HashMap<String, Value>) -> Result<Operand, EvalError> {
        let expr = parse(source).unwrap();
        eval(&expr, attrs).map(Cow::into_owned)
    }

    #[test]
    fn arithmetic_and_promotion() {
        let attrs = ctx(&[("a", Value::Integer(7)), ("b", Value::Float(0.5))]);
        assert_eq!(run("a + 1", &attrs), Ok(Operand::Int(8)));
        assert_eq!(run("a * b", &attrs), Ok(Operand::Float(3.5)));
        assert_eq!(run("a / 2", &attrs), Ok(Operand::Float(3.5)));
        assert_eq!(run("a % 4", &attrs), Ok(Operand::Int(3)));
        assert_eq!(run("-a", &attrs), Ok(Operand::Int(-7)));
        assert_eq!(run("'ab' + 'cd'", &attrs), Ok(Operand::Str("abcd".into())));
    }

    #[test]
    fn arithmetic_failures() {
        let attrs = ctx(&[("max", Value::Integer(i64::MAX)), ("s", Value::from("x"))]);
        assert_eq!(run("max + 1", &attrs), Err(EvalError::Overflow));
        assert_eq!(run("1 / 0", &attrs), Err(EvalError::DivisionByZero));
        assert_eq!(run("1 % 0", &attrs), Err(EvalError::DivisionByZero));
        assert!(matches!(run("s + 1", &attrs), Err(EvalError::TypeMismatch { .. })));
        assert!(matches!(run("-s", &attrs), Err(EvalError::BadOperand { .. })));
    }

    #[test]
    fn comparisons() {
        let attrs = ctx(&[("level", Value::Integer(2)), ("name", Value::from("bob"))]);
        assert_eq!(run("level >= 1.5", &attrs), Ok(Operand::Bool(true)));
        assert_eq!(run("level < 2", &attrs), Ok(Operand::Bool(false)));
        assert_eq!(run("level == 2.0", &attrs), Ok(Operand::Bool(true)));
        assert_eq!(run("name > 'alice'", &attrs), Ok(Operand::Bool(true)));
        assert!(matches!(run("name > 1", &attrs), Err(EvalError::TypeMismatch { .. })));
    }

    #[test]
    fn equality_across_types_is_false() {
        let attrs = ctx(&[("n", Value::Integer(1)), ("t", Value::from("1"))]);
        assert_eq!(run("n == t", &attrs), Ok(Operand::Bool(false)));
        assert_eq!(run("n != t", &attrs), Ok(Operand::Bool(true)));
        assert_eq!(run("n == nil", &attrs), Ok(Operand::Bool(false)));
        assert_eq!(run("nil == nil", &attrs), Ok(Operand::Bool(true)));
        assert_eq!(run("[1, 2] == [1.0, 2]", &attrs), Ok(Operand::Bool(true)));
    }

    #[test]
    fn membership() {
        let attrs = ctx(&[("uvs", Value::Integer(2)), ("c", Value::from("US"))]);
        assert_eq!(run("uvs in [1, 2, 3]", &attrs), Ok(Operand::Bool(true)));
        assert_eq!(run("uvs in [uvs + 1]", &attrs), Ok(Operand::Bool(false)));
        assert_eq!(run("c not in ['CA', 'MX']", &attrs), Ok(Operand::Bool(true)));
        assert!(matches!(run("uvs in 3", &attrs), Err(EvalError::BadOperand { .. })));
    }

    #[test]
    fn string_operators() {
        let attrs = ctx(&[("path", Value::from("/promo/spring"))]);
        assert_eq!(run("path startsWith '/promo'", &attrs), Ok(Operand::Bool(true)));
        assert_eq!(run("path endsWith 'fall'", &attrs), Ok(Operand::Bool(false)));
        assert_eq!(run("path contains 'spr'", &attrs), Ok(Operand::Bool(true)));
        assert!(matches!(
            run("path contains 1", &attrs),
            Err(EvalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn logical_short_circuit() {
        let attrs = ctx(&[("flag", Value::Bool(false))]);
        // `missing` is never looked up
        assert_eq!(run("flag && missing", &attrs), Ok(Operand::Bool(false)));
        assert_eq!(run("!flag || missing", &attrs), Ok(Operand::Bool(true)));
        assert_eq!(
            run("flag || missing", &attrs),
            Err(EvalError::UnknownVariable("missing".into()))
        );
        assert!(matches!(run("1 && flag", &attrs), Err(EvalError::BadOperand { .. })));
        assert!(matches!(run("flag || 1", &attrs), Err(EvalError::BadOperand { .. })));
    }

    #[test]
    fn chains_stop_at_the_first_decisive_term() {
        let attrs = ctx(&[("t", Value::Bool(true)), ("f", Value::Bool(false))]);
        assert_eq!(run("t && t && f && missing", &attrs), Ok(Operand::Bool(false)));
        assert_eq!(run("f || f || t || missing", &attrs), Ok(Operand::Bool(true)));
        assert_eq!(run("t and t and t", &attrs), Ok(Operand::Bool(true)));
        assert_eq!(run("f or f or f", &attrs), Ok(Operand::Bool(false)));
        assert_eq!(
            run("t && t && missing", &attrs),
            Err(EvalError::UnknownVariable("missing".into()))
        );
        assert!(matches!(
            run("f || f || 'x'", &attrs),
            Err(EvalError::BadOperand { op: "||", found: "string", .. })
        ));
    }

    #[test]
    fn unary_errors_name_their_operator() {
        let attrs = ctx(&[("s", Value::from("x")), ("n", Value::Integer(1))]);
        assert_eq!(
            run("-s", &attrs),
            Err(EvalError::BadOperand {
                op: "-",
                expected: "a number",
                found: "string",
            })
        );
        assert_eq!(
            run("!n", &attrs),
            Err(EvalError::BadOperand {
                op: "!",
                expected: "bool",
                found: "int",
            })
        );
    }

    #[test]
    fn long_chain_evaluates() {
        let attrs = ctx(&[("level", Value::Integer(1))]);
        let source = vec!["level >= 1"; 10_000].join(" && ");
        assert_eq!(run(&source, &attrs), Ok(Operand::Bool(true)));

        let source = format!("{} || level == 1", vec!["level > 1"; 10_000].join(" || "));
        assert_eq!(run(&source, &attrs), Ok(Operand::Bool(true)));
    }
}
