//! Filter expressions.
//!
//! A segment's filter is compiled once, when the segment is written, into a
//! [`Predicate`]. Queries then evaluate the cached predicate against the
//! caller's attribute context.
//!
//! ## Language
//!
//! | Construct | Example |
//! |-----------|---------|
//! | Literals | `42`, `1.5`, `"text"`, `'text'`, `true`, `false`, `nil`, `[1, 2]` |
//! | Logical | `a && b`, `a and b`, `a \|\| b`, `a or b`, `!a`, `not a` |
//! | Equality | `a == b`, `a != b` |
//! | Ordering | `<`, `<=`, `>`, `>=` |
//! | Membership | `x in [1, 2]`, `x not in ["a"]` |
//! | Strings | `contains`, `startsWith`, `endsWith`, `+` |
//! | Arithmetic | `+`, `-`, `*`, `/`, `%`, unary `-` |
//!
//! Function calls, member access and indexing are rejected at compile time,
//! as is unary `+`.
//!
//! Parentheses, arrays and unary operators nest at most 64 levels, and the
//! compiled tree is at most 256 nodes tall. Chains of `&&` or `||` compile
//! to one node however long they are; a chain of any other operator adds a
//! level per term.
//!
//! ## Failure semantics
//!
//! Evaluation never fails from the caller's point of view. A missing
//! attribute, a type mismatch, a division by zero or a non-boolean result
//! all make [`Predicate::evaluate`] return `false`.
//!
//! ```
//! use segdb_codec::Value;
//! use segdb_core::Predicate;
//! use std::collections::HashMap;
//!
//! let predicate = Predicate::compile("level >= 1 && uvs in [1, 2, 3]").unwrap();
//!
//! let mut attrs = HashMap::new();
//! attrs.insert("level".to_string(), Value::Integer(1));
//! attrs.insert("uvs".to_string(), Value::Integer(3));
//! assert!(predicate.evaluate(&attrs));
//!
//! attrs.remove("uvs");
//! assert!(!predicate.evaluate(&attrs));
//! ```

mod ast;
mod eval;
mod lexer;
mod parser;

use ast::{Expr, Operand};
use segdb_codec::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::sync::Arc;
use thiserror::Error;

/// A filter expression that could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The source is empty or only whitespace.
    #[error("filter expression is empty")]
    Empty,

    /// A character that cannot start any token.
    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar {
        /// The offending character.
        found: char,
        /// Character offset in the source.
        offset: usize,
    },

    /// A string literal without its closing quote.
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString {
        /// Offset of the opening quote.
        offset: usize,
    },

    /// A malformed or out-of-range numeric literal.
    #[error("invalid number {literal:?}")]
    InvalidNumber {
        /// The literal text as read.
        literal: String,
    },

    /// A token that does not fit the grammar at this position.
    #[error("unexpected {found} at offset {offset}, expected {expected}")]
    UnexpectedToken {
        /// Description of the token found.
        found: String,
        /// What the parser was looking for.
        expected: &'static str,
        /// Character offset in the source.
        offset: usize,
    },

    /// Syntax the expression language does not support.
    #[error("unsupported construct at offset {offset}: {construct}")]
    Unsupported {
        /// Name of the construct (for example `function call`).
        construct: &'static str,
        /// Character offset in the source.
        offset: usize,
    },

    /// Parentheses or unary operators nested beyond the parser's limit, or
    /// an operator chain too tall to evaluate safely.
    #[error("expression nested deeper than {limit} levels")]
    TooDeep {
        /// The nesting limit.
        limit: usize,
    },
}

/// Read access to a set of named attributes.
///
/// Implemented for the map types callers naturally hold, so a context can be
/// evaluated without copying it.
pub trait Attributes {
    /// Returns the value bound to `name`, if any.
    fn attribute(&self, name: &str) -> Option<&Value>;
}

impl<S: BuildHasher> Attributes for HashMap<String, Value, S> {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl Attributes for BTreeMap<String, Value> {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl<A: Attributes + ?Sized> Attributes for &A {
    fn attribute(&self, name: &str) -> Option<&Value> {
        (**self).attribute(name)
    }
}

/// A compiled, reusable filter expression.
///
/// Cloning is cheap: the compiled tree is shared.
#[derive(Clone)]
pub struct Predicate {
    source: Arc<str>,
    root: Arc<Expr>,
}

impl Predicate {
    /// Compiles filter source text.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] for empty input, syntax errors and
    /// unsupported constructs.
    pub fn compile(source: &str) -> Result<Self, CompileError> {
        let root = parser::parse(source)?;
        Ok(Self {
            source: Arc::from(source),
            root: Arc::new(root),
        })
    }

    /// Returns the source text this predicate was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates the predicate. Any evaluation failure is a non-match.
    pub fn evaluate<A: Attributes + ?Sized>(&self, attrs: &A) -> bool {
        matches!(
            eval::eval(&self.root, attrs).as_deref(),
            Ok(Operand::Bool(true))
        )
    }

    /// Evaluates the predicate, reporting why it did not match.
    ///
    /// Intended for diagnostics; queries use [`Predicate::evaluate`].
    ///
    /// # Errors
    ///
    /// Returns a description of the evaluation failure, or of the
    /// non-boolean result.
    pub fn explain<A: Attributes + ?Sized>(&self, attrs: &A) -> Result<bool, String> {
        match eval::eval(&self.root, attrs) {
            Ok(result) => match result.as_ref() {
                Operand::Bool(b) => Ok(*b),
                other => Err(format!("expression produced {}, not bool", other.type_name())),
            },
            Err(e) => Err(e.to_string()),
        }
    }

    /// Returns the attribute names the expression refers to, in order of
    /// first appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.root.collect_variables(&mut names);
        names
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.source).finish()
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Predicate {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn attrs(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn compile_and_match() {
        let p = Predicate::compile("level >= 1 && uvs in [1,2,3]").unwrap();
        assert!(p.evaluate(&attrs(&[
            ("level", Value::Integer(1)),
            ("uvs", Value::Integer(1))
        ])));
        assert!(!p.evaluate(&attrs(&[
            ("level", Value::Integer(0)),
            ("uvs", Value::Integer(1))
        ])));
        assert!(!p.evaluate(&attrs(&[
            ("level", Value::Integer(5)),
            ("uvs", Value::Integer(9))
        ])));
    }

    #[test]
    fn failures_are_non_matches() {
        let ctx = attrs(&[("level", Value::from("high")), ("n", Value::Integer(1))]);

        // missing variable
        assert!(!Predicate::compile("missing == 1").unwrap().evaluate(&ctx));
        // type mismatch
        assert!(!Predicate::compile("level >= 1").unwrap().evaluate(&ctx));
        // non-boolean result
        assert!(!Predicate::compile("n + 1").unwrap().evaluate(&ctx));
        // division by zero
        assert!(!Predicate::compile("n / 0 > 1").unwrap().evaluate(&ctx));
    }

    #[test]
    fn explain_reports_cause() {
        let p = Predicate::compile("n + 1").unwrap();
        let ctx = attrs(&[("n", Value::Integer(1))]);
        assert_eq!(p.explain(&ctx), Err("expression produced int, not bool".into()));

        let p = Predicate::compile("missing").unwrap();
        assert_eq!(p.explain(&ctx), Err("unknown variable `missing`".into()));

        let p = Predicate::compile("n == 1").unwrap();
        assert_eq!(p.explain(&ctx), Ok(true));
    }

    #[test]
    fn evaluates_btree_context() {
        let mut ctx = BTreeMap::new();
        ctx.insert("active".to_string(), Value::Bool(true));
        assert!(Predicate::compile("active").unwrap().evaluate(&ctx));
    }

    #[test]
    fn variables_in_first_appearance_order() {
        let p = Predicate::compile("b > 1 && (a == 2 || b < 5) && c in [a]").unwrap();
        assert_eq!(p.variables(), vec!["b", "a", "c"]);
    }

    #[test]
    fn debug_shows_source() {
        let p = Predicate::compile("x == 1").unwrap();
        assert_eq!(format!("{p:?}"), "Predicate(\"x == 1\")");
    }

    #[test]
    fn long_chains_compile_evaluate_and_drop() {
        let ctx = attrs(&[("level", Value::Integer(1)), ("a", Value::Bool(false))]);

        let p = Predicate::compile(&vec!["level >= 1"; 10_000].join(" && ")).unwrap();
        assert!(p.evaluate(&ctx));
        assert_eq!(p.variables(), vec!["level"]);
        drop(p);

        let p = Predicate::compile(&vec!["a"; 200_000].join(" || ")).unwrap();
        assert!(!p.evaluate(&ctx));
        let shared = p.clone();
        drop(p);
        assert!(!shared.evaluate(&ctx));
    }

    #[test]
    fn tall_arithmetic_chains_are_rejected() {
        let source = format!("{} > 0", vec!["1"; 10_000].join(" + "));
        assert!(matches!(
            Predicate::compile(&source),
            Err(CompileError::TooDeep { .. })
        ));
        assert!(Predicate::compile("1 + 1 + 1 + 1 > 0").is_ok());
    }

    #[test]
    fn compile_errors() {
        assert_eq!(Predicate::compile("").unwrap_err(), CompileError::Empty);
        assert!(Predicate::compile("level >=").is_err());
        assert!(Predicate::compile("f(x)").is_err());
        assert!(Predicate::compile("a ? b : c").is_err());
    }

    proptest! {
        #[test]
        fn integer_comparison_matches_rust(a in any::<i64>(), b in any::<i64>()) {
            let ctx = attrs(&[("a", Value::Integer(a)), ("b", Value::Integer(b))]);
            prop_assert_eq!(Predicate::compile("a < b").unwrap().evaluate(&ctx), a < b);
            prop_assert_eq!(Predicate::compile("a == b").unwrap().evaluate(&ctx), a == b);
            prop_assert_eq!(Predicate::compile("a >= b").unwrap().evaluate(&ctx), a >= b);
        }

        #[test]
        fn evaluation_never_panics(source in "[a-c0-9 +*/%<>=!&|()\\[\\],.'-]{0,160}") {
            if let Ok(p) = Predicate::compile(&source) {
                let ctx = attrs(&[
                    ("a", Value::Integer(i64::MIN)),
                    ("b", Value::Float(-0.5)),
                    ("c", Value::from("c")),
                ]);
                let _ = p.evaluate(&ctx);
            }
        }

        #[test]
        fn chains_match_iterator_semantics(
            levels in prop::collection::vec(0i64..4, 1..400),
            level in 0i64..4,
        ) {
            let terms: Vec<String> = levels.iter().map(|n| format!("level >= {n}")).collect();
            let ctx = attrs(&[("level", Value::Integer(level))]);

            let all = Predicate::compile(&terms.join(" && ")).unwrap();
            prop_assert_eq!(all.evaluate(&ctx), levels.iter().all(|n| level >= *n));
            let any = Predicate::compile(&terms.join(" || ")).unwrap();
            prop_assert_eq!(any.evaluate(&ctx), levels.iter().any(|n| level >= *n));
        }
    }
}
