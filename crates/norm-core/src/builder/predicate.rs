//! Typed predicates over entity fields.
//!
//! Predicates are built from column handles generated by `#[derive(Entity)]`
//! and can be combined with AND, OR, and NOT:
//!
//! ```ignore
//! let p = Post::id().eq(1).and(Post::title().eq("Test"));
//! ```
//!
//! Only equality and conjunction compile to SQL; the remaining nodes exist
//! so that callers get a descriptive error instead of a type error.

use std::fmt;
use std::marker::PhantomData;

use crate::builder::value::SqlValue;
use crate::dialect::Dialect;
use crate::error::{CoreError, Result};
use crate::schema::{Entity, EntityDescriptor, FieldValue};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "!="),
            Self::Gt => write!(f, ">"),
            Self::Gte => write!(f, ">="),
            Self::Lt => write!(f, "<"),
            Self::Lte => write!(f, "<="),
        }
    }
}

/// Untyped predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `field op value`
    Comparison {
        /// Rust field name.
        field: String,
        /// Operator.
        op: CompareOp,
        /// Value captured when the predicate was built.
        value: SqlValue,
    },
    /// `field IS NULL`
    IsNull {
        /// Rust field name.
        field: String,
    },
    /// AND combination
    And(Box<Expr>, Box<Expr>),
    /// OR combination
    Or(Box<Expr>, Box<Expr>),
    /// NOT negation
    Not(Box<Expr>),
}

impl Expr {
    /// Name of the node kind, as reported by [`CoreError::UnsupportedPredicate`].
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Comparison { op, .. } => match op {
                CompareOp::Eq => "Equal",
                CompareOp::Ne => "NotEqual",
                CompareOp::Gt => "GreaterThan",
                CompareOp::Gte => "GreaterThanOrEqual",
                CompareOp::Lt => "LessThan",
                CompareOp::Lte => "LessThanOrEqual",
            },
            Self::IsNull { .. } => "IsNull",
            Self::And(..) => "AndAlso",
            Self::Or(..) => "OrElse",
            Self::Not(_) => "Not",
        }
    }
}

/// A predicate over entity `T`.
pub struct Predicate<T> {
    expr: Expr,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Predicate<T> {
    /// Wraps an untyped tree.
    #[must_use]
    pub const fn from_expr(expr: Expr) -> Self {
        Self {
            expr,
            _entity: PhantomData,
        }
    }

    /// Comparison of a field against a value.
    pub fn compare(field: &str, op: CompareOp, value: SqlValue) -> Self {
        Self::from_expr(Expr::Comparison {
            field: field.to_string(),
            op,
            value,
        })
    }

    /// The untyped tree.
    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Combines with AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::from_expr(Expr::And(Box::new(self.expr), Box::new(other.expr)))
    }

    /// Combines with OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::from_expr(Expr::Or(Box::new(self.expr), Box::new(other.expr)))
    }

    /// Negates the predicate.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::from_expr(Expr::Not(Box::new(self.expr)))
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self::from_expr(self.expr.clone())
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.expr).finish()
    }
}

/// A typed handle on one column of an entity.
///
/// Implemented by the column types `#[derive(Entity)]` generates.
pub trait Column: Copy {
    /// The entity this column belongs to.
    type Entity: Entity;
    /// The Rust type of the field.
    type Value: FieldValue;
    /// Rust field name.
    const FIELD: &'static str;

    /// `column = value`
    fn eq(self, value: impl Into<Self::Value>) -> Predicate<Self::Entity> {
        let value: Self::Value = value.into();
        Predicate::compare(Self::FIELD, CompareOp::Eq, value.to_value())
    }

    /// `column != value`
    fn ne(self, value: impl Into<Self::Value>) -> Predicate<Self::Entity> {
        let value: Self::Value = value.into();
        Predicate::compare(Self::FIELD, CompareOp::Ne, value.to_value())
    }

    /// `column < value`
    fn lt(self, value: impl Into<Self::Value>) -> Predicate<Self::Entity> {
        let value: Self::Value = value.into();
        Predicate::compare(Self::FIELD, CompareOp::Lt, value.to_value())
    }

    /// `column > value`
    fn gt(self, value: impl Into<Self::Value>) -> Predicate<Self::Entity> {
        let value: Self::Value = value.into();
        Predicate::compare(Self::FIELD, CompareOp::Gt, value.to_value())
    }

    /// `column IS NULL`
    fn is_null(self) -> Predicate<Self::Entity> {
        Predicate::from_expr(Expr::IsNull {
            field: Self::FIELD.to_string(),
        })
    }
}

/// Compiles a predicate tree into a `WHERE` clause body.
///
/// Fields resolve to their storage column names; a field the descriptor does
/// not know is used verbatim.
///
/// # Errors
///
/// Returns [`CoreError::UnsupportedPredicate`] for any node other than AND
/// and equality.
pub fn compile(expr: &Expr, descriptor: &EntityDescriptor, dialect: Dialect) -> Result<String> {
    let mut conjuncts = Vec::new();
    collect_conjuncts(expr, descriptor, dialect, &mut conjuncts)?;
    Ok(conjuncts.join(" AND "))
}

fn collect_conjuncts(
    expr: &Expr,
    descriptor: &EntityDescriptor,
    dialect: Dialect,
    out: &mut Vec<String>,
) -> Result<()> {
    match expr {
        Expr::And(left, right) => {
            collect_conjuncts(left, descriptor, dialect, out)?;
            collect_conjuncts(right, descriptor, dialect, out)
        }
        Expr::Comparison {
            field,
            op: CompareOp::Eq,
            value,
        } => {
            let column = descriptor
                .column_by_field(field)
                .map_or(field.as_str(), |c| c.name);
            out.push(format!("{column} = {}", value.to_sql_literal(dialect)));
            Ok(())
        }
        other => Err(CoreError::UnsupportedPredicate(other.kind().to_string())),
    }
}
