//! Expression tree handed to the translator
//!
//! Expressions are plain data. Column enums generated by the derive macro
//! convert into [`Expr::Member`] nodes, literals into [`Expr::Constant`], and
//! closures into [`Expr::Captured`] nodes that are evaluated when the query is
//! translated.

use std::sync::Arc;

use chrono::NaiveDate;
use chrono::NaiveDateTime;

use crate::traits::column::ColumnTrait;
use crate::value::IntoValue;
use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        !matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        };
        write!(f, "{}", op)
    }
}

/// A value read from the caller's environment at translation time
#[derive(Clone)]
pub struct Capture(Arc<dyn Fn() -> Value + Send + Sync>);

impl Capture {
    pub fn evaluate(&self) -> Value {
        (self.0)()
    }
}

impl std::fmt::Debug for Capture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Capture(..)")
    }
}

#[derive(Clone, Debug)]
pub enum Expr {
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    /// Property path starting at the root entity, e.g. `["organisation", "name"]`
    Member(Vec<String>),
    Constant(Value),
    Captured(Capture),
    Call { method: String, target: Option<Box<Expr>>, args: Vec<Expr> },
    NewTuple(Vec<Expr>),
    ArrayInit(Vec<Expr>),
}

impl Expr {
    pub fn col(property: impl Into<String>) -> Self {
        Expr::Member(vec![property.into()])
    }

    pub fn member<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>, {
        Expr::Member(path.into_iter().map(Into::into).collect())
    }

    pub fn value<V: IntoValue>(value: V) -> Self {
        Expr::Constant(value.into_value())
    }

    pub fn captured<F, V>(f: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: IntoValue, {
        Expr::Captured(Capture(Arc::new(move || f().into_value())))
    }

    pub fn tuple(items: impl IntoIterator<Item = Expr>) -> Self {
        Expr::NewTuple(items.into_iter().collect())
    }

    pub fn array(items: impl IntoIterator<Item = Expr>) -> Self {
        Expr::ArrayInit(items.into_iter().collect())
    }

    /// Step into a property of a member; on anything else this becomes a
    /// call the translator rejects.
    pub fn field(self, property: impl Into<String>) -> Self {
        match self {
            Expr::Member(mut path) => {
                path.push(property.into());
                Expr::Member(path)
            }
            other => other.call(property, vec![]),
        }
    }

    pub fn call(self, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call { method: method.into(), target: Some(Box::new(self)), args }
    }

    fn binary(self, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary { op, left: Box::new(self), right: Box::new(right) }
    }

    pub fn eq(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Eq, right.into())
    }

    pub fn ne(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Ne, right.into())
    }

    pub fn lt(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Lt, right.into())
    }

    pub fn lte(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Le, right.into())
    }

    pub fn gt(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Gt, right.into())
    }

    pub fn gte(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Ge, right.into())
    }

    pub fn and(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::And, right.into())
    }

    pub fn or(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Or, right.into())
    }

    pub fn contains(self, value: impl Into<Expr>) -> Self {
        self.call("Contains", vec![value.into()])
    }

    pub fn starts_with(self, value: impl Into<Expr>) -> Self {
        self.call("StartsWith", vec![value.into()])
    }

    pub fn ends_with(self, value: impl Into<Expr>) -> Self {
        self.call("EndsWith", vec![value.into()])
    }

    pub fn as_text(self) -> Self {
        self.call("ToString", vec![])
    }

    pub fn asc(self) -> Self {
        self.call("Asc", vec![])
    }

    pub fn desc(self) -> Self {
        self.call("Desc", vec![])
    }

    pub fn left(self) -> Self {
        self.call("Left", vec![])
    }

    pub fn inner(self) -> Self {
        self.call("Inner", vec![])
    }

    /// Node kind, as named in translation errors
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Binary { .. } => "Binary",
            Expr::Member(_) => "Member",
            Expr::Constant(_) => "Constant",
            Expr::Captured(_) => "Captured",
            Expr::Call { .. } => "Call",
            Expr::NewTuple(_) => "NewTuple",
            Expr::ArrayInit(_) => "ArrayInit",
        }
    }
}

macro_rules! constant_expr {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Expr::Constant(value.into_value())
                }
            }
        )*
    };
}

constant_expr!(i64, i32, i16, i8, u32, u16, u8, f64, f32, bool, String, &str, Vec<u8>, NaiveDateTime, NaiveDate, Value);

impl<T: IntoValue> From<Option<T>> for Expr {
    fn from(value: Option<T>) -> Self {
        Expr::Constant(value.into_value())
    }
}

/// Expression combinators on generated column enums
///
/// ```ignore
/// let filter = UserColumn::Name.contains("ar").and(UserColumn::Id.gt(10));
/// let join = UserColumn::Organisation.left();
/// ```
pub trait ColumnExt: ColumnTrait {
    fn expr(self) -> Expr {
        Expr::col(self.property())
    }

    fn field(self, property: impl Into<String>) -> Expr {
        self.expr().field(property)
    }

    fn eq(self, right: impl Into<Expr>) -> Expr {
        self.expr().eq(right)
    }

    fn ne(self, right: impl Into<Expr>) -> Expr {
        self.expr().ne(right)
    }

    fn lt(self, right: impl Into<Expr>) -> Expr {
        self.expr().lt(right)
    }

    fn lte(self, right: impl Into<Expr>) -> Expr {
        self.expr().lte(right)
    }

    fn gt(self, right: impl Into<Expr>) -> Expr {
        self.expr().gt(right)
    }

    fn gte(self, right: impl Into<Expr>) -> Expr {
        self.expr().gte(right)
    }

    fn is_null(self) -> Expr {
        self.expr().eq(Value::Null)
    }

    fn is_not_null(self) -> Expr {
        self.expr().ne(Value::Null)
    }

    fn contains(self, value: impl Into<Expr>) -> Expr {
        self.expr().contains(value)
    }

    fn starts_with(self, value: impl Into<Expr>) -> Expr {
        self.expr().starts_with(value)
    }

    fn ends_with(self, value: impl Into<Expr>) -> Expr {
        self.expr().ends_with(value)
    }

    fn asc(self) -> Expr {
        self.expr().asc()
    }

    fn desc(self) -> Expr {
        self.expr().desc()
    }

    fn left(self) -> Expr {
        self.expr().left()
    }

    fn inner(self) -> Expr {
        self.expr().inner()
    }
}

impl<C: ColumnTrait> ColumnExt for C {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_op_renders_t_sql_operators() {
        assert_eq!(BinaryOp::Ne.to_string(), "<>");
        assert_eq!(BinaryOp::Le.to_string(), "<=");
        assert_eq!(BinaryOp::And.to_string(), "AND");
        assert!(BinaryOp::Gt.is_comparison());
        assert!(!BinaryOp::Or.is_comparison());
    }

    #[test]
    fn test_field_extends_member_path() {
        let expr = Expr::col("organisation").field("name");
        assert!(matches!(expr, Expr::Member(ref path) if path == &["organisation", "name"]));
    }

    #[test]
    fn test_field_on_constant_becomes_call() {
        let expr = Expr::value(1).field("name");
        assert!(matches!(expr, Expr::Call { ref method, .. } if method == "name"));
    }

    #[test]
    fn test_captured_evaluates_late() {
        let source = Arc::new(std::sync::atomic::AtomicI64::new(1));
        let read = source.clone();
        let expr = Expr::captured(move || read.load(std::sync::atomic::Ordering::SeqCst));
        source.store(19, std::sync::atomic::Ordering::SeqCst);
        match expr {
            Expr::Captured(capture) => assert_eq!(capture.evaluate(), Value::Integer(19)),
            other => panic!("unexpected node {}", other.kind()),
        }
    }

    #[test]
    fn test_option_converts_to_constant() {
        let expr: Expr = None::<i64>.into();
        assert!(matches!(expr, Expr::Constant(Value::Null)));
    }
}
