//! Statement execution boundary
//!
//! The ORM produces SQL text plus an ordered parameter list. Everything that
//! actually talks to a server sits behind the traits in this module.

use async_trait::async_trait;

use crate::error::Result;
use crate::query::Parameter;
use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NonQueryKind {
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for NonQueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonQueryKind::Insert => write!(f, "INSERT"),
            NonQueryKind::Update => write!(f, "UPDATE"),
            NonQueryKind::Delete => write!(f, "DELETE"),
        }
    }
}

/// What a non-query statement handed back
#[derive(Clone, Debug, PartialEq)]
pub enum NonQueryResult {
    /// Scalar returned by an insert that selects the new identity
    Identity(Value),
    RowsAffected(u64),
    Nothing,
}

/// Forward-only reader over a result set
#[async_trait]
pub trait RowCursor: Send {
    fn field_count(&self) -> usize;

    fn name(&self, index: usize) -> &str;

    /// Value of the current row, `Value::Null` outside the row bounds
    fn value(&self, index: usize) -> Value;

    /// Advance to the next row
    async fn read(&mut self) -> Result<bool>;
}

#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute_non_query(&self, sql: &str, params: &[Parameter], kind: NonQueryKind) -> Result<NonQueryResult>;

    async fn execute_query(&self, sql: &str, params: &[Parameter]) -> Result<Box<dyn RowCursor>>;

    async fn begin(&self) -> Result<()>;

    async fn commit(&self) -> Result<()>;

    async fn rollback(&self) -> Result<()>;
}

/// Opens executors; one per [`Connection`](crate::Connection)
#[async_trait]
pub trait Driver: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Executor>>;
}

/// An in-memory result set
///
/// ```ignore
/// let rows = MemoryRows::new(["Id", "Name"])
///     .row([Value::Integer(1), Value::Text("Ada".into())])
///     .row([Value::Integer(2), Value::Text("Grace".into())]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryRows {
    columns:  Vec<String>,
    rows:     Vec<Vec<Value>>,
    position: Option<usize>,
}

impl MemoryRows {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>, {
        Self { columns: columns.into_iter().map(Into::into).collect(), rows: Vec::new(), position: None }
    }

    pub fn row(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.rows.push(values.into_iter().collect());
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl RowCursor for MemoryRows {
    fn field_count(&self) -> usize {
        self.columns.len()
    }

    fn name(&self, index: usize) -> &str {
        self.columns.get(index).map(String::as_str).unwrap_or_default()
    }

    fn value(&self, index: usize) -> Value {
        self.position.and_then(|p| self.rows.get(p)).and_then(|r| r.get(index)).cloned().unwrap_or_default()
    }

    async fn read(&mut self) -> Result<bool> {
        let next = self.position.map_or(0, |p| p + 1);
        self.position = Some(next.min(self.rows.len()));
        Ok(next < self.rows.len())
    }
}
