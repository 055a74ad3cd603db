//! In-memory driver for tests
//!
//! [`MemoryDriver`] records every statement it is handed and answers from a
//! queue of scripted responses. When the queue is empty it falls back to
//! sensible defaults: an empty result set for queries, a fresh identity for
//! inserts that select one, and one affected row otherwise.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use async_trait::async_trait;

use crate::error::Error;
use crate::error::Result;
use crate::executor::Driver;
use crate::executor::Executor;
use crate::executor::MemoryRows;
use crate::executor::NonQueryKind;
use crate::executor::NonQueryResult;
use crate::executor::RowCursor;
use crate::query::Parameter;
use crate::value::IntoValue;
use crate::value::Value;

#[derive(Clone, Debug, PartialEq)]
pub struct ExecutedStatement {
    pub sql:        String,
    pub parameters: Vec<Parameter>,
    /// `None` for queries
    pub kind:       Option<NonQueryKind>,
}

#[derive(Debug)]
enum Response {
    Rows(MemoryRows),
    NonQuery(NonQueryResult),
    Failure(String),
}

#[derive(Debug, Default)]
struct Script {
    responses:     VecDeque<Response>,
    executed:      Vec<ExecutedStatement>,
    transactions:  Vec<&'static str>,
    last_identity: i64,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryDriver {
    script: Arc<Mutex<Script>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a result set for the next query
    pub fn push_rows(&self, rows: MemoryRows) -> &Self {
        self.lock().responses.push_back(Response::Rows(rows));
        self
    }

    /// Queue the identity value the next insert returns
    pub fn push_identity(&self, identity: impl IntoValue) -> &Self {
        self.lock().responses.push_back(Response::NonQuery(NonQueryResult::Identity(identity.into_value())));
        self
    }

    pub fn push_rows_affected(&self, rows: u64) -> &Self {
        self.lock().responses.push_back(Response::NonQuery(NonQueryResult::RowsAffected(rows)));
        self
    }

    /// Make the next statement fail with a driver error
    pub fn push_failure(&self, message: &str) -> &Self {
        self.lock().responses.push_back(Response::Failure(message.to_string()));
        self
    }

    pub fn executed(&self) -> Vec<ExecutedStatement> {
        self.lock().executed.clone()
    }

    pub fn executed_sql(&self) -> Vec<String> {
        self.lock().executed.iter().map(|s| s.sql.clone()).collect()
    }

    /// `BEGIN`, `COMMIT` and `ROLLBACK` calls in order
    pub fn transactions(&self) -> Vec<&'static str> {
        self.lock().transactions.clone()
    }

    pub fn clear(&self) {
        let mut script = self.lock();
        script.executed.clear();
        script.transactions.clear();
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn connect(&self) -> Result<Box<dyn Executor>> {
        Ok(Box::new(MemoryExecutor { script: self.script.clone() }))
    }
}

#[derive(Debug)]
pub struct MemoryExecutor {
    script: Arc<Mutex<Script>>,
}

impl MemoryExecutor {
    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Executor for MemoryExecutor {
    async fn execute_non_query(&self, sql: &str, params: &[Parameter], kind: NonQueryKind) -> Result<NonQueryResult> {
        let mut script = self.lock();
        script.executed.push(ExecutedStatement { sql: sql.to_string(), parameters: params.to_vec(), kind: Some(kind) });
        match script.responses.pop_front() {
            Some(Response::NonQuery(result)) => Ok(result),
            Some(Response::Failure(message)) => Err(Error::Driver(message)),
            Some(Response::Rows(_)) => Err(Error::Driver(format!("Scripted rows cannot answer {}", kind))),
            None if kind == NonQueryKind::Insert && sql.contains("SCOPE_IDENTITY") => {
                script.last_identity += 1;
                Ok(NonQueryResult::Identity(Value::Integer(script.last_identity)))
            }
            None => Ok(NonQueryResult::RowsAffected(1)),
        }
    }

    async fn execute_query(&self, sql: &str, params: &[Parameter]) -> Result<Box<dyn RowCursor>> {
        let mut script = self.lock();
        script.executed.push(ExecutedStatement { sql: sql.to_string(), parameters: params.to_vec(), kind: None });
        match script.responses.pop_front() {
            Some(Response::Rows(rows)) => Ok(Box::new(rows)),
            Some(Response::Failure(message)) => Err(Error::Driver(message)),
            Some(Response::NonQuery(result)) => Err(Error::Driver(format!("Scripted {:?} cannot answer a query", result))),
            None => Ok(Box::new(MemoryRows::default())),
        }
    }

    async fn begin(&self) -> Result<()> {
        self.lock().transactions.push("BEGIN");
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        self.lock().transactions.push("COMMIT");
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        self.lock().transactions.push("ROLLBACK");
        Ok(())
    }
}
