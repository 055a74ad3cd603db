pub(crate) mod builder;
pub(crate) mod database;
pub(crate) mod opts;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use crate::Collection;
use crate::Entity;
use crate::Result;
use crate::executor::Executor;
use crate::executor::NonQueryResult;
use crate::executor::RowCursor;
use crate::query::SelectQuery;
use crate::query::Statement;
use crate::schema::Catalog;
use crate::schema::TableSchema;
use crate::traits::table::Table;

pub mod prelude {
    pub use super::Connection;
    pub use super::builder::Builder;
    pub use super::database::Database;
}

/// One open executor plus the shared schema catalog
pub struct Connection {
    inner:          Box<dyn Executor>,
    catalog:        Arc<Catalog>,
    opts:           opts::DatabaseOpts,
    in_transaction: AtomicBool,
}

impl Connection {
    fn new(inner: Box<dyn Executor>, catalog: Arc<Catalog>, opts: opts::DatabaseOpts) -> Self {
        Self { inner, catalog, opts, in_transaction: AtomicBool::new(false) }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn schema_name(&self) -> &str {
        self.opts.schema_name.as_str()
    }

    pub fn is_change_tracking_enabled(&self) -> bool {
        self.opts.change_tracking
    }

    pub fn is_test_mode(&self) -> bool {
        self.opts.test_mode
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction.load(Ordering::SeqCst)
    }

    pub fn describe<T: Table>(&self) -> Result<Arc<TableSchema>> {
        self.catalog.describe::<T>()
    }

    /// A new, unsaved entity of `T`
    pub fn entity<T: Table>(&self) -> Result<Entity> {
        Ok(Entity::new(self.describe::<T>()?))
    }

    /// An entity of `T` standing for the row with `key`
    pub fn record<T: Table>(&self, key: impl IntoIterator<Item = crate::Value>) -> Result<Entity> {
        Entity::record(self.describe::<T>()?, key)
    }

    pub fn collection<T: Table>(&self) -> Result<Collection<T>> {
        Collection::new(self)
    }

    #[tracing::instrument(skip(self))]
    pub async fn begin(&self) -> Result<()> {
        self.inner.begin().await?;
        self.in_transaction.store(true, Ordering::SeqCst);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn commit(&self) -> Result<()> {
        self.inner.commit().await?;
        self.in_transaction.store(false, Ordering::SeqCst);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn rollback(&self) -> Result<()> {
        self.inner.rollback().await?;
        self.in_transaction.store(false, Ordering::SeqCst);
        Ok(())
    }

    pub async fn query(&self, query: &SelectQuery) -> Result<Box<dyn RowCursor>> {
        tracing::debug!(sql = %query.sql, parameters = ?query.parameters, "Executing query");
        self.inner.execute_query(&query.sql, &query.parameters).await
    }

    pub async fn execute(&self, statement: &Statement) -> Result<NonQueryResult> {
        tracing::debug!(
            sql = %statement.sql,
            parameters = ?statement.parameters,
            kind = %statement.kind,
            "Executing statement"
        );
        let result = self.inner.execute_non_query(&statement.sql, &statement.parameters, statement.kind).await?;
        tracing::trace!(result = ?result, "Statement finished");
        Ok(result)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("opts", &self.opts)
            .field("tables", &self.catalog.len())
            .field("in_transaction", &self.in_transaction())
            .finish()
    }
}
