//! Query translation and result mapping

pub(crate) mod delete;
pub(crate) mod expr;
pub(crate) mod insert;
pub(crate) mod mapper;
pub(crate) mod parameter;
pub(crate) mod select;
pub(crate) mod statement;
pub(crate) mod translator;
pub(crate) mod update;

use std::sync::Arc;

pub use expr::Expr;
pub use parameter::Parameter;
pub use select::SelectQuery;
pub use statement::Statement;

use crate::Connection;
use crate::Entity;
use crate::Result;
use crate::schema::Catalog;
use crate::schema::TableSchema;

pub mod prelude {
    pub use super::expr::BinaryOp;
    pub use super::expr::Capture;
    pub use super::expr::ColumnExt;
    pub use super::expr::Expr;
    pub use super::mapper::QueryMapper;
    pub use super::parameter::Parameter;
    pub use super::select::QueryBuilder;
    pub use super::select::SelectQuery;
    pub use super::statement::Statement;
    pub use super::translator::JoinKind;
    pub use super::translator::TableVisit;
    pub use super::translator::VisitRole;
}

/// Staged expressions over one root table, not yet translated
#[derive(Clone, Debug)]
pub struct Query {
    root:     Arc<TableSchema>,
    select:   Option<Expr>,
    join:     Option<Expr>,
    filter:   Option<Expr>,
    order_by: Option<Expr>,
}

impl Query {
    pub fn new(root: Arc<TableSchema>) -> Self {
        Self { root, select: None, join: None, filter: None, order_by: None }
    }

    pub fn root(&self) -> &Arc<TableSchema> {
        &self.root
    }

    /// Restrict the column list. Replaces any earlier projection.
    pub fn select(mut self, columns: impl Into<Expr>) -> Self {
        self.select = Some(columns.into());
        self
    }

    /// Add joins; repeated calls accumulate
    pub fn join(mut self, relation: impl Into<Expr>) -> Self {
        let relation = relation.into();
        self.join = Some(match self.join.take() {
            None => relation,
            Some(Expr::ArrayInit(mut items)) => {
                items.push(relation);
                Expr::ArrayInit(items)
            }
            Some(existing) => Expr::ArrayInit(vec![existing, relation]),
        });
        self
    }

    /// Add a predicate; repeated calls are combined with AND
    pub fn filter(mut self, predicate: impl Into<Expr>) -> Self {
        let predicate = predicate.into();
        self.filter = Some(match self.filter.take() {
            None => predicate,
            Some(existing) => existing.and(predicate),
        });
        self
    }

    /// Add sort keys; repeated calls append
    pub fn order_by(mut self, sort: impl Into<Expr>) -> Self {
        let sort = sort.into();
        self.order_by = Some(match self.order_by.take() {
            None => sort,
            Some(Expr::NewTuple(mut items)) => {
                items.push(sort);
                Expr::NewTuple(items)
            }
            Some(existing) => Expr::NewTuple(vec![existing, sort]),
        });
        self
    }

    pub fn build(&self, catalog: &Catalog, limit: Option<usize>) -> Result<SelectQuery> {
        select::QueryBuilder::new(catalog, self.root.clone()).build_query(
            self.select.as_ref(),
            self.join.as_ref(),
            self.filter.as_ref(),
            self.order_by.as_ref(),
            limit,
        )
    }

    /// Execute a built query and map its rows
    pub async fn run(&self, conn: &Connection, built: &SelectQuery) -> Result<Vec<Entity>> {
        let mut cursor = conn.query(built).await?;
        mapper::QueryMapper::new(built, conn.is_change_tracking_enabled()).populate(cursor.as_mut()).await
    }
}
