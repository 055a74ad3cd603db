use std::future::Future;
use std::pin::Pin;

use tracing::Instrument;

use super::Entity;
use super::Field;
use super::ObjectState;
use crate::Connection;
use crate::error::Error;
use crate::error::Result;
use crate::error::SchemaError;
use crate::error::StateError;
use crate::executor::NonQueryKind;
use crate::executor::NonQueryResult;
use crate::query::Expr;
use crate::query::Query;
use crate::query::Statement;
use crate::query::prelude::QueryBuilder;
use crate::value::Value;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

impl Entity {
    /// Write pending changes, saving dirty related entities first.
    ///
    /// New entities are inserted and pick up their identity. Others get an
    /// UPDATE of the dirty columns only. An entity scheduled for deletion is
    /// deleted instead.
    pub fn save<'a>(&'a mut self, conn: &'a Connection) -> BoxFuture<'a, Result<()>> {
        let span = tracing::debug_span!("save", table = %self.schema.table_name(), state = %self.state);
        Box::pin(async move { self.save_inner(conn).await }.instrument(span))
    }

    async fn save_inner(&mut self, conn: &Connection) -> Result<()> {
        match self.state {
            ObjectState::Deleted => {
                tracing::trace!("Entity already deleted, nothing to save");
                return Ok(());
            }
            ObjectState::ScheduledForDeletion => return self.delete(conn).await,
            state if state.is_snapshot() => {
                return Err(StateError::ImmutableSnapshot { table: self.schema.table_name().to_string() }.into());
            }
            _ => {}
        }
        if !self.is_new() && self.primary_key.is_empty() {
            return Err(StateError::EmptyPrimaryKey { table: self.schema.table_name().to_string() }.into());
        }
        if !self.is_dirty() && !self.has_dirty_relations() {
            tracing::trace!("Entity is clean, nothing to save");
            return Ok(());
        }

        self.stage_relations();
        self.save_relations(conn).await?;

        let inserted = self.is_new();
        if inserted {
            self.insert(conn).await?;
        } else {
            self.refresh_dirty_tracker()?;
            if self.tracker.any() {
                self.update(conn).await?;
            } else {
                tracing::trace!("Only related entities changed");
            }
        }

        self.original = if conn.is_change_tracking_enabled() {
            let marker = if inserted { ObjectState::NewRecord } else { ObjectState::OriginalFetchedValue };
            Some(Box::new(self.snapshot(marker)))
        } else {
            None
        };
        self.set_state(ObjectState::Saved)?;
        self.tracker.reset();
        Ok(())
    }

    /// Track every entity-valued foreign key column not tracked yet
    fn stage_relations(&mut self) {
        for &index in self.schema.mutable_indices() {
            if matches!(self.fields[index], Field::Entity(_)) && !self.relations.contains(&index) {
                self.relations.push(index);
            }
        }
    }

    async fn save_relations(&mut self, conn: &Connection) -> Result<()> {
        for index in self.relations.clone() {
            let detached = !matches!(self.fields[index], Field::Entity(_))
                && self.original.as_ref().is_some_and(|o| matches!(o.fields[index], Field::Entity(_)));
            if detached {
                tracing::trace!(column = %self.schema.column(index).name, "Skipping detached relation");
                continue;
            }
            if let Field::Entity(child) = &mut self.fields[index] {
                if child.is_dirty() || child.has_dirty_relations() {
                    child.save(conn).await?;
                }
            }
        }
        let fields = &self.fields;
        self.relations.retain(|&i| matches!(fields[i], Field::Entity(_)));
        Ok(())
    }

    fn statement(&self, conn: &Connection, kind: NonQueryKind) -> Result<Option<Statement>> {
        QueryBuilder::new(conn.catalog(), self.schema.clone()).build_non_query(self, kind)
    }

    async fn insert(&mut self, conn: &Connection) -> Result<()> {
        let Some(statement) = self.statement(conn, NonQueryKind::Insert)? else {
            return Ok(());
        };
        let result = conn.execute(&statement).await?;
        if statement.returns_identity {
            match result {
                NonQueryResult::Identity(identity) if !identity.is_null() => self.update_single_primary_key(identity),
                other => Err(Error::Query(format!(
                    "Insert into {} returned {:?} instead of an identity value",
                    self.schema.table_name(),
                    other
                ))),
            }
        } else {
            self.update_combined_primary_key()
        }
    }

    async fn update(&mut self, conn: &Connection) -> Result<()> {
        let Some(statement) = self.statement(conn, NonQueryKind::Update)? else {
            return Ok(());
        };
        if let NonQueryResult::RowsAffected(0) = conn.execute(&statement).await? {
            tracing::warn!(table = self.schema.table_name(), key = %self.primary_key, "Update matched no row");
        }
        // A changed natural key becomes the new identity
        self.update_combined_primary_key()
    }

    /// Delete the row. Deleting twice, or deleting an entity that was never
    /// saved, does nothing.
    #[tracing::instrument(skip(self, conn), fields(table = %self.schema.table_name()))]
    pub async fn delete(&mut self, conn: &Connection) -> Result<()> {
        match self.state {
            ObjectState::Deleted => {
                tracing::trace!("Entity already deleted");
                return Ok(());
            }
            ObjectState::New => {
                tracing::trace!("Entity was never saved");
                return Ok(());
            }
            ObjectState::ScheduledForDeletion => {}
            state if state.is_snapshot() => {
                return Err(StateError::ImmutableSnapshot { table: self.schema.table_name().to_string() }.into());
            }
            _ => self.set_state(ObjectState::ScheduledForDeletion)?,
        }
        if self.primary_key.is_empty() {
            return Err(StateError::EmptyPrimaryKey { table: self.schema.table_name().to_string() }.into());
        }

        if let Some(statement) = self.statement(conn, NonQueryKind::Delete)? {
            conn.execute(&statement).await?;
        }
        self.set_state(ObjectState::Deleted)
    }

    /// Load the row with the given key into this entity.
    ///
    /// Returns `false` and leaves the entity untouched when no row matches,
    /// unless the connection runs in test mode, where that is an error.
    #[tracing::instrument(skip(self, conn, key), fields(table = %self.schema.table_name()))]
    pub async fn fetch_by_primary_key<I>(&mut self, conn: &Connection, key: I) -> Result<bool>
    where I: IntoIterator<Item = Value> {
        let values: Vec<Value> = key.into_iter().collect();
        let indices = self.schema.primary_key_indices();
        if values.len() != indices.len() {
            return Err(SchemaError::KeyColumnMismatch {
                table:    self.schema.table_name().to_string(),
                expected: indices.len(),
                found:    values.len(),
            }
            .into());
        }
        let criteria: Vec<(String, Value)> =
            indices.iter().map(|&i| self.schema.column(i).property.to_string()).zip(values).collect();
        self.fetch_matching(conn, criteria).await
    }

    /// Load the first row whose columns equal the given values
    #[tracing::instrument(skip(self, conn, criteria), fields(table = %self.schema.table_name()))]
    pub async fn fetch_using(&mut self, conn: &Connection, criteria: &[(&str, Value)]) -> Result<bool> {
        let criteria = criteria.iter().map(|(c, v)| (c.to_string(), v.clone())).collect();
        self.fetch_matching(conn, criteria).await
    }

    async fn fetch_matching(&mut self, conn: &Connection, criteria: Vec<(String, Value)>) -> Result<bool> {
        if self.state == ObjectState::Deleted {
            return Err(StateError::EntityDeleted { table: self.schema.table_name().to_string() }.into());
        }
        let described = criteria.iter().map(|(c, v)| format!("{}={}", c, v)).collect::<Vec<_>>().join(", ");
        let Some(filter) = criteria.into_iter().map(|(c, v)| Expr::col(c).eq(v)).reduce(|a, b| a.and(b)) else {
            return Err(Error::Query(format!("No criteria given to fetch {}", self.schema.table_name())));
        };

        let query = Query::new(self.schema.clone()).filter(filter);
        let built = query.build(conn.catalog(), None)?;
        match query.run(conn, &built).await?.into_iter().next() {
            Some(found) => {
                *self = found;
                Ok(true)
            }
            None if conn.is_test_mode() => {
                Err(Error::NotFound { table: self.schema.table_name().to_string(), key: described })
            }
            None => Ok(false),
        }
    }
}
