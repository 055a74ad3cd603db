use std::marker::PhantomData;

use crate::Connection;
use crate::Entity;
use crate::Error;
use crate::Result;
use crate::query::Expr;
use crate::query::Parameter;
use crate::query::Query;
use crate::traits::from_entity::FromEntity;
use crate::traits::table::Table;

/// Entities of one table, fetched through staged expressions
///
/// ```ignore
/// let mut users = User::collection(&conn)?
///     .join(UserColumn::Organisation.left())
///     .filter(UserColumn::Name.contains("ar"))
///     .order_by(UserColumn::Name.asc());
/// users.fetch(&conn).await?;
/// ```
#[derive(Debug)]
pub struct Collection<T: Table> {
    query:               Query,
    entities:            Vec<Entity>,
    executed_query:      Option<String>,
    executed_parameters: Vec<Parameter>,
    _table:              PhantomData<T>,
}

impl<T: Table> Collection<T> {
    pub fn new(conn: &Connection) -> Result<Self> {
        Ok(Self {
            query:               Query::new(conn.describe::<T>()?),
            entities:            Vec::new(),
            executed_query:      None,
            executed_parameters: Vec::new(),
            _table:              PhantomData,
        })
    }

    pub fn select(mut self, columns: impl Into<Expr>) -> Self {
        self.query = self.query.select(columns);
        self
    }

    pub fn join(mut self, relation: impl Into<Expr>) -> Self {
        self.query = self.query.join(relation);
        self
    }

    pub fn filter(mut self, predicate: impl Into<Expr>) -> Self {
        self.query = self.query.filter(predicate);
        self
    }

    pub fn and_filter(self, predicate: impl Into<Expr>) -> Self {
        self.filter(predicate)
    }

    pub fn order_by(mut self, sort: impl Into<Expr>) -> Self {
        self.query = self.query.order_by(sort);
        self
    }

    /// Fetch every matching row
    pub async fn fetch(&mut self, conn: &Connection) -> Result<&[Entity]> {
        self.fetch_limited(conn, None).await
    }

    /// Fetch at most `n` rows
    pub async fn fetch_top(&mut self, conn: &Connection, n: usize) -> Result<&[Entity]> {
        self.fetch_limited(conn, Some(n)).await
    }

    #[tracing::instrument(skip(self, conn), fields(table = %self.query.root().table_name()))]
    async fn fetch_limited(&mut self, conn: &Connection, limit: Option<usize>) -> Result<&[Entity]> {
        let built = self.query.build(conn.catalog(), limit)?;
        if self.executed_query.as_deref() == Some(built.sql.as_str()) && self.executed_parameters == built.parameters {
            tracing::debug!("Query unchanged since last fetch, keeping loaded entities");
            return Ok(&self.entities);
        }

        self.entities = self.query.run(conn, &built).await?;
        self.executed_query = Some(built.sql);
        self.executed_parameters = built.parameters;
        Ok(&self.entities)
    }

    /// SQL of the last executed fetch
    pub fn executed_query(&self) -> Option<&str> {
        self.executed_query.as_deref()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Entity> {
        self.entities.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    /// Append an entity of this collection's table
    pub fn add(&mut self, entity: Entity) -> Result<()> {
        if entity.schema().type_id() != self.query.root().type_id() {
            return Err(Error::InvalidRelation(format!(
                "Cannot add {} to a collection of {}",
                entity.schema().type_name(),
                self.query.root().type_name()
            )));
        }
        self.entities.push(entity);
        Ok(())
    }

    /// Append a new entity and hand it back for editing
    pub fn create(&mut self) -> &mut Entity {
        self.entities.push(Entity::new(self.query.root().clone()));
        let last = self.entities.len() - 1;
        &mut self.entities[last]
    }

    /// Save every entity in order, stopping at the first failure
    #[tracing::instrument(skip_all, fields(table = %self.query.root().table_name(), count = self.entities.len()))]
    pub async fn save_changes(&mut self, conn: &Connection) -> Result<()> {
        for entity in &mut self.entities {
            entity.save(conn).await?;
        }
        Ok(())
    }

    pub fn models(&self) -> Result<Vec<T>>
    where T: FromEntity {
        self.entities.iter().map(T::from_entity).collect()
    }
}

impl<'a, T: Table> IntoIterator for &'a Collection<T> {
    type IntoIter = std::slice::Iter<'a, Entity>;
    type Item = &'a Entity;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}
