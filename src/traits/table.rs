use async_trait::async_trait;

use super::column::ColumnTrait;
use crate::Collection;
use crate::Connection;
use crate::Entity;
use crate::Result;
use crate::schema::TableDefinition;
use crate::value::IntoValue;

/// A struct mapped onto one database table
///
/// Normally implemented through `#[derive(Table)]`.
pub trait Table: Send + Sync + Sized + 'static {
    type Column: ColumnTrait;

    fn definition() -> TableDefinition;
}

#[async_trait]
pub trait TableExt: Table {
    /// An empty, unfetched collection over this table
    #[tracing::instrument(skip(conn))]
    fn collection(conn: &Connection) -> Result<Collection<Self>> {
        Collection::new(conn)
    }

    /// A new entity in the `New` state
    #[tracing::instrument(skip(conn))]
    fn create(conn: &Connection) -> Result<Entity> {
        conn.entity::<Self>()
    }

    /// Look a row up by its single-column primary key
    async fn find_by_id<V: IntoValue + Send + 'static>(conn: &Connection, id: V) -> Result<Option<Entity>> {
        let mut entity = conn.entity::<Self>()?;
        if entity.fetch_by_primary_key(conn, [id.into_value()]).await? { Ok(Some(entity)) } else { Ok(None) }
    }
}

impl<T: Table> TableExt for T {}
