//! Where the catalog learns which columns a table really has

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Error;
use crate::error::Result;
use crate::executor::Executor;
use crate::schema::definition::TableDefinition;

/// A column as reported by a schema source
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceColumn {
    pub name:    String,
    pub ordinal: usize,
}

impl SourceColumn {
    pub fn new(name: impl Into<String>, ordinal: usize) -> Self {
        Self { name: name.into(), ordinal }
    }
}

#[async_trait]
pub trait SchemaSource: Send + Sync {
    async fn columns(&self, definition: &TableDefinition, schema_name: &str) -> Result<Vec<SourceColumn>>;
}

/// Trusts the declared fields, in declaration order
#[derive(Clone, Copy, Debug, Default)]
pub struct DeclaredSchemaSource;

#[async_trait]
impl SchemaSource for DeclaredSchemaSource {
    async fn columns(&self, definition: &TableDefinition, _schema_name: &str) -> Result<Vec<SourceColumn>> {
        Ok(definition.fields.iter().enumerate().map(|(i, f)| SourceColumn::new(f.column, i)).collect())
    }
}

/// Column lists supplied up front, keyed by table name
///
/// ```ignore
/// let source = FixtureSchemaSource::new()
///     .table("Users", ["Id", "Name", "Organisation"])
///     .table("Organisations", ["Id", "Name"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct FixtureSchemaSource {
    tables: HashMap<String, Vec<String>>,
}

impl FixtureSchemaSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table<I, S>(mut self, table: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>, {
        self.tables.insert(table.to_lowercase(), columns.into_iter().map(Into::into).collect());
        self
    }
}

#[async_trait]
impl SchemaSource for FixtureSchemaSource {
    async fn columns(&self, definition: &TableDefinition, _schema_name: &str) -> Result<Vec<SourceColumn>> {
        let columns = self
            .tables
            .get(&definition.table_name.to_lowercase())
            .ok_or_else(|| Error::Query(format!("No fixture declares the columns of {}", definition.table_name)))?;
        Ok(columns.iter().enumerate().map(|(i, name)| SourceColumn::new(name.clone(), i)).collect())
    }
}

/// Reads the column list from an empty result set of the live table
pub struct LiveSchemaSource<'a> {
    executor: &'a dyn Executor,
}

impl<'a> LiveSchemaSource<'a> {
    pub fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl SchemaSource for LiveSchemaSource<'_> {
    async fn columns(&self, definition: &TableDefinition, schema_name: &str) -> Result<Vec<SourceColumn>> {
        let sql = format!("SELECT TOP (0) * FROM [{}].[{}];", schema_name, definition.table_name);
        tracing::debug!(sql = %sql, "Reading table layout");
        let cursor = self.executor.execute_query(&sql, &[]).await?;
        Ok((0..cursor.field_count()).map(|i| SourceColumn::new(cursor.name(i), i)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::definition::FieldDefinition;
    use crate::value::ColumnType;

    struct Tag;

    fn definition() -> TableDefinition {
        TableDefinition::new::<Tag>("Tag", "Tags")
            .field(FieldDefinition::new("id", "Id", ColumnType::Integer).primary_key(true))
            .field(FieldDefinition::new("label", "Label", ColumnType::Text))
    }

    #[tokio::test]
    async fn test_declared_source_follows_declaration_order() {
        let columns = DeclaredSchemaSource.columns(&definition(), "dbo").await.unwrap();
        assert_eq!(columns, vec![SourceColumn::new("Id", 0), SourceColumn::new("Label", 1)]);
    }

    #[tokio::test]
    async fn test_fixture_source_is_case_insensitive_on_table() {
        let source = FixtureSchemaSource::new().table("TAGS", ["Label", "Id"]);
        let columns = source.columns(&definition(), "dbo").await.unwrap();
        assert_eq!(columns[0].name, "Label");
        assert_eq!(columns[1].ordinal, 1);
    }

    #[tokio::test]
    async fn test_fixture_source_missing_table() {
        let err = FixtureSchemaSource::new().columns(&definition(), "dbo").await.unwrap_err();
        assert!(matches!(err, Error::Query(ref m) if m.contains("Tags")));
    }
}
