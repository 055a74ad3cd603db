//! Schema catalog
//!
//! The catalog is built once, when the database handle is built, and shared
//! read-only afterwards. Registering a type also registers every type it
//! reaches through foreign keys and many-to-many junctions.

pub(crate) mod definition;
pub(crate) mod descriptor;
pub(crate) mod source;

use std::any::TypeId;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

pub use definition::FieldDefinition;
pub use definition::ManyToManyDefinition;
pub use definition::RelationTarget;
pub use definition::TableDefinition;
pub use descriptor::ColumnSchema;
pub use descriptor::ManyToManySchema;
pub use descriptor::TableSchema;
pub use source::DeclaredSchemaSource;
pub use source::FixtureSchemaSource;
pub use source::LiveSchemaSource;
pub use source::SchemaSource;
pub use source::SourceColumn;

use crate::error::Result;
use crate::error::SchemaError;
use crate::traits::table::Table;

#[derive(Debug, Default)]
pub struct Catalog {
    by_type:  HashMap<TypeId, Arc<TableSchema>>,
    by_table: HashMap<String, TypeId>,
}

impl Catalog {
    pub fn builder(default_schema: impl Into<String>) -> CatalogBuilder {
        CatalogBuilder::new(default_schema)
    }

    pub fn describe<T: Table>(&self) -> Result<Arc<TableSchema>> {
        self.describe_type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    pub fn describe_type(&self, type_id: TypeId, type_name: &str) -> Result<Arc<TableSchema>> {
        self.by_type
            .get(&type_id)
            .cloned()
            .ok_or_else(|| SchemaError::UnregisteredType { type_name: type_name.to_string() }.into())
    }

    pub fn describe_target(&self, target: &RelationTarget) -> Result<Arc<TableSchema>> {
        self.describe_type(target.type_id, target.type_name)
    }

    /// Reverse lookup from a table name, case-insensitive
    pub fn describe_table(&self, table_name: &str) -> Option<Arc<TableSchema>> {
        self.by_table.get(&table_name.to_lowercase()).and_then(|id| self.by_type.get(id)).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    pub fn tables(&self) -> impl Iterator<Item = &Arc<TableSchema>> {
        self.by_type.values()
    }
}

pub struct CatalogBuilder {
    default_schema: String,
    definitions:    Vec<TableDefinition>,
}

impl CatalogBuilder {
    pub fn new(default_schema: impl Into<String>) -> Self {
        Self { default_schema: default_schema.into(), definitions: Vec::new() }
    }

    pub fn register<T: Table>(self) -> Self {
        self.register_definition(T::definition())
    }

    pub fn register_definition(mut self, definition: TableDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Resolve every registered definition, and everything reachable from
    /// them, against `source`.
    #[tracing::instrument(skip_all, fields(schema = %self.default_schema))]
    pub async fn build(self, source: &dyn SchemaSource) -> Result<Catalog> {
        let mut pending = self.definitions;
        let mut seen = HashSet::new();
        let mut catalog = Catalog::default();

        while let Some(definition) = pending.pop() {
            if !seen.insert(definition.type_id) {
                continue;
            }
            pending.extend(
                definition.relation_targets().filter(|t| !seen.contains(&t.type_id)).map(|t| (t.definition)()),
            );

            let schema_name = definition.schema_name.unwrap_or(self.default_schema.as_str());
            let columns = source.columns(&definition, schema_name).await?;
            let schema = TableSchema::resolve(&definition, &self.default_schema, &columns)?;
            tracing::debug!(
                table = schema.table_name(),
                columns = schema.columns().len(),
                "Registered table in schema catalog"
            );

            catalog.by_table.insert(schema.table_name().to_lowercase(), schema.type_id());
            catalog.by_type.insert(schema.type_id(), Arc::new(schema));
        }

        Ok(catalog)
    }
}
