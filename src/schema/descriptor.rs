//! Resolved table descriptors
//!
//! A [`TableSchema`] is the catalog's view of one table after the declared
//! fields were reconciled with the columns the database reports. Columns are
//! kept in source ordinal order, which is also the order the mapper expects
//! them in a result row.

use std::any::TypeId;

use crate::error::JoinError;
use crate::error::Result;
use crate::error::SchemaError;
use crate::schema::definition::RelationTarget;
use crate::schema::definition::TableDefinition;
use crate::schema::source::SourceColumn;
use crate::value::ColumnType;

#[derive(Clone, Debug)]
pub struct ColumnSchema {
    pub name:           String,
    pub property:       &'static str,
    pub ordinal:        usize,
    pub column_type:    ColumnType,
    pub nullable:       bool,
    pub primary_key:    bool,
    pub auto_increment: bool,
    pub references:     Option<RelationTarget>,
}

impl ColumnSchema {
    pub fn is_foreign_key(&self) -> bool {
        self.references.is_some()
    }

    /// Whether this column takes part in INSERT and UPDATE statements
    pub fn is_mutable(&self) -> bool {
        !(self.primary_key && self.auto_increment)
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.property.eq_ignore_ascii_case(name)
    }
}

#[derive(Clone, Debug)]
pub struct ManyToManySchema {
    pub property: &'static str,
    pub junction: RelationTarget,
    pub target:   RelationTarget,
}

#[derive(Debug)]
pub struct TableSchema {
    type_id:      TypeId,
    type_name:    &'static str,
    table_name:   String,
    schema_name:  String,
    columns:      Vec<ColumnSchema>,
    primary_key:  Vec<usize>,
    mutable:      Vec<usize>,
    many_to_many: Vec<ManyToManySchema>,
}

impl TableSchema {
    /// Reconcile a definition with the columns reported for its table.
    ///
    /// Declared fields missing from `source` are dropped. A reported column no
    /// field claims is an error.
    pub fn resolve(definition: &TableDefinition, default_schema: &str, source: &[SourceColumn]) -> Result<Self> {
        if definition.primary_key_fields().next().is_none() {
            return Err(SchemaError::MissingPrimaryKey { type_name: definition.type_name }.into());
        }

        let mut ordered = source.to_vec();
        ordered.sort_by_key(|c| c.ordinal);

        let mut columns = Vec::with_capacity(ordered.len());
        for source_column in ordered {
            let field = definition
                .fields
                .iter()
                .find(|f| f.column.eq_ignore_ascii_case(&source_column.name))
                .or_else(|| definition.fields.iter().find(|f| f.property.eq_ignore_ascii_case(&source_column.name)));

            let Some(field) = field else {
                if source_column.name.eq_ignore_ascii_case(definition.type_name) {
                    return Err(SchemaError::IllegalColumnName {
                        type_name: definition.type_name,
                        column:    source_column.name,
                    }
                    .into());
                }
                return Err(SchemaError::UnresolvableColumn {
                    type_name: definition.type_name,
                    column:    source_column.name,
                }
                .into());
            };

            columns.push(ColumnSchema {
                name:           source_column.name,
                property:       field.property,
                ordinal:        source_column.ordinal,
                column_type:    field.column_type,
                nullable:       field.nullable,
                primary_key:    field.primary_key,
                auto_increment: field.auto_increment,
                references:     field.references,
            });
        }

        for field in &definition.fields {
            if !columns.iter().any(|c| c.property == field.property) {
                tracing::warn!(
                    table = definition.table_name,
                    property = field.property,
                    "Declared field has no column in the database, ignoring it"
                );
            }
        }

        let primary_key: Vec<usize> =
            columns.iter().enumerate().filter(|(_, c)| c.primary_key).map(|(i, _)| i).collect();
        if primary_key.is_empty() {
            return Err(SchemaError::MissingPrimaryKey { type_name: definition.type_name }.into());
        }
        let mutable = columns.iter().enumerate().filter(|(_, c)| c.is_mutable()).map(|(i, _)| i).collect();

        Ok(Self {
            type_id: definition.type_id,
            type_name: definition.type_name,
            table_name: definition.table_name.to_string(),
            schema_name: definition.schema_name.unwrap_or(default_schema).to_string(),
            columns,
            primary_key,
            mutable,
            many_to_many: definition
                .many_to_many
                .iter()
                .map(|m| ManyToManySchema { property: m.property, junction: m.junction, target: m.target })
                .collect(),
        })
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// `[schema].[table]`
    pub fn qualified_name(&self) -> String {
        format!("[{}].[{}]", self.schema_name, self.table_name)
    }

    /// Default alias: the first letter of the table name, uppercased
    pub fn alias_letter(&self) -> String {
        self.table_name.chars().next().map(|c| c.to_uppercase().collect()).unwrap_or_else(|| "T".to_string())
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> &ColumnSchema {
        &self.columns[index]
    }

    /// Position of a column, looked up by column name first and property second
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .or_else(|| self.columns.iter().position(|c| c.property.eq_ignore_ascii_case(name)))
    }

    pub fn primary_key_indices(&self) -> &[usize] {
        &self.primary_key
    }

    pub fn mutable_indices(&self) -> &[usize] {
        &self.mutable
    }

    pub fn is_combined_key(&self) -> bool {
        self.primary_key.len() > 1
    }

    /// Single auto-increment key whose value the database assigns on insert
    pub fn has_identity_key(&self) -> bool {
        self.primary_key.len() == 1 && self.columns[self.primary_key[0]].auto_increment
    }

    /// The key column used to join onto this table
    pub fn single_key_column(&self) -> Result<&ColumnSchema> {
        match self.primary_key.as_slice() {
            [index] => Ok(&self.columns[*index]),
            _ => Err(JoinError::CompositeKey { type_name: self.type_name.to_string() }.into()),
        }
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = (usize, &ColumnSchema)> {
        self.columns.iter().enumerate().filter(|(_, c)| c.is_foreign_key())
    }

    /// Foreign key columns pointing at `target`, in ordinal order
    pub fn foreign_keys_to(&self, target: TypeId) -> impl Iterator<Item = usize> + '_ {
        self.foreign_keys().filter(move |(_, c)| c.references.is_some_and(|r| r.type_id == target)).map(|(i, _)| i)
    }

    pub fn many_to_many(&self) -> &[ManyToManySchema] {
        &self.many_to_many
    }

    pub fn many_to_many_index(&self, property: &str) -> Option<usize> {
        self.many_to_many.iter().position(|m| m.property.eq_ignore_ascii_case(property))
    }
}
