//! Static table declarations
//!
//! A [`TableDefinition`] is what a type says about itself: its table, the
//! columns it expects and how those columns relate to other types. It is the
//! input to the catalog, which reconciles it with the columns the database
//! actually reports.

use std::any::TypeId;

use crate::traits::table::Table;
use crate::value::ColumnType;

/// Handle to another declared type, used for foreign keys and junctions
#[derive(Clone, Copy, Debug)]
pub struct RelationTarget {
    pub type_id:    TypeId,
    pub type_name:  &'static str,
    pub definition: fn() -> TableDefinition,
}

impl RelationTarget {
    pub fn of<T: Table>() -> Self {
        Self { type_id: TypeId::of::<T>(), type_name: short_type_name::<T>(), definition: T::definition }
    }
}

impl PartialEq for RelationTarget {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for RelationTarget {}

#[derive(Clone, Debug)]
pub struct FieldDefinition {
    pub property:       &'static str,
    pub column:         &'static str,
    pub column_type:    ColumnType,
    pub nullable:       bool,
    pub primary_key:    bool,
    pub auto_increment: bool,
    pub references:     Option<RelationTarget>,
}

impl FieldDefinition {
    pub fn new(property: &'static str, column: &'static str, column_type: ColumnType) -> Self {
        Self {
            property,
            column,
            column_type,
            nullable: false,
            primary_key: false,
            auto_increment: false,
            references: None,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = primary_key;
        self
    }

    pub fn auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = auto_increment;
        self
    }

    pub fn references(mut self, target: RelationTarget) -> Self {
        self.references = Some(target);
        self
    }
}

/// A collection-valued property resolved through a junction table
#[derive(Clone, Debug)]
pub struct ManyToManyDefinition {
    pub property: &'static str,
    pub junction: RelationTarget,
    pub target:   RelationTarget,
}

impl ManyToManyDefinition {
    pub fn new(property: &'static str, junction: RelationTarget, target: RelationTarget) -> Self {
        Self { property, junction, target }
    }
}

#[derive(Clone, Debug)]
pub struct TableDefinition {
    pub type_id:      TypeId,
    pub type_name:    &'static str,
    pub table_name:   &'static str,
    pub schema_name:  Option<&'static str>,
    pub fields:       Vec<FieldDefinition>,
    pub many_to_many: Vec<ManyToManyDefinition>,
}

impl TableDefinition {
    pub fn new<T: 'static>(type_name: &'static str, table_name: &'static str) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name,
            table_name,
            schema_name: None,
            fields: Vec::new(),
            many_to_many: Vec::new(),
        }
    }

    pub fn with_schema(mut self, schema_name: &'static str) -> Self {
        self.schema_name = Some(schema_name);
        self
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn many_to_many(mut self, relation: ManyToManyDefinition) -> Self {
        self.many_to_many.push(relation);
        self
    }

    pub fn primary_key_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.primary_key)
    }

    /// Every type this definition points at, junctions included
    pub fn relation_targets(&self) -> impl Iterator<Item = RelationTarget> + '_ {
        self.fields
            .iter()
            .filter_map(|f| f.references)
            .chain(self.many_to_many.iter().flat_map(|m| [m.junction, m.target]))
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
