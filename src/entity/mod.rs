//! Dynamic entities
//!
//! An [`Entity`] is one row of one table, held as a value per resolved
//! column. A foreign key column holds either the raw key or the referenced
//! entity itself once it was joined or attached. Many-to-many properties hold
//! a list of related entities on the side.

pub(crate) mod dirty_tracker;
#[cfg(feature = "serde")]
pub(crate) mod json;
pub(crate) mod persist;
pub(crate) mod primary_key;
pub(crate) mod state;

use std::sync::Arc;

pub use dirty_tracker::DirtyTracker;
pub use primary_key::KeyComponent;
pub use primary_key::PrimaryKey;
pub use state::ObjectState;

use crate::error::Error;
use crate::error::JoinError;
use crate::error::Result;
use crate::error::SchemaError;
use crate::error::StateError;
use crate::schema::TableSchema;
use crate::traits::from_entity::FromEntity;
use crate::value::IntoValue;
use crate::value::Value;

#[derive(Clone, Debug, PartialEq)]
pub enum Field {
    Value(Value),
    Entity(Box<Entity>),
}

impl Field {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Field::Value(value) => Some(value),
            Field::Entity(_) => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Field::Entity(entity) => Some(entity),
            Field::Value(_) => None,
        }
    }

    /// The value written to the column: the raw value, or the key of the
    /// referenced entity.
    pub fn key_value(&self) -> Result<Value> {
        match self {
            Field::Value(value) => Ok(value.clone()),
            Field::Entity(child) => child
                .primary_key
                .single_value()
                .cloned()
                .ok_or_else(|| JoinError::CompositeKey { type_name: child.schema.type_name().to_string() }.into()),
        }
    }

    /// Key values this field stands for. `None` for an entity never saved.
    fn identity(&self) -> Option<Vec<Value>> {
        match self {
            Field::Value(value) => Some(vec![value.clone()]),
            Field::Entity(child) if child.is_new() => None,
            Field::Entity(child) => Some(child.primary_key.values()),
        }
    }
}

/// Whether a column moved away from its snapshot value
fn field_differs(current: &Field, original: &Field) -> bool {
    match (current.identity(), original.identity()) {
        (Some(current), Some(original)) => current != original,
        _ => true,
    }
}

#[derive(Clone, Debug)]
pub struct Entity {
    schema:      Arc<TableSchema>,
    state:       ObjectState,
    primary_key: PrimaryKey,
    tracker:     DirtyTracker,
    fields:      Vec<Field>,
    related:     Vec<Vec<Entity>>,
    relations:   Vec<usize>,
    original:    Option<Box<Entity>>,
}

impl Entity {
    /// A blank entity in the `New` state
    pub fn new(schema: Arc<TableSchema>) -> Self {
        let tracker = DirtyTracker::new(
            schema.table_name(),
            schema.mutable_indices().iter().map(|&i| schema.column(i).name.clone()),
        );
        Self {
            state: ObjectState::New,
            primary_key: PrimaryKey::for_schema(&schema),
            tracker,
            fields: vec![Field::Value(Value::Null); schema.columns().len()],
            related: vec![Vec::new(); schema.many_to_many().len()],
            relations: Vec::new(),
            original: None,
            schema,
        }
    }

    /// An entity that stands for an existing row known only by its key.
    ///
    /// Columns set afterwards are written by `save` without fetching first.
    pub fn record(schema: Arc<TableSchema>, key: impl IntoIterator<Item = Value>) -> Result<Self> {
        let values: Vec<Value> = key.into_iter().collect();
        let mut entity = Self::new(schema);
        let indices = entity.schema.primary_key_indices().to_vec();
        if values.len() != indices.len() {
            return Err(SchemaError::KeyColumnMismatch {
                table:    entity.schema.table_name().to_string(),
                expected: indices.len(),
                found:    values.len(),
            }
            .into());
        }
        for (position, (index, value)) in indices.into_iter().zip(values).enumerate() {
            entity.fields[index] = Field::Value(value.clone());
            entity.primary_key.set_value(position, value);
        }
        entity.state = ObjectState::Record;
        Ok(entity)
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    pub fn state(&self) -> ObjectState {
        self.state
    }

    pub fn primary_key(&self) -> &PrimaryKey {
        &self.primary_key
    }

    pub fn dirty_tracker(&self) -> &DirtyTracker {
        &self.tracker
    }

    /// Frozen copy of the last fetched or saved values
    pub fn original(&self) -> Option<&Entity> {
        self.original.as_deref()
    }

    pub fn is_new(&self) -> bool {
        self.state == ObjectState::New
    }

    pub fn is_marked_as_deleted(&self) -> bool {
        self.state.is_marked_as_deleted()
    }

    /// Names of the foreign key columns currently holding an entity staged
    /// for cascading saves
    pub fn relations(&self) -> Vec<&str> {
        self.relations.iter().map(|&i| self.schema.column(i).name.as_str()).collect()
    }

    fn column_index(&self, column: &str) -> Result<usize> {
        self.schema.column_index(column).ok_or_else(|| Error::ColumnNotFound {
            table:  self.schema.table_name().to_string(),
            column: column.to_string(),
        })
    }

    pub(crate) fn field_at(&self, index: usize) -> &Field {
        &self.fields[index]
    }

    pub fn get(&self, column: &str) -> Result<&Field> {
        Ok(&self.fields[self.column_index(column)?])
    }

    /// Column value; for a foreign key holding an entity, that entity's key
    pub fn value(&self, column: &str) -> Result<Value> {
        self.get(column)?.key_value()
    }

    pub fn entity(&self, column: &str) -> Result<Option<&Entity>> {
        Ok(self.get(column)?.as_entity())
    }

    pub fn entity_mut(&mut self, column: &str) -> Result<Option<&mut Entity>> {
        let index = self.column_index(column)?;
        Ok(match &mut self.fields[index] {
            Field::Entity(child) => Some(child),
            Field::Value(_) => None,
        })
    }

    pub fn set(&mut self, column: &str, value: impl IntoValue) -> Result<()> {
        let index = self.column_index(column)?;
        self.assign_tracked(index, Field::Value(value.into_value()))
    }

    /// Put an entity into a foreign key column
    pub fn attach(&mut self, column: &str, child: Entity) -> Result<()> {
        let index = self.column_index(column)?;
        let Some(target) = self.schema.column(index).references else {
            return Err(Error::InvalidRelation(format!("{}.{} is not a foreign key", self.schema.table_name(), column)));
        };
        if child.schema.type_id() != target.type_id {
            return Err(Error::InvalidRelation(format!(
                "{}.{} references {}, not {}",
                self.schema.table_name(),
                column,
                target.type_name,
                child.schema.type_name()
            )));
        }
        self.assign_tracked(index, Field::Entity(Box::new(child)))
    }

    /// Clear a foreign key column, returning the entity it held
    pub fn detach(&mut self, column: &str) -> Result<Option<Entity>> {
        let index = self.column_index(column)?;
        let previous = self.fields[index].as_entity().cloned();
        self.assign_tracked(index, Field::Value(Value::Null))?;
        Ok(previous)
    }

    pub fn related(&self, property: &str) -> Result<&[Entity]> {
        let index = self.relation_index(property)?;
        Ok(&self.related[index])
    }

    pub fn related_mut(&mut self, property: &str) -> Result<&mut Vec<Entity>> {
        let index = self.relation_index(property)?;
        Ok(&mut self.related[index])
    }

    fn relation_index(&self, property: &str) -> Result<usize> {
        self.schema.many_to_many_index(property).ok_or_else(|| Error::ColumnNotFound {
            table:  self.schema.table_name().to_string(),
            column: property.to_string(),
        })
    }

    fn ensure_mutable(&self) -> Result<()> {
        let table = self.schema.table_name().to_string();
        match self.state {
            ObjectState::Deleted => Err(StateError::EntityDeleted { table }.into()),
            state if state.is_snapshot() => Err(StateError::ImmutableSnapshot { table }.into()),
            _ => Ok(()),
        }
    }

    fn assign_tracked(&mut self, index: usize, field: Field) -> Result<()> {
        self.ensure_mutable()?;
        self.fields[index] = field;

        let column = self.schema.column(index);
        if column.primary_key && matches!(self.state, ObjectState::New | ObjectState::Record | ObjectState::ExternalRecord)
        {
            if let Some(position) = self.primary_key.position(&column.name) {
                let value = self.fields[index].key_value()?;
                self.primary_key.set_value(position, value);
            }
        }

        if self.is_new() || !self.tracker.tracks(&column.name) {
            return Ok(());
        }
        let dirty = match &self.original {
            Some(original) => field_differs(&self.fields[index], &original.fields[index]),
            None => true,
        };
        self.tracker.update(&column.name, dirty)
    }

    /// Flag a column for the next UPDATE regardless of its value
    pub fn mark_dirty(&mut self, column: &str) -> Result<()> {
        self.ensure_mutable()?;
        let index = self.column_index(column)?;
        self.tracker.update(&self.schema.column(index).name, true)
    }

    /// Whether a save would write this row.
    ///
    /// New entities are always dirty. With a snapshot, mutable columns are
    /// compared against it; without one, the tracker decides.
    pub fn is_dirty(&self) -> bool {
        match self.state {
            ObjectState::New => true,
            ObjectState::Deleted => false,
            state if state.is_snapshot() => false,
            _ => match &self.original {
                Some(original) => self
                    .schema
                    .mutable_indices()
                    .iter()
                    .any(|&i| field_differs(&self.fields[i], &original.fields[i])),
                None => self.tracker.any(),
            },
        }
    }

    pub fn is_column_dirty(&self, column: &str) -> Result<bool> {
        let index = self.column_index(column)?;
        let name = &self.schema.column(index).name;
        if !self.tracker.tracks(name) {
            return self.tracker.is_dirty(name);
        }
        Ok(match (self.state, &self.original) {
            (ObjectState::New, _) => true,
            (_, Some(original)) => field_differs(&self.fields[index], &original.fields[index]),
            (_, None) => self.tracker.is_dirty(name)?,
        })
    }

    /// Whether any entity held in a foreign key column needs saving
    pub fn has_dirty_relations(&self) -> bool {
        self.fields.iter().any(|f| match f {
            Field::Entity(child) => child.is_dirty() || child.has_dirty_relations(),
            Field::Value(_) => false,
        })
    }

    /// Replace the tracker flags with the result of diffing against the
    /// snapshot, when there is one
    pub(crate) fn refresh_dirty_tracker(&mut self) -> Result<()> {
        let Some(original) = &self.original else {
            return Ok(());
        };
        for &index in self.schema.mutable_indices() {
            let dirty = field_differs(&self.fields[index], &original.fields[index]);
            self.tracker.update(&self.schema.column(index).name, dirty)?;
        }
        Ok(())
    }

    pub(crate) fn set_state(&mut self, state: ObjectState) -> Result<()> {
        if self.state == ObjectState::Deleted {
            return Err(StateError::EntityDeleted { table: self.schema.table_name().to_string() }.into());
        }
        tracing::trace!(table = self.schema.table_name(), from = %self.state, to = %state, "Entity state change");
        self.state = state;
        Ok(())
    }

    /// Mark for deletion on the next save
    pub fn schedule_deletion(&mut self) -> Result<()> {
        let table = self.schema.table_name().to_string();
        match self.state {
            ObjectState::New => Ok(()),
            ObjectState::ScheduledForDeletion => Err(StateError::AlreadyScheduled { table }.into()),
            ObjectState::Deleted => Err(StateError::EntityDeleted { table }.into()),
            state if state.is_snapshot() => Err(StateError::ImmutableSnapshot { table }.into()),
            _ => self.set_state(ObjectState::ScheduledForDeletion),
        }
    }

    pub(crate) fn snapshot(&self, marker: ObjectState) -> Entity {
        let mut snapshot = self.clone();
        snapshot.original = None;
        snapshot.state = marker;
        snapshot
    }

    /// Take the database-assigned identity after an insert
    pub fn update_single_primary_key(&mut self, value: Value) -> Result<()> {
        let [index] = self.schema.primary_key_indices() else {
            return Err(SchemaError::KeyColumnMismatch {
                table:    self.schema.table_name().to_string(),
                expected: 1,
                found:    self.schema.primary_key_indices().len(),
            }
            .into());
        };
        self.fields[*index] = Field::Value(value.clone());
        self.primary_key.set_value(0, value);
        Ok(())
    }

    /// Re-read every key component from the current column values
    pub fn update_combined_primary_key(&mut self) -> Result<()> {
        let indices = self.schema.primary_key_indices().to_vec();
        for (position, index) in indices.into_iter().enumerate() {
            let value = self.fields[index].key_value()?;
            self.primary_key.set_value(position, value);
        }
        Ok(())
    }

    pub fn to_model<T: FromEntity>(&self) -> Result<T> {
        T::from_entity(self)
    }

    /// Store a value read from the database, bypassing tracking
    pub(crate) fn load(&mut self, index: usize, field: Field) {
        self.fields[index] = field;
    }

    pub(crate) fn push_related(&mut self, relation: usize, entity: Entity) {
        let items = &mut self.related[relation];
        if entity.primary_key.is_empty() || !items.iter().any(|e| e.primary_key == entity.primary_key) {
            items.push(entity);
        }
    }

    /// Fold the related items another read of the same row carries into this one
    pub(crate) fn merge_related(&mut self, other: Entity) {
        for (relation, items) in other.related.into_iter().enumerate() {
            for item in items {
                match self.related[relation].iter_mut().find(|e| !item.primary_key.is_empty() && e.primary_key == item.primary_key) {
                    Some(existing) => existing.merge_related(item),
                    None => self.related[relation].push(item),
                }
            }
        }
        for (index, field) in other.fields.into_iter().enumerate() {
            if let (Field::Entity(mine), Field::Entity(theirs)) = (&mut self.fields[index], field) {
                mine.merge_related(*theirs);
            }
        }
    }

    /// Settle a freshly mapped entity: children first, then the snapshot
    pub(crate) fn finalize_fetch(&mut self, change_tracking: bool) {
        for field in &mut self.fields {
            if let Field::Entity(child) = field {
                child.finalize_fetch(change_tracking);
            }
        }
        for items in &mut self.related {
            for item in items {
                item.finalize_fetch(change_tracking);
            }
        }
        self.relations = self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| matches!(f, Field::Entity(_)))
            .map(|(i, _)| i)
            .collect();
        self.state = ObjectState::Fetched;
        self.tracker.reset();
        self.original =
            if change_tracking { Some(Box::new(self.snapshot(ObjectState::OriginalFetchedValue))) } else { None };
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.schema.type_id() == other.schema.type_id() && self.fields == other.fields && self.related == other.related
    }
}
