//! Result rows to entities
//!
//! A joined row is cut into one window per participating table using the
//! column counts recorded at translation time. The root window becomes the
//! entity, foreign key windows become attached children, and many-to-many
//! windows are collected into the owner's related list. When a query fans out
//! over a many-to-many join, rows of the same root key are folded together.

use std::collections::HashMap;
use std::ops::Range;

use super::select::SelectQuery;
use super::translator::VisitRole;
use crate::Entity;
use crate::entity::Field;
use crate::entity::PrimaryKey;
use crate::error::Error;
use crate::error::Result;
use crate::executor::RowCursor;
use crate::value::Value;

struct Row<'r> {
    names:   &'r [String],
    values:  &'r [Value],
    windows: &'r [Range<usize>],
}

pub struct QueryMapper<'a> {
    query:           &'a SelectQuery,
    change_tracking: bool,
}

impl<'a> QueryMapper<'a> {
    pub fn new(query: &'a SelectQuery, change_tracking: bool) -> Self {
        Self { query, change_tracking }
    }

    #[tracing::instrument(skip_all, fields(table = %self.query.root().schema.table_name()))]
    pub async fn populate(&self, cursor: &mut dyn RowCursor) -> Result<Vec<Entity>> {
        let mut entities: Vec<Entity> = Vec::new();
        let mut seen: HashMap<PrimaryKey, usize> = HashMap::new();
        let fan_out = self.query.has_many_to_many();
        let mut layout: Option<(Vec<String>, Vec<Range<usize>>)> = None;
        let mut rows = 0usize;

        while cursor.read().await? {
            rows += 1;
            if layout.is_none() {
                let names: Vec<String> = (0..cursor.field_count()).map(|i| cursor.name(i).to_string()).collect();
                let windows = self.windows(names.len())?;
                layout = Some((names, windows));
            }
            let Some((names, windows)) = layout.as_ref() else {
                continue;
            };
            let values: Vec<Value> = (0..names.len()).map(|i| cursor.value(i)).collect();
            let row = Row { names, values: &values, windows };

            let Some(entity) = self.populate_visit(0, &row)? else {
                continue;
            };

            if fan_out {
                let window = windows[0].clone();
                let key = PrimaryKey::read(&self.query.root().schema, &names[window.clone()], &values[window])?;
                if let Some(&index) = seen.get(&key) {
                    entities[index].merge_related(entity);
                    continue;
                }
                seen.insert(key, entities.len());
            }
            entities.push(entity);
        }

        for entity in &mut entities {
            entity.finalize_fetch(self.change_tracking);
        }
        tracing::debug!(rows, entities = entities.len(), "Mapped result rows");
        Ok(entities)
    }

    fn windows(&self, field_count: usize) -> Result<Vec<Range<usize>>> {
        if self.query.tables.len() == 1 {
            return Ok(vec![0..field_count]);
        }
        let expected: usize = self.query.column_counts.iter().sum();
        if expected != field_count {
            return Err(Error::Query(format!(
                "Expected {} columns across {} tables, reader returned {}",
                expected,
                self.query.tables.len(),
                field_count
            )));
        }
        Ok(self.query.windows())
    }

    /// Build the entity for one table window, recursing into its children.
    ///
    /// A window of nothing but NULLs outside the root means the outer join
    /// found no row.
    fn populate_visit(&self, visit: usize, row: &Row<'_>) -> Result<Option<Entity>> {
        let table = &self.query.tables[visit];
        let window = row.windows[visit].clone();
        if visit != 0 && row.values[window.clone()].iter().all(Value::is_null) {
            return Ok(None);
        }

        let mut entity = Entity::new(table.schema.clone());
        for position in window {
            let name = &row.names[position];
            let index = table.schema.column_index(name).ok_or_else(|| Error::ColumnNotFound {
                table:  table.schema.table_name().to_string(),
                column: name.clone(),
            })?;
            let value = row.values[position].clone();
            let column = table.schema.column(index);
            if value.is_null() && !column.nullable {
                return Err(Error::Nullability {
                    table:  table.schema.table_name().to_string(),
                    column: column.name.clone(),
                });
            }
            entity.load(index, Field::Value(value));
        }

        for (child, child_table) in self.query.tables.iter().enumerate() {
            if child_table.role.parent() != Some(visit) {
                continue;
            }
            match child_table.role {
                VisitRole::ForeignKey { column, .. } => {
                    if let Some(found) = self.populate_visit(child, row)? {
                        entity.load(column, Field::Entity(Box::new(found)));
                    }
                }
                VisitRole::ManyToMany { relation, .. } => {
                    if let Some(found) = self.populate_visit(child, row)? {
                        entity.push_related(relation, found);
                    }
                }
                VisitRole::Junction { .. } | VisitRole::Root => {}
            }
        }

        entity.update_combined_primary_key()?;
        Ok(Some(entity))
    }
}
