//! JSON representation of entities
//!
//! Properties are keyed by their declared property name. Foreign keys holding
//! an entity nest as objects, many-to-many properties as arrays.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde_json::Map;
use serde_json::Value as Json;

use super::Entity;
use super::Field;
use super::ObjectState;
use crate::Connection;
use crate::error::Error;
use crate::error::Result;
use crate::schema::Catalog;
use crate::schema::TableSchema;
use crate::traits::table::Table;
use crate::value::ColumnType;
use crate::value::DATETIME_FORMAT;
use crate::value::FromValue;
use crate::value::Value;

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Integer(v) => Json::from(*v),
        Value::Real(v) => serde_json::Number::from_f64(*v).map(Json::Number).unwrap_or(Json::Null),
        Value::Text(v) => Json::String(v.clone()),
        Value::Blob(v) => Json::Array(v.iter().map(|b| Json::from(*b)).collect()),
        Value::Boolean(v) => Json::Bool(*v),
        Value::DateTime(v) => Json::String(v.format(DATETIME_FORMAT).to_string()),
    }
}

fn json_to_value(json: &Json, column_type: ColumnType) -> Result<Value> {
    let mismatch = || Error::TypeConversion { expected: "JSON value matching the column type", actual: json.to_string() };
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(v) => Ok(Value::Boolean(*v)),
        Json::Number(n) => match column_type {
            ColumnType::Float => n.as_f64().map(Value::Real),
            _ => n.as_i64().map(Value::Integer).or_else(|| n.as_f64().map(Value::Real)),
        }
        .ok_or_else(mismatch),
        Json::String(s) => match column_type {
            ColumnType::DateTime => NaiveDateTime::from_value(Value::Text(s.clone())).map(Value::DateTime),
            _ => Ok(Value::Text(s.clone())),
        },
        Json::Array(items) if column_type == ColumnType::Blob => items
            .iter()
            .map(|i| i.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect::<Option<Vec<u8>>>()
            .map(Value::Blob)
            .ok_or_else(mismatch),
        _ => Err(mismatch()),
    }
}

impl Entity {
    pub fn to_json(&self) -> Json {
        let mut object = Map::new();
        for (index, column) in self.schema.columns().iter().enumerate() {
            let value = match &self.fields[index] {
                Field::Value(value) => value_to_json(value),
                Field::Entity(child) => child.to_json(),
            };
            object.insert(column.property.to_string(), value);
        }
        for (relation, declared) in self.schema.many_to_many().iter().enumerate() {
            object.insert(
                declared.property.to_string(),
                Json::Array(self.related[relation].iter().map(Entity::to_json).collect()),
            );
        }
        Json::Object(object)
    }

    /// Build an entity from its JSON form.
    ///
    /// With a complete key the result is an `ExternalRecord` whose present
    /// columns are all flagged dirty, so saving it updates the row. Without
    /// one it is `New`.
    pub fn from_json(catalog: &Catalog, schema: Arc<TableSchema>, json: &Json) -> Result<Entity> {
        let Json::Object(object) = json else {
            return Err(Error::TypeConversion { expected: "JSON object", actual: json.to_string() });
        };

        let mut entity = Entity::new(schema.clone());
        let mut present = Vec::new();
        for (key, value) in object {
            if let Some(index) = schema.column_index(key) {
                let column = schema.column(index);
                let field = match (value, column.references) {
                    (Json::Object(_), Some(target)) => {
                        Field::Entity(Box::new(Entity::from_json(catalog, catalog.describe_target(&target)?, value)?))
                    }
                    _ => Field::Value(json_to_value(value, column.column_type)?),
                };
                entity.load(index, field);
                present.push(index);
            } else if let Some(relation) = schema.many_to_many_index(key) {
                let Json::Array(items) = value else {
                    return Err(Error::TypeConversion { expected: "JSON array", actual: value.to_string() });
                };
                let target = catalog.describe_target(&schema.many_to_many()[relation].target)?;
                for item in items {
                    entity.related[relation].push(Entity::from_json(catalog, target.clone(), item)?);
                }
            } else {
                tracing::debug!(table = schema.table_name(), property = %key, "Ignoring unknown JSON property");
            }
        }

        entity.update_combined_primary_key()?;
        if !entity.primary_key.is_empty() {
            entity.state = ObjectState::ExternalRecord;
            for index in present {
                let name = &schema.column(index).name;
                if entity.tracker.tracks(name) {
                    entity.tracker.update(name, true)?;
                }
            }
        }
        Ok(entity)
    }
}

impl Connection {
    pub fn entity_from_json<T: Table>(&self, json: &Json) -> Result<Entity> {
        Entity::from_json(self.catalog(), self.describe::<T>()?, json)
    }
}
