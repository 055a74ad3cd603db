use std::hash::Hash;
use std::hash::Hasher;

use crate::error::Result;
use crate::error::SchemaError;
use crate::schema::TableSchema;
use crate::value::Value;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyComponent {
    pub property:       &'static str,
    pub column:         String,
    pub value:          Value,
    pub auto_increment: bool,
}

/// Ordered key components plus a hash kept in step with their values
///
/// Two keys are equal when both the hash and every component match.
#[derive(Clone, Debug, Default)]
pub struct PrimaryKey {
    keys: Vec<KeyComponent>,
    hash: u64,
}

impl PrimaryKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Components for every key column of `schema`, all NULL
    pub fn for_schema(schema: &TableSchema) -> Self {
        let mut key = Self::new();
        for &index in schema.primary_key_indices() {
            let column = schema.column(index);
            key.add(column.property, column.name.clone(), Value::Null, column.auto_increment);
        }
        key
    }

    /// Read the key out of a result row.
    ///
    /// `names` and `values` cover one table window. Every key column of
    /// `schema` has to be present exactly once.
    pub fn read(schema: &TableSchema, names: &[String], values: &[Value]) -> Result<Self> {
        let mut key = Self::for_schema(schema);
        let mut found = 0;
        for (position, component) in key.keys.iter_mut().enumerate() {
            let matches: Vec<usize> = names
                .iter()
                .enumerate()
                .filter(|(_, n)| n.eq_ignore_ascii_case(&component.column) || n.eq_ignore_ascii_case(component.property))
                .map(|(i, _)| i)
                .collect();
            if let [index] = matches.as_slice() {
                component.value = values.get(*index).cloned().unwrap_or_default();
                found = position + 1;
            } else {
                break;
            }
        }
        if found != key.keys.len() {
            return Err(SchemaError::KeyColumnMismatch {
                table:    schema.table_name().to_string(),
                expected: key.keys.len(),
                found,
            }
            .into());
        }
        key.rehash();
        Ok(key)
    }

    pub fn add(&mut self, property: &'static str, column: impl Into<String>, value: Value, auto_increment: bool) {
        self.keys.push(KeyComponent { property, column: column.into(), value, auto_increment });
        self.rehash();
    }

    pub fn keys(&self) -> &[KeyComponent] {
        &self.keys
    }

    pub fn values(&self) -> Vec<Value> {
        self.keys.iter().map(|k| k.value.clone()).collect()
    }

    /// The value of a non-combined key
    pub fn single_value(&self) -> Option<&Value> {
        match self.keys.as_slice() {
            [key] => Some(&key.value),
            _ => None,
        }
    }

    /// True when there are no components or any component is NULL
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() || self.keys.iter().any(|k| k.value.is_null())
    }

    pub fn is_combined(&self) -> bool {
        self.keys.len() > 1
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.keys
            .iter()
            .position(|k| k.column.eq_ignore_ascii_case(column) || k.property.eq_ignore_ascii_case(column))
    }

    pub fn set_value(&mut self, position: usize, value: Value) {
        if let Some(component) = self.keys.get_mut(position) {
            component.value = value;
            self.rehash();
        }
    }

    fn rehash(&mut self) {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        for key in &self.keys {
            key.column.to_lowercase().hash(&mut hasher);
            key.value.hash(&mut hasher);
        }
        self.hash = hasher.finish();
    }
}

impl PartialEq for PrimaryKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.keys == other.keys
    }
}

impl Eq for PrimaryKey {}

impl Hash for PrimaryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl std::fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.keys.iter().map(|k| format!("{}={}", k.column, k.value)).collect();
        write!(f, "{}", parts.join(", "))
    }
}
