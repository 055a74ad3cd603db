use crate::Entity;
use crate::Error;
use crate::Result;
use crate::entity::Field;
use crate::value::FromValue;

/// Conversion from a dynamic [`Entity`] into a typed model
pub trait FromEntity: Sized {
    fn from_entity(entity: &Entity) -> Result<Self>;
}

/// Read one scalar property. A foreign key column yields the referenced key.
pub fn read_value<T: FromValue>(entity: &Entity, property: &str) -> Result<T> {
    T::from_value(entity.value(property)?).map_err(|e| match e {
        Error::UnexpectedNull => {
            Error::Nullability { table: entity.schema().table_name().to_string(), column: property.to_string() }
        }
        other => other,
    })
}

/// Read a foreign key property as the referenced model, if one is attached
pub fn read_reference<T: FromEntity>(entity: &Entity, property: &str) -> Result<Option<T>> {
    match entity.get(property)? {
        Field::Entity(child) => T::from_entity(child).map(Some),
        Field::Value(_) => Ok(None),
    }
}

/// Read a many-to-many property
pub fn read_related<T: FromEntity>(entity: &Entity, property: &str) -> Result<Vec<T>> {
    entity.related(property)?.iter().map(T::from_entity).collect()
}
