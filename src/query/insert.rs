use super::parameter::ParameterList;
use super::statement::Statement;
use crate::Entity;
use crate::error::Result;
use crate::executor::NonQueryKind;

/// INSERT of every mutable column, selecting the identity back when the
/// table has a single auto-increment key
pub(crate) fn build_insert(entity: &Entity) -> Result<Statement> {
    let schema = entity.schema();
    let mut parameters = ParameterList::default();
    let mut columns = Vec::new();
    let mut placeholders = Vec::new();

    for &index in schema.mutable_indices() {
        let column = schema.column(index);
        let value = entity.field_at(index).key_value()?;
        columns.push(format!("[{}]", column.name));
        placeholders.push(parameters.bind(value, Some(&column.name)));
    }

    let mut sql = if columns.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES;", schema.qualified_name())
    } else {
        format!("INSERT INTO {} ({}) VALUES({});", schema.qualified_name(), columns.join(", "), placeholders.join(", "))
    };

    let returns_identity = schema.has_identity_key();
    if returns_identity {
        sql.push_str(" SELECT CAST(SCOPE_IDENTITY() AS INT);");
    }

    Ok(Statement { sql, parameters: parameters.into_vec(), kind: NonQueryKind::Insert, returns_identity })
}
