use super::parameter::ParameterList;
use super::statement::Statement;
use super::statement::key_predicate;
use crate::Entity;
use crate::error::Result;
use crate::error::StateError;
use crate::executor::NonQueryKind;

/// UPDATE of the columns the dirty tracker flags, keyed on the persisted
/// primary key. `None` when no column is flagged.
pub(crate) fn build_update(entity: &Entity) -> Result<Option<Statement>> {
    let schema = entity.schema();
    if entity.primary_key().is_empty() {
        return Err(StateError::EmptyPrimaryKey { table: schema.table_name().to_string() }.into());
    }

    let alias = schema.alias_letter();
    let mut parameters = ParameterList::default();
    let mut assignments = Vec::new();

    for &index in schema.mutable_indices() {
        let column = schema.column(index);
        if !entity.dirty_tracker().is_dirty(&column.name)? {
            continue;
        }
        let value = entity.field_at(index).key_value()?;
        let placeholder = parameters.bind(value, Some(&column.name));
        assignments.push(format!("[{}].[{}] = {}", alias, column.name, placeholder));
    }

    if assignments.is_empty() {
        return Ok(None);
    }

    let predicate = key_predicate(&alias, entity.primary_key(), &mut parameters);
    let sql = format!(
        "UPDATE [{}] SET {} FROM {} AS [{}] WHERE {};",
        alias,
        assignments.join(", "),
        schema.qualified_name(),
        alias,
        predicate
    );

    Ok(Some(Statement { sql, parameters: parameters.into_vec(), kind: NonQueryKind::Update, returns_identity: false }))
}
