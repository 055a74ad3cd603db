use super::parameter::ParameterList;
use super::statement::Statement;
use super::statement::key_predicate;
use crate::Entity;
use crate::error::Result;
use crate::error::StateError;
use crate::executor::NonQueryKind;

pub(crate) fn build_delete(entity: &Entity) -> Result<Statement> {
    let schema = entity.schema();
    if entity.primary_key().is_empty() {
        return Err(StateError::EmptyPrimaryKey { table: schema.table_name().to_string() }.into());
    }

    let alias = schema.alias_letter();
    let mut parameters = ParameterList::default();
    let predicate = key_predicate(&alias, entity.primary_key(), &mut parameters);
    let sql = format!("DELETE FROM {} AS [{}] WHERE {};", schema.qualified_name(), alias, predicate);

    Ok(Statement { sql, parameters: parameters.into_vec(), kind: NonQueryKind::Delete, returns_identity: false })
}
