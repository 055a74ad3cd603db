use super::parameter::Parameter;
use super::parameter::ParameterList;
use super::select::QueryBuilder;
use crate::Entity;
use crate::entity::PrimaryKey;
use crate::error::Result;
use crate::executor::NonQueryKind;

/// A translated INSERT, UPDATE or DELETE
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub sql:              String,
    pub parameters:       Vec<Parameter>,
    pub kind:             NonQueryKind,
    /// The statement ends with a scalar select of the new identity
    pub returns_identity: bool,
}

/// `([A].[Id] = @PARAMn)`, components of a combined key joined with AND
pub(crate) fn key_predicate(alias: &str, key: &PrimaryKey, parameters: &mut ParameterList) -> String {
    let parts: Vec<String> = key
        .keys()
        .iter()
        .map(|k| format!("([{}].[{}] = {})", alias, k.column, parameters.bind(k.value.clone(), Some(&k.column))))
        .collect();
    match parts.as_slice() {
        [single] => single.clone(),
        _ => format!("({})", parts.join(" AND ")),
    }
}

impl QueryBuilder<'_> {
    /// Build the write statement of `kind` for an entity.
    ///
    /// `None` means there is nothing to write, which only happens for an
    /// UPDATE without dirty columns.
    pub fn build_non_query(&self, entity: &Entity, kind: NonQueryKind) -> Result<Option<Statement>> {
        match kind {
            NonQueryKind::Insert => super::insert::build_insert(entity).map(Some),
            NonQueryKind::Update => super::update::build_update(entity),
            NonQueryKind::Delete => super::delete::build_delete(entity).map(Some),
        }
    }
}
