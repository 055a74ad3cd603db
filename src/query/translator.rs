//! Expression tree to T-SQL
//!
//! A [`Translator`] owns the table list and the parameter counter for one
//! statement. Join translation appends tables in first-seen order, and that
//! order is what the mapper later uses to cut a row into per-table windows.

use std::borrow::Cow;
use std::sync::Arc;

use super::expr::BinaryOp;
use super::expr::Expr;
use super::parameter::Parameter;
use super::parameter::ParameterList;
use crate::error::Error;
use crate::error::JoinError;
use crate::error::Result;
use crate::error::TranslationError;
use crate::schema::Catalog;
use crate::schema::TableSchema;
use crate::value::Value;

/// How a table came to take part in a query
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisitRole {
    Root,
    /// Joined through foreign key `column` of table `parent`
    ForeignKey { parent: usize, column: usize },
    /// Junction of many-to-many `relation` declared on `parent`
    Junction { parent: usize, relation: usize },
    /// Far side of many-to-many `relation` declared on `parent`
    ManyToMany { parent: usize, relation: usize },
}

impl VisitRole {
    pub fn parent(&self) -> Option<usize> {
        match *self {
            VisitRole::Root => None,
            VisitRole::ForeignKey { parent, .. }
            | VisitRole::Junction { parent, .. }
            | VisitRole::ManyToMany { parent, .. } => Some(parent),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TableVisit {
    pub alias:  String,
    pub schema: Arc<TableSchema>,
    pub role:   VisitRole,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JoinKind {
    #[default]
    Left,
    Inner,
}

impl std::fmt::Display for JoinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinKind::Left => write!(f, "LEFT"),
            JoinKind::Inner => write!(f, "INNER"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Clause {
    Select,
    Join,
    Where,
    OrderBy,
}

impl Clause {
    fn as_str(self) -> &'static str {
        match self {
            Clause::Select => "SELECT",
            Clause::Join => "JOIN",
            Clause::Where => "WHERE",
            Clause::OrderBy => "ORDER BY",
        }
    }
}

pub(crate) struct Translator<'a> {
    catalog:    &'a Catalog,
    tables:     Vec<TableVisit>,
    qualify:    bool,
    parameters: ParameterList,
}

impl<'a> Translator<'a> {
    /// `qualify` prefixes every column with its table alias, needed as soon
    /// as more than one table takes part.
    pub(crate) fn new(catalog: &'a Catalog, root: Arc<TableSchema>, qualify: bool) -> Self {
        let alias = root.alias_letter();
        Self {
            catalog,
            tables: vec![TableVisit { alias, schema: root, role: VisitRole::Root }],
            qualify,
            parameters: ParameterList::default(),
        }
    }

    pub(crate) fn root(&self) -> &TableVisit {
        &self.tables[0]
    }

    pub(crate) fn tables(&self) -> &[TableVisit] {
        &self.tables
    }

    pub(crate) fn into_parts(self) -> (Vec<TableVisit>, Vec<Parameter>) {
        (self.tables, self.parameters.into_vec())
    }

    pub(crate) fn column_ref(&self, visit: usize, column: usize) -> String {
        let table = &self.tables[visit];
        let name = &table.schema.column(column).name;
        if self.qualify { format!("[{}].[{}]", table.alias, name) } else { format!("[{}]", name) }
    }

    fn allocate_alias(&self, schema: &TableSchema) -> String {
        let letter = schema.alias_letter();
        let mut alias = letter.clone();
        while self.tables.iter().any(|t| t.alias == alias) {
            alias.push_str(&letter);
        }
        alias
    }

    fn find_visit(&self, role: VisitRole) -> Option<usize> {
        self.tables.iter().position(|t| t.role == role)
    }

    fn push_visit(&mut self, schema: Arc<TableSchema>, role: VisitRole) -> usize {
        let alias = self.allocate_alias(&schema);
        self.tables.push(TableVisit { alias, schema, role });
        self.tables.len() - 1
    }

    /// Translate a join expression into JOIN clauses, registering every
    /// table it reaches.
    pub(crate) fn translate_join(&mut self, expr: &Expr) -> Result<Vec<String>> {
        match expr {
            Expr::NewTuple(items) | Expr::ArrayInit(items) => {
                let mut clauses = Vec::new();
                for item in items {
                    clauses.extend(self.translate_join(item)?);
                }
                Ok(clauses)
            }
            Expr::Member(path) => self.join_path(path, JoinKind::Left),
            Expr::Call { method, target, args } => {
                let kind = if method.eq_ignore_ascii_case("left") {
                    JoinKind::Left
                } else if method.eq_ignore_ascii_case("inner") {
                    JoinKind::Inner
                } else {
                    return Err(JoinError::UnsupportedMethod { method: method.clone() }.into());
                };
                match target.as_deref().or(args.first()) {
                    Some(Expr::Member(path)) => self.join_path(path, kind),
                    other => Err(JoinError::InvalidTarget {
                        property:  other.map(Expr::kind).unwrap_or(method.as_str()).to_string(),
                        type_name: self.root().schema.type_name().to_string(),
                    }
                    .into()),
                }
            }
            other => Err(TranslationError::UnsupportedNode { node: other.kind(), clause: Clause::Join.as_str() }.into()),
        }
    }

    fn join_path(&mut self, path: &[String], kind: JoinKind) -> Result<Vec<String>> {
        let mut clauses = Vec::new();
        let mut current = 0;

        for segment in path {
            let schema = self.tables[current].schema.clone();

            if let Some(column) = schema.column_index(segment) {
                let Some(target) = schema.column(column).references else {
                    return Err(JoinError::InvalidTarget {
                        property:  segment.clone(),
                        type_name: schema.type_name().to_string(),
                    }
                    .into());
                };
                let role = VisitRole::ForeignKey { parent: current, column };
                if let Some(existing) = self.find_visit(role) {
                    current = existing;
                    continue;
                }

                let target = self.catalog.describe_target(&target)?;
                let target_key = target.single_key_column()?.name.clone();
                let parent_alias = self.tables[current].alias.clone();
                let visit = self.push_visit(target.clone(), role);
                clauses.push(format!(
                    "{} JOIN {} AS [{}] ON [{}].[{}] = [{}].[{}]",
                    kind,
                    target.qualified_name(),
                    self.tables[visit].alias,
                    parent_alias,
                    schema.column(column).name,
                    self.tables[visit].alias,
                    target_key
                ));
                current = visit;
            } else if let Some(relation) = schema.many_to_many_index(segment) {
                let role = VisitRole::ManyToMany { parent: current, relation };
                if let Some(existing) = self.find_visit(role) {
                    current = existing;
                    continue;
                }

                let declared = &schema.many_to_many()[relation];
                let junction = self.catalog.describe_target(&declared.junction)?;
                let target = self.catalog.describe_target(&declared.target)?;
                let not_implemented = || JoinError::ForeignKeyNotImplemented {
                    property:  segment.clone(),
                    type_name: junction.type_name().to_string(),
                };
                let owner_fk = junction.foreign_keys_to(schema.type_id()).next().ok_or_else(not_implemented)?;
                let target_fk =
                    junction.foreign_keys_to(target.type_id()).find(|&i| i != owner_fk).ok_or_else(not_implemented)?;
                let owner_key = schema.single_key_column()?.name.clone();
                let target_key = target.single_key_column()?.name.clone();
                let parent_alias = self.tables[current].alias.clone();

                let junction_visit = self.push_visit(junction.clone(), VisitRole::Junction { parent: current, relation });
                let junction_alias = self.tables[junction_visit].alias.clone();
                clauses.push(format!(
                    "{} JOIN {} AS [{}] ON [{}].[{}] = [{}].[{}]",
                    kind,
                    junction.qualified_name(),
                    junction_alias,
                    parent_alias,
                    owner_key,
                    junction_alias,
                    junction.column(owner_fk).name
                ));

                let visit = self.push_visit(target.clone(), role);
                clauses.push(format!(
                    "{} JOIN {} AS [{}] ON [{}].[{}] = [{}].[{}]",
                    kind,
                    target.qualified_name(),
                    self.tables[visit].alias,
                    junction_alias,
                    junction.column(target_fk).name,
                    self.tables[visit].alias,
                    target_key
                ));
                current = visit;
            } else {
                return Err(Error::ColumnNotFound { table: schema.table_name().to_string(), column: segment.clone() });
            }
        }

        Ok(clauses)
    }

    /// Find the table visit and column a member path ends on
    fn resolve_member(&self, path: &[String], clause: Clause) -> Result<(usize, usize)> {
        let mut current = 0;
        for (i, segment) in path.iter().enumerate() {
            let schema = &self.tables[current].schema;
            let last = i + 1 == path.len();

            if let Some(column) = schema.column_index(segment) {
                if last {
                    return Ok((current, column));
                }
                current = self.find_visit(VisitRole::ForeignKey { parent: current, column }).ok_or_else(|| {
                    JoinError::NotJoined { property: segment.clone(), type_name: schema.type_name().to_string() }
                })?;
            } else if let Some(relation) = schema.many_to_many_index(segment) {
                if last {
                    return Err(TranslationError::UnsupportedNode { node: "Member", clause: clause.as_str() }.into());
                }
                current = self.find_visit(VisitRole::ManyToMany { parent: current, relation }).ok_or_else(|| {
                    JoinError::NotJoined { property: segment.clone(), type_name: schema.type_name().to_string() }
                })?;
            } else {
                return Err(Error::ColumnNotFound { table: schema.table_name().to_string(), column: segment.clone() });
            }
        }
        Err(TranslationError::UnsupportedNode { node: "Member", clause: clause.as_str() }.into())
    }

    /// Column name a comparison operand refers to, used to tag parameters
    fn source_column(&self, expr: &Expr) -> Option<String> {
        match expr {
            Expr::Member(path) => self
                .resolve_member(path, Clause::Where)
                .ok()
                .map(|(visit, column)| self.tables[visit].schema.column(column).name.clone()),
            Expr::Call { method, target: Some(target), .. } if method.eq_ignore_ascii_case("tostring") => {
                self.source_column(target)
            }
            _ => None,
        }
    }

    pub(crate) fn translate(&mut self, expr: &Expr, clause: Clause) -> Result<String> {
        self.translate_node(expr, clause, None)
    }

    fn translate_node(&mut self, expr: &Expr, clause: Clause, source: Option<&str>) -> Result<String> {
        match expr {
            Expr::Binary { op, left, right } => {
                let right = materialize(right);
                let left_sql = self.translate_node(left, clause, None)?;
                if op.is_comparison() && matches!(right.as_ref(), Expr::Constant(Value::Null)) {
                    match op {
                        BinaryOp::Eq => return Ok(format!("({} IS NULL)", left_sql)),
                        BinaryOp::Ne => return Ok(format!("({} IS NOT NULL)", left_sql)),
                        _ => {}
                    }
                }
                let source = self.source_column(left);
                let right_sql = self.translate_node(&right, clause, source.as_deref())?;
                Ok(format!("({} {} {})", left_sql, op, right_sql))
            }
            Expr::Member(path) => {
                let (visit, column) = self.resolve_member(path, clause)?;
                Ok(self.column_ref(visit, column))
            }
            Expr::Constant(value) => Ok(self.parameters.bind(value.clone(), source)),
            Expr::Captured(capture) => Ok(self.parameters.bind(capture.evaluate(), source)),
            Expr::Call { method, target, args } => self.translate_call(method, target.as_deref(), args, clause),
            Expr::NewTuple(items) | Expr::ArrayInit(items) if matches!(clause, Clause::Select | Clause::OrderBy) => {
                let parts = items.iter().map(|item| self.translate_node(item, clause, None)).collect::<Result<Vec<_>>>()?;
                Ok(parts.join(", "))
            }
            other => Err(TranslationError::UnsupportedNode { node: other.kind(), clause: clause.as_str() }.into()),
        }
    }

    fn translate_call(&mut self, method: &str, target: Option<&Expr>, args: &[Expr], clause: Clause) -> Result<String> {
        let (receiver, rest) = match target {
            Some(target) => (Some(target), args),
            None => (args.first(), args.get(1..).unwrap_or_default()),
        };
        let unsupported = || TranslationError::UnsupportedMethod { method: method.to_string() };
        let lowered = method.to_ascii_lowercase();

        match lowered.as_str() {
            "contains" | "startswith" | "endswith" => {
                let receiver = receiver.ok_or_else(unsupported)?;
                let pattern = rest.first().map(materialize).ok_or_else(unsupported)?;
                // Patterns are built from the bound form, so date-times use the parameter format
                let text = match pattern.as_ref() {
                    Expr::Constant(value) => match value.clone().bind() {
                        Value::Text(text) => text,
                        Value::Integer(v) => v.to_string(),
                        Value::Real(v) => v.to_string(),
                        Value::Boolean(v) => if v { "1" } else { "0" }.to_string(),
                        Value::Null => {
                            return Err(TranslationError::UnsupportedNode { node: "Null", clause: clause.as_str() }.into());
                        }
                        Value::DateTime(dt) => dt.format(crate::value::DATETIME_FORMAT).to_string(),
                        Value::Blob(_) => {
                            return Err(TranslationError::UnsupportedNode { node: "Blob", clause: clause.as_str() }.into());
                        }
                    },
                    other => {
                        return Err(TranslationError::UnsupportedNode { node: other.kind(), clause: clause.as_str() }.into());
                    }
                };
                let pattern = match lowered.as_str() {
                    "contains" => format!("%{}%", text),
                    "startswith" => format!("{}%", text),
                    _ => format!("%{}", text),
                };
                let receiver_sql = self.translate_node(receiver, clause, None)?;
                let source = self.source_column(receiver);
                let parameter = self.parameters.bind(Value::Text(pattern), source.as_deref());
                Ok(format!("({} LIKE {})", receiver_sql, parameter))
            }
            "tostring" => {
                let receiver = receiver.ok_or_else(unsupported)?;
                self.translate_node(receiver, clause, None)
            }
            "asc" | "desc" if clause == Clause::OrderBy => {
                let receiver = receiver.ok_or_else(unsupported)?;
                let sql = self.translate_node(receiver, clause, None)?;
                Ok(format!("{} {}", sql, lowered.to_ascii_uppercase()))
            }
            _ => Err(unsupported().into()),
        }
    }

    /// Resolve a projection into `(visit, column)` pairs
    pub(crate) fn projection(&self, expr: &Expr) -> Result<Vec<(usize, usize)>> {
        match expr {
            Expr::Member(path) => Ok(vec![self.resolve_member(path, Clause::Select)?]),
            Expr::NewTuple(items) | Expr::ArrayInit(items) => {
                let mut columns = Vec::new();
                for item in items {
                    columns.extend(self.projection(item)?);
                }
                Ok(columns)
            }
            Expr::Call { method, target: Some(target), .. } if method.eq_ignore_ascii_case("tostring") => {
                self.projection(target)
            }
            Expr::Call { method, .. } => Err(TranslationError::UnsupportedMethod { method: method.clone() }.into()),
            other => Err(TranslationError::UnsupportedNode { node: other.kind(), clause: Clause::Select.as_str() }.into()),
        }
    }
}

/// Evaluate a captured value once, so the same snapshot is used for the
/// NULL check and for the bound parameter.
fn materialize(expr: &Expr) -> Cow<'_, Expr> {
    match expr {
        Expr::Captured(capture) => Cow::Owned(Expr::Constant(capture.evaluate())),
        other => Cow::Borrowed(other),
    }
}
