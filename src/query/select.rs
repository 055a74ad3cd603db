use std::ops::Range;
use std::sync::Arc;

use super::expr::Expr;
use super::parameter::Parameter;
use super::translator::Clause;
use super::translator::TableVisit;
use super::translator::Translator;
use super::translator::VisitRole;
use crate::Result;
use crate::schema::Catalog;
use crate::schema::TableSchema;

/// A translated SELECT, with what the mapper needs to read its rows back
#[derive(Clone, Debug)]
pub struct SelectQuery {
    pub sql:           String,
    pub parameters:    Vec<Parameter>,
    /// Participating tables in first-seen order
    pub tables:        Vec<TableVisit>,
    /// Number of result columns contributed by each entry of `tables`
    pub column_counts: Vec<usize>,
}

impl SelectQuery {
    pub fn root(&self) -> &TableVisit {
        &self.tables[0]
    }

    /// Column range of each table inside a result row
    pub fn windows(&self) -> Vec<Range<usize>> {
        let mut start = 0;
        self.column_counts
            .iter()
            .map(|count| {
                let window = start..start + count;
                start += count;
                window
            })
            .collect()
    }

    pub fn has_many_to_many(&self) -> bool {
        self.tables.iter().any(|t| matches!(t.role, VisitRole::ManyToMany { .. }))
    }
}

/// Entry point for statement generation against one root table
pub struct QueryBuilder<'a> {
    catalog: &'a Catalog,
    root:    Arc<TableSchema>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(catalog: &'a Catalog, root: Arc<TableSchema>) -> Self {
        Self { catalog, root }
    }

    /// Translate staged expressions into a SELECT.
    ///
    /// Clauses are produced in the order FROM, JOIN, WHERE, ORDER BY. The
    /// column list goes last since it depends on which tables were joined.
    #[tracing::instrument(skip_all, fields(table = %self.root.table_name()))]
    pub fn build_query(
        &self,
        select: Option<&Expr>,
        join: Option<&Expr>,
        filter: Option<&Expr>,
        sort: Option<&Expr>,
        limit: Option<usize>,
    ) -> Result<SelectQuery> {
        let mut translator = Translator::new(self.catalog, self.root.clone(), join.is_some());

        let mut body = format!("FROM {}", self.root.qualified_name());
        if let Some(join) = join {
            body.push_str(&format!(" AS [{}]", translator.root().alias));
            for clause in translator.translate_join(join)? {
                body.push(' ');
                body.push_str(&clause);
            }
        }
        if let Some(filter) = filter {
            let predicate = translator.translate(filter, Clause::Where)?;
            body.push_str(&format!(" WHERE {}", predicate));
        }
        if let Some(sort) = sort {
            let order = translator.translate(sort, Clause::OrderBy)?;
            body.push_str(&format!(" ORDER BY {}", order));
        }

        let (columns, column_counts) = match select {
            None => ("*".to_string(), translator.tables().iter().map(|t| t.schema.columns().len()).collect()),
            Some(select) => {
                let mut members = translator.projection(select)?;
                members.sort_by_key(|(visit, _)| *visit);
                let mut counts = vec![0; translator.tables().len()];
                for (visit, _) in &members {
                    counts[*visit] += 1;
                }
                let columns: Vec<String> = members.iter().map(|(v, c)| translator.column_ref(*v, *c)).collect();
                (columns.join(", "), counts)
            }
        };

        let top = limit.map(|n| format!("TOP ({}) ", n)).unwrap_or_default();
        let sql = format!("SELECT {}{} {};", top, columns, body);
        let (tables, parameters) = translator.into_parts();
        tracing::trace!(sql = %sql, parameters = parameters.len(), "Translated query");

        Ok(SelectQuery { sql, parameters, tables, column_counts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColumnExt;
    use crate::error::Error;
    use crate::error::JoinError;
    use crate::error::TranslationError;
    use crate::testing::fixtures::*;
    use crate::value::Value;

    async fn builder_for<T: crate::Table>(catalog: &Catalog) -> QueryBuilder<'_> {
        QueryBuilder::new(catalog, catalog.describe::<T>().unwrap())
    }

    #[tokio::test]
    async fn test_select_all() {
        let catalog = catalog().await;
        let query = builder_for::<User>(&catalog).await.build_query(None, None, None, None, None).unwrap();
        assert_eq!(query.sql.to_uppercase(), "SELECT * FROM [DBO].[USERS];");
        assert!(query.parameters.is_empty());
        assert_eq!(query.column_counts, vec![3]);
    }

    #[tokio::test]
    async fn test_select_top() {
        let catalog = catalog().await;
        let query = builder_for::<User>(&catalog).await.build_query(None, None, None, None, Some(1)).unwrap();
        assert_eq!(query.sql.to_uppercase(), "SELECT TOP (1) * FROM [DBO].[USERS];");
    }

    #[tokio::test]
    async fn test_where_and_numbers_parameters_left_to_right() {
        let catalog = catalog().await;
        let filter = UserColumn::Id.eq(19).and(UserColumn::Id.eq(12));
        let query = builder_for::<User>(&catalog).await.build_query(None, None, Some(&filter), None, None).unwrap();
        assert_eq!(query.sql.to_uppercase(), "SELECT * FROM [DBO].[USERS] WHERE (([ID] = @PARAM1) AND ([ID] = @PARAM2));");
        assert_eq!(query.parameters[0].value, Value::Integer(19));
        assert_eq!(query.parameters[1].value, Value::Integer(12));
        assert_eq!(query.parameters[1].source_column.as_deref(), Some("id"));
    }

    #[tokio::test]
    async fn test_left_join_on_foreign_key() {
        let catalog = catalog().await;
        let join = UserColumn::Organisation.left();
        let query = builder_for::<User>(&catalog).await.build_query(None, Some(&join), None, None, Some(1)).unwrap();
        assert_eq!(
            query.sql.to_uppercase(),
            "SELECT TOP (1) * FROM [DBO].[USERS] AS [U] LEFT JOIN [DBO].[ORGANISATIONS] AS [O] ON [U].[ORGANISATION] = [O].[ID];"
        );
        assert_eq!(query.column_counts, vec![3, 2]);
        assert_eq!(query.windows(), vec![0..3, 3..5]);
    }

    #[tokio::test]
    async fn test_inner_join_and_qualified_filter() {
        let catalog = catalog().await;
        let join = UserColumn::Organisation.inner();
        let filter = UserColumn::Organisation.field("name").eq("Acme");
        let query =
            builder_for::<User>(&catalog).await.build_query(None, Some(&join), Some(&filter), None, None).unwrap();
        assert_eq!(
            query.sql.to_uppercase(),
            "SELECT * FROM [DBO].[USERS] AS [U] INNER JOIN [DBO].[ORGANISATIONS] AS [O] ON [U].[ORGANISATION] = \
             [O].[ID] WHERE ([O].[NAME] = @PARAM1);"
        );
    }

    #[tokio::test]
    async fn test_aliases_repeat_letter_on_collision() {
        let catalog = catalog().await;
        let join = UserColumn::Roles.left();
        let query = builder_for::<User>(&catalog).await.build_query(None, Some(&join), None, None, None).unwrap();
        let aliases: Vec<&str> = query.tables.iter().map(|t| t.alias.as_str()).collect();
        assert_eq!(aliases, vec!["U", "UU", "R"]);
        assert_eq!(
            query.sql.to_uppercase(),
            "SELECT * FROM [DBO].[USERS] AS [U] LEFT JOIN [DBO].[USERROLES] AS [UU] ON [U].[ID] = [UU].[USER] LEFT JOIN \
             [DBO].[ROLES] AS [R] ON [UU].[ROLE] = [R].[ID];"
        );
        assert!(query.has_many_to_many());
        assert_eq!(query.column_counts, vec![3, 2, 2]);
    }

    #[tokio::test]
    async fn test_tuple_join_adds_one_join_per_element() {
        let catalog = catalog().await;
        let join = crate::Expr::tuple([UserColumn::Organisation.left(), UserColumn::Roles.inner()]);
        let query = builder_for::<User>(&catalog).await.build_query(None, Some(&join), None, None, None).unwrap();
        assert_eq!(query.tables.len(), 4);
        assert_eq!(query.sql.matches(" JOIN ").count(), 3);
    }

    #[tokio::test]
    async fn test_null_comparison_renders_is_null() {
        let catalog = catalog().await;
        let filter = UserColumn::Organisation.is_null().or(UserColumn::Name.ne(crate::Expr::captured(|| None::<String>)));
        let query = builder_for::<User>(&catalog).await.build_query(None, None, Some(&filter), None, None).unwrap();
        assert_eq!(
            query.sql.to_uppercase(),
            "SELECT * FROM [DBO].[USERS] WHERE (([ORGANISATION] IS NULL) OR ([NAME] IS NOT NULL));"
        );
        assert!(query.parameters.is_empty());
    }

    #[tokio::test]
    async fn test_like_patterns() {
        let catalog = catalog().await;
        let filter = UserColumn::Name
            .contains("ar")
            .and(UserColumn::Name.starts_with("M"))
            .and(UserColumn::Name.expr().as_text().ends_with("y"));
        let query = builder_for::<User>(&catalog).await.build_query(None, None, Some(&filter), None, None).unwrap();
        assert_eq!(
            query.sql.to_uppercase(),
            "SELECT * FROM [DBO].[USERS] WHERE ((([NAME] LIKE @PARAM1) AND ([NAME] LIKE @PARAM2)) AND ([NAME] LIKE \
             @PARAM3));"
        );
        let patterns: Vec<Value> = query.parameters.iter().map(|p| p.value.clone()).collect();
        assert_eq!(patterns, vec![
            Value::Text("%ar%".to_string()),
            Value::Text("M%".to_string()),
            Value::Text("%y".to_string())
        ]);
    }

    #[tokio::test]
    async fn test_like_pattern_uses_bound_form_of_non_text_values() {
        let catalog = catalog().await;
        let when = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap();
        let filter = UserColumn::Name
            .contains(Value::DateTime(when))
            .and(UserColumn::Name.starts_with(true))
            .and(UserColumn::Name.ends_with(42));
        let query = builder_for::<User>(&catalog).await.build_query(None, None, Some(&filter), None, None).unwrap();
        let patterns: Vec<Value> = query.parameters.iter().map(|p| p.value.clone()).collect();
        assert_eq!(patterns, vec![
            Value::Text("%2024-01-02 03:04:05.000%".to_string()),
            Value::Text("1%".to_string()),
            Value::Text("%42".to_string())
        ]);
    }

    #[tokio::test]
    async fn test_like_pattern_rejects_blob() {
        let catalog = catalog().await;
        let filter = UserColumn::Name.contains(vec![1u8, 2, 3]);
        let err = builder_for::<User>(&catalog).await.build_query(None, None, Some(&filter), None, None).unwrap_err();
        assert!(matches!(err, Error::Translation(TranslationError::UnsupportedNode { node: "Blob", clause: "WHERE" })));
    }

    #[tokio::test]
    async fn test_order_by_directions() {
        let catalog = catalog().await;
        let sort = crate::Expr::tuple([UserColumn::Name.asc(), UserColumn::Id.desc()]);
        let query = builder_for::<User>(&catalog).await.build_query(None, None, None, Some(&sort), None).unwrap();
        assert_eq!(query.sql.to_uppercase(), "SELECT * FROM [DBO].[USERS] ORDER BY [NAME] ASC, [ID] DESC;");
    }

    #[tokio::test]
    async fn test_projection_groups_columns_by_table() {
        let catalog = catalog().await;
        let join = UserColumn::Organisation.left();
        let select = crate::Expr::tuple([
            UserColumn::Organisation.field("name"),
            UserColumn::Name.expr(),
            UserColumn::Id.expr(),
        ]);
        let query =
            builder_for::<User>(&catalog).await.build_query(Some(&select), Some(&join), None, None, None).unwrap();
        assert!(query.sql.to_uppercase().starts_with("SELECT [U].[NAME], [U].[ID], [O].[NAME] FROM"));
        assert_eq!(query.column_counts, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_join_on_scalar_property_is_invalid() {
        let catalog = catalog().await;
        let join = UserColumn::Name.left();
        let err = builder_for::<User>(&catalog).await.build_query(None, Some(&join), None, None, None).unwrap_err();
        assert!(matches!(err, Error::Join(JoinError::InvalidTarget { ref property, .. }) if property == "name"));
    }

    #[tokio::test]
    async fn test_unjoined_member_path() {
        let catalog = catalog().await;
        let filter = UserColumn::Organisation.field("name").eq("Acme");
        let err = builder_for::<User>(&catalog).await.build_query(None, None, Some(&filter), None, None).unwrap_err();
        assert!(matches!(err, Error::Join(JoinError::NotJoined { .. })));
    }

    #[tokio::test]
    async fn test_unknown_method_is_rejected() {
        let catalog = catalog().await;
        let filter = UserColumn::Name.expr().call("Trim", vec![]).eq("x");
        let err = builder_for::<User>(&catalog).await.build_query(None, None, Some(&filter), None, None).unwrap_err();
        assert!(matches!(err, Error::Translation(TranslationError::UnsupportedMethod { ref method }) if method == "Trim"));
    }

    #[tokio::test]
    async fn test_tuple_in_where_is_rejected() {
        let catalog = catalog().await;
        let filter = crate::Expr::tuple([UserColumn::Id.expr()]);
        let err = builder_for::<User>(&catalog).await.build_query(None, None, Some(&filter), None, None).unwrap_err();
        assert!(matches!(
            err,
            Error::Translation(TranslationError::UnsupportedNode { node: "NewTuple", clause: "WHERE" })
        ));
    }

    #[tokio::test]
    async fn test_many_to_many_without_junction_key() {
        let catalog = catalog().await;
        let join = UserColumn::Badges.left();
        let err = builder_for::<User>(&catalog).await.build_query(None, Some(&join), None, None, None).unwrap_err();
        assert!(matches!(err, Error::Join(JoinError::ForeignKeyNotImplemented { ref property, .. }) if property == "badges"));
    }
}
