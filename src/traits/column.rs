use crate::value::ColumnType;

/// Column metadata generated for every `#[derive(Table)]` struct
///
/// Each variant names one declared property. Many-to-many properties get a
/// variant too, so they can be used in join expressions, but they never map
/// onto a database column.
pub trait ColumnTrait: std::fmt::Debug + Copy + Clone + std::fmt::Display + Send + Sync + 'static {
    /// Property name on the declaring struct
    fn property(&self) -> &'static str;

    /// Declared column name
    fn name(&self) -> &'static str;

    fn column_type(&self) -> ColumnType;

    fn is_nullable(&self) -> bool {
        false
    }

    fn is_primary_key(&self) -> bool {
        false
    }

    fn is_auto_increment(&self) -> bool {
        false
    }

    fn is_foreign_key(&self) -> bool {
        false
    }

    fn is_many_to_many(&self) -> bool {
        false
    }

    fn all() -> &'static [Self];
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Column type for hand-written test tables that never build expressions
    #[derive(Debug, Clone, Copy)]
    pub(crate) enum NoColumn {}

    impl ColumnTrait for NoColumn {
        fn property(&self) -> &'static str {
            match *self {}
        }

        fn name(&self) -> &'static str {
            match *self {}
        }

        fn column_type(&self) -> ColumnType {
            match *self {}
        }

        fn all() -> &'static [Self] {
            &[]
        }
    }

    impl std::fmt::Display for NoColumn {
        fn fmt(&self, _f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match *self {}
        }
    }
}
