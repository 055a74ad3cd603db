use crate::error::Error;
use crate::error::Result;

/// Per-column dirty flags for the mutable columns of one table
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirtyTracker {
    table: String,
    flags: Vec<(String, bool)>,
}

impl DirtyTracker {
    pub fn new<I, S>(table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>, {
        Self { table: table.into(), flags: columns.into_iter().map(|c| (c.into(), false)).collect() }
    }

    fn position(&self, column: &str) -> Result<usize> {
        self.flags
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(column))
            .ok_or_else(|| Error::ColumnNotFound { table: self.table.clone(), column: column.to_string() })
    }

    pub fn is_dirty(&self, column: &str) -> Result<bool> {
        Ok(self.flags[self.position(column)?].1)
    }

    pub fn update(&mut self, column: &str, dirty: bool) -> Result<()> {
        let index = self.position(column)?;
        self.flags[index].1 = dirty;
        Ok(())
    }

    pub fn tracks(&self, column: &str) -> bool {
        self.position(column).is_ok()
    }

    pub fn any(&self) -> bool {
        self.flags.iter().any(|(_, dirty)| *dirty)
    }

    pub fn count(&self) -> usize {
        self.flags.iter().filter(|(_, dirty)| *dirty).count()
    }

    pub fn dirty_columns(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().filter(|(_, dirty)| *dirty).map(|(name, _)| name.as_str())
    }

    pub fn reset(&mut self) {
        for (_, dirty) in &mut self.flags {
            *dirty = false;
        }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}
