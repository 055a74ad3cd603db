use super::builder::Builder;

#[derive(Debug, Clone)]
pub struct DatabaseOpts {
    pub(super) schema_name:     String,
    pub(super) change_tracking: bool,
    pub(super) test_mode:       bool,
}

impl From<&Builder> for DatabaseOpts {
    fn from(builder: &Builder) -> Self {
        Self {
            schema_name:     builder.schema_name.clone(),
            change_tracking: builder.change_tracking,
            test_mode:       builder.test_mode,
        }
    }
}
