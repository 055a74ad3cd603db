use std::sync::Arc;

use crate::Result;
use crate::executor::Driver;
use crate::schema::CatalogBuilder;
use crate::schema::DeclaredSchemaSource;
use crate::schema::LiveSchemaSource;
use crate::schema::SchemaSource;
use crate::schema::TableDefinition;
use crate::traits::table::Table;

/// Configures and builds a [`Database`](super::database::Database)
///
/// ```ignore
/// let db = Builder::new(driver)
///     .with_schema_name("dbo")
///     .register::<User>()
///     .build()
///     .await?;
/// let conn = db.connect().await?;
/// ```
pub struct Builder {
    pub(super) driver:          Arc<dyn Driver>,
    pub(super) schema_name:     String,
    pub(super) change_tracking: bool,
    pub(super) test_mode:       bool,
    pub(super) schema_source:   Option<Box<dyn SchemaSource>>,
    pub(super) definitions:     Vec<TableDefinition>,
}

impl Builder {
    pub fn new(driver: impl Driver + 'static) -> Self {
        Self {
            driver:          Arc::new(driver),
            schema_name:     "dbo".to_string(),
            change_tracking: true,
            test_mode:       false,
            schema_source:   None,
            definitions:     Vec::new(),
        }
    }

    /// Schema used for tables that do not name one
    pub fn with_schema_name(mut self, schema_name: &str) -> Self {
        self.schema_name = schema_name.to_string();
        self
    }

    /// Keep a snapshot of fetched and saved values to diff against
    pub fn with_change_tracking(mut self, change_tracking: bool) -> Self {
        self.change_tracking = change_tracking;
        self
    }

    /// Test mode reads the layout from declarations instead of the live
    /// database, and turns a missed fetch by key into an error.
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub fn with_schema_source(mut self, source: impl SchemaSource + 'static) -> Self {
        self.schema_source = Some(Box::new(source));
        self
    }

    pub fn register<T: Table>(mut self) -> Self {
        self.definitions.push(T::definition());
        self
    }

    #[tracing::instrument(skip_all, fields(schema = %self.schema_name, test_mode = self.test_mode))]
    pub async fn build(self) -> Result<super::database::Database> {
        let opts = super::opts::DatabaseOpts::from(&self);
        let catalog = self
            .definitions
            .into_iter()
            .fold(CatalogBuilder::new(self.schema_name.clone()), CatalogBuilder::register_definition);

        let catalog = match (&self.schema_source, self.test_mode) {
            (Some(source), _) => catalog.build(source.as_ref()).await?,
            (None, true) => catalog.build(&DeclaredSchemaSource).await?,
            (None, false) => {
                let executor = self.driver.connect().await?;
                catalog.build(&LiveSchemaSource::new(executor.as_ref())).await?
            }
        };
        tracing::info!(tables = catalog.len(), "Schema catalog ready");

        Ok(super::database::Database::new(self.driver, Arc::new(catalog), opts))
    }
}
