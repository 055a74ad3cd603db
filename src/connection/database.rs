use std::sync::Arc;

use crate::Result;
use crate::executor::Driver;
use crate::schema::Catalog;

#[derive(Clone)]
pub struct Database {
    driver:  Arc<dyn Driver>,
    catalog: Arc<Catalog>,
    opts:    super::opts::DatabaseOpts,
}

impl Database {
    pub(super) fn new(driver: Arc<dyn Driver>, catalog: Arc<Catalog>, opts: super::opts::DatabaseOpts) -> Self {
        Self { driver, catalog, opts }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn connect(&self) -> Result<super::Connection> {
        let inner = self.driver.connect().await?;
        Ok(super::Connection::new(inner, self.catalog.clone(), self.opts.clone()))
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("tables", &self.catalog.len()).field("opts", &self.opts).finish()
    }
}
