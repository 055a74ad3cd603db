//! # tsqlorm
//!
//! An entity-state ORM for SQL Server dialect databases.
//!
//! ## Features
//!
//! - `#[derive(Table)]` for declaring tables, foreign keys and many-to-many
//!   properties
//! - Schema catalog reconciled with the live table layout at startup
//! - Dynamic entities with snapshot-based dirty tracking and a lifecycle
//!   state machine
//! - Expression trees translated into parameterized T-SQL with aliased joins
//! - Joined rows mapped back into entity graphs, with many-to-many fan-out
//!   folded per root key
//! - A pluggable [`Driver`] boundary, with an in-memory driver for tests
//!
//! ## Quick Start
//!
//! ```ignore
//! use tsqlorm::prelude::*;
//!
//! #[derive(Clone, Debug, Table)]
//! #[tsqlorm(table_name = "Organisations")]
//! pub struct Organisation {
//!     #[tsqlorm(primary_key, auto_increment)]
//!     pub id:   i64,
//!     pub name: String,
//! }
//!
//! #[derive(Clone, Debug, Table)]
//! #[tsqlorm(table_name = "Users")]
//! pub struct User {
//!     #[tsqlorm(primary_key, auto_increment)]
//!     pub id:           i64,
//!     pub name:         String,
//!     #[tsqlorm(foreign_key, column_name = "Organisation")]
//!     pub organisation: Option<Organisation>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let db = Builder::new(my_driver).register::<User>().build().await?;
//!     let conn = db.connect().await?;
//!
//!     // Fetch with a join and a filter
//!     let mut users = User::collection(&conn)?
//!         .join(UserColumn::Organisation.left())
//!         .filter(UserColumn::Name.starts_with("A"));
//!     users.fetch(&conn).await?;
//!
//!     // Change one and save it; only the dirty column is written
//!     if let Some(user) = users.get_mut(0) {
//!         user.set("name", "Ada")?;
//!         user.save(&conn).await?;
//!     }
//!
//!     // Insert picks up the identity value
//!     let mut user = User::create(&conn)?;
//!     user.set("name", "Grace")?;
//!     user.save(&conn).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Table Attributes
//!
//! The `#[tsqlorm(...)]` attribute supports:
//!
//! - `table_name = "..."` - Set the table name (default: struct name)
//! - `schema = "..."` - Set the schema (default: the builder's schema name)
//! - `primary_key` - Mark a field as part of the primary key
//! - `auto_increment` - Mark a primary key as assigned by the database
//! - `column_name = "..."` - Set a custom column name
//! - `foreign_key` - The field is an `Option<T>` of another table
//! - `many_to_many, junction = "..."` - The field is a `Vec<T>` reached
//!   through the named junction table

extern crate self as tsqlorm;

pub mod collection;
pub mod connection;
pub mod entity;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod query;
pub mod schema;
pub mod testing;
pub mod traits;
pub mod value;

// Re-export main types at crate root
pub use collection::Collection;
pub use connection::Connection;
pub use connection::builder::Builder;
pub use connection::database::Database;
pub use entity::DirtyTracker;
pub use entity::Entity;
pub use entity::Field;
pub use entity::ObjectState;
pub use entity::PrimaryKey;
pub use error::Error;
pub use error::Result;
pub use executor::Driver;
pub use executor::Executor;
pub use executor::MemoryRows;
pub use executor::NonQueryKind;
pub use executor::NonQueryResult;
pub use executor::RowCursor;
pub use query::Expr;
pub use query::Parameter;
pub use query::Query;
pub use query::prelude::ColumnExt;
pub use query::prelude::QueryBuilder;
pub use query::prelude::QueryMapper;
pub use schema::Catalog;
pub use schema::FieldDefinition;
pub use schema::ManyToManyDefinition;
pub use schema::RelationTarget;
pub use schema::TableDefinition;
pub use schema::TableSchema;
pub use traits::prelude::*;
// Re-export the derive macro
pub use tsqlorm_macros::Table;
pub use value::ColumnType;
pub use value::FromValue;
pub use value::IntoValue;
pub use value::Value;
