//! Prelude module for tsqlorm
//!
//! This module re-exports the most commonly used types and traits.
//!
//! ```ignore
//! use tsqlorm::prelude::*;
//! ```

pub use crate::connection::prelude::*;
pub use crate::error::Error;
pub use crate::error::Result;
pub use crate::query::prelude::BinaryOp;
pub use crate::query::prelude::ColumnExt;
pub use crate::query::prelude::Expr;
pub use crate::traits::prelude::*;
pub use crate::value::ColumnType;
pub use crate::value::FromValue;
pub use crate::value::IntoValue;
pub use crate::value::Value;
pub use crate::Collection;
pub use crate::Entity;
pub use crate::Field;
pub use crate::ObjectState;
pub use crate::PrimaryKey;
// Re-export the derive macro
pub use tsqlorm_macros::Table;
