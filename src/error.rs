use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Misconfiguration detected while building the schema catalog or reading keys
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Type {type_name} does not declare a primary key")]
    MissingPrimaryKey { type_name: &'static str },

    #[error("Column {column} of {type_name} cannot be matched to a declared property")]
    UnresolvableColumn { type_name: &'static str, column: String },

    #[error("Column {column} of {type_name} has the same name as its type and cannot be mapped")]
    IllegalColumnName { type_name: &'static str, column: String },

    #[error("Type {type_name} is not registered in the schema catalog")]
    UnregisteredType { type_name: String },

    #[error("Expected {expected} primary key column(s) for {table}, found {found}")]
    KeyColumnMismatch { table: String, expected: usize, found: usize },
}

#[derive(Error, Debug)]
pub enum JoinError {
    #[error("Property {property} of {type_name} is not a valid join target")]
    InvalidTarget { property: String, type_name: String },

    #[error("Foreign key not implemented for {property} on {type_name}")]
    ForeignKeyNotImplemented { property: String, type_name: String },

    #[error("Method {method} cannot be used in a join expression")]
    UnsupportedMethod { method: String },

    #[error("Property {property} of {type_name} is referenced but was never joined")]
    NotJoined { property: String, type_name: String },

    #[error("Type {type_name} has a combined primary key and cannot be joined on a single column")]
    CompositeKey { type_name: String },
}

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("Expression node {node} is not implemented in the {clause} clause")]
    UnsupportedNode { node: &'static str, clause: &'static str },

    #[error("Method {method} is not implemented")]
    UnsupportedMethod { method: String },
}

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Primary key of {table} is empty")]
    EmptyPrimaryKey { table: String },

    #[error("Entity of {table} is deleted and cannot change state")]
    EntityDeleted { table: String },

    #[error("Entity of {table} is already scheduled for deletion")]
    AlreadyScheduled { table: String },

    #[error("Entity of {table} is a snapshot and cannot be modified")]
    ImmutableSnapshot { table: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Join error: {0}")]
    Join(#[from] JoinError),

    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("No row of {table} found for {key}")]
    NotFound { table: String, key: String },

    #[error("Column {table}.{column} is not nullable but received NULL")]
    Nullability { table: String, column: String },

    #[error("Type conversion error: expected {expected}, got {actual}")]
    TypeConversion { expected: &'static str, actual: String },

    #[error("Unexpected null value for non-nullable field")]
    UnexpectedNull,

    #[error("Column not found: {table}.{column}")]
    ColumnNotFound { table: String, column: String },

    #[error("Invalid relation: {0}")]
    InvalidRelation(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
