pub(crate) mod column;
pub(crate) mod from_entity;
pub(crate) mod table;

pub mod prelude {
    pub use super::column::ColumnTrait;
    pub use super::from_entity::FromEntity;
    pub use super::from_entity::read_reference;
    pub use super::from_entity::read_related;
    pub use super::from_entity::read_value;
    pub use super::table::Table;
    pub use super::table::TableExt;
}
