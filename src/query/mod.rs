//! Query construction: a stateful validated builder plus stateless filter
//! combination helpers.

mod builder;
pub mod filters;

pub use builder::QueryBuilder;
pub use filters::{combine, FilterBuilder, TagInput};
