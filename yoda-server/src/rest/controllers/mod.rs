pub mod documents;
pub mod index;
pub mod query;
