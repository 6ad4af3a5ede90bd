pub mod fetch;
pub mod metric;
pub mod normalize;
pub mod probe;
pub mod query;
pub mod system;
