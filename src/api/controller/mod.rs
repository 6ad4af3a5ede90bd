pub mod probe;
pub mod query;
pub mod system;
