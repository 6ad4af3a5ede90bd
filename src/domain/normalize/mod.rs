pub mod field_coercion;
pub mod normalized_table;
pub mod program_resolver;
pub mod raw_node;
pub mod result_normalizer;
