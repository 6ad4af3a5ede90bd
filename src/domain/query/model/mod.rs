pub mod api_dialect;
pub mod operator_zone;
pub mod probe_ids;
pub mod query_spec;
pub mod query_window;
