pub mod probe_records;
pub mod probe_status;
