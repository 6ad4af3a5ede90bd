pub mod query_request;
