pub mod dto;
pub mod model;
pub mod query_builder;
pub mod service;
