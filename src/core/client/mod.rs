pub mod medux_client;
pub mod results_transport;
