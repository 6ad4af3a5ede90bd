pub mod session_runtime_state;
pub mod session_runtime_state_manager;
pub mod session_runtime_state_repository;
pub mod session_runtime_state_repository_trait;
