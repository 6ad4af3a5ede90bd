use std::sync::Arc;
use async_trait::async_trait;

use crate::core::state::runtime::session::session_runtime_state::SessionRuntimeState;

#[async_trait]
pub trait SessionRuntimeStateRepositoryTrait: Send + Sync {
    /// Return the current state as an Arc.
    async fn get(&self) -> Arc<SessionRuntimeState>;

    /// Mutate the state under the write lock and hand back the closure's result.
    async fn update<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut SessionRuntimeState) -> T + Send,
        T: Send;
}
