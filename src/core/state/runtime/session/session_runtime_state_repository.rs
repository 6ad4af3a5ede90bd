use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::state::runtime::session::session_runtime_state::SessionRuntimeState;
use crate::core::state::runtime::session::session_runtime_state_repository_trait::SessionRuntimeStateRepositoryTrait;

/// In-memory session store. Writers swap in a new `Arc`, so a request that
/// already holds the current snapshot never sees it change underneath it.
#[derive(Default)]
pub struct SessionRuntimeStateRepository {
    state: RwLock<Arc<SessionRuntimeState>>,
}

impl SessionRuntimeStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait::async_trait]
impl SessionRuntimeStateRepositoryTrait for SessionRuntimeStateRepository {
    async fn get(&self) -> Arc<SessionRuntimeState> {
        self.state.read().await.clone()
    }

    async fn update<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut SessionRuntimeState) -> T + Send,
        T: Send,
    {
        let mut guard = self.state.write().await;
        let mut next = (**guard).clone();
        let out = f(&mut next);
        *guard = Arc::new(next);
        out
    }
}
