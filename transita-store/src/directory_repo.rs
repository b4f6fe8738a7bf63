use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use transita_core::identity::UserAccount;
use transita_core::repository::{RouteDirectory, StoreError, UserDirectory};
use transita_core::route::BusRoute;

/// In-memory stand-in for the external user service. The pipeline only reads;
/// `insert` exists for wiring and tests.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, UserAccount>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: UserAccount) {
        self.users.write().await.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get_user(&self, id: &str) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }
}

/// In-memory stand-in for the external route catalog.
#[derive(Default)]
pub struct InMemoryRouteDirectory {
    routes: RwLock<HashMap<String, BusRoute>>,
}

impl InMemoryRouteDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, route: BusRoute) {
        self.routes.write().await.insert(route.id.clone(), route);
    }
}

#[async_trait]
impl RouteDirectory for InMemoryRouteDirectory {
    async fn get_route(&self, id: &str) -> Result<Option<BusRoute>, StoreError> {
        Ok(self.routes.read().await.get(id).cloned())
    }
}
