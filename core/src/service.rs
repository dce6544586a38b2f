use std::sync::Arc;

use crate::api::{AuthApi, HealthApi, InventoryApi, RemindersApi};
use crate::credentials::CredentialStore;
use crate::health::HealthStore;
use crate::inventory::InventoryStore;
use crate::reminders::RemindersStore;
use crate::session::SessionStore;

/// The four state stores over one remote and one credential store.
///
/// The CLI builds this over its reqwest-backed remote and a file credential
/// store; tests build it over in-memory mocks. Stores share nothing with each
/// other apart from the remote, so they can be used independently.
pub struct OliverService {
    pub session: SessionStore,
    pub health: HealthStore,
    pub inventory: InventoryStore,
    pub reminders: RemindersStore,
}

impl OliverService {
    pub fn new<R>(remote: Arc<R>, credentials: Arc<dyn CredentialStore>) -> Self
    where
        R: AuthApi + HealthApi + InventoryApi + RemindersApi + 'static,
    {
        Self {
            session: SessionStore::new(remote.clone(), credentials),
            health: HealthStore::new(remote.clone()),
            inventory: InventoryStore::new(remote.clone()),
            reminders: RemindersStore::new(remote),
        }
    }

    /// Load everything a fresh session shows on its dashboard.
    ///
    /// Each fetch follows its store's read policy, so one failing resource
    /// does not stop the others.
    pub async fn bootstrap(&self) {
        self.session.fetch_current_user().await;
        if !self.session.is_authenticated() {
            return;
        }
        tokio::join!(
            self.health.fetch_targets(),
            self.health.fetch_today_data(),
            self.inventory.fetch_items(None),
            self.inventory.fetch_summary(),
            self.reminders.fetch_all_reminders(),
        );
    }
}
