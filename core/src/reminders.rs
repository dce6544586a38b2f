use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{error, warn};

use crate::api::RemindersApi;
use crate::error::RemoteResult;
use crate::models::{ListCounts, Reminder, ReminderList, SyncResult};

/// Number of entries in [`RemindersStore::upcoming_reminders`].
pub const UPCOMING_LIMIT: usize = 5;

#[derive(Debug, Default)]
struct RemindersState {
    inbox: Vec<Reminder>,
    next: Vec<Reminder>,
    waiting: Vec<Reminder>,
    someday: Vec<Reminder>,
    projects: Vec<Reminder>,
    loading: bool,
    last_synced: Option<DateTime<Utc>>,
}

impl RemindersState {
    fn list(&self, list: ReminderList) -> &Vec<Reminder> {
        match list {
            ReminderList::Inbox => &self.inbox,
            ReminderList::Next => &self.next,
            ReminderList::Waiting => &self.waiting,
            ReminderList::Someday => &self.someday,
            ReminderList::Projects => &self.projects,
        }
    }

    fn list_mut(&mut self, list: ReminderList) -> &mut Vec<Reminder> {
        match list {
            ReminderList::Inbox => &mut self.inbox,
            ReminderList::Next => &mut self.next,
            ReminderList::Waiting => &mut self.waiting,
            ReminderList::Someday => &mut self.someday,
            ReminderList::Projects => &mut self.projects,
        }
    }
}

/// Read-only mirror of the five GTD reminder lists.
pub struct RemindersStore {
    api: Arc<dyn RemindersApi>,
    state: Mutex<RemindersState>,
}

impl RemindersStore {
    pub fn new(api: Arc<dyn RemindersApi>) -> Self {
        Self {
            api,
            state: Mutex::new(RemindersState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, RemindersState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn last_synced(&self) -> Option<DateTime<Utc>> {
        self.state().last_synced
    }

    pub fn reminders_in(&self, list: ReminderList) -> Vec<Reminder> {
        self.state().list(list).clone()
    }

    /// Reminders of the list called `name`. Unknown names give an empty list.
    pub fn get_reminders_by_list(&self, name: &str) -> Vec<Reminder> {
        ReminderList::from_name(name)
            .map(|list| self.reminders_in(list))
            .unwrap_or_default()
    }

    /// Every list concatenated in inbox, next, waiting, someday, projects order.
    pub fn all_reminders(&self) -> Vec<Reminder> {
        let state = self.state();
        ReminderList::ALL
            .into_iter()
            .flat_map(|list| state.list(list).iter().cloned())
            .collect()
    }

    pub fn total_count(&self) -> usize {
        let state = self.state();
        ReminderList::ALL.into_iter().map(|l| state.list(l).len()).sum()
    }

    pub fn list_counts(&self) -> ListCounts {
        let state = self.state();
        ListCounts {
            inbox: state.inbox.len(),
            next: state.next.len(),
            waiting: state.waiting.len(),
            someday: state.someday.len(),
            projects: state.projects.len(),
        }
    }

    /// First few incomplete entries of the "next" list.
    pub fn upcoming_reminders(&self) -> Vec<Reminder> {
        self.state()
            .next
            .iter()
            .filter(|r| !r.completed)
            .take(UPCOMING_LIMIT)
            .cloned()
            .collect()
    }

    /// Replace every list from one combined fetch. Lists the server leaves
    /// out or sends as null become empty.
    pub async fn fetch_all_reminders(&self) {
        self.state().loading = true;
        let result = self.api.get_all_reminders().await;

        let mut state = self.state();
        state.loading = false;
        match result {
            Ok(mut lists) => {
                for list in ReminderList::ALL {
                    *state.list_mut(list) =
                        lists.remove(list.as_str()).flatten().unwrap_or_default();
                }
            }
            Err(e) => warn!(error = %e, "failed to fetch reminders"),
        }
    }

    /// Ask the server to pull from Apple Reminders, then reload every list.
    pub async fn sync_with_apple(&self) -> RemoteResult<SyncResult> {
        self.state().loading = true;
        let result = self.api.sync_reminders().await.inspect_err(|e| {
            self.state().loading = false;
            error!(error = %e, "failed to sync reminders");
        })?;
        self.state().last_synced = Some(result.last_synced);
        self.fetch_all_reminders().await;
        Ok(result)
    }
}
