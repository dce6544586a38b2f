use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Local, NaiveDate};
use tracing::{error, warn};

use crate::api::InventoryApi;
use crate::error::RemoteResult;
use crate::health::replace_by_id;
use crate::models::{
    InventoryCategory, InventoryItem, InventoryItemUpdate, InventorySummary, NewInventoryItem,
    days_since, days_until,
};

/// Items expiring within this many days (inclusive) count as expiring.
pub const EXPIRY_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Default)]
struct InventoryState {
    items: Vec<InventoryItem>,
    summary: InventorySummary,
    selected_category: Option<InventoryCategory>,
    loading: bool,
}

/// Household inventory plus the server's summary counts.
///
/// Every successful mutation is followed by a summary re-fetch; the summary is
/// never derived from the local items.
pub struct InventoryStore {
    api: Arc<dyn InventoryApi>,
    state: Mutex<InventoryState>,
}

impl InventoryStore {
    pub fn new(api: Arc<dyn InventoryApi>) -> Self {
        Self {
            api,
            state: Mutex::new(InventoryState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, InventoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn items(&self) -> Vec<InventoryItem> {
        self.state().items.clone()
    }

    pub fn summary(&self) -> InventorySummary {
        self.state().summary.clone()
    }

    pub fn selected_category(&self) -> Option<InventoryCategory> {
        self.state().selected_category
    }

    pub fn set_category(&self, category: Option<InventoryCategory>) {
        self.state().selected_category = category;
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    // --- Derived views ---

    pub fn filtered_items(&self) -> Vec<InventoryItem> {
        let state = self.state();
        match state.selected_category {
            Some(category) => state
                .items
                .iter()
                .filter(|i| i.category == category)
                .cloned()
                .collect(),
            None => state.items.clone(),
        }
    }

    pub fn items_needing_purchase(&self) -> Vec<InventoryItem> {
        self.select(|i| i.needs_to_buy)
    }

    pub fn expiring_items(&self) -> Vec<InventoryItem> {
        self.expiring_items_on(Local::now().date_naive())
    }

    /// Items whose expiry date lies in `[today, today + 7 days]`.
    pub fn expiring_items_on(&self, today: NaiveDate) -> Vec<InventoryItem> {
        self.select(|i| {
            i.expiry_date
                .is_some_and(|d| (0..=EXPIRY_WINDOW_DAYS).contains(&days_until(d, today)))
        })
    }

    pub fn items_needing_replacement(&self) -> Vec<InventoryItem> {
        self.items_needing_replacement_on(Local::now().date_naive())
    }

    /// Items whose replacement cycle has run out. Items missing either the
    /// last replacement date or the cycle are never due.
    pub fn items_needing_replacement_on(&self, today: NaiveDate) -> Vec<InventoryItem> {
        self.select(|i| match (i.last_replaced, i.replacement_cycle) {
            (Some(last), Some(cycle)) => days_since(last, today) >= i64::from(cycle),
            _ => false,
        })
    }

    fn select(&self, keep: impl Fn(&InventoryItem) -> bool) -> Vec<InventoryItem> {
        self.state().items.iter().filter(|i| keep(i)).cloned().collect()
    }

    // --- Fetches ---

    /// Replace the local items with the server's, optionally for one category.
    pub async fn fetch_items(&self, category: Option<InventoryCategory>) {
        self.state().loading = true;
        let result = self.api.get_items(category).await;

        let mut state = self.state();
        state.loading = false;
        match result {
            Ok(items) => state.items = items,
            Err(e) => warn!(
                category = category.map_or("all", InventoryCategory::as_str),
                error = %e,
                "failed to fetch inventory items"
            ),
        }
    }

    pub async fn fetch_summary(&self) {
        match self.api.get_summary().await {
            Ok(summary) => self.state().summary = summary,
            Err(e) => warn!(error = %e, "failed to fetch inventory summary"),
        }
    }

    // --- Mutations ---

    pub async fn add_item(&self, item: &NewInventoryItem) -> RemoteResult<InventoryItem> {
        let created = self.api.create_item(item).await.inspect_err(|e| {
            error!(name = %item.name, error = %e, "failed to add inventory item");
        })?;
        self.state().items.push(created.clone());
        self.fetch_summary().await;
        Ok(created)
    }

    pub async fn update_item(
        &self,
        id: &str,
        update: &InventoryItemUpdate,
    ) -> RemoteResult<InventoryItem> {
        let updated = self.api.update_item(id, update).await.inspect_err(|e| {
            error!(id, error = %e, "failed to update inventory item");
        })?;
        self.patch(id, &updated);
        self.fetch_summary().await;
        Ok(updated)
    }

    pub async fn delete_item(&self, id: &str) -> RemoteResult<()> {
        self.api.delete_item(id).await.inspect_err(|e| {
            error!(id, error = %e, "failed to delete inventory item");
        })?;
        self.state().items.retain(|i| i.id != id);
        self.fetch_summary().await;
        Ok(())
    }

    /// Record a restock of `quantity`; the server clears the buy flag.
    pub async fn mark_purchased(&self, id: &str, quantity: f64) -> RemoteResult<InventoryItem> {
        let updated = self.api.mark_purchased(id, quantity).await.inspect_err(|e| {
            error!(id, quantity, error = %e, "failed to mark item purchased");
        })?;
        self.patch(id, &updated);
        self.fetch_summary().await;
        Ok(updated)
    }

    /// Reset the replacement clock to today on the server.
    pub async fn mark_replaced(&self, id: &str) -> RemoteResult<InventoryItem> {
        let updated = self.api.mark_replaced(id).await.inspect_err(|e| {
            error!(id, error = %e, "failed to mark item replaced");
        })?;
        self.patch(id, &updated);
        self.fetch_summary().await;
        Ok(updated)
    }

    fn patch(&self, id: &str, updated: &InventoryItem) {
        replace_by_id(&mut self.state().items, id, updated, |i| i.id.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(id: &str, category: InventoryCategory) -> InventoryItem {
        InventoryItem {
            id: id.to_string(),
            name: format!("item {id}"),
            category,
            quantity: 1.0,
            unit: "pcs".to_string(),
            min_quantity: 1.0,
            expiry_date: None,
            last_replaced: None,
            replacement_cycle: None,
            location: None,
            notes: None,
            needs_to_buy: false,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[derive(Default)]
    struct MockInventory {
        items: Mutex<Vec<InventoryItem>>,
        summary: Mutex<InventorySummary>,
        fail_writes: AtomicBool,
        summary_calls: AtomicUsize,
    }

    impl MockInventory {
        fn with_items(items: Vec<InventoryItem>) -> Self {
            let mock = Self::default();
            *mock.items.lock().unwrap() = items;
            mock
        }

        fn check_write(&self) -> RemoteResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(RemoteError::Remote {
                    status: 500,
                    message: Some("database is locked".to_string()),
                });
            }
            Ok(())
        }

        fn find(&self, id: &str) -> RemoteResult<InventoryItem> {
            self.items
                .lock()
                .unwrap()
                .iter()
                .find(|i| i.id == id)
                .cloned()
                .ok_or(RemoteError::Remote {
                    status: 404,
                    message: Some("Item not found".to_string()),
                })
        }
    }

    #[async_trait]
    impl InventoryApi for MockInventory {
        async fn get_items(
            &self,
            category: Option<InventoryCategory>,
        ) -> RemoteResult<Vec<InventoryItem>> {
            let items = self.items.lock().unwrap();
            Ok(items
                .iter()
                .filter(|i| category.is_none_or(|c| i.category == c))
                .cloned()
                .collect())
        }

        async fn get_summary(&self) -> RemoteResult<InventorySummary> {
            self.summary_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.summary.lock().unwrap().clone())
        }

        async fn get_items_needing_purchase(&self) -> RemoteResult<Vec<InventoryItem>> {
            Ok(vec![])
        }

        async fn get_expiring_items(&self, _days: u32) -> RemoteResult<Vec<InventoryItem>> {
            Ok(vec![])
        }

        async fn get_items_needing_replacement(&self) -> RemoteResult<Vec<InventoryItem>> {
            Ok(vec![])
        }

        async fn create_item(&self, new: &NewInventoryItem) -> RemoteResult<InventoryItem> {
            self.check_write()?;
            let mut created = item(&uuid::Uuid::new_v4().to_string(), new.category);
            created.name.clone_from(&new.name);
            created.quantity = new.quantity;
            self.items.lock().unwrap().push(created.clone());
            self.summary.lock().unwrap().total_items += 1;
            Ok(created)
        }

        async fn update_item(
            &self,
            id: &str,
            update: &InventoryItemUpdate,
        ) -> RemoteResult<InventoryItem> {
            self.check_write()?;
            let mut found = self.find(id)?;
            if let Some(quantity) = update.quantity {
                found.quantity = quantity;
            }
            Ok(found)
        }

        async fn delete_item(&self, id: &str) -> RemoteResult<()> {
            self.check_write()?;
            self.items.lock().unwrap().retain(|i| i.id != id);
            Ok(())
        }

        async fn mark_purchased(&self, id: &str, quantity: f64) -> RemoteResult<InventoryItem> {
            self.check_write()?;
            let mut found = self.find(id)?;
            found.quantity += quantity;
            found.needs_to_buy = false;
            Ok(found)
        }

        async fn mark_replaced(&self, id: &str) -> RemoteResult<InventoryItem> {
            self.check_write()?;
            let mut found = self.find(id)?;
            found.last_replaced = Some(date(2024, 6, 15));
            Ok(found)
        }
    }

    fn store(mock: MockInventory) -> (InventoryStore, Arc<MockInventory>) {
        let mock = Arc::new(mock);
        (InventoryStore::new(mock.clone()), mock)
    }

    #[tokio::test]
    async fn test_fetch_items_is_idempotent() {
        let (store, _) = store(MockInventory::with_items(vec![
            item("a", InventoryCategory::Food),
            item("b", InventoryCategory::Household),
            item("c", InventoryCategory::Food),
        ]));

        store.fetch_items(Some(InventoryCategory::Food)).await;
        let first = store.items();
        store.fetch_items(Some(InventoryCategory::Food)).await;

        assert_eq!(first.len(), 2);
        assert_eq!(store.items(), first);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_filtered_items_follow_category() {
        let (store, _) = store(MockInventory::with_items(vec![
            item("a", InventoryCategory::Food),
            item("b", InventoryCategory::PetSupplies),
        ]));
        store.fetch_items(None).await;
        assert_eq!(store.filtered_items().len(), 2);

        store.set_category(Some(InventoryCategory::PetSupplies));
        let ids: Vec<_> = store.filtered_items().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["b"]);

        store.set_category(None);
        assert_eq!(store.filtered_items().len(), 2);
    }

    #[tokio::test]
    async fn test_expiry_window_bounds() {
        let today = date(2024, 6, 15);
        let with_expiry = |id: &str, offset: i64| {
            let mut i = item(id, InventoryCategory::Food);
            i.expiry_date = Some(today + chrono::Duration::days(offset));
            i
        };
        let (store, _) = store(MockInventory::with_items(vec![
            with_expiry("today", 0),
            with_expiry("week", 7),
            with_expiry("eight", 8),
            with_expiry("past", -1),
            item("none", InventoryCategory::Food),
        ]));
        store.fetch_items(None).await;

        let ids: Vec<_> = store
            .expiring_items_on(today)
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["today", "week"]);
    }

    #[tokio::test]
    async fn test_replacement_requires_both_fields() {
        let today = date(2024, 6, 15);
        let mut fresh_zero = item("zero", InventoryCategory::PersonalCare);
        fresh_zero.last_replaced = Some(today);
        fresh_zero.replacement_cycle = Some(0);

        let mut overdue = item("overdue", InventoryCategory::PersonalCare);
        overdue.last_replaced = Some(date(2024, 3, 1));
        overdue.replacement_cycle = Some(90);

        let mut not_yet = item("not-yet", InventoryCategory::PersonalCare);
        not_yet.last_replaced = Some(date(2024, 6, 1));
        not_yet.replacement_cycle = Some(30);

        let mut no_cycle = item("no-cycle", InventoryCategory::PersonalCare);
        no_cycle.last_replaced = Some(date(2020, 1, 1));

        let mut no_date = item("no-date", InventoryCategory::PersonalCare);
        no_date.replacement_cycle = Some(1);

        let (store, _) = store(MockInventory::with_items(vec![
            fresh_zero, overdue, not_yet, no_cycle, no_date,
        ]));
        store.fetch_items(None).await;

        let ids: Vec<_> = store
            .items_needing_replacement_on(today)
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["zero", "overdue"]);
    }

    #[tokio::test]
    async fn test_needs_purchase_uses_flag() {
        let mut low = item("low", InventoryCategory::Household);
        low.needs_to_buy = true;
        let (store, _) = store(MockInventory::with_items(vec![
            low,
            item("ok", InventoryCategory::Household),
        ]));
        store.fetch_items(None).await;

        let ids: Vec<_> = store
            .items_needing_purchase()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["low"]);
    }

    #[tokio::test]
    async fn test_add_item_refetches_summary() {
        let (store, mock) = store(MockInventory::default());
        let created = store
            .add_item(&NewInventoryItem {
                name: "Dish soap".to_string(),
                category: InventoryCategory::Household,
                quantity: 2.0,
                unit: "bottle".to_string(),
                min_quantity: 1.0,
                expiry_date: None,
                last_replaced: None,
                replacement_cycle: None,
                location: Some("kitchen".to_string()),
                notes: None,
            })
            .await
            .unwrap();

        assert_eq!(created.name, "Dish soap");
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.summary().total_items, 1);
        assert_eq!(mock.summary_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mark_replaced_patches_and_refetches() {
        let (store, mock) = store(MockInventory::with_items(vec![
            item("a", InventoryCategory::PersonalCare),
            item("b", InventoryCategory::PersonalCare),
        ]));
        store.fetch_items(None).await;

        let updated = store.mark_replaced("a").await.unwrap();
        assert_eq!(updated.last_replaced, Some(date(2024, 6, 15)));
        let items = store.items();
        assert_eq!(items[0].last_replaced, Some(date(2024, 6, 15)));
        assert_eq!(items[1].last_replaced, None);
        assert_eq!(mock.summary_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mark_replaced_failure_leaves_item() {
        let (store, mock) = store(MockInventory::with_items(vec![item(
            "a",
            InventoryCategory::PersonalCare,
        )]));
        store.fetch_items(None).await;
        mock.fail_writes.store(true, Ordering::SeqCst);

        let err = store.mark_replaced("a").await.unwrap_err();
        assert_eq!(err.message(), Some("database is locked"));
        assert_eq!(store.items()[0].last_replaced, None);
        assert_eq!(mock.summary_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_mark_purchased_returns_item() {
        let mut low = item("a", InventoryCategory::Food);
        low.needs_to_buy = true;
        let (store, _) = store(MockInventory::with_items(vec![low]));
        store.fetch_items(None).await;

        let updated = store.mark_purchased("a", 3.0).await.unwrap();
        assert!((updated.quantity - 4.0).abs() < f64::EPSILON);
        assert!(store.items_needing_purchase().is_empty());
    }

    #[tokio::test]
    async fn test_delete_respects_category_filter() {
        let (store, _) = store(MockInventory::with_items(vec![
            item("a", InventoryCategory::Food),
            item("b", InventoryCategory::Household),
            item("c", InventoryCategory::Food),
        ]));
        store.fetch_items(None).await;
        store.set_category(Some(InventoryCategory::Food));
        assert_eq!(store.filtered_items().len(), 2);

        store.delete_item("b").await.unwrap();
        assert_eq!(store.items().len(), 2);
        assert_eq!(store.filtered_items().len(), 2);

        store.delete_item("a").await.unwrap();
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.filtered_items().len(), 1);
    }

    #[tokio::test]
    async fn test_update_unknown_item_is_error() {
        let (store, _) = store(MockInventory::default());
        let update = InventoryItemUpdate {
            quantity: Some(5.0),
            ..InventoryItemUpdate::default()
        };
        let err = store.update_item("missing", &update).await.unwrap_err();
        assert_eq!(err.message(), Some("Item not found"));
        assert!(store.items().is_empty());
    }
}
