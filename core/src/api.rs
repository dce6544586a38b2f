//! Contracts of the remote service, one trait per resource family.
//!
//! The HTTP implementation lives in the CLI crate; the stores only see these
//! traits, which keeps them testable against in-memory mocks. Every method is
//! one request. Implementations clear the credential store on an
//! authorization failure before returning [`RemoteError::Unauthorized`].
//!
//! [`RemoteError::Unauthorized`]: crate::error::RemoteError::Unauthorized

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::RemoteResult;
use crate::models::{
    AuthResponse, HealthSummary, InventoryCategory, InventoryItem, InventoryItemUpdate,
    InventorySummary, LoginCredentials, MealRecord, MealUpdate, NewInventoryItem, NewMeal,
    NewWaterRecord, NewWeightRecord, NewWorkout, NutritionTarget, ProfileUpdate, Reminder,
    ReminderList, SyncResult, User, WaterRecord, WeightRecord, WorkoutRecord, WorkoutUpdate,
};

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &LoginCredentials) -> RemoteResult<AuthResponse>;
    async fn logout(&self) -> RemoteResult<()>;
    async fn refresh_token(&self, refresh_token: &str) -> RemoteResult<AuthResponse>;
    async fn current_user(&self) -> RemoteResult<User>;
    async fn update_profile(&self, update: &ProfileUpdate) -> RemoteResult<User>;
}

#[async_trait]
pub trait HealthApi: Send + Sync {
    // ── Meals ──

    async fn get_meals(&self, date: NaiveDate) -> RemoteResult<Vec<MealRecord>>;
    async fn get_meals_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RemoteResult<Vec<MealRecord>>;
    async fn create_meal(&self, meal: &NewMeal) -> RemoteResult<MealRecord>;
    async fn update_meal(&self, id: &str, update: &MealUpdate) -> RemoteResult<MealRecord>;
    async fn delete_meal(&self, id: &str) -> RemoteResult<()>;

    // ── Water ──

    async fn get_water_records(&self, date: NaiveDate) -> RemoteResult<Vec<WaterRecord>>;
    async fn add_water_record(&self, record: &NewWaterRecord) -> RemoteResult<WaterRecord>;
    async fn delete_water_record(&self, id: &str) -> RemoteResult<()>;

    // ── Workouts ──

    async fn get_workouts(&self, date: NaiveDate) -> RemoteResult<Vec<WorkoutRecord>>;
    async fn get_workouts_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RemoteResult<Vec<WorkoutRecord>>;
    async fn create_workout(&self, workout: &NewWorkout) -> RemoteResult<WorkoutRecord>;
    async fn update_workout(&self, id: &str, update: &WorkoutUpdate)
    -> RemoteResult<WorkoutRecord>;
    async fn delete_workout(&self, id: &str) -> RemoteResult<()>;

    // ── Weight ──

    /// Records from the last `days` days.
    async fn get_weight_records(&self, days: u32) -> RemoteResult<Vec<WeightRecord>>;
    async fn add_weight_record(&self, record: &NewWeightRecord) -> RemoteResult<WeightRecord>;

    // ── Summary and targets ──

    async fn get_health_summary(&self, date: NaiveDate) -> RemoteResult<HealthSummary>;
    async fn get_nutrition_targets(&self) -> RemoteResult<NutritionTarget>;
    async fn update_nutrition_targets(
        &self,
        targets: &NutritionTarget,
    ) -> RemoteResult<NutritionTarget>;
}

#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// All items, or only those of `category`.
    async fn get_items(
        &self,
        category: Option<InventoryCategory>,
    ) -> RemoteResult<Vec<InventoryItem>>;
    async fn get_summary(&self) -> RemoteResult<InventorySummary>;
    async fn get_items_needing_purchase(&self) -> RemoteResult<Vec<InventoryItem>>;
    async fn get_expiring_items(&self, days: u32) -> RemoteResult<Vec<InventoryItem>>;
    async fn get_items_needing_replacement(&self) -> RemoteResult<Vec<InventoryItem>>;
    async fn create_item(&self, item: &NewInventoryItem) -> RemoteResult<InventoryItem>;
    async fn update_item(
        &self,
        id: &str,
        update: &InventoryItemUpdate,
    ) -> RemoteResult<InventoryItem>;
    async fn delete_item(&self, id: &str) -> RemoteResult<()>;
    async fn mark_purchased(&self, id: &str, quantity: f64) -> RemoteResult<InventoryItem>;
    async fn mark_replaced(&self, id: &str) -> RemoteResult<InventoryItem>;
}

/// Body of the combined reminders fetch.
pub type ReminderLists = BTreeMap<String, Option<Vec<Reminder>>>;

#[async_trait]
pub trait RemindersApi: Send + Sync {
    async fn get_reminders(&self, list: Option<ReminderList>) -> RemoteResult<Vec<Reminder>>;
    /// Every list keyed by its name. Keys may be missing or null.
    async fn get_all_reminders(&self) -> RemoteResult<ReminderLists>;
    async fn get_reminder(&self, id: &str) -> RemoteResult<Reminder>;
    async fn sync_reminders(&self) -> RemoteResult<SyncResult>;
}
