use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use oliver_core::api::{AuthApi, HealthApi, InventoryApi, ReminderLists, RemindersApi};
use oliver_core::credentials::CredentialStore;
use oliver_core::error::{RemoteError, RemoteResult};
use oliver_core::models::{
    AuthResponse, HealthSummary, InventoryCategory, InventoryItem, InventoryItemUpdate,
    InventorySummary, LoginCredentials, MealRecord, MealUpdate, NewInventoryItem, NewMeal,
    NewWaterRecord, NewWeightRecord, NewWorkout, NutritionTarget, ProfileUpdate, Reminder,
    ReminderList, SyncResult, User, WaterRecord, WeightRecord, WorkoutRecord, WorkoutUpdate,
};

use crate::config::{CONNECT_TIMEOUT, REQUEST_TIMEOUT};

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// JSON-over-HTTP client for the oliver service.
///
/// Attaches the stored bearer token to every request. A 401 from any endpoint
/// wipes the credential store, so the next command starts signed out.
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl HttpRemote {
    pub fn new(base_url: &str, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "oliver-cli/{} (personal records)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        match self.credentials.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }

    /// Send and turn any non-success status into a [`RemoteError`].
    async fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let resp = request
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let url = resp.url().path().to_string();
        let message = resp
            .text()
            .await
            .ok()
            .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
            .and_then(|body| body.message);

        if status == StatusCode::UNAUTHORIZED {
            warn!(%url, "session rejected, clearing stored credentials");
            self.credentials.clear();
            return Err(RemoteError::Unauthorized { message });
        }

        debug!(%url, status = status.as_u16(), ?message, "request failed");
        Err(RemoteError::Remote {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        let resp = self.send(request).await?;
        resp.json()
            .await
            .map_err(|e| RemoteError::Transport(format!("invalid response body: {e}")))
    }

    /// For endpoints whose response body carries nothing.
    async fn execute(&self, request: RequestBuilder) -> RemoteResult<()> {
        self.send(request).await.map(|_| ())
    }
}

fn day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[async_trait]
impl AuthApi for HttpRemote {
    async fn login(&self, credentials: &LoginCredentials) -> RemoteResult<AuthResponse> {
        self.fetch(self.post("/auth/login").json(credentials)).await
    }

    async fn logout(&self) -> RemoteResult<()> {
        self.execute(self.post("/auth/logout")).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> RemoteResult<AuthResponse> {
        let body = serde_json::json!({ "refreshToken": refresh_token });
        self.fetch(self.post("/auth/refresh").json(&body)).await
    }

    async fn current_user(&self) -> RemoteResult<User> {
        self.fetch(self.get("/auth/me")).await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> RemoteResult<User> {
        self.fetch(self.put("/auth/profile").json(update)).await
    }
}

#[async_trait]
impl HealthApi for HttpRemote {
    async fn get_meals(&self, date: NaiveDate) -> RemoteResult<Vec<MealRecord>> {
        self.fetch(self.get("/health/meals").query(&[("date", day(date))])).await
    }

    async fn get_meals_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RemoteResult<Vec<MealRecord>> {
        let query = [("startDate", day(start)), ("endDate", day(end))];
        self.fetch(self.get("/health/meals").query(&query)).await
    }

    async fn create_meal(&self, meal: &NewMeal) -> RemoteResult<MealRecord> {
        self.fetch(self.post("/health/meals").json(meal)).await
    }

    async fn update_meal(&self, id: &str, update: &MealUpdate) -> RemoteResult<MealRecord> {
        self.fetch(self.put(&format!("/health/meals/{id}")).json(update)).await
    }

    async fn delete_meal(&self, id: &str) -> RemoteResult<()> {
        self.execute(self.delete(&format!("/health/meals/{id}"))).await
    }

    async fn get_water_records(&self, date: NaiveDate) -> RemoteResult<Vec<WaterRecord>> {
        self.fetch(self.get("/health/water").query(&[("date", day(date))])).await
    }

    async fn add_water_record(&self, record: &NewWaterRecord) -> RemoteResult<WaterRecord> {
        self.fetch(self.post("/health/water").json(record)).await
    }

    async fn delete_water_record(&self, id: &str) -> RemoteResult<()> {
        self.execute(self.delete(&format!("/health/water/{id}"))).await
    }

    async fn get_workouts(&self, date: NaiveDate) -> RemoteResult<Vec<WorkoutRecord>> {
        self.fetch(self.get("/health/workouts").query(&[("date", day(date))])).await
    }

    async fn get_workouts_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RemoteResult<Vec<WorkoutRecord>> {
        let query = [("startDate", day(start)), ("endDate", day(end))];
        self.fetch(self.get("/health/workouts").query(&query)).await
    }

    async fn create_workout(&self, workout: &NewWorkout) -> RemoteResult<WorkoutRecord> {
        self.fetch(self.post("/health/workouts").json(workout)).await
    }

    async fn update_workout(
        &self,
        id: &str,
        update: &WorkoutUpdate,
    ) -> RemoteResult<WorkoutRecord> {
        self.fetch(self.put(&format!("/health/workouts/{id}")).json(update)).await
    }

    async fn delete_workout(&self, id: &str) -> RemoteResult<()> {
        self.execute(self.delete(&format!("/health/workouts/{id}"))).await
    }

    async fn get_weight_records(&self, days: u32) -> RemoteResult<Vec<WeightRecord>> {
        self.fetch(self.get("/health/weight").query(&[("days", days)])).await
    }

    async fn add_weight_record(&self, record: &NewWeightRecord) -> RemoteResult<WeightRecord> {
        self.fetch(self.post("/health/weight").json(record)).await
    }

    async fn get_health_summary(&self, date: NaiveDate) -> RemoteResult<HealthSummary> {
        self.fetch(self.get("/health/summary").query(&[("date", day(date))])).await
    }

    async fn get_nutrition_targets(&self) -> RemoteResult<NutritionTarget> {
        self.fetch(self.get("/health/targets")).await
    }

    async fn update_nutrition_targets(
        &self,
        targets: &NutritionTarget,
    ) -> RemoteResult<NutritionTarget> {
        self.fetch(self.put("/health/targets").json(targets)).await
    }
}

#[async_trait]
impl InventoryApi for HttpRemote {
    async fn get_items(
        &self,
        category: Option<InventoryCategory>,
    ) -> RemoteResult<Vec<InventoryItem>> {
        let mut request = self.get("/inventory");
        if let Some(category) = category {
            request = request.query(&[("category", category.as_str())]);
        }
        self.fetch(request).await
    }

    async fn get_summary(&self) -> RemoteResult<InventorySummary> {
        self.fetch(self.get("/inventory/summary")).await
    }

    async fn get_items_needing_purchase(&self) -> RemoteResult<Vec<InventoryItem>> {
        self.fetch(self.get("/inventory/needs-purchase")).await
    }

    async fn get_expiring_items(&self, days: u32) -> RemoteResult<Vec<InventoryItem>> {
        self.fetch(self.get("/inventory/expiring").query(&[("days", days)])).await
    }

    async fn get_items_needing_replacement(&self) -> RemoteResult<Vec<InventoryItem>> {
        self.fetch(self.get("/inventory/needs-replacement")).await
    }

    async fn create_item(&self, item: &NewInventoryItem) -> RemoteResult<InventoryItem> {
        self.fetch(self.post("/inventory").json(item)).await
    }

    async fn update_item(
        &self,
        id: &str,
        update: &InventoryItemUpdate,
    ) -> RemoteResult<InventoryItem> {
        self.fetch(self.put(&format!("/inventory/{id}")).json(update)).await
    }

    async fn delete_item(&self, id: &str) -> RemoteResult<()> {
        self.execute(self.delete(&format!("/inventory/{id}"))).await
    }

    async fn mark_purchased(&self, id: &str, quantity: f64) -> RemoteResult<InventoryItem> {
        let body = serde_json::json!({ "quantity": quantity });
        self.fetch(self.post(&format!("/inventory/{id}/purchase")).json(&body)).await
    }

    async fn mark_replaced(&self, id: &str) -> RemoteResult<InventoryItem> {
        self.fetch(self.post(&format!("/inventory/{id}/replace"))).await
    }
}

#[async_trait]
impl RemindersApi for HttpRemote {
    async fn get_reminders(&self, list: Option<ReminderList>) -> RemoteResult<Vec<Reminder>> {
        let mut request = self.get("/reminders");
        if let Some(list) = list {
            request = request.query(&[("list", list.as_str())]);
        }
        self.fetch(request).await
    }

    async fn get_all_reminders(&self) -> RemoteResult<ReminderLists> {
        self.fetch(self.get("/reminders/all")).await
    }

    async fn get_reminder(&self, id: &str) -> RemoteResult<Reminder> {
        self.fetch(self.get(&format!("/reminders/{id}"))).await
    }

    async fn sync_reminders(&self) -> RemoteResult<SyncResult> {
        self.fetch(self.post("/reminders/sync")).await
    }
}
