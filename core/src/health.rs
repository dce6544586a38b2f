use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Local, NaiveDate, Utc};
use tracing::{error, warn};

use crate::api::HealthApi;
use crate::error::RemoteResult;
use crate::models::{
    HealthSummary, MealRecord, MealUpdate, NewMeal, NewWaterRecord, NewWeightRecord, NewWorkout,
    NutritionProgress, NutritionTarget, Progress, WaterRecord, WeightRecord, WorkoutRecord,
    WorkoutUpdate,
};

pub const DEFAULT_WEIGHT_HISTORY_DAYS: u32 = 30;

#[derive(Debug)]
struct HealthState {
    meals: Vec<MealRecord>,
    water_records: Vec<WaterRecord>,
    workouts: Vec<WorkoutRecord>,
    weight_history: Vec<WeightRecord>,
    targets: NutritionTarget,
    selected_date: NaiveDate,
    loading: bool,
}

impl HealthState {
    fn new(selected_date: NaiveDate) -> Self {
        Self {
            meals: Vec::new(),
            water_records: Vec::new(),
            workouts: Vec::new(),
            weight_history: Vec::new(),
            targets: NutritionTarget::default(),
            selected_date,
            loading: false,
        }
    }

    fn day_meals(&self) -> impl Iterator<Item = &MealRecord> {
        let date = self.selected_date;
        self.meals.iter().filter(move |m| m.date == date)
    }

    fn day_total(&self, field: impl Fn(&MealRecord) -> f64) -> f64 {
        self.day_meals().map(field).sum()
    }

    fn day_water(&self) -> f64 {
        self.water_records
            .iter()
            .filter(|r| r.date == self.selected_date)
            .map(|r| r.amount)
            .sum()
    }
}

/// Meals, water, workouts and weight for the selected day.
///
/// Every `today_*` view is computed from the current collections and the
/// selected date on each call; nothing derived is cached.
pub struct HealthStore {
    api: Arc<dyn HealthApi>,
    state: Mutex<HealthState>,
}

impl HealthStore {
    /// Starts on the local calendar date.
    pub fn new(api: Arc<dyn HealthApi>) -> Self {
        Self::with_date(api, Local::now().date_naive())
    }

    pub fn with_date(api: Arc<dyn HealthApi>, selected_date: NaiveDate) -> Self {
        Self {
            api,
            state: Mutex::new(HealthState::new(selected_date)),
        }
    }

    fn state(&self) -> MutexGuard<'_, HealthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- Raw state ---

    pub fn meals(&self) -> Vec<MealRecord> {
        self.state().meals.clone()
    }

    pub fn water_records(&self) -> Vec<WaterRecord> {
        self.state().water_records.clone()
    }

    pub fn workouts(&self) -> Vec<WorkoutRecord> {
        self.state().workouts.clone()
    }

    pub fn weight_history(&self) -> Vec<WeightRecord> {
        self.state().weight_history.clone()
    }

    pub fn targets(&self) -> NutritionTarget {
        self.state().targets.clone()
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.state().selected_date
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    // --- Derived views ---

    pub fn today_meals(&self) -> Vec<MealRecord> {
        self.state().day_meals().cloned().collect()
    }

    pub fn today_calories(&self) -> f64 {
        self.state().day_total(|m| m.calories)
    }

    pub fn today_protein(&self) -> f64 {
        self.state().day_total(|m| m.protein)
    }

    pub fn today_carbs(&self) -> f64 {
        self.state().day_total(|m| m.carbs)
    }

    pub fn today_fat(&self) -> f64 {
        self.state().day_total(|m| m.fat)
    }

    pub fn today_water_intake(&self) -> f64 {
        self.state().day_water()
    }

    /// First workout recorded on the selected date.
    pub fn today_workout(&self) -> Option<WorkoutRecord> {
        let state = self.state();
        state
            .workouts
            .iter()
            .find(|w| w.date == state.selected_date)
            .cloned()
    }

    pub fn nutrition_progress(&self) -> NutritionProgress {
        let state = self.state();
        let targets = &state.targets;
        NutritionProgress {
            calories: Progress {
                current: state.day_total(|m| m.calories),
                target: targets.calories,
            },
            protein: Progress {
                current: state.day_total(|m| m.protein),
                target: targets.protein,
            },
            carbs: Progress {
                current: state.day_total(|m| m.carbs),
                target: targets.carbs,
            },
            fat: Progress {
                current: state.day_total(|m| m.fat),
                target: targets.fat,
            },
            water: Progress {
                current: state.day_water(),
                target: targets.water,
            },
        }
    }

    // --- Fetches: failures are logged and the previous state is kept ---

    /// Fetch meals, water and workouts for the selected date together.
    ///
    /// The three collections are replaced only if all three requests succeed,
    /// so they always come from the same fetch. Anything appended locally
    /// while the requests were in flight is overwritten.
    pub async fn fetch_today_data(&self) {
        let date = {
            let mut state = self.state();
            state.loading = true;
            state.selected_date
        };

        let (meals, water, workouts) = tokio::join!(
            self.api.get_meals(date),
            self.api.get_water_records(date),
            self.api.get_workouts(date),
        );

        let mut state = self.state();
        state.loading = false;
        match (meals, water, workouts) {
            (Ok(meals), Ok(water), Ok(workouts)) => {
                state.meals = meals;
                state.water_records = water;
                state.workouts = workouts;
            }
            (meals, water, workouts) => {
                let errors = [meals.err(), water.err(), workouts.err()];
                for e in errors.iter().flatten() {
                    warn!(%date, error = %e, "failed to fetch health data");
                }
            }
        }
    }

    pub async fn fetch_weight_history(&self, days: u32) {
        match self.api.get_weight_records(days).await {
            Ok(records) => self.state().weight_history = records,
            Err(e) => warn!(days, error = %e, "failed to fetch weight history"),
        }
    }

    pub async fn fetch_targets(&self) {
        match self.api.get_nutrition_targets().await {
            Ok(targets) => self.state().targets = targets,
            Err(e) => warn!(error = %e, "failed to fetch nutrition targets"),
        }
    }

    /// Server-side rollup; not cached locally.
    pub async fn fetch_health_summary(&self, date: NaiveDate) -> Option<HealthSummary> {
        match self.api.get_health_summary(date).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(%date, error = %e, "failed to fetch health summary");
                None
            }
        }
    }

    /// Move the cursor, then reload the day it points at.
    pub async fn set_selected_date(&self, date: NaiveDate) {
        self.state().selected_date = date;
        self.fetch_today_data().await;
    }

    // --- Mutations: failures are logged and returned, state is untouched ---

    pub async fn add_meal(&self, meal: &NewMeal) -> RemoteResult<MealRecord> {
        let created = self.api.create_meal(meal).await.inspect_err(|e| {
            error!(date = %meal.date, error = %e, "failed to add meal");
        })?;
        self.state().meals.push(created.clone());
        Ok(created)
    }

    pub async fn update_meal(&self, id: &str, update: &MealUpdate) -> RemoteResult<MealRecord> {
        let updated = self.api.update_meal(id, update).await.inspect_err(|e| {
            error!(id, error = %e, "failed to update meal");
        })?;
        replace_by_id(&mut self.state().meals, id, &updated, |m| m.id.as_str());
        Ok(updated)
    }

    pub async fn delete_meal(&self, id: &str) -> RemoteResult<()> {
        self.api.delete_meal(id).await.inspect_err(|e| {
            error!(id, error = %e, "failed to delete meal");
        })?;
        self.state().meals.retain(|m| m.id != id);
        Ok(())
    }

    /// Log `amount` ml against the selected date, stamped with the current time.
    pub async fn add_water(&self, amount: f64) -> RemoteResult<WaterRecord> {
        let record = NewWaterRecord {
            date: self.selected_date(),
            time: Utc::now().to_rfc3339(),
            amount,
        };
        let created = self.api.add_water_record(&record).await.inspect_err(|e| {
            error!(amount, error = %e, "failed to add water record");
        })?;
        self.state().water_records.push(created.clone());
        Ok(created)
    }

    pub async fn delete_water(&self, id: &str) -> RemoteResult<()> {
        self.api.delete_water_record(id).await.inspect_err(|e| {
            error!(id, error = %e, "failed to delete water record");
        })?;
        self.state().water_records.retain(|r| r.id != id);
        Ok(())
    }

    pub async fn add_workout(&self, workout: &NewWorkout) -> RemoteResult<WorkoutRecord> {
        let created = self.api.create_workout(workout).await.inspect_err(|e| {
            error!(date = %workout.date, error = %e, "failed to add workout");
        })?;
        self.state().workouts.push(created.clone());
        Ok(created)
    }

    pub async fn update_workout(
        &self,
        id: &str,
        update: &WorkoutUpdate,
    ) -> RemoteResult<WorkoutRecord> {
        let updated = self.api.update_workout(id, update).await.inspect_err(|e| {
            error!(id, error = %e, "failed to update workout");
        })?;
        replace_by_id(&mut self.state().workouts, id, &updated, |w| w.id.as_str());
        Ok(updated)
    }

    pub async fn delete_workout(&self, id: &str) -> RemoteResult<()> {
        self.api.delete_workout(id).await.inspect_err(|e| {
            error!(id, error = %e, "failed to delete workout");
        })?;
        self.state().workouts.retain(|w| w.id != id);
        Ok(())
    }

    pub async fn add_weight(&self, record: &NewWeightRecord) -> RemoteResult<WeightRecord> {
        let created = self.api.add_weight_record(record).await.inspect_err(|e| {
            error!(date = %record.date, error = %e, "failed to add weight record");
        })?;
        self.state().weight_history.push(created.clone());
        Ok(created)
    }

    pub async fn update_targets(&self, targets: &NutritionTarget) -> RemoteResult<NutritionTarget> {
        let saved = self
            .api
            .update_nutrition_targets(targets)
            .await
            .inspect_err(|e| {
                error!(error = %e, "failed to update nutrition targets");
            })?;
        self.state().targets = saved.clone();
        Ok(saved)
    }
}

/// Swap the entry whose id matches; a missing id leaves the list alone.
pub(crate) fn replace_by_id<T: Clone>(
    items: &mut [T],
    id: &str,
    replacement: &T,
    id_of: impl Fn(&T) -> &str,
) {
    if let Some(slot) = items.iter_mut().find(|item| id_of(item) == id) {
        *slot = replacement.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::models::{MealType, WorkoutType};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn meal(id: &str, day: NaiveDate, calories: f64) -> MealRecord {
        MealRecord {
            id: id.to_string(),
            date: day,
            meal_type: MealType::Lunch,
            time: "12:00".to_string(),
            foods: vec![],
            calories,
            protein: calories / 20.0,
            carbs: calories / 10.0,
            fat: calories / 40.0,
            notes: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn water(id: &str, day: NaiveDate, amount: f64) -> WaterRecord {
        WaterRecord {
            id: id.to_string(),
            date: day,
            time: "09:00".to_string(),
            amount,
            created_at: String::new(),
        }
    }

    fn workout(id: &str, day: NaiveDate) -> WorkoutRecord {
        WorkoutRecord {
            id: id.to_string(),
            date: day,
            workout_type: WorkoutType::Cardio,
            duration: 30,
            exercises: vec![],
            calories_burned: 250.0,
            notes: None,
            completed: true,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn new_meal(day: NaiveDate, calories: f64, notes: Option<&str>) -> NewMeal {
        NewMeal {
            date: day,
            meal_type: MealType::Dinner,
            time: "19:00".to_string(),
            foods: vec![],
            calories,
            protein: 30.0,
            carbs: 50.0,
            fat: 20.0,
            notes: notes.map(str::to_string),
        }
    }

    fn failure() -> RemoteError {
        RemoteError::Remote {
            status: 503,
            message: Some("maintenance".to_string()),
        }
    }

    /// Server stand-in. Lists are returned as-is, without filtering by date,
    /// so tests can check that the views do their own filtering.
    #[derive(Default)]
    struct MockHealth {
        meals: Mutex<Vec<MealRecord>>,
        water: Mutex<Vec<WaterRecord>>,
        workouts: Mutex<Vec<WorkoutRecord>>,
        weights: Mutex<Vec<WeightRecord>>,
        targets: Mutex<Option<NutritionTarget>>,
        fail_water_fetch: AtomicBool,
        fail_writes: AtomicBool,
        fail_targets: AtomicBool,
        /// `get_meals` waits on this when set.
        meals_gate: Option<Notify>,
        /// `create_meal` waits on this for meals whose notes say "slow".
        create_gate: Option<Notify>,
    }

    impl MockHealth {
        fn check_write(&self) -> RemoteResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(failure());
            }
            Ok(())
        }

        fn next_id() -> String {
            uuid::Uuid::new_v4().to_string()
        }
    }

    #[async_trait]
    impl HealthApi for MockHealth {
        async fn get_meals(&self, _date: NaiveDate) -> RemoteResult<Vec<MealRecord>> {
            let snapshot = self.meals.lock().unwrap().clone();
            if let Some(gate) = &self.meals_gate {
                gate.notified().await;
            }
            Ok(snapshot)
        }

        async fn get_meals_in_range(
            &self,
            start: NaiveDate,
            end: NaiveDate,
        ) -> RemoteResult<Vec<MealRecord>> {
            let meals = self.meals.lock().unwrap();
            Ok(meals
                .iter()
                .filter(|m| m.date >= start && m.date <= end)
                .cloned()
                .collect())
        }

        async fn create_meal(&self, input: &NewMeal) -> RemoteResult<MealRecord> {
            self.check_write()?;
            if input.notes.as_deref() == Some("slow") {
                if let Some(gate) = &self.create_gate {
                    gate.notified().await;
                }
            }
            let mut record = meal(&Self::next_id(), input.date, input.calories);
            record.notes.clone_from(&input.notes);
            Ok(record)
        }

        async fn update_meal(&self, id: &str, update: &MealUpdate) -> RemoteResult<MealRecord> {
            self.check_write()?;
            let meals = self.meals.lock().unwrap();
            let mut record = meals
                .iter()
                .find(|m| m.id == id)
                .cloned()
                .ok_or(RemoteError::Remote {
                    status: 404,
                    message: None,
                })?;
            if let Some(calories) = update.calories {
                record.calories = calories;
            }
            Ok(record)
        }

        async fn delete_meal(&self, _id: &str) -> RemoteResult<()> {
            self.check_write()
        }

        async fn get_water_records(&self, _date: NaiveDate) -> RemoteResult<Vec<WaterRecord>> {
            if self.fail_water_fetch.load(Ordering::SeqCst) {
                return Err(RemoteError::Transport("timed out".to_string()));
            }
            Ok(self.water.lock().unwrap().clone())
        }

        async fn add_water_record(&self, record: &NewWaterRecord) -> RemoteResult<WaterRecord> {
            self.check_write()?;
            Ok(water(&Self::next_id(), record.date, record.amount))
        }

        async fn delete_water_record(&self, _id: &str) -> RemoteResult<()> {
            self.check_write()
        }

        async fn get_workouts(&self, _date: NaiveDate) -> RemoteResult<Vec<WorkoutRecord>> {
            Ok(self.workouts.lock().unwrap().clone())
        }

        async fn get_workouts_in_range(
            &self,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> RemoteResult<Vec<WorkoutRecord>> {
            Ok(self.workouts.lock().unwrap().clone())
        }

        async fn create_workout(&self, w: &NewWorkout) -> RemoteResult<WorkoutRecord> {
            self.check_write()?;
            let mut record = workout(&Self::next_id(), w.date);
            record.workout_type = w.workout_type;
            record.duration = w.duration;
            Ok(record)
        }

        async fn update_workout(
            &self,
            id: &str,
            update: &WorkoutUpdate,
        ) -> RemoteResult<WorkoutRecord> {
            self.check_write()?;
            let mut record = workout(id, date(2024, 6, 15));
            if let Some(completed) = update.completed {
                record.completed = completed;
            }
            Ok(record)
        }

        async fn delete_workout(&self, _id: &str) -> RemoteResult<()> {
            self.check_write()
        }

        async fn get_weight_records(&self, _days: u32) -> RemoteResult<Vec<WeightRecord>> {
            Ok(self.weights.lock().unwrap().clone())
        }

        async fn add_weight_record(&self, record: &NewWeightRecord) -> RemoteResult<WeightRecord> {
            self.check_write()?;
            Ok(WeightRecord {
                id: Self::next_id(),
                date: record.date,
                weight: record.weight,
                body_fat: record.body_fat,
                created_at: String::new(),
            })
        }

        async fn get_health_summary(&self, _date: NaiveDate) -> RemoteResult<HealthSummary> {
            Err(failure())
        }

        async fn get_nutrition_targets(&self) -> RemoteResult<NutritionTarget> {
            if self.fail_targets.load(Ordering::SeqCst) {
                return Err(failure());
            }
            Ok(self.targets.lock().unwrap().clone().unwrap_or_default())
        }

        async fn update_nutrition_targets(
            &self,
            targets: &NutritionTarget,
        ) -> RemoteResult<NutritionTarget> {
            self.check_write()?;
            *self.targets.lock().unwrap() = Some(targets.clone());
            Ok(targets.clone())
        }
    }

    fn store_with(mock: MockHealth, day: NaiveDate) -> (HealthStore, Arc<MockHealth>) {
        let mock = Arc::new(mock);
        (HealthStore::with_date(mock.clone(), day), mock)
    }

    #[tokio::test]
    async fn test_fetch_today_data_views_filter_by_selected_date() {
        let d = date(2024, 6, 15);
        let other = date(2024, 6, 14);
        let mock = MockHealth::default();
        *mock.meals.lock().unwrap() = vec![
            meal("a", d, 400.0),
            meal("b", other, 900.0),
            meal("c", d, 600.0),
        ];
        *mock.water.lock().unwrap() = vec![water("w1", d, 250.0), water("w2", other, 1000.0)];
        *mock.workouts.lock().unwrap() =
            vec![workout("x", other), workout("y", d), workout("z", d)];
        let (store, _) = store_with(mock, d);

        store.fetch_today_data().await;

        assert_eq!(store.meals().len(), 3);
        let ids: Vec<_> = store.today_meals().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!((store.today_calories() - 1000.0).abs() < f64::EPSILON);
        assert!((store.today_protein() - 50.0).abs() < f64::EPSILON);
        assert!((store.today_carbs() - 100.0).abs() < f64::EPSILON);
        assert!((store.today_fat() - 25.0).abs() < f64::EPSILON);
        assert!((store.today_water_intake() - 250.0).abs() < f64::EPSILON);
        assert_eq!(store.today_workout().unwrap().id, "y");
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_empty_day_views() {
        let (store, _) = store_with(MockHealth::default(), date(2024, 6, 15));
        store.fetch_today_data().await;
        assert!(store.today_meals().is_empty());
        assert!(store.today_calories().abs() < f64::EPSILON);
        assert!(store.today_workout().is_none());
    }

    #[tokio::test]
    async fn test_fetch_today_data_is_all_or_nothing() {
        let d = date(2024, 6, 15);
        let (store, mock) = store_with(MockHealth::default(), d);
        *mock.meals.lock().unwrap() = vec![meal("a", d, 400.0)];
        store.fetch_today_data().await;
        assert_eq!(store.meals().len(), 1);

        // Meals would succeed with new data, but water fails: nothing applies.
        *mock.meals.lock().unwrap() = vec![meal("b", d, 100.0), meal("c", d, 200.0)];
        mock.fail_water_fetch.store(true, Ordering::SeqCst);
        store.fetch_today_data().await;

        let ids: Vec<_> = store.meals().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["a"]);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_fetch_replaces_instead_of_merging() {
        let d = date(2024, 6, 15);
        let (store, mock) = store_with(MockHealth::default(), d);
        *mock.meals.lock().unwrap() = vec![meal("a", d, 400.0), meal("b", d, 100.0)];
        store.fetch_today_data().await;

        *mock.meals.lock().unwrap() = vec![meal("b", d, 100.0)];
        store.fetch_today_data().await;
        store.fetch_today_data().await;

        let ids: Vec<_> = store.meals().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[tokio::test]
    async fn test_add_meal_updates_calories_and_progress() {
        let d = date(2024, 6, 15);
        let mock = MockHealth::default();
        *mock.targets.lock().unwrap() = Some(NutritionTarget {
            calories: 2000.0,
            ..NutritionTarget::default()
        });
        *mock.meals.lock().unwrap() = vec![meal("a", d, 300.0)];
        let (store, _) = store_with(mock, d);
        store.fetch_targets().await;
        store.fetch_today_data().await;
        let before = store.today_calories();

        let created = store.add_meal(&new_meal(d, 500.0, None)).await.unwrap();

        assert!(!created.id.is_empty());
        assert!((store.today_calories() - before - 500.0).abs() < f64::EPSILON);
        let progress = store.nutrition_progress();
        assert!((progress.calories.current - 800.0).abs() < f64::EPSILON);
        assert!((progress.calories.target - 2000.0).abs() < f64::EPSILON);
        assert_eq!(progress.calories.percent(), 40);
    }

    #[tokio::test]
    async fn test_add_meal_for_other_day_does_not_touch_today() {
        let d = date(2024, 6, 15);
        let (store, _) = store_with(MockHealth::default(), d);
        store.add_meal(&new_meal(date(2024, 6, 16), 500.0, None)).await.unwrap();
        assert_eq!(store.meals().len(), 1);
        assert!(store.today_calories().abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_add_meal_failure_is_returned_and_state_untouched() {
        let d = date(2024, 6, 15);
        let (store, mock) = store_with(MockHealth::default(), d);
        mock.fail_writes.store(true, Ordering::SeqCst);

        let err = store.add_meal(&new_meal(d, 500.0, None)).await.unwrap_err();
        assert_eq!(err.message(), Some("maintenance"));
        assert!(store.meals().is_empty());
    }

    #[tokio::test]
    async fn test_add_water_sums_records() {
        let d = date(2024, 6, 15);
        let (store, _) = store_with(MockHealth::default(), d);
        store.fetch_today_data().await;

        let first = store.add_water(500.0).await.unwrap();
        assert_eq!(first.date, d);
        assert!((store.today_water_intake() - 500.0).abs() < f64::EPSILON);

        store.add_water(300.0).await.unwrap();
        assert!((store.today_water_intake() - 800.0).abs() < f64::EPSILON);
        assert!((store.nutrition_progress().water.current - 800.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_default_targets_survive_failed_fetch() {
        let mock = MockHealth::default();
        mock.fail_targets.store(true, Ordering::SeqCst);
        let (store, _) = store_with(mock, date(2024, 6, 15));

        store.fetch_targets().await;
        assert_eq!(store.targets(), NutritionTarget::default());
    }

    #[tokio::test]
    async fn test_set_selected_date_refetches() {
        let d1 = date(2024, 6, 15);
        let d2 = date(2024, 6, 16);
        let (store, mock) = store_with(MockHealth::default(), d1);
        *mock.meals.lock().unwrap() = vec![meal("a", d1, 400.0), meal("b", d2, 700.0)];

        store.set_selected_date(d2).await;

        assert_eq!(store.selected_date(), d2);
        assert_eq!(store.meals().len(), 2);
        assert!((store.today_calories() - 700.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_fetch_weight_history_replaces() {
        let (store, mock) = store_with(MockHealth::default(), date(2024, 6, 15));
        store
            .add_weight(&NewWeightRecord {
                date: date(2024, 6, 15),
                weight: 80.0,
                body_fat: None,
            })
            .await
            .unwrap();
        assert_eq!(store.weight_history().len(), 1);

        mock.weights.lock().unwrap().clear();
        store.fetch_weight_history(DEFAULT_WEIGHT_HISTORY_DAYS).await;
        assert!(store.weight_history().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_meal_patch_by_id() {
        let d = date(2024, 6, 15);
        let (store, mock) = store_with(MockHealth::default(), d);
        *mock.meals.lock().unwrap() = vec![meal("a", d, 400.0), meal("b", d, 100.0)];
        store.fetch_today_data().await;

        let update = MealUpdate {
            calories: Some(450.0),
            ..MealUpdate::default()
        };
        store.update_meal("a", &update).await.unwrap();
        assert!((store.today_calories() - 550.0).abs() < f64::EPSILON);

        store.delete_meal("b").await.unwrap();
        let ids: Vec<_> = store.meals().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_record() {
        let d = date(2024, 6, 15);
        let (store, mock) = store_with(MockHealth::default(), d);
        *mock.water.lock().unwrap() = vec![water("w1", d, 250.0)];
        store.fetch_today_data().await;

        mock.fail_writes.store(true, Ordering::SeqCst);
        assert!(store.delete_water("w1").await.is_err());
        assert_eq!(store.water_records().len(), 1);
    }

    #[tokio::test]
    async fn test_workout_actions() {
        let d = date(2024, 6, 15);
        let (store, _) = store_with(MockHealth::default(), d);
        let created = store
            .add_workout(&NewWorkout {
                date: d,
                workout_type: WorkoutType::LegsCore,
                duration: 45,
                exercises: vec![],
                calories_burned: 300.0,
                notes: None,
                completed: false,
            })
            .await
            .unwrap();
        assert_eq!(store.today_workout().unwrap().workout_type, WorkoutType::LegsCore);

        store.delete_workout(&created.id).await.unwrap();
        assert!(store.today_workout().is_none());
    }

    #[tokio::test]
    async fn test_update_targets_replaces_local() {
        let (store, _) = store_with(MockHealth::default(), date(2024, 6, 15));
        let targets = NutritionTarget {
            calories: 1800.0,
            protein: 140.0,
            carbs: 150.0,
            fat: 55.0,
            water: 3000.0,
        };
        store.update_targets(&targets).await.unwrap();
        assert_eq!(store.targets(), targets);
        assert!((store.nutrition_progress().water.target - 3000.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_health_summary_failure_is_none() {
        let (store, _) = store_with(MockHealth::default(), date(2024, 6, 15));
        assert!(store.fetch_health_summary(date(2024, 6, 15)).await.is_none());
    }

    #[tokio::test]
    async fn test_add_during_batch_fetch_is_overwritten() {
        let d = date(2024, 6, 15);
        let (store, mock) = store_with(
            MockHealth {
                meals_gate: Some(Notify::new()),
                ..MockHealth::default()
            },
            d,
        );

        tokio::join!(store.fetch_today_data(), async {
            store.add_meal(&new_meal(d, 500.0, None)).await.unwrap();
            assert_eq!(store.meals().len(), 1);
            mock.meals_gate.as_ref().unwrap().notify_one();
        });

        // The batch resolved after the add and replaced the collection.
        assert!(store.meals().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_adds_append_in_resolution_order() {
        let d = date(2024, 6, 15);
        let (store, mock) = store_with(
            MockHealth {
                create_gate: Some(Notify::new()),
                ..MockHealth::default()
            },
            d,
        );

        let slow_meal = new_meal(d, 100.0, Some("slow"));
        let fast_meal = new_meal(d, 200.0, None);
        let (slow, fast) = tokio::join!(store.add_meal(&slow_meal), async {
            let created = store.add_meal(&fast_meal).await;
            mock.create_gate.as_ref().unwrap().notify_one();
            created
        });

        let ids: Vec<_> = store.meals().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![fast.unwrap().id, slow.unwrap().id]);
    }
}
