use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// --- Auth ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

// --- Meals ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [Self; 4] = [Self::Breakfast, Self::Lunch, Self::Dinner, Self::Snack];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_lowercase();
        match Self::ALL.into_iter().find(|m| m.as_str() == lower) {
            Some(m) => Ok(m),
            None => bail!(
                "Invalid meal type '{s}'. Must be one of: {}",
                join_names(Self::ALL.iter().map(|m| m.as_str()))
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealRecord {
    pub id: String,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub time: String,
    #[serde(default)]
    pub foods: Vec<FoodItem>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// A meal as submitted for creation; the service assigns id and timestamps.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMeal {
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub time: String,
    pub foods: Vec<FoodItem>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<MealType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// --- Water ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterRecord {
    pub id: String,
    pub date: NaiveDate,
    pub time: String,
    /// Millilitres.
    pub amount: f64,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewWaterRecord {
    pub date: NaiveDate,
    pub time: String,
    pub amount: f64,
}

// --- Workouts ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    BackShoulder,
    ChestShoulder,
    LegsCore,
    Cardio,
    Rest,
}

impl WorkoutType {
    pub const ALL: [Self; 5] = [
        Self::BackShoulder,
        Self::ChestShoulder,
        Self::LegsCore,
        Self::Cardio,
        Self::Rest,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BackShoulder => "back_shoulder",
            Self::ChestShoulder => "chest_shoulder",
            Self::LegsCore => "legs_core",
            Self::Cardio => "cardio",
            Self::Rest => "rest",
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.to_lowercase().replace('-', "_");
        match Self::ALL.into_iter().find(|w| w.as_str() == normalized) {
            Some(w) => Ok(w),
            None => bail!(
                "Invalid workout type '{s}'. Must be one of: {}",
                join_names(Self::ALL.iter().map(|w| w.as_str()))
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSet {
    pub reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sets: Vec<ExerciseSet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    /// Minutes.
    pub duration: u32,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    pub calories_burned: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub completed: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkout {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    pub duration: u32,
    pub exercises: Vec<Exercise>,
    pub calories_burned: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutUpdate {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub workout_type: Option<WorkoutType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories_burned: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// --- Weight ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightRecord {
    pub id: String,
    pub date: NaiveDate,
    /// Kilograms.
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_fat: Option<f64>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWeightRecord {
    pub date: NaiveDate,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_fat: Option<f64>,
}

// --- Targets and progress ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionTarget {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    /// Millilitres.
    pub water: f64,
}

impl Default for NutritionTarget {
    fn default() -> Self {
        Self {
            calories: 2000.0,
            protein: 150.0,
            carbs: 200.0,
            fat: 60.0,
            water: 2500.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub current: f64,
    pub target: f64,
}

impl Progress {
    /// Whole-number percentage of the target reached, capped at 100.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn percent(&self) -> u8 {
        if self.target == 0.0 {
            return 0;
        }
        let pct = (self.current / self.target * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }

    #[must_use]
    pub fn remaining(&self) -> f64 {
        self.target - self.current
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionProgress {
    pub calories: Progress,
    pub protein: Progress,
    pub carbs: Progress,
    pub fat: Progress,
    pub water: Progress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumedTarget {
    pub consumed: f64,
    pub target: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutStatus {
    pub completed: bool,
    pub duration: u32,
}

/// Server-side rollup of one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub date: NaiveDate,
    pub calories: ConsumedTarget,
    pub protein: ConsumedTarget,
    pub carbs: ConsumedTarget,
    pub fat: ConsumedTarget,
    pub water: ConsumedTarget,
    pub workout: WorkoutStatus,
}

// --- Inventory ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryCategory {
    Food,
    PetSupplies,
    Household,
    PersonalCare,
    Electronics,
    Other,
}

impl InventoryCategory {
    pub const ALL: [Self; 6] = [
        Self::Food,
        Self::PetSupplies,
        Self::Household,
        Self::PersonalCare,
        Self::Electronics,
        Self::Other,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::PetSupplies => "pet_supplies",
            Self::Household => "household",
            Self::PersonalCare => "personal_care",
            Self::Electronics => "electronics",
            Self::Other => "other",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::PetSupplies => "Pet supplies",
            Self::Household => "Household",
            Self::PersonalCare => "Personal care",
            Self::Electronics => "Electronics",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for InventoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InventoryCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.to_lowercase().replace('-', "_");
        match Self::ALL.into_iter().find(|c| c.as_str() == normalized) {
            Some(c) => Ok(c),
            None => bail!(
                "Invalid category '{s}'. Must be one of: {}",
                join_names(Self::ALL.iter().map(|c| c.as_str()))
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub category: InventoryCategory,
    pub quantity: f64,
    pub unit: String,
    pub min_quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_replaced: Option<NaiveDate>,
    /// Days between replacements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_cycle: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Computed by the service.
    #[serde(default)]
    pub needs_to_buy: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    pub name: String,
    pub category: InventoryCategory,
    pub quantity: f64,
    pub unit: String,
    pub min_quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_replaced: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement_cycle: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update. `Some(None)` on a nullable field clears it on the service.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::option_option)]
pub struct InventoryItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<InventoryCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement_cycle: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl InventoryItemUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.quantity.is_none()
            && self.unit.is_none()
            && self.min_quantity.is_none()
            && self.expiry_date.is_none()
            && self.replacement_cycle.is_none()
            && self.location.is_none()
            && self.notes.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub total_items: u32,
    pub needs_to_buy: u32,
    pub expiring_soon: u32,
    pub needs_replacement: u32,
}

// --- Reminders ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderPriority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl ReminderPriority {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ReminderPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderList {
    Inbox,
    Next,
    Waiting,
    Someday,
    Projects,
}

impl ReminderList {
    /// Fixed display and concatenation order.
    pub const ALL: [Self; 5] = [
        Self::Inbox,
        Self::Next,
        Self::Waiting,
        Self::Someday,
        Self::Projects,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Next => "next",
            Self::Waiting => "waiting",
            Self::Someday => "someday",
            Self::Projects => "projects",
        }
    }

    /// Exact-name lookup. Anything other than the five list names is `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == name)
    }
}

impl fmt::Display for ReminderList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderList {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match Self::from_name(&s.to_lowercase()) {
            Some(l) => Ok(l),
            None => bail!(
                "Invalid reminder list '{s}'. Must be one of: {}",
                join_names(Self::ALL.iter().map(|l| l.as_str()))
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: ReminderPriority,
    #[serde(default)]
    pub completed: bool,
    pub list: ReminderList,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub synced: bool,
    pub last_synced: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListCounts {
    pub inbox: usize,
    pub next: usize,
    pub waiting: usize,
    pub someday: usize,
    pub projects: usize,
}

// --- Validation ---

pub fn validate_water_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        bail!("Water amount must be greater than 0 ml");
    }
    Ok(())
}

pub fn validate_weight(weight: f64, body_fat: Option<f64>) -> Result<()> {
    if !weight.is_finite() || weight <= 0.0 {
        bail!("Weight must be greater than 0");
    }
    if body_fat.is_some_and(|bf| !(0.0..=100.0).contains(&bf)) {
        bail!("Body fat must be between 0 and 100 percent");
    }
    Ok(())
}

pub fn validate_macros(calories: f64, protein: f64, carbs: f64, fat: f64) -> Result<()> {
    for (name, value) in [
        ("calories", calories),
        ("protein", protein),
        ("carbs", carbs),
        ("fat", fat),
    ] {
        if !value.is_finite() || value < 0.0 {
            bail!("{name} must not be negative");
        }
    }
    Ok(())
}

pub fn validate_quantity(quantity: f64) -> Result<()> {
    if !quantity.is_finite() || quantity < 0.0 {
        bail!("Quantity must not be negative");
    }
    Ok(())
}

// --- Date helpers ---

/// Whole days from `date` to `today`; negative when `date` is in the future.
#[must_use]
pub fn days_since(date: NaiveDate, today: NaiveDate) -> i64 {
    (today - date).num_days()
}

/// Whole days from `today` to `date`; negative when `date` has passed.
#[must_use]
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}
