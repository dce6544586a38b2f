use anyhow::Result;
use chrono::Local;
use clap::Args;

use oliver_core::models::{MealType, NewMeal, validate_macros};
use oliver_core::service::OliverService;

use super::ensure_signed_in;
use super::helpers::parse_date;

#[derive(Args)]
pub(crate) struct MealFields {
    /// Meal type: breakfast, lunch, dinner, snack
    #[arg(short, long, default_value = "snack")]
    pub meal: MealType,
    /// Calories (kcal)
    #[arg(long)]
    pub calories: f64,
    /// Protein (g)
    #[arg(long, default_value = "0")]
    pub protein: f64,
    /// Carbs (g)
    #[arg(long, default_value = "0")]
    pub carbs: f64,
    /// Fat (g)
    #[arg(long, default_value = "0")]
    pub fat: f64,
    /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
    #[arg(long)]
    pub date: Option<String>,
    /// Time of day, e.g. 12:30 (default: now)
    #[arg(long)]
    pub time: Option<String>,
    /// Optional notes
    #[arg(long)]
    pub notes: Option<String>,
}

pub(crate) async fn cmd_meal_add(
    service: &OliverService,
    fields: MealFields,
    json: bool,
) -> Result<()> {
    validate_macros(fields.calories, fields.protein, fields.carbs, fields.fat)?;
    let date = parse_date(fields.date)?;
    ensure_signed_in(&service.session).await?;

    let meal = NewMeal {
        date,
        meal_type: fields.meal,
        time: fields
            .time
            .unwrap_or_else(|| Local::now().format("%H:%M").to_string()),
        foods: Vec::new(),
        calories: fields.calories,
        protein: fields.protein,
        carbs: fields.carbs,
        fat: fields.fat,
        notes: fields.notes,
    };
    let created = service.health.add_meal(&meal).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&created)?);
    } else {
        let (id, meal_type, cal) = (&created.id, created.meal_type, created.calories);
        println!("Logged {meal_type} on {date}: {cal:.0} kcal [{id}]");
    }
    Ok(())
}

pub(crate) async fn cmd_meal_delete(service: &OliverService, id: &str, json: bool) -> Result<()> {
    ensure_signed_in(&service.session).await?;
    service.health.delete_meal(id).await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted meal {id}");
    }
    Ok(())
}
