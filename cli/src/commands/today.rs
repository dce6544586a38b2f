use anyhow::Result;
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use oliver_core::models::{
    MealRecord, MealType, NutritionProgress, NutritionTarget, Progress, WaterRecord, WorkoutRecord,
};
use oliver_core::service::OliverService;

use super::ensure_signed_in;
use super::helpers::{format_duration, format_water, no_neg_zero, parse_date};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DayReport {
    date: chrono::NaiveDate,
    meals: Vec<MealRecord>,
    water_records: Vec<WaterRecord>,
    workout: Option<WorkoutRecord>,
    targets: NutritionTarget,
    progress: NutritionProgress,
}

pub(crate) async fn cmd_today(
    service: &OliverService,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    ensure_signed_in(&service.session).await?;

    let health = &service.health;
    health.fetch_targets().await;
    health.set_selected_date(date).await;

    let report = DayReport {
        date,
        meals: health.today_meals(),
        water_records: health
            .water_records()
            .into_iter()
            .filter(|r| r.date == date)
            .collect(),
        workout: health.today_workout(),
        targets: health.targets(),
        progress: health.nutrition_progress(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("=== {date} ===\n");

    if report.meals.is_empty() {
        println!("  No meals logged");
    }
    for meal_type in MealType::ALL {
        let meals: Vec<&MealRecord> = report
            .meals
            .iter()
            .filter(|m| m.meal_type == meal_type)
            .collect();
        if meals.is_empty() {
            continue;
        }
        let subtotal: f64 = meals.iter().map(|m| m.calories).sum();
        let label = meal_type.as_str().to_uppercase();
        println!("  {label} ({subtotal:.0} kcal)");
        for m in meals {
            let (id, time, cal) = (&m.id, &m.time, m.calories);
            let (p, c, f) = (m.protein, m.carbs, m.fat);
            let notes = m
                .notes
                .as_ref()
                .map(|n| format!(" - {n}"))
                .unwrap_or_default();
            println!("    [{id}] {time} {cal:.0} kcal | P:{p:.0}g C:{c:.0}g F:{f:.0}g{notes}");
        }
    }
    println!();

    if !report.water_records.is_empty() {
        let entries: Vec<String> = report
            .water_records
            .iter()
            .map(|r| format!("[{}] {}", r.id, format_water(r.amount)))
            .collect();
        println!("  WATER: {}", entries.join(", "));
    }

    match &report.workout {
        Some(w) => {
            let status = if w.completed { "done" } else { "planned" };
            println!(
                "  WORKOUT: [{}] {} {} ({status}, {:.0} kcal burned)",
                w.id,
                w.workout_type,
                format_duration(w.duration),
                w.calories_burned
            );
        }
        None => println!("  WORKOUT: none"),
    }
    println!();

    print_progress_table(&report.progress);
    Ok(())
}

fn print_progress_table(progress: &NutritionProgress) {
    #[derive(Tabled)]
    struct ProgressRow {
        #[tabled(rename = "")]
        name: &'static str,
        #[tabled(rename = "Current")]
        current: String,
        #[tabled(rename = "Target")]
        target: String,
        #[tabled(rename = "Remaining")]
        remaining: String,
        #[tabled(rename = "%")]
        percent: String,
    }

    let grams = |v: f64| format!("{:.0}g", no_neg_zero(v));
    let kcal = |v: f64| format!("{:.0}", no_neg_zero(v));
    let row = |name, p: &Progress, fmt: &dyn Fn(f64) -> String| ProgressRow {
        name,
        current: fmt(p.current),
        target: fmt(p.target),
        remaining: fmt(p.remaining()),
        percent: format!("{}%", p.percent()),
    };

    let rows = vec![
        row("Calories", &progress.calories, &kcal),
        row("Protein", &progress.protein, &grams),
        row("Carbs", &progress.carbs, &grams),
        row("Fat", &progress.fat, &grams),
        row("Water", &progress.water, &format_water),
    ];

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
