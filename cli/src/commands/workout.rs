use anyhow::{Result, bail};
use clap::Args;

use oliver_core::models::{NewWorkout, WorkoutType};
use oliver_core::service::OliverService;

use super::ensure_signed_in;
use super::helpers::{format_duration, parse_date};

#[derive(Args)]
pub(crate) struct WorkoutFields {
    /// Workout type: back-shoulder, chest-shoulder, legs-core, cardio, rest
    pub workout_type: WorkoutType,
    /// Duration in minutes
    #[arg(short, long, default_value = "0")]
    pub duration: u32,
    /// Calories burned (kcal)
    #[arg(long, default_value = "0")]
    pub calories: f64,
    /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
    #[arg(long)]
    pub date: Option<String>,
    /// Log as planned rather than completed
    #[arg(long)]
    pub planned: bool,
    /// Optional notes
    #[arg(long)]
    pub notes: Option<String>,
}

pub(crate) async fn cmd_workout_log(
    service: &OliverService,
    fields: WorkoutFields,
    json: bool,
) -> Result<()> {
    if !fields.calories.is_finite() || fields.calories < 0.0 {
        bail!("Calories burned must not be negative");
    }
    let date = parse_date(fields.date)?;
    ensure_signed_in(&service.session).await?;

    let workout = NewWorkout {
        date,
        workout_type: fields.workout_type,
        duration: fields.duration,
        exercises: Vec::new(),
        calories_burned: fields.calories,
        notes: fields.notes,
        completed: !fields.planned,
    };
    let created = service.health.add_workout(&workout).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&created)?);
    } else {
        let verb = if created.completed { "Logged" } else { "Planned" };
        println!(
            "{verb} {} workout on {date}: {} [{}]",
            created.workout_type,
            format_duration(created.duration),
            created.id
        );
    }
    Ok(())
}

pub(crate) async fn cmd_workout_delete(
    service: &OliverService,
    id: &str,
    json: bool,
) -> Result<()> {
    ensure_signed_in(&service.session).await?;
    service.health.delete_workout(id).await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted workout {id}");
    }
    Ok(())
}
