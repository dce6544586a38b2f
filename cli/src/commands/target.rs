use anyhow::{Result, bail};
use clap::Args;

use oliver_core::models::{NutritionTarget, validate_macros};
use oliver_core::service::OliverService;

use super::ensure_signed_in;
use super::helpers::format_water;

#[derive(Args)]
pub(crate) struct TargetFields {
    /// Daily calorie target (kcal)
    #[arg(long)]
    pub calories: Option<f64>,
    /// Daily protein target (g)
    #[arg(long)]
    pub protein: Option<f64>,
    /// Daily carbs target (g)
    #[arg(long)]
    pub carbs: Option<f64>,
    /// Daily fat target (g)
    #[arg(long)]
    pub fat: Option<f64>,
    /// Daily water target (ml)
    #[arg(long)]
    pub water: Option<f64>,
}

impl TargetFields {
    fn is_empty(&self) -> bool {
        self.calories.is_none()
            && self.protein.is_none()
            && self.carbs.is_none()
            && self.fat.is_none()
            && self.water.is_none()
    }

    fn apply(self, base: NutritionTarget) -> NutritionTarget {
        NutritionTarget {
            calories: self.calories.unwrap_or(base.calories),
            protein: self.protein.unwrap_or(base.protein),
            carbs: self.carbs.unwrap_or(base.carbs),
            fat: self.fat.unwrap_or(base.fat),
            water: self.water.unwrap_or(base.water),
        }
    }
}

fn print_targets(t: &NutritionTarget) {
    println!(
        "{:.0} kcal/day  Protein: {:.0}g  Carbs: {:.0}g  Fat: {:.0}g  Water: {}",
        t.calories,
        t.protein,
        t.carbs,
        t.fat,
        format_water(t.water)
    );
}

pub(crate) async fn cmd_target_show(service: &OliverService, json: bool) -> Result<()> {
    ensure_signed_in(&service.session).await?;
    service.health.fetch_targets().await;
    let targets = service.health.targets();

    if json {
        println!("{}", serde_json::to_string_pretty(&targets)?);
    } else {
        print_targets(&targets);
    }
    Ok(())
}

/// Only the given fields change; the rest keep their current server value.
pub(crate) async fn cmd_target_set(
    service: &OliverService,
    fields: TargetFields,
    json: bool,
) -> Result<()> {
    if fields.is_empty() {
        bail!(
            "Nothing to update. Provide at least one of \
             --calories, --protein, --carbs, --fat, --water"
        );
    }
    ensure_signed_in(&service.session).await?;

    service.health.fetch_targets().await;
    let targets = fields.apply(service.health.targets());
    validate_macros(targets.calories, targets.protein, targets.carbs, targets.fat)?;
    if !targets.water.is_finite() || targets.water <= 0.0 {
        bail!("Water target must be greater than 0 ml");
    }

    let saved = service.health.update_targets(&targets).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&saved)?);
    } else {
        print_targets(&saved);
    }
    Ok(())
}
