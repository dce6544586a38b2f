use anyhow::Result;

use oliver_core::models::validate_water_amount;
use oliver_core::service::OliverService;

use super::ensure_signed_in;
use super::helpers::{format_water, parse_date};

pub(crate) async fn cmd_water_add(
    service: &OliverService,
    amount: f64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    validate_water_amount(amount)?;
    let date = parse_date(date)?;
    ensure_signed_in(&service.session).await?;

    let health = &service.health;
    health.fetch_targets().await;
    health.set_selected_date(date).await;
    let record = health.add_water(amount).await?;

    let progress = health.nutrition_progress().water;
    if json {
        println!(
            "{}",
            serde_json::json!({
                "record": record,
                "total": progress.current,
                "target": progress.target,
            })
        );
    } else {
        println!(
            "Logged {} of water on {date}. Total {} of {} ({}%)",
            format_water(record.amount),
            format_water(progress.current),
            format_water(progress.target),
            progress.percent()
        );
    }
    Ok(())
}

pub(crate) async fn cmd_water_delete(service: &OliverService, id: &str, json: bool) -> Result<()> {
    ensure_signed_in(&service.session).await?;
    service.health.delete_water(id).await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted water record {id}");
    }
    Ok(())
}
