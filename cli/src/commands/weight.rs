use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use oliver_core::models::{NewWeightRecord, validate_weight};
use oliver_core::service::OliverService;

use super::ensure_signed_in;
use super::helpers::parse_date;

pub(crate) async fn cmd_weight_log(
    service: &OliverService,
    weight: f64,
    body_fat: Option<f64>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    validate_weight(weight, body_fat)?;
    let date = parse_date(date)?;
    ensure_signed_in(&service.session).await?;

    let record = service
        .health
        .add_weight(&NewWeightRecord {
            date,
            weight,
            body_fat,
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("Logged {:.1} kg for {}", record.weight, record.date);
        if let Some(bf) = record.body_fat {
            print!(" ({bf:.1}% body fat)");
        }
        println!();
    }
    Ok(())
}

pub(crate) async fn cmd_weight_history(
    service: &OliverService,
    days: u32,
    json: bool,
) -> Result<()> {
    #[derive(Tabled)]
    struct WeightRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Weight (kg)")]
        weight: String,
        #[tabled(rename = "Body fat")]
        body_fat: String,
        #[tabled(rename = "Change")]
        change: String,
    }

    ensure_signed_in(&service.session).await?;
    service.health.fetch_weight_history(days).await;
    let mut records = service.health.weight_history();
    records.sort_by_key(|r| r.date);

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        eprintln!("No weight records in the last {days} days. Use `oliver weight log` to add one.");
        process::exit(2);
    }

    let rows: Vec<WeightRow> = records
        .iter()
        .enumerate()
        .map(|(i, r)| WeightRow {
            date: r.date.to_string(),
            weight: format!("{:.1}", r.weight),
            body_fat: r.body_fat.map_or("-".into(), |bf| format!("{bf:.1}%")),
            change: i
                .checked_sub(1)
                .map_or("-".into(), |prev| format!("{:+.1}", r.weight - records[prev].weight)),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}
