use anyhow::{Result, bail};
use chrono::Local;
use clap::Args;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use oliver_core::inventory::EXPIRY_WINDOW_DAYS;
use oliver_core::models::{
    InventoryCategory, InventoryItem, InventoryItemUpdate, NewInventoryItem, days_since,
    days_until, validate_quantity,
};
use oliver_core::service::OliverService;

use super::ensure_signed_in;
use super::helpers::{format_quantity, parse_optional_date, truncate};

#[derive(Args)]
pub(crate) struct ItemFields {
    /// Item name
    pub name: String,
    /// Category: food, pet-supplies, household, personal-care, electronics, other
    #[arg(short, long, default_value = "other")]
    pub category: InventoryCategory,
    /// Quantity on hand
    #[arg(short, long, default_value = "1")]
    pub quantity: f64,
    /// Unit (e.g. pcs, kg, bottle)
    #[arg(short, long, default_value = "pcs")]
    pub unit: String,
    /// Restock when the quantity drops to this level
    #[arg(long, default_value = "0")]
    pub min: f64,
    /// Expiry date (YYYY-MM-DD)
    #[arg(long)]
    pub expiry: Option<String>,
    /// Date last replaced (YYYY-MM-DD)
    #[arg(long)]
    pub replaced: Option<String>,
    /// Replace every N days
    #[arg(long)]
    pub cycle: Option<u32>,
    /// Where the item is kept
    #[arg(long)]
    pub location: Option<String>,
    /// Optional notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args)]
pub(crate) struct ItemUpdateFields {
    /// New name
    #[arg(long)]
    pub name: Option<String>,
    /// New category
    #[arg(short, long)]
    pub category: Option<InventoryCategory>,
    /// New quantity
    #[arg(short, long)]
    pub quantity: Option<f64>,
    /// New unit
    #[arg(short, long)]
    pub unit: Option<String>,
    /// New restock level
    #[arg(long)]
    pub min: Option<f64>,
    /// New expiry date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "clear_expiry")]
    pub expiry: Option<String>,
    /// Remove the expiry date
    #[arg(long)]
    pub clear_expiry: bool,
    /// New replacement cycle in days
    #[arg(long, conflicts_with = "clear_cycle")]
    pub cycle: Option<u32>,
    /// Remove the replacement cycle
    #[arg(long)]
    pub clear_cycle: bool,
    /// New location
    #[arg(long)]
    pub location: Option<String>,
    /// New notes
    #[arg(long)]
    pub notes: Option<String>,
}

impl ItemUpdateFields {
    fn into_update(self) -> Result<InventoryItemUpdate> {
        if let Some(q) = self.quantity {
            validate_quantity(q)?;
        }
        if let Some(m) = self.min {
            validate_quantity(m)?;
        }
        let expiry_date = if self.clear_expiry {
            Some(None)
        } else {
            parse_optional_date(self.expiry)?.map(Some)
        };
        let replacement_cycle = if self.clear_cycle {
            Some(None)
        } else {
            self.cycle.map(Some)
        };

        Ok(InventoryItemUpdate {
            name: self.name,
            category: self.category,
            quantity: self.quantity,
            unit: self.unit,
            min_quantity: self.min,
            expiry_date,
            replacement_cycle,
            location: self.location.map(Some),
            notes: self.notes.map(Some),
        })
    }
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Qty")]
    quantity: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Expires")]
    expires: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Buy")]
    buy: String,
}

fn print_item_table(items: &[InventoryItem]) {
    let rows: Vec<ItemRow> = items
        .iter()
        .map(|i| ItemRow {
            id: i.id.clone(),
            name: truncate(&i.name, 30),
            category: i.category.label().to_string(),
            quantity: format!("{} {}", format_quantity(i.quantity), i.unit),
            min: format_quantity(i.min_quantity),
            expires: i.expiry_date.map(|d| d.to_string()).unwrap_or_default(),
            location: i
                .location
                .as_deref()
                .map(|l| truncate(l, 20))
                .unwrap_or_default(),
            buy: if i.needs_to_buy { "yes" } else { "" }.to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

fn print_item_line(i: &InventoryItem) {
    println!(
        "{} [{}] {} {} ({})",
        i.name,
        i.id,
        format_quantity(i.quantity),
        i.unit,
        i.category.label()
    );
}

pub(crate) async fn cmd_inventory_list(
    service: &OliverService,
    category: Option<InventoryCategory>,
    json: bool,
) -> Result<()> {
    ensure_signed_in(&service.session).await?;
    let inventory = &service.inventory;
    inventory.fetch_items(None).await;
    inventory.set_category(category);
    let items = inventory.filtered_items();

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if items.is_empty() {
        eprintln!("No inventory items. Use `oliver inventory add` to add one.");
        process::exit(2);
    } else {
        print_item_table(&items);
    }
    Ok(())
}

pub(crate) async fn cmd_inventory_summary(service: &OliverService, json: bool) -> Result<()> {
    ensure_signed_in(&service.session).await?;
    service.inventory.fetch_summary().await;
    let summary = service.inventory.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Items:             {}", summary.total_items);
        println!("Need to buy:       {}", summary.needs_to_buy);
        println!("Expiring soon:     {}", summary.expiring_soon);
        println!("Need replacement:  {}", summary.needs_replacement);
    }
    Ok(())
}

pub(crate) async fn cmd_inventory_add(
    service: &OliverService,
    fields: ItemFields,
    json: bool,
) -> Result<()> {
    validate_quantity(fields.quantity)?;
    validate_quantity(fields.min)?;
    if fields.name.trim().is_empty() {
        bail!("Item name must not be empty");
    }
    let item = NewInventoryItem {
        name: fields.name,
        category: fields.category,
        quantity: fields.quantity,
        unit: fields.unit,
        min_quantity: fields.min,
        expiry_date: parse_optional_date(fields.expiry)?,
        last_replaced: parse_optional_date(fields.replaced)?,
        replacement_cycle: fields.cycle,
        location: fields.location,
        notes: fields.notes,
    };
    ensure_signed_in(&service.session).await?;

    let created = service.inventory.add_item(&item).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&created)?);
    } else {
        print!("Added ");
        print_item_line(&created);
    }
    Ok(())
}

pub(crate) async fn cmd_inventory_update(
    service: &OliverService,
    id: &str,
    fields: ItemUpdateFields,
    json: bool,
) -> Result<()> {
    let update = fields.into_update()?;
    if update.is_empty() {
        bail!("Nothing to update. Provide at least one field to change");
    }
    ensure_signed_in(&service.session).await?;

    let updated = service.inventory.update_item(id, &update).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        print!("Updated ");
        print_item_line(&updated);
    }
    Ok(())
}

pub(crate) async fn cmd_inventory_delete(
    service: &OliverService,
    id: &str,
    json: bool,
) -> Result<()> {
    ensure_signed_in(&service.session).await?;
    service.inventory.delete_item(id).await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted item {id}");
    }
    Ok(())
}

pub(crate) async fn cmd_inventory_purchase(
    service: &OliverService,
    id: &str,
    quantity: f64,
    json: bool,
) -> Result<()> {
    if !quantity.is_finite() || quantity <= 0.0 {
        bail!("Purchased quantity must be greater than 0");
    }
    ensure_signed_in(&service.session).await?;

    let item = service.inventory.mark_purchased(id, quantity).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        print!("Restocked ");
        print_item_line(&item);
    }
    Ok(())
}

pub(crate) async fn cmd_inventory_replace(
    service: &OliverService,
    id: &str,
    json: bool,
) -> Result<()> {
    ensure_signed_in(&service.session).await?;

    let item = service.inventory.mark_replaced(id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        let when = item
            .last_replaced
            .map_or_else(|| "today".to_string(), |d| d.to_string());
        println!("Marked {} [{}] as replaced on {when}", item.name, item.id);
    }
    Ok(())
}

/// Items that need attention: to buy, expiring within a week, due for replacement.
pub(crate) async fn cmd_inventory_alerts(service: &OliverService, json: bool) -> Result<()> {
    ensure_signed_in(&service.session).await?;
    let inventory = &service.inventory;
    inventory.fetch_items(None).await;

    let today = Local::now().date_naive();
    let to_buy = inventory.items_needing_purchase();
    let expiring = inventory.expiring_items_on(today);
    let replace = inventory.items_needing_replacement_on(today);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "needsToBuy": to_buy,
                "expiring": expiring,
                "needsReplacement": replace,
            })
        );
        return Ok(());
    }

    if to_buy.is_empty() && expiring.is_empty() && replace.is_empty() {
        println!("Nothing needs attention");
        return Ok(());
    }

    if !to_buy.is_empty() {
        println!("NEED TO BUY");
        for i in &to_buy {
            println!(
                "  [{}] {} ({} {} left, min {})",
                i.id,
                i.name,
                format_quantity(i.quantity),
                i.unit,
                format_quantity(i.min_quantity)
            );
        }
        println!();
    }

    if !expiring.is_empty() {
        println!("EXPIRING WITHIN {EXPIRY_WINDOW_DAYS} DAYS");
        for i in &expiring {
            let Some(date) = i.expiry_date else { continue };
            let left = match days_until(date, today) {
                0 => "today".to_string(),
                1 => "tomorrow".to_string(),
                n => format!("in {n} days"),
            };
            println!("  [{}] {} expires {left} ({date})", i.id, i.name);
        }
        println!();
    }

    if !replace.is_empty() {
        println!("DUE FOR REPLACEMENT");
        for i in &replace {
            let (Some(last), Some(cycle)) = (i.last_replaced, i.replacement_cycle) else {
                continue;
            };
            let age = days_since(last, today);
            println!(
                "  [{}] {} replaced {age} days ago (every {cycle} days)",
                i.id, i.name
            );
        }
    }
    Ok(())
}
