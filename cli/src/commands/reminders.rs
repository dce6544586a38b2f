use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use oliver_core::models::{Reminder, ReminderList, ReminderPriority};
use oliver_core::service::OliverService;

use super::ensure_signed_in;
use super::helpers::truncate;

fn print_reminder_table(reminders: &[Reminder]) {
    #[derive(Tabled)]
    struct ReminderRow {
        #[tabled(rename = "")]
        done: &'static str,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "List")]
        list: String,
        #[tabled(rename = "Due")]
        due: String,
        #[tabled(rename = "Priority")]
        priority: String,
    }

    let rows: Vec<ReminderRow> = reminders
        .iter()
        .map(|r| ReminderRow {
            done: if r.completed { "x" } else { " " },
            title: truncate(&r.title, 40),
            list: r.list.to_string(),
            due: r.due_date.clone().unwrap_or_default(),
            priority: match r.priority {
                ReminderPriority::None => String::new(),
                p => p.to_string(),
            },
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
}

/// One list by name, or every list with per-list counts.
pub(crate) async fn cmd_reminders_list(
    service: &OliverService,
    list: Option<ReminderList>,
    json: bool,
) -> Result<()> {
    ensure_signed_in(&service.session).await?;
    let reminders = &service.reminders;
    reminders.fetch_all_reminders().await;

    let Some(list) = list else {
        let all = reminders.all_reminders();
        if json {
            println!(
                "{}",
                serde_json::json!({ "counts": reminders.list_counts(), "reminders": all })
            );
            return Ok(());
        }
        print_counts(service);
        if !all.is_empty() {
            println!();
            print_reminder_table(&all);
        }
        return Ok(());
    };

    let items = reminders.get_reminders_by_list(list.as_str());
    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if items.is_empty() {
        eprintln!("No reminders in {list}");
        process::exit(2);
    } else {
        print_reminder_table(&items);
    }
    Ok(())
}

fn print_counts(service: &OliverService) {
    #[derive(Tabled)]
    struct CountRow {
        #[tabled(rename = "List")]
        list: &'static str,
        #[tabled(rename = "Count")]
        count: usize,
    }

    let reminders = &service.reminders;
    let mut rows: Vec<CountRow> = ReminderList::ALL
        .into_iter()
        .map(|l| CountRow {
            list: l.as_str(),
            count: reminders.reminders_in(l).len(),
        })
        .collect();
    rows.push(CountRow {
        list: "total",
        count: reminders.total_count(),
    });

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) async fn cmd_reminders_upcoming(service: &OliverService, json: bool) -> Result<()> {
    ensure_signed_in(&service.session).await?;
    service.reminders.fetch_all_reminders().await;
    let upcoming = service.reminders.upcoming_reminders();

    if json {
        println!("{}", serde_json::to_string_pretty(&upcoming)?);
    } else if upcoming.is_empty() {
        eprintln!("Nothing up next");
        process::exit(2);
    } else {
        print_reminder_table(&upcoming);
    }
    Ok(())
}

pub(crate) async fn cmd_reminders_sync(service: &OliverService, json: bool) -> Result<()> {
    ensure_signed_in(&service.session).await?;
    let result = service.reminders.sync_with_apple().await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "synced": result.synced,
                "lastSynced": result.last_synced,
                "counts": service.reminders.list_counts(),
            })
        );
    } else {
        let when = result.last_synced.format("%Y-%m-%d %H:%M UTC");
        println!(
            "Synced {} reminders from Apple Reminders at {when}",
            service.reminders.total_count()
        );
        print_counts(service);
    }
    Ok(())
}
