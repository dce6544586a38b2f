mod commands;
mod config;
mod credentials;
mod remote;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    ItemFields, ItemUpdateFields, MealFields, TargetFields, WorkoutFields, cmd_inventory_add,
    cmd_inventory_alerts, cmd_inventory_delete, cmd_inventory_list, cmd_inventory_purchase,
    cmd_inventory_replace, cmd_inventory_summary, cmd_inventory_update, cmd_login, cmd_logout,
    cmd_meal_add, cmd_meal_delete, cmd_reminders_list, cmd_reminders_sync, cmd_reminders_upcoming,
    cmd_target_set, cmd_target_show, cmd_today, cmd_water_add, cmd_water_delete,
    cmd_weight_history, cmd_weight_log, cmd_whoami, cmd_workout_delete, cmd_workout_log,
};
use crate::config::Config;
use crate::credentials::FileCredentialStore;
use crate::remote::HttpRemote;
use oliver_core::error::RemoteError;
use oliver_core::health::DEFAULT_WEIGHT_HISTORY_DAYS;
use oliver_core::models::{InventoryCategory, ReminderList};
use oliver_core::service::OliverService;

#[derive(Parser)]
#[command(
    name = "oliver",
    version,
    about = "Meals, water, workouts, weight, household stock and reminders from the terminal"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session tokens
    Login {
        /// Account username
        username: String,
        /// Password (prompted on stdin when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sign out and forget the stored tokens
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the signed-in user
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show meals, water, workout and nutrition progress for a day (default: today)
    Today {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log or delete meals
    Meal {
        #[command(subcommand)]
        command: MealCommands,
    },
    /// Log or delete water intake
    Water {
        #[command(subcommand)]
        command: WaterCommands,
    },
    /// Log or delete workouts
    Workout {
        #[command(subcommand)]
        command: WorkoutCommands,
    },
    /// Track body weight
    Weight {
        #[command(subcommand)]
        command: WeightCommands,
    },
    /// Show or change daily nutrition targets
    Target {
        #[command(subcommand)]
        command: TargetCommands,
    },
    /// Manage household inventory
    Inventory {
        #[command(subcommand)]
        command: InventoryCommands,
    },
    /// Browse reminders mirrored from Apple Reminders
    Reminders {
        #[command(subcommand)]
        command: ReminderCommands,
    },
}

#[derive(Subcommand)]
enum MealCommands {
    /// Log a meal
    Add {
        #[command(flatten)]
        fields: MealFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a meal by ID
    Delete {
        /// Meal ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WaterCommands {
    /// Log water intake
    Add {
        /// Amount in ml
        amount: f64,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a water record by ID
    Delete {
        /// Water record ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WorkoutCommands {
    /// Log a workout
    Log {
        #[command(flatten)]
        fields: WorkoutFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a workout by ID
    Delete {
        /// Workout ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WeightCommands {
    /// Log a weight entry
    Log {
        /// Weight in kg
        weight: f64,
        /// Body fat percentage
        #[arg(long)]
        body_fat: Option<f64>,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show weight history
    History {
        /// Number of days to show
        #[arg(short, long, default_value_t = DEFAULT_WEIGHT_HISTORY_DAYS)]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum TargetCommands {
    /// Show daily targets
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change daily targets; omitted fields keep their current value
    Set {
        #[command(flatten)]
        fields: TargetFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum InventoryCommands {
    /// List items, optionally for one category
    List {
        /// Category: food, pet-supplies, household, personal-care, electronics, other
        #[arg(short, long)]
        category: Option<InventoryCategory>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the server's inventory counts
    Summary {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add an item
    Add {
        #[command(flatten)]
        fields: ItemFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change fields of an item
    Update {
        /// Item ID
        id: String,
        #[command(flatten)]
        fields: ItemUpdateFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an item by ID
    Delete {
        /// Item ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a restock
    Purchase {
        /// Item ID
        id: String,
        /// Quantity bought
        quantity: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record that an item was replaced today
    Replace {
        /// Item ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show items to buy, expiring within a week, or due for replacement
    Alerts {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ReminderCommands {
    /// List reminders, optionally for one list
    List {
        /// List: inbox, next, waiting, someday, projects
        list: Option<ReminderList>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the next few open items
    Upcoming {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pull the latest reminders from Apple Reminders
    Sync {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        if e
            .downcast_ref::<RemoteError>()
            .is_some_and(RemoteError::is_unauthorized)
        {
            eprintln!("Your session has expired. Run `oliver login <username>` to sign in again.");
        }
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let credentials = Arc::new(FileCredentialStore::open(&config.credentials_path)?);
    let remote = Arc::new(HttpRemote::new(&config.api_base_url, credentials.clone())?);
    let service = OliverService::new(remote, credentials);
    let service = &service;

    match cli.command {
        Commands::Login {
            username,
            password,
            json,
        } => cmd_login(service, &username, password, json).await,
        Commands::Logout { json } => cmd_logout(service, json).await,
        Commands::Whoami { json } => cmd_whoami(service, json).await,
        Commands::Today { date, json } => cmd_today(service, date, json).await,
        Commands::Meal { command } => match command {
            MealCommands::Add { fields, json } => cmd_meal_add(service, fields, json).await,
            MealCommands::Delete { id, json } => cmd_meal_delete(service, &id, json).await,
        },
        Commands::Water { command } => match command {
            WaterCommands::Add { amount, date, json } => {
                cmd_water_add(service, amount, date, json).await
            }
            WaterCommands::Delete { id, json } => cmd_water_delete(service, &id, json).await,
        },
        Commands::Workout { command } => match command {
            WorkoutCommands::Log { fields, json } => cmd_workout_log(service, fields, json).await,
            WorkoutCommands::Delete { id, json } => cmd_workout_delete(service, &id, json).await,
        },
        Commands::Weight { command } => match command {
            WeightCommands::Log {
                weight,
                body_fat,
                date,
                json,
            } => cmd_weight_log(service, weight, body_fat, date, json).await,
            WeightCommands::History { days, json } => {
                cmd_weight_history(service, days, json).await
            }
        },
        Commands::Target { command } => match command {
            TargetCommands::Show { json } => cmd_target_show(service, json).await,
            TargetCommands::Set { fields, json } => cmd_target_set(service, fields, json).await,
        },
        Commands::Inventory { command } => match command {
            InventoryCommands::List { category, json } => {
                cmd_inventory_list(service, category, json).await
            }
            InventoryCommands::Summary { json } => cmd_inventory_summary(service, json).await,
            InventoryCommands::Add { fields, json } => {
                cmd_inventory_add(service, fields, json).await
            }
            InventoryCommands::Update { id, fields, json } => {
                cmd_inventory_update(service, &id, fields, json).await
            }
            InventoryCommands::Delete { id, json } => {
                cmd_inventory_delete(service, &id, json).await
            }
            InventoryCommands::Purchase { id, quantity, json } => {
                cmd_inventory_purchase(service, &id, quantity, json).await
            }
            InventoryCommands::Replace { id, json } => {
                cmd_inventory_replace(service, &id, json).await
            }
            InventoryCommands::Alerts { json } => cmd_inventory_alerts(service, json).await,
        },
        Commands::Reminders { command } => match command {
            ReminderCommands::List { list, json } => cmd_reminders_list(service, list, json).await,
            ReminderCommands::Upcoming { json } => cmd_reminders_upcoming(service, json).await,
            ReminderCommands::Sync { json } => cmd_reminders_sync(service, json).await,
        },
    }
}
