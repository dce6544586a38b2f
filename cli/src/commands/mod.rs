mod auth;
mod helpers;
mod inventory;
mod meal;
mod reminders;
mod target;
mod today;
mod water;
mod weight;
mod workout;

use anyhow::{Result, bail};

use oliver_core::session::SessionStore;

pub(crate) use auth::{cmd_login, cmd_logout, cmd_whoami};
pub(crate) use inventory::{
    ItemFields, ItemUpdateFields, cmd_inventory_add, cmd_inventory_alerts, cmd_inventory_delete,
    cmd_inventory_list, cmd_inventory_purchase, cmd_inventory_replace, cmd_inventory_summary,
    cmd_inventory_update,
};
pub(crate) use meal::{MealFields, cmd_meal_add, cmd_meal_delete};
pub(crate) use reminders::{cmd_reminders_list, cmd_reminders_sync, cmd_reminders_upcoming};
pub(crate) use target::{TargetFields, cmd_target_set, cmd_target_show};
pub(crate) use today::cmd_today;
pub(crate) use water::{cmd_water_add, cmd_water_delete};
pub(crate) use weight::{cmd_weight_history, cmd_weight_log};
pub(crate) use workout::{WorkoutFields, cmd_workout_delete, cmd_workout_log};

/// Confirm the stored token still belongs to a live session.
pub(super) async fn ensure_signed_in(session: &SessionStore) -> Result<()> {
    session.fetch_current_user().await;
    if !session.is_authenticated() {
        bail!("Not logged in. Run `oliver login <username>` first");
    }
    Ok(())
}
