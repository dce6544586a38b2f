use anyhow::{Result, bail};
use std::process;

use oliver_core::models::LoginCredentials;
use oliver_core::service::OliverService;

use super::helpers::{json_error, prompt_line};

pub(crate) async fn cmd_login(
    service: &OliverService,
    username: &str,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_line("Password: ")?,
    };
    let credentials = LoginCredentials {
        username: username.to_string(),
        password,
    };

    if service.session.login(&credentials).await {
        if json {
            println!("{}", serde_json::to_string_pretty(&service.session.user())?);
        } else {
            let name = service.session.username();
            println!("Logged in as {name}");
        }
        return Ok(());
    }

    let message = service.session.error().unwrap_or_default();
    if json {
        println!("{}", json_error(&message));
        process::exit(1);
    }
    bail!(message)
}

pub(crate) async fn cmd_logout(service: &OliverService, json: bool) -> Result<()> {
    service.session.logout().await;
    if json {
        println!("{}", serde_json::json!({ "loggedOut": true }));
    } else {
        println!("Logged out");
    }
    Ok(())
}

pub(crate) async fn cmd_whoami(service: &OliverService, json: bool) -> Result<()> {
    service.session.fetch_current_user().await;

    let Some(user) = service.session.user() else {
        if json {
            println!("{}", json_error("Not logged in"));
        } else {
            eprintln!("Not logged in");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!("{} <{}>", user.username, user.email);
        if !user.created_at.is_empty() {
            println!("  Member since {}", user.created_at);
        }
    }
    Ok(())
}
