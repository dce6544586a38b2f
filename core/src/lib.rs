pub mod api;
pub mod credentials;
pub mod error;
pub mod health;
pub mod inventory;
pub mod models;
pub mod reminders;
pub mod service;
pub mod session;
