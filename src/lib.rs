//! Incubation programme backend: mission catalog, quiz and project-form
//! evaluation, level progression and module certificates.

pub mod app;
pub mod app_state;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod evaluator;
pub mod i18n;
pub mod middleware;
pub mod modules;
pub mod progression;
pub mod telemetry;
pub mod websocket;

pub use app::create_router;
pub use app_state::AppState;
