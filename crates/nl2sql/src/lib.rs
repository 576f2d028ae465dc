//! NL2SQL - ask questions of a SQLite database in plain language
//!
//! A question is first routed to a topic by the `router` crate; the topic's
//! table is then described to a language model by the `translator` crate,
//! which returns SQL that is run read-only against the database.

pub mod commands;
pub mod config;
pub mod orchestrator;
pub mod report;

pub use config::AppConfig;
pub use orchestrator::{Answer, Pipeline};
