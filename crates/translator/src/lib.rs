//! Translator - turns a routed question into SQL and runs it
//!
//! Given the table a question was routed to, this crate gathers the table's
//! column info and a few sample rows, renders the NL2SQL prompt, asks a
//! language model for the query and executes the result against SQLite.

pub mod error;
pub mod executor;
pub mod model;
pub mod prompt;
pub mod response;
pub mod schema;
pub mod translate;

pub use error::TranslateError;
pub use executor::{QueryResult, SqliteExecutor};
pub use model::{ChatCompletionsClient, ChatCompletionsConfig, LanguageModel};
pub use prompt::render_prompt;
pub use response::parse_sql_response;
pub use schema::{ColumnInfo, SchemaContext};
pub use translate::Translator;
