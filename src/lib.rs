pub mod commands;
pub mod config;
pub mod database;
pub mod keyboard;
pub mod message;
pub mod quiz;
pub mod runner;
pub mod schema;
pub mod state;
pub mod transport;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type HandlerResult = Result<(), BoxError>;
