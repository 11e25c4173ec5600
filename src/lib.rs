pub mod ai_client;
pub mod api_connection;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod favorites;
pub mod meal_planner;
pub mod models;
pub mod prompts;
pub mod retry;
pub mod validator;
