pub mod api_connection;
pub mod cli;
pub mod config;
pub mod cook;
pub mod flow;
pub mod form;
pub mod nutrient_analyzer;
pub mod nutrition;
pub mod presentation;
pub mod recipe_generator;
pub mod recipe_store;
pub mod schema;
pub mod session;
pub mod timer;
