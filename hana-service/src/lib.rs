pub mod config;
pub mod error;
pub mod features;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
