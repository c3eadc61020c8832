pub mod auth;
pub mod billing;
pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod jobs;
pub mod models;
pub mod pubsub;
pub mod services;
pub mod tx;

pub use db::create_pool;
