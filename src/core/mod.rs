pub mod auth;
pub mod billing;
pub mod catalog;
pub mod config;
pub mod models;
pub mod query;
pub mod report;
