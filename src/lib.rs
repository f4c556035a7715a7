pub mod api;
pub mod auth;
pub mod config;
pub mod csv;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod sheet;
pub mod state;
