// src/lib.rs
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod health;
pub mod manager;
pub mod ml;
pub mod models;
pub mod predictions;
pub mod recommendations;
pub mod scoring;
pub mod store;
