//! # Postgres
//!
//! This crate provides a client for the CampMarket application to interact with a PostgreSQL database.

/// Database client for the camping marketplace application.
pub mod database;
