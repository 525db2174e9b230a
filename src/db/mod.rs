//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization and migrations
//! - SQLite pragma configuration
//! - Repository layer for every aggregate the draw engine persists

pub mod migrations;
pub mod repo;

pub use migrations::{init_db, init_db_with, DbOptions};
pub use repo::Repository;
