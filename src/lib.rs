//! Task hierarchy and lifecycle engine.
//!
//! Tasks live in SQLite and form a forest: each task has at most one parent
//! and the parent graph never contains a cycle. Completing a recurring task
//! spawns its next occurrence in the same transaction.
//!
//! This module exports the core components for testing and integration.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod notify;
pub mod service;
pub mod types;
