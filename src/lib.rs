//! Sentinela Trading Service Library
//!
//! Core components of the Sentinela trading decision service: decision
//! analysis, trade execution and position monitoring over a SQLite store,
//! a spot exchange and a generative model.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod persistence;
