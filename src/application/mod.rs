//! Application layer
//!
//! Orchestration services over the domain and persistence layers, plus the
//! HTTP handlers that expose them.

pub mod handlers;
pub mod services;
