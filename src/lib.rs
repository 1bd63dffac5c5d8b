//! Liora - model-name resolution and generation tooling for fal.ai
//!
//! Maps free-form model names ("nano banana", "kling") to exact fal.ai
//! endpoints, looks up generation best practices, and runs generations,
//! exposed as agent tools over HTTP and to Coral sessions.

pub mod cli;
pub mod config;
pub mod coral;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod resolver;
pub mod services;
pub mod shared;
pub mod telemetry;
pub mod tools;
