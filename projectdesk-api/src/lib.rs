//! # ProjectDesk API Server Library
//!
//! HTTP JSON service for proposing projects, assigning developers, tracking
//! module delivery and settling payments.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Response security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
