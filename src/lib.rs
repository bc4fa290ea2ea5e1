//! Core library for the taskhub API.
//!
//! Contains the configuration, domain models, authentication stack, route
//! handlers, image normalization, and outbound email used by the binary in
//! `main.rs` to assemble and run the application.

pub mod auth;
pub mod config;
pub mod error;
pub mod images;
pub mod models;
pub mod notify;
pub mod routes;
