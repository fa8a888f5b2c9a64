//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and view computations into use-case APIs.
//! - Keep the request layer decoupled from storage details.

pub mod wish_service;
