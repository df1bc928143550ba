//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Apply authorization gates before reads and mutations.

pub mod page_service;
