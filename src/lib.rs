//! Lead Intake & Evaluation API Library
//!
//! This library provides the core functionality for the lead intake API:
//! the evaluation pipeline (scoring, web-presence analysis, generative
//! research and style guides), CRM recording, transactional notifications,
//! and the HTTP handlers that accept submissions.
//!
//! # Modules
//!
//! - `circuit_breaker`: Circuit breaker guarding the generative service.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and shared state.
//! - `models`: Core data models.
//! - `notifications`: Acknowledgment and sales notification emails.
//! - `pdf`: PDF rendering for generated documents.
//! - `pipeline`: Per-submission orchestration.
//! - `recorder`: CRM record creation.
//! - `research`: Generative research enrichment.
//! - `scoring`: Pure lead scoring engine.
//! - `services`: External service clients (generative, CRM, email).
//! - `style_guide`: Style-guide generation and section parsing.
//! - `web_presence`: Website and social-link analysis.

pub mod circuit_breaker;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod notifications;
pub mod pdf;
pub mod pipeline;
pub mod recorder;
pub mod research;
pub mod scoring;
pub mod services;
pub mod style_guide;
pub mod web_presence;
