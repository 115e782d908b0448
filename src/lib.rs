//! Renovation-Preview Funnel Backend
//!
//! This library backs a marketing funnel for an interior-renovation
//! business: room photos are forwarded to a hosted image-generation API,
//! the resulting prediction is polled to a terminal state by an in-process
//! adaptive poller, and captured leads are forwarded to an external record
//! store.

pub mod app_state;
pub mod config;
pub mod funnel;
pub mod jobs;
pub mod models;
pub mod routes;
pub mod services;
