//! services/client/src/lib.rs
//!
//! The PRD Generator client: session handling, the backend gateway and the
//! controllers behind each view.

pub mod adapters;
pub mod config;
pub mod controllers;
pub mod error;
pub mod records;
pub mod session;
