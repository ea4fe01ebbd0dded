// src/infrastructure/mod.rs
pub mod auth;
pub mod memory;
