// src/application/mod.rs
pub mod service;
