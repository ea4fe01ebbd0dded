// src/lib.rs
pub mod application;
pub mod auction;
pub mod config;
pub mod domain;
pub mod infrastructure;
