// src/auction/mod.rs
pub mod broadcaster;
pub mod coordinator;
pub mod registry;
