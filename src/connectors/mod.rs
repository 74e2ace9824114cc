// src/connectors/mod.rs
pub mod messages;
pub mod telegram;
pub mod traits;
pub mod yahoo;
