// src/models/mod.rs

pub mod medication;

pub use medication::*;
