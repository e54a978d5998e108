// src/handlers.rs

pub mod dashboard;
pub mod leads;
pub mod properties;
