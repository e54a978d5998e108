// src/services.rs

pub mod aggregation;
pub mod dashboard_service;
pub mod insights;
pub mod kml_processor;
pub mod lead_service;
pub mod property_service;
pub mod scoring;

pub use dashboard_service::DashboardService;
pub use lead_service::LeadService;
pub use property_service::PropertyService;
