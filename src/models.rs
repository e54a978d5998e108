pub mod crop;
pub mod dashboard;
pub mod geometry;
pub mod lead;
pub mod property;
