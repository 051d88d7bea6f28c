pub mod analyze;
pub mod inventory;
pub mod stats;
