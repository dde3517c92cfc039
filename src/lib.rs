// Core infrastructure modules
pub mod core;

// Report modules
pub mod config;
pub mod integrity;
pub mod reports;
pub mod runner;
pub mod table;

#[doc(hidden)]
pub mod test_utils;
