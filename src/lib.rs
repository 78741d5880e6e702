// Sensor readings and their domain model
pub mod reading;

// Read-only SQLite reading store
pub mod store;

// Latest value per sensor category
pub mod latest;

// Model-backed forecasting pipeline
pub mod forecast;

// Process-wide configuration
pub mod config;

// HTTP API
pub mod api;
