pub mod logger;
pub mod models;
