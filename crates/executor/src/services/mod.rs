pub mod scheduler_service;
pub mod summary;
pub mod telegram_service;
pub mod workflow;
