pub mod handlers;
pub mod queue;
pub mod redis_queue;
pub mod scheduler;
pub mod service;
