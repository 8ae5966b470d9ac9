pub mod classify;
pub mod health;
pub mod metrics;
pub mod refill;
pub mod register;
