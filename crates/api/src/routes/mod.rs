//! API route modules

pub mod appointments;
pub mod health;
