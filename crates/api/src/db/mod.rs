//! Database repository modules

pub mod appointments;
