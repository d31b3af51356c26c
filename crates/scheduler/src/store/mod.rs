//! Appointment store adapters

pub mod http;
pub mod memory;

pub use http::HttpAppointmentStore;
pub use memory::InMemoryAppointmentStore;
