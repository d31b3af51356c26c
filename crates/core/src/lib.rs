//! Agenda Core - Scheduling domain logic
//!
//! This crate contains pure domain logic with no I/O operations: time ranges,
//! appointments, recurrence expansion and the overlap layout. The persistence
//! boundary is declared here as the [`AppointmentStore`] port and implemented
//! by the crates that do perform I/O.

pub mod config;
pub mod error;
pub mod layout;
pub mod models;
pub mod recurrence;
pub mod series;
pub mod store;
pub mod time_range;
pub mod timezone;
pub mod types;

pub use config::CalendarConfig;
pub use error::{CalendarError, CalendarResult, ConfigError, SeriesIncomplete, StoreError};
pub use layout::{ColumnSlot, layout_columns};
pub use models::{Appointment, AppointmentPatch, NewAppointment};
pub use recurrence::{Occurrences, Pattern, RecurrenceRule, Termination};
pub use series::materialize_series;
pub use store::AppointmentStore;
pub use time_range::TimeRange;
pub use timezone::{localize, parse_timezone};
pub use types::{AppointmentId, SeriesId};
