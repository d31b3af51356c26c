//! Type-safe wrappers for domain identifiers
//!
//! These newtypes prevent mixing different ID types at compile time.
//! For example, you cannot pass a SeriesId where an AppointmentId is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Appointment identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentId(pub Uuid);

impl AppointmentId {
    /// Create a new appointment ID
    pub fn new() -> Self {
        AppointmentId(Uuid::new_v4())
    }
}

impl Default for AppointmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AppointmentId {
    fn from(id: Uuid) -> Self {
        AppointmentId(id)
    }
}

impl From<AppointmentId> for Uuid {
    fn from(id: AppointmentId) -> Self {
        id.0
    }
}

/// Identifier shared by every occurrence materialized from one recurrence rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesId(pub Uuid);

impl SeriesId {
    /// Create a new series ID
    pub fn new() -> Self {
        SeriesId(Uuid::new_v4())
    }
}

impl Default for SeriesId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SeriesId {
    fn from(id: Uuid) -> Self {
        SeriesId(id)
    }
}

impl From<SeriesId> for Uuid {
    fn from(id: SeriesId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appointment_id_creation() {
        let id1 = AppointmentId::new();
        let id2 = AppointmentId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_series_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let series_id = SeriesId::from(uuid);
        assert_eq!(Uuid::from(series_id), uuid);
    }

    #[test]
    fn test_appointment_id_serialization() {
        let id = AppointmentId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let deserialized: AppointmentId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
