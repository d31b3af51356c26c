//! Interactive scheduling layer
//!
//! Hosts the calendar view state machine: drag relocation and edge resizing
//! with optimistic commits, serialized persistence per appointment, and a
//! full resynchronization from the store when a write fails. Store adapters
//! for in-memory use and for the HTTP API live under [`store`].

pub mod appointments;
pub mod commit;
pub mod drag;
pub mod error;
pub mod gesture;
pub mod resize;
pub mod series;
pub mod store;
pub mod view;

pub use appointments::AppointmentSet;
pub use commit::{CommitQueue, CommitResolution, CommitStatus, CommitTurn, PendingCommit, TimeChange};
pub use drag::DragRelocationController;
pub use error::SchedulerError;
pub use gesture::{DragSession, GestureState, HitZone, Point, ResizeEdge, ResizeSession, TimeSlot};
pub use resize::ResizeController;
pub use series::create_series;
pub use store::{HttpAppointmentStore, InMemoryAppointmentStore};
pub use view::{CalendarNotification, CalendarView, NowIndicator, RenderItem, ViewMode};
