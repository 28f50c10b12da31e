//! Appointment records and their status lifecycle.
//!
//! Booking and status changes are exposed as services; the patient and
//! doctor cells mount them behind their own role-scoped routes.

pub mod models;
pub mod services;

pub use models::{AppointmentError, AppointmentView, BookAppointmentRequest};
pub use services::booking::AppointmentBookingService;
pub use services::lifecycle::{AppointmentAction, AppointmentLifecycleService};
