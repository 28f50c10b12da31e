pub mod appointment;
pub mod auth;
pub mod doctor;
pub mod error;
pub mod time;
pub mod user;

pub use appointment::{Appointment, AppointmentStatus};
pub use auth::{AuthUser, Role};
pub use doctor::{AvailabilityInput, AvailabilityWindow, DayOfWeek, Doctor, DoctorStatus, DoctorView};
pub use error::AppError;
pub use user::{User, UserProfile, UserSummary};
