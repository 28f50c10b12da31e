//! Platform administration: doctor approval, user management and
//! platform-wide statistics.

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::admin_routes;
pub use services::admin::AdminService;
