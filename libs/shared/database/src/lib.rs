pub mod memory;
pub mod store;
pub mod supabase;

pub use memory::MemoryStore;
pub use store::{AppointmentFilter, Store, StoreError, StoreResult};
pub use supabase::{SupabaseClient, SupabaseStore};
