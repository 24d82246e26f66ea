pub mod deadline;
pub mod error;
pub mod memory;
pub mod postgrest;
pub mod store;
pub mod supabase;

pub use deadline::Deadline;
pub use error::StoreError;
pub use memory::InMemoryStore;
pub use postgrest::SupabaseStore;
pub use store::{AvailabilityStore, BookingStore, CancelOutcome, PatientStore, SchedulingStore};
