pub mod error;
pub mod supabase;
pub mod tenant;

pub use error::DatabaseError;
pub use supabase::SupabaseTenantClient;
pub use tenant::{TenantClientFactory, TenantConfig, TenantStore, DEFAULT_TENANT};
