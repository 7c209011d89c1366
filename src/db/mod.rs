//! Persistence: the `UserStore` seam with Postgres and in-memory backends.

mod memory;
mod pool;
mod repositories;
mod store;

pub use memory::MemoryUserStore;
pub use pool::{create_pool, ensure_schema, DbPool};
pub use repositories::PgUserStore;
pub use store::UserStore;
