pub mod memory;
pub mod postgres;
pub mod sweeper;

pub use memory::InMemoryTokenCache;
pub use postgres::PostgresTokenCache;
pub use sweeper::spawn_cleanup_task;
