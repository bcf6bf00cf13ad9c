mod connection;
pub mod helpers;
mod migrations;
mod repositories;

pub use connection::Database;
pub use repositories::kv::keys;
