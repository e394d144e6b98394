pub mod address;
pub mod connection;
pub mod migration;
pub mod store;
pub mod transaction;
pub mod wallet;

pub use store::StoreSession;
