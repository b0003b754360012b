//! Cart synchronization.
//!
//! [`CartStore`] keeps the local view of the shopper's cart in step with the
//! remote cart through a [`CartGateway`], and remembers the cart ID between
//! sessions through a [`CartPersistence`] slot.

mod gateway;
mod persistence;
mod snapshot;
mod store;

pub use gateway::CartGateway;
pub use persistence::{CartPersistence, FilePersistence, MemoryPersistence, STORAGE_KEY};
pub use snapshot::{CartLine, CartSnapshot, QuantityMismatch};
pub use store::CartStore;
