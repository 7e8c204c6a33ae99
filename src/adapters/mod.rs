// Adapters layer: concrete implementations for external systems.

pub mod auth;
pub mod firestore;
pub mod probe;
