// Adapters layer: HTTP implementations of the domain ports.

pub mod ads;
pub mod google_auth;
pub mod sheets;
