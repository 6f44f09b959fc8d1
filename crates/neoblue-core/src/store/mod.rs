// ── Device state store ──
//
// Last-known-good records with push-based change notification.

mod state_cache;

pub use state_cache::{DevicePhase, StateCache, merge};
