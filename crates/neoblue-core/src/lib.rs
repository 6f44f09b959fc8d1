// neoblue-core: Device state coordinator between the radio stack and consumers (CLI, host integrations).

pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod error;
pub mod listener;
pub mod model;
pub mod registry;
pub mod store;
pub mod stream;
pub mod supervisor;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{CoordinatorConfig, DEFAULT_FALLBACK_RSSI};
pub use coordinator::Coordinator;
pub use dispatch::CommandDispatcher;
pub use error::CoreError;
pub use listener::{AdvertisementListener, IgnoreReason, ListenOutcome};
pub use registry::DeviceRegistry;
pub use store::{DevicePhase, StateCache};
pub use stream::{StatusStream, StatusWatchStream};
pub use supervisor::{ConnectionSupervisor, LinkGates};

pub use model::{CoverMotion, CoverState, StatusRecord, StatusUpdate};
