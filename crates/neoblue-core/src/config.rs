// ── Runtime coordinator configuration ──
//
// Tuning for one coordinator: which manufacturer id to listen for and how
// long connection-scoped work may take. Never touches disk; the CLI or host
// builds a `CoordinatorConfig` and hands it in.

use std::time::Duration;

use neoblue_api::NEOSMART_MANUFACTURER_ID;

/// Signal strength assumed for a seed record when the radio has no reading.
pub const DEFAULT_FALLBACK_RSSI: i16 = -60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Manufacturer identifier carrying the status payload.
    pub manufacturer_id: u16,
    /// Upper bound on a single transport connect.
    pub connect_timeout: Duration,
    /// Upper bound on writing one command over an open link.
    pub command_timeout: Duration,
    /// How old a stored advertisement may be and still resolve a device
    /// (and prime a freshly created coordinator).
    pub advertisement_recency: Duration,
    /// Seed signal strength when nothing better is known, dBm.
    pub fallback_rssi: i16,
    /// Publish signal-strength updates from frames whose payload failed to
    /// decode.
    pub surface_signal_only: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            manufacturer_id: NEOSMART_MANUFACTURER_ID,
            connect_timeout: Duration::from_secs(15),
            command_timeout: Duration::from_secs(5),
            advertisement_recency: Duration::from_secs(195),
            fallback_rssi: DEFAULT_FALLBACK_RSSI,
            surface_signal_only: true,
        }
    }
}
