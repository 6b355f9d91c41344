//! # Network & Gameplay Constants
//!
//! Defaults baked into every build. A `tilebattle.toml` file can override
//! the tunable ones (see [`crate::config`]).
//!
//! **CRITICAL:** Two builds with different [`PROTOCOL_VERSION`]s refuse to
//! play each other.

use std::time::Duration;

// =============================================================================
// NETWORK CONFIGURATION
// =============================================================================

/// Version exchanged in `PlayerData`. Peers must match exactly.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Port the host listens on and the guest dials.
pub const APP_PORT: u16 = 8027;

/// Host bind address (accepts connections from all interfaces)
pub const HOST_BIND: &str = "0.0.0.0:8027";

/// Upper bound for the guest's connect attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(200);

/// Largest frame either peer will accept.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

// =============================================================================
// GAMEPLAY CONFIGURATION
// =============================================================================

/// Local moves buffered between update ticks. Overflow drops the move.
pub const MOVE_QUEUE_CAPACITY: usize = 100;

/// Username used before the player types one.
pub const DEFAULT_USERNAME: &str = "Player";

// =============================================================================
// STATUS LINE TIMINGS
// =============================================================================

/// "Failed to connect to host" stays up this long.
pub const CONNECT_FAIL_CLEAR: Duration = Duration::from_secs(1);

/// "Lost connection with host" stays up this long.
pub const STATUS_CLEAR: Duration = Duration::from_secs(2);

/// One dot is added to the waiting line per interval.
pub const WAITING_DOTS_INTERVAL: Duration = Duration::from_secs(1);

/// The waiting line cycles through 0..=MAX_WAITING_DOTS dots.
pub const MAX_WAITING_DOTS: usize = 3;
