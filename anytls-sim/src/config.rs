use std::time::Duration;

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

/// Configuration for the in-process session simulator.
///
/// All fields default to a perfect endpoint — dials succeed instantly and
/// streams never fail.
#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    // ---
    /// Artificial latency applied to every dial. Lets tests overlap a dial
    /// with a shutdown or a timeout.
    pub dial_delay: Option<Duration>,

    /// When true, every dial fails with a transport error.
    pub fail_dials: bool,

    /// When true, every `open_stream` fails with a transport error.
    pub fail_streams: bool,
}

// ---

impl SimConfig {
    // ---
    /// Perfect endpoint — no impairments. Useful as a baseline.
    pub fn perfect() -> Self {
        Self::default()
    }

    // ---

    /// Endpoint that refuses every dial.
    pub fn broken_dialer() -> Self {
        // ---
        Self {
            fail_dials: true,
            ..Default::default()
        }
    }

    // ---

    /// Endpoint whose sessions come up but cannot open streams.
    pub fn broken_streams() -> Self {
        // ---
        Self {
            fail_streams: true,
            ..Default::default()
        }
    }

    // ---

    /// Endpoint where every dial takes `delay` to complete.
    pub fn slow(delay: Duration) -> Self {
        // ---
        Self {
            dial_delay: Some(delay),
            ..Default::default()
        }
    }
}
