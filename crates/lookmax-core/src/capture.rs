//! # Capture Readiness Gate
//!
//! Decides when the capture action is enabled during a live camera session.
//!
//! The gate is a pure state machine. It owns no timers: every transition
//! returns the [`GateEffect`]s the driver must apply (start/stop the probe
//! interval, arm/disarm the failsafe, show a notice). The async driver in
//! the client crate turns those effects into tokio timers and feeds timer
//! expiries and probe results back in.
//!
//! ## Lifecycle
//!
//! ```text
//!                  camera ready                      teardown
//! AwaitingCamera ───────────────► Live ──────────────────────────► Closed
//!       │                          │                                 ▲
//!       │ camera error             │ camera error / switch to upload │
//!       └──────────────► Upload ◄──┘─────────────────────────────────┘
//! ```
//!
//! Upload is terminal for the session: the camera is never probed again
//! until a new gate is created (a reload).

use crate::notice::Notice;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// TIMING
// =============================================================================

/// Period of the repeating detection probe.
pub const PROBE_PERIOD: Duration = Duration::from_secs(1);

/// Delay of the one-shot failsafe that force-enables capture.
pub const FAILSAFE_DELAY: Duration = Duration::from_secs(5);

/// Pause between a stored capture and navigating to the analysis screen.
pub const NAVIGATE_DELAY: Duration = Duration::from_millis(1500);

/// Wait before taking a screenshot when the camera is not yet delivering
/// full frames.
pub const CAMERA_SETTLE_DELAY: Duration = Duration::from_millis(500);

// =============================================================================
// TYPES
// =============================================================================

/// Session mode of the scan screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Waiting for the camera stream.
    AwaitingCamera,
    /// Camera stream is live and being probed.
    Live,
    /// Camera unavailable or declined; photos come from file uploads.
    Upload,
    /// Session torn down.
    Closed,
}

/// Result of one detection probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Face,
    NoFace,
    /// The detector raised an error.
    Failed,
}

/// Work the driver must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEffect {
    StartProbing(Duration),
    ArmFailsafe(Duration),
    StopProbing,
    DisarmFailsafe,
    Notify(Notice),
}

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("action not available in {0:?} mode")]
    WrongMode(Mode),

    #[error("no face detected yet")]
    NoFace,

    #[error("a capture is already in flight")]
    Busy,
}

/// Read-only view of the gate for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateSnapshot {
    pub mode: Mode,
    pub camera_ready: bool,
    pub face_detected: bool,
    pub capturing: bool,
    pub can_capture: bool,
}

// =============================================================================
// CAPTURE GATE
// =============================================================================

/// The capture readiness state machine for one scan session.
#[derive(Debug, Clone)]
pub struct CaptureGate {
    mode: Mode,
    camera_ready: bool,
    face_detected: bool,
    capturing: bool,
    /// Set once the failsafe has fired; negative probes no longer disable
    /// capture afterwards.
    failsafe_fired: bool,
    probing: bool,
    failsafe_armed: bool,
    probes: u64,
}

impl Default for CaptureGate {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureGate {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: Mode::AwaitingCamera,
            camera_ready: false,
            face_detected: false,
            capturing: false,
            failsafe_fired: false,
            probing: false,
            failsafe_armed: false,
            probes: 0,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn face_detected(&self) -> bool {
        self.face_detected
    }

    #[must_use]
    pub fn is_probing(&self) -> bool {
        self.probing
    }

    #[must_use]
    pub fn is_failsafe_armed(&self) -> bool {
        self.failsafe_armed
    }

    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// Number of probe results accepted so far.
    #[must_use]
    pub fn probe_count(&self) -> u64 {
        self.probes
    }

    /// Whether the capture button is enabled.
    #[must_use]
    pub fn can_capture(&self) -> bool {
        self.mode == Mode::Live && self.camera_ready && self.face_detected && !self.capturing
    }

    #[must_use]
    pub fn snapshot(&self) -> GateSnapshot {
        GateSnapshot {
            mode: self.mode,
            camera_ready: self.camera_ready,
            face_detected: self.face_detected,
            capturing: self.capturing,
            can_capture: self.can_capture(),
        }
    }

    // -------------------------------------------------------------------------
    // Camera lifecycle
    // -------------------------------------------------------------------------

    /// The camera stream is delivering frames.
    ///
    /// Starts the probe interval and arms the failsafe. Ignored outside
    /// [`Mode::AwaitingCamera`], so a session that fell back to uploads
    /// never resumes probing.
    pub fn on_camera_ready(&mut self) -> Vec<GateEffect> {
        if self.mode != Mode::AwaitingCamera {
            return Vec::new();
        }
        self.mode = Mode::Live;
        self.camera_ready = true;
        self.probing = true;
        self.failsafe_armed = true;
        vec![
            GateEffect::StartProbing(PROBE_PERIOD),
            GateEffect::ArmFailsafe(FAILSAFE_DELAY),
        ]
    }

    /// The camera stream could not be acquired (permission denied, no
    /// device). Falls back to upload mode and tells the user.
    pub fn on_camera_error(&mut self) -> Vec<GateEffect> {
        match self.mode {
            Mode::AwaitingCamera | Mode::Live => {
                let mut effects = self.enter_upload();
                effects.push(GateEffect::Notify(Notice::camera_unavailable()));
                effects
            }
            Mode::Upload | Mode::Closed => Vec::new(),
        }
    }

    /// The user chose to upload a photo instead of using the camera.
    pub fn switch_to_upload(&mut self) -> Vec<GateEffect> {
        match self.mode {
            Mode::AwaitingCamera => self.enter_upload(),
            Mode::Live if !self.capturing => self.enter_upload(),
            _ => Vec::new(),
        }
    }

    fn enter_upload(&mut self) -> Vec<GateEffect> {
        self.mode = Mode::Upload;
        self.capturing = false;
        self.stop_timers()
    }

    fn stop_timers(&mut self) -> Vec<GateEffect> {
        let mut effects = Vec::new();
        if self.probing {
            self.probing = false;
            effects.push(GateEffect::StopProbing);
        }
        if self.failsafe_armed {
            self.failsafe_armed = false;
            effects.push(GateEffect::DisarmFailsafe);
        }
        effects
    }

    // -------------------------------------------------------------------------
    // Detection
    // -------------------------------------------------------------------------

    /// Record the result of one probe. Returns `true` when `face_detected`
    /// changed.
    ///
    /// A failed probe counts as a detection so a broken detector never
    /// blocks the user.
    pub fn on_probe(&mut self, outcome: ProbeOutcome) -> bool {
        if self.mode != Mode::Live || !self.probing {
            return false;
        }
        self.probes = self.probes.saturating_add(1);

        let detected = match outcome {
            ProbeOutcome::Face | ProbeOutcome::Failed => true,
            ProbeOutcome::NoFace => self.failsafe_fired,
        };
        let changed = detected != self.face_detected;
        self.face_detected = detected;
        changed
    }

    /// The failsafe timer expired. Fires at most once per session and
    /// returns `true` when it forced `face_detected` on.
    pub fn on_failsafe(&mut self) -> bool {
        if !self.failsafe_armed {
            return false;
        }
        self.failsafe_armed = false;
        self.failsafe_fired = true;

        if self.mode == Mode::Live && !self.face_detected {
            self.face_detected = true;
            return true;
        }
        false
    }

    // -------------------------------------------------------------------------
    // Capture
    // -------------------------------------------------------------------------

    /// Start a camera capture. Allowed only while live, with a face detected
    /// and no capture in flight.
    pub fn begin_capture(&mut self) -> Result<(), GateError> {
        if self.mode != Mode::Live {
            return Err(GateError::WrongMode(self.mode));
        }
        if self.capturing {
            return Err(GateError::Busy);
        }
        if !self.face_detected {
            return Err(GateError::NoFace);
        }
        self.capturing = true;
        Ok(())
    }

    /// Start processing an uploaded file.
    pub fn begin_upload(&mut self) -> Result<(), GateError> {
        if self.mode != Mode::Upload {
            return Err(GateError::WrongMode(self.mode));
        }
        if self.capturing {
            return Err(GateError::Busy);
        }
        self.capturing = true;
        Ok(())
    }

    /// The frame was frozen and stored; returns how long to wait before
    /// navigating on. The gate stays busy until the session ends.
    pub fn capture_stored(&self) -> Duration {
        NAVIGATE_DELAY
    }

    /// The camera capture failed; capture becomes available again.
    pub fn capture_failed(&mut self) -> Notice {
        self.capturing = false;
        Notice::capture_failed()
    }

    /// The uploaded file was not accepted; another upload may be tried.
    pub fn upload_failed(&mut self, notice: Notice) -> Notice {
        self.capturing = false;
        notice
    }

    /// Discard a frozen frame and allow another capture.
    pub fn retry(&mut self) {
        if self.mode == Mode::Live || self.mode == Mode::Upload {
            self.capturing = false;
        }
    }

    // -------------------------------------------------------------------------
    // Tear-down
    // -------------------------------------------------------------------------

    /// Close the session, cancelling every armed timer. Idempotent.
    pub fn teardown(&mut self) -> Vec<GateEffect> {
        let effects = self.stop_timers();
        self.mode = Mode::Closed;
        self.capturing = false;
        effects
    }
}

// =============================================================================
// TESTS
// =============================================================================
