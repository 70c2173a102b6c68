//! # Scan Session
//!
//! Async driver for the scan screen.
//!
//! One task owns the camera, the detector and a [`CaptureGate`]. It waits
//! on four event sources at once: the probe interval, the failsafe sleep,
//! the navigation sleep and the command channel. Gate transitions return
//! effects, and this module turns them into tokio timers.
//!
//! ```text
//!   ScanHandle ──commands──► ScanSession::run ──snapshots──► watch
//!                                 │   ▲        ──notices────► mpsc
//!                      probe/tick │   │ outcome
//!                                 ▼   │
//!                           Camera + FaceDetector
//! ```

use crate::session::SessionStore;
use lookmax_core::capture::CAMERA_SETTLE_DELAY;
use lookmax_core::{
    CaptureGate, FaceDetector, Frame, GateEffect, GateSnapshot, Notice, ProbeOutcome,
    check_upload_size,
};
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, info, warn};

// =============================================================================
// CAMERA
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("camera access denied")]
    PermissionDenied,

    #[error("no camera available")]
    NotFound,

    #[error("failed to grab a frame: {0}")]
    Frame(String),
}

/// A live video source.
pub trait Camera {
    /// Acquire the stream.
    fn open(&mut self) -> Result<(), CameraError>;

    /// Whether the stream is delivering full frames yet.
    fn has_enough_data(&self) -> bool;

    /// Current frame, for detection probes.
    fn current_frame(&mut self) -> Result<Frame, CameraError>;

    /// Still screenshot, for the capture itself.
    fn screenshot(&mut self) -> Result<Frame, CameraError>;

    /// Release the stream.
    fn close(&mut self);
}

/// A file picked in upload mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

// =============================================================================
// COMMANDS / OUTCOME
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanCommand {
    /// Press the capture button.
    Capture,
    /// Use file upload instead of the camera.
    SwitchToUpload,
    /// Submit a picked file.
    Upload(UploadedFile),
    /// Discard the frozen frame.
    Retry,
    /// Leave the scan screen.
    Exit,
}

/// How a scan session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// An image was stored in session storage; go to the analysis screen.
    Captured { image: String },
    /// The user left (or the handle was dropped).
    Exited,
}

/// The caller's side of a running session.
#[derive(Debug)]
pub struct ScanHandle {
    pub commands: mpsc::Sender<ScanCommand>,
    pub state: watch::Receiver<GateSnapshot>,
    pub notices: mpsc::UnboundedReceiver<Notice>,
}

impl ScanHandle {
    /// Send a command; `false` once the session has ended.
    pub async fn send(&self, command: ScanCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub fn snapshot(&self) -> GateSnapshot {
        *self.state.borrow()
    }
}

// =============================================================================
// TIMERS
// =============================================================================

struct Timers {
    probe: Option<Interval>,
    failsafe: Pin<Box<Sleep>>,
    failsafe_armed: bool,
    navigate: Pin<Box<Sleep>>,
    pending: Option<String>,
}

impl Timers {
    fn new() -> Self {
        Self {
            probe: None,
            failsafe: Box::pin(tokio::time::sleep(Duration::ZERO)),
            failsafe_armed: false,
            navigate: Box::pin(tokio::time::sleep(Duration::ZERO)),
            pending: None,
        }
    }

    fn start_probing(&mut self, period: Duration) {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        // A slow probe pushes the next one back instead of bursting.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.probe = Some(interval);
    }

    fn arm_failsafe(&mut self, delay: Duration) {
        self.failsafe.as_mut().reset(Instant::now() + delay);
        self.failsafe_armed = true;
    }

    fn navigate_after(&mut self, delay: Duration, image: String) {
        self.navigate.as_mut().reset(Instant::now() + delay);
        self.pending = Some(image);
    }
}

async fn next_probe(probe: &mut Option<Interval>) {
    match probe {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

// =============================================================================
// SESSION
// =============================================================================

struct Driver<C, D> {
    camera: C,
    detector: D,
    session: SessionStore,
    gate: CaptureGate,
    state: watch::Sender<GateSnapshot>,
    notices: mpsc::UnboundedSender<Notice>,
}

/// One visit to the scan screen.
pub struct ScanSession<C, D> {
    driver: Driver<C, D>,
    commands: mpsc::Receiver<ScanCommand>,
}

impl<C: Camera, D: FaceDetector> ScanSession<C, D> {
    pub fn new(camera: C, detector: D, session: SessionStore) -> (Self, ScanHandle) {
        let gate = CaptureGate::new();
        let (command_tx, command_rx) = mpsc::channel(16);
        let (state_tx, state_rx) = watch::channel(gate.snapshot());
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let scan = Self {
            driver: Driver {
                camera,
                detector,
                session,
                gate,
                state: state_tx,
                notices: notice_tx,
            },
            commands: command_rx,
        };
        let handle = ScanHandle {
            commands: command_tx,
            state: state_rx,
            notices: notice_rx,
        };
        (scan, handle)
    }

    /// Run until an image is stored and the navigation delay elapses, or
    /// until the user exits. Every timer is cancelled on return.
    pub async fn run(self) -> ScanOutcome {
        let ScanSession {
            mut driver,
            mut commands,
        } = self;
        let mut timers = Timers::new();

        let effects = match driver.camera.open() {
            Ok(()) => {
                info!("camera ready");
                driver.gate.on_camera_ready()
            }
            Err(e) => {
                warn!(error = %e, "camera unavailable, switching to upload");
                driver.gate.on_camera_error()
            }
        };
        driver.apply(effects, &mut timers);
        driver.publish();

        let outcome = loop {
            tokio::select! {
                () = next_probe(&mut timers.probe) => driver.probe(),
                () = &mut timers.failsafe, if timers.failsafe_armed => {
                    timers.failsafe_armed = false;
                    if driver.gate.on_failsafe() {
                        info!("enabling capture as fallback");
                    }
                    driver.publish();
                }
                () = &mut timers.navigate, if timers.pending.is_some() => {
                    if let Some(image) = timers.pending.take() {
                        break ScanOutcome::Captured { image };
                    }
                }
                command = commands.recv() => match command {
                    None | Some(ScanCommand::Exit) => break ScanOutcome::Exited,
                    Some(command) => driver.handle(command, &mut timers).await,
                },
            }
        };

        let effects = driver.gate.teardown();
        driver.apply(effects, &mut timers);
        driver.camera.close();
        driver.publish();
        debug!(?outcome, "scan session closed");
        outcome
    }
}

impl<C: Camera, D: FaceDetector> Driver<C, D> {
    fn publish(&self) {
        self.state.send_replace(self.gate.snapshot());
    }

    fn notify(&self, notice: Notice) {
        // The receiver may be gone when nobody renders notices.
        let _ = self.notices.send(notice);
    }

    fn apply(&self, effects: Vec<GateEffect>, timers: &mut Timers) {
        for effect in effects {
            debug!(?effect, "gate effect");
            match effect {
                GateEffect::StartProbing(period) => timers.start_probing(period),
                GateEffect::ArmFailsafe(delay) => timers.arm_failsafe(delay),
                GateEffect::StopProbing => timers.probe = None,
                GateEffect::DisarmFailsafe => timers.failsafe_armed = false,
                GateEffect::Notify(notice) => self.notify(notice),
            }
        }
    }

    fn probe(&mut self) {
        let outcome = match self.camera.current_frame() {
            Ok(frame) => match self.detector.detect(&frame) {
                Ok(Some(_)) => ProbeOutcome::Face,
                Ok(None) => ProbeOutcome::NoFace,
                Err(e) => {
                    warn!(error = %e, "face detection error");
                    ProbeOutcome::Failed
                }
            },
            Err(e) => {
                warn!(error = %e, "face detection error");
                ProbeOutcome::Failed
            }
        };
        if self.gate.on_probe(outcome) {
            debug!(?outcome, face = self.gate.face_detected(), "face detection changed");
            self.publish();
        }
    }

    async fn handle(&mut self, command: ScanCommand, timers: &mut Timers) {
        match command {
            ScanCommand::Capture => self.capture(timers).await,
            ScanCommand::SwitchToUpload => {
                let effects = self.gate.switch_to_upload();
                self.apply(effects, timers);
            }
            ScanCommand::Upload(file) => self.upload(file, timers),
            ScanCommand::Retry => {
                self.gate.retry();
                if timers.pending.take().is_some() {
                    self.session.remove(crate::session::CAPTURED_IMAGE_KEY);
                }
            }
            ScanCommand::Exit => {}
        }
        self.publish();
    }

    async fn capture(&mut self, timers: &mut Timers) {
        if let Err(e) = self.gate.begin_capture() {
            debug!(error = %e, "capture refused");
            return;
        }
        self.publish();

        if !self.camera.has_enough_data() {
            tokio::time::sleep(CAMERA_SETTLE_DELAY).await;
        }
        match self.camera.screenshot() {
            Ok(frame) => self.store(&frame, timers),
            Err(e) => {
                warn!(error = %e, "capture error");
                let notice = self.gate.capture_failed();
                self.notify(notice);
            }
        }
    }

    fn upload(&mut self, file: UploadedFile, timers: &mut Timers) {
        if let Err(e) = check_upload_size(file.bytes.len()) {
            warn!(file = %file.name, error = %e, "upload rejected");
            self.notify(Notice::file_too_large());
            return;
        }
        if let Err(e) = self.gate.begin_upload() {
            debug!(error = %e, "upload refused");
            return;
        }

        let frame = Frame::new(file.mime, file.bytes);
        match self.detector.detect(&frame) {
            Ok(Some(_)) => self.store(&frame, timers),
            Ok(None) => {
                let notice = self.gate.upload_failed(Notice::no_face_detected());
                self.notify(notice);
            }
            Err(e) => {
                warn!(file = %file.name, error = %e, "upload error");
                let notice = self.gate.upload_failed(Notice::upload_failed());
                self.notify(notice);
            }
        }
    }

    fn store(&mut self, frame: &Frame, timers: &mut Timers) {
        let image = frame.to_data_uri();
        self.session.set_captured_image(&image);
        info!(bytes = frame.bytes.len(), "image stored");
        timers.navigate_after(self.gate.capture_stored(), image);
    }
}

// =============================================================================
// TESTS
// =============================================================================
