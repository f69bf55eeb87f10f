use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel::{Receiver, Sender};

use crate::shared::constants::{
    ERROR_CAPTURE_FAILED, ERROR_DETECTION_FAILED, STATUS_ANALYZING, STATUS_DETECTION_FAILED,
    STATUS_IDLE,
};
use crate::shared::face_detection::{DetectionResultSet, DetectionSummary};

/// Everything a front end needs to draw the session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    pub camera_on: bool,
    pub detecting: bool,
    pub status_message: String,
    pub error: Option<String>,
    pub detections: Arc<DetectionResultSet>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            camera_on: false,
            detecting: false,
            status_message: STATUS_IDLE.to_string(),
            error: None,
            detections: Arc::new(Vec::new()),
        }
    }
}

/// Change notifications pushed to subscribers.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Status(String),
    Error(Option<String>),
    Camera(bool),
    Detecting(bool),
    Detections(Arc<DetectionResultSet>),
}

/// Identifies one detection cycle: the loop run it belongs to and its
/// position in invocation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleTicket {
    pub generation: u64,
    pub sequence: u64,
}

/// How a detection cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    Completed(DetectionResultSet),
    /// The source stopped being sampleable between the check and the capture.
    NoFrame,
    CaptureFailed,
    Failed,
}

struct Inner {
    state: SessionState,
    /// Last status not set by `begin_cycle`; shown again when a cycle
    /// ends without a result.
    settled_status: String,
    generation: u64,
    last_applied: u64,
}

/// Owner of the mutable [`SessionState`].
///
/// Writers are the detection loop's cycle completions and the session
/// controller; the overlay renderer only reads. Detection results sit behind
/// an `Arc` that is swapped, never mutated, so a reader keeps painting the
/// set it grabbed even if a newer one lands mid-paint.
///
/// Cycle writes are ordered: a completion is applied only if it belongs to
/// the current loop run and is not older than the last applied completion.
pub struct SessionStore {
    inner: Mutex<Inner>,
    next_sequence: AtomicU64,
    subscribers: Mutex<Vec<Sender<SessionEvent>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: SessionState::default(),
                settled_status: STATUS_IDLE.to_string(),
                generation: 0,
                last_applied: 0,
            }),
            next_sequence: AtomicU64::new(1),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        lock(&self.inner).state.clone()
    }

    /// The latest result set. Cheap: clones the `Arc`, not the detections.
    pub fn detections(&self) -> Arc<DetectionResultSet> {
        lock(&self.inner).state.detections.clone()
    }

    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        lock(&self.subscribers).push(tx);
        rx
    }

    pub fn set_status(&self, message: &str) {
        {
            let mut inner = lock(&self.inner);
            inner.state.status_message = message.to_string();
            inner.settled_status = message.to_string();
        }
        self.publish(vec![SessionEvent::Status(message.to_string())]);
    }

    pub fn set_error(&self, error: Option<&str>) {
        let error = error.map(str::to_string);
        lock(&self.inner).state.error = error.clone();
        self.publish(vec![SessionEvent::Error(error)]);
    }

    pub fn set_camera_on(&self, on: bool) {
        lock(&self.inner).state.camera_on = on;
        self.publish(vec![SessionEvent::Camera(on)]);
    }

    pub fn set_detecting(&self, detecting: bool) {
        lock(&self.inner).state.detecting = detecting;
        self.publish(vec![SessionEvent::Detecting(detecting)]);
    }

    /// Camera released: flags off and the visible result set emptied.
    pub fn reset(&self) {
        let empty = Arc::new(Vec::new());
        {
            let mut inner = lock(&self.inner);
            inner.state.camera_on = false;
            inner.state.detecting = false;
            inner.state.detections = empty.clone();
        }
        self.publish(vec![
            SessionEvent::Camera(false),
            SessionEvent::Detecting(false),
            SessionEvent::Detections(empty),
        ]);
    }

    /// Opens a new loop run. Completions from earlier runs are ignored from
    /// now on.
    pub fn begin_generation(&self) -> u64 {
        let mut inner = lock(&self.inner);
        inner.generation += 1;
        inner.generation
    }

    /// Closes the current run so in-flight cycles can no longer write.
    pub fn end_generation(&self) {
        lock(&self.inner).generation += 1;
    }

    /// Marks a cycle as started: `detecting` on and status "analyzing".
    ///
    /// Returns `None` when `generation` has already ended.
    pub fn begin_cycle(&self, generation: u64) -> Option<CycleTicket> {
        {
            let mut inner = lock(&self.inner);
            if inner.generation != generation {
                return None;
            }
            inner.state.detecting = true;
            inner.state.status_message = STATUS_ANALYZING.to_string();
        }
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        self.publish(vec![
            SessionEvent::Detecting(true),
            SessionEvent::Status(STATUS_ANALYZING.to_string()),
        ]);
        Some(CycleTicket {
            generation,
            sequence,
        })
    }

    /// Records a cycle's outcome and clears `detecting`.
    ///
    /// `detecting` is cleared unconditionally; the outcome itself is dropped
    /// when the cycle is stale. Returns whether the outcome was applied.
    pub fn complete_cycle(&self, ticket: CycleTicket, outcome: CycleOutcome) -> bool {
        let mut events = vec![SessionEvent::Detecting(false)];
        let applied = {
            let mut inner = lock(&self.inner);
            inner.state.detecting = false;

            let fresh =
                inner.generation == ticket.generation && ticket.sequence >= inner.last_applied;
            if fresh {
                apply_outcome(&mut inner, ticket, outcome, &mut events);
            }
            fresh
        };
        if !applied {
            log::debug!(
                "Discarding stale detection cycle #{} (run {})",
                ticket.sequence,
                ticket.generation
            );
        }
        self.publish(events);
        applied
    }

    fn publish(&self, events: Vec<SessionEvent>) {
        let mut subscribers = lock(&self.subscribers);
        subscribers.retain(|tx| events.iter().all(|e| tx.send(e.clone()).is_ok()));
    }
}

fn apply_outcome(
    inner: &mut Inner,
    ticket: CycleTicket,
    outcome: CycleOutcome,
    events: &mut Vec<SessionEvent>,
) {
    let state = &mut inner.state;
    match outcome {
        CycleOutcome::Completed(detections) => {
            let summary = DetectionSummary::of(&detections);
            let detections = Arc::new(detections);
            state.detections = detections.clone();
            state.status_message = summary.status_message();
            inner.last_applied = ticket.sequence;
            inner.settled_status = state.status_message.clone();
            events.push(SessionEvent::Detections(detections));
            events.push(SessionEvent::Status(state.status_message.clone()));
        }
        CycleOutcome::NoFrame => {
            if state.status_message == STATUS_ANALYZING {
                state.status_message = inner.settled_status.clone();
                events.push(SessionEvent::Status(state.status_message.clone()));
            }
        }
        CycleOutcome::CaptureFailed => {
            state.error = Some(ERROR_CAPTURE_FAILED.to_string());
            state.status_message = STATUS_DETECTION_FAILED.to_string();
            inner.settled_status = state.status_message.clone();
            events.push(SessionEvent::Error(state.error.clone()));
            events.push(SessionEvent::Status(state.status_message.clone()));
        }
        CycleOutcome::Failed => {
            let empty = Arc::new(Vec::new());
            state.detections = empty.clone();
            state.error = Some(ERROR_DETECTION_FAILED.to_string());
            state.status_message = STATUS_DETECTION_FAILED.to_string();
            inner.last_applied = ticket.sequence;
            inner.settled_status = state.status_message.clone();
            events.push(SessionEvent::Detections(empty));
            events.push(SessionEvent::Error(state.error.clone()));
            events.push(SessionEvent::Status(state.status_message.clone()));
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
