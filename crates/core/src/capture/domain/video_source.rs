use crate::shared::frame::Frame;

/// How much decoded media a source has buffered, ordered from least to most.
///
/// Mirrors the HTML media `readyState` scale so adapters over browser-like
/// players can map one-to-one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    HaveEnoughData = 4,
}

impl ReadyState {
    /// Minimum state at which the current frame is decoded and stable.
    pub const SAMPLEABLE: ReadyState = ReadyState::HaveFutureData;

    pub fn is_sampleable(self) -> bool {
        self >= Self::SAMPLEABLE
    }
}

/// A live video stream granted by a [`Camera`](super::camera::Camera).
///
/// Everything is polled: callers ask for sizes and readiness every time
/// instead of caching them, since a live source can change under them.
pub trait VideoSource: Send + Sync {
    fn ready_state(&self) -> ReadyState;

    /// Decoded frame resolution.
    fn native_size(&self) -> (u32, u32);

    /// Size the video currently occupies on screen. `(0, 0)` when hidden.
    fn displayed_size(&self) -> (u32, u32);

    /// The frame currently being presented, at native resolution.
    fn current_frame(&self) -> Option<Frame>;

    /// Stops every track of the underlying stream. Idempotent.
    fn stop(&self);

    fn is_live(&self) -> bool;
}
