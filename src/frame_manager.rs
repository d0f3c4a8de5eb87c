//! Read/write façade over one `FrameSet`, classifying frames by state.
//!
//! `get_frame` only peeks: admitting the returned frame (moving it to
//! `Active`) is the caller's decision.

use crate::frame::{Frame, FrameId, FrameState};
use crate::frame_set::FrameSet;

#[derive(Debug, Default)]
pub struct FrameManager {
    frames: FrameSet,
}

impl FrameManager {
    #[must_use]
    pub fn new(frames: FrameSet) -> Self {
        Self { frames }
    }

    /// Queue a frame. Returns `false` if the underlying set is full.
    pub fn add_frame(&mut self, frame: Frame) -> bool {
        self.frames.enqueue(frame)
    }

    pub fn remove_frame(&mut self, id: FrameId) -> Option<Frame> {
        self.frames.remove_id(id)
    }

    /// Detached set of frames waiting for admission.
    #[must_use]
    pub fn get_waiting(&self) -> FrameSet {
        self.frames.filter(|f| f.state() == FrameState::Waiting)
    }

    /// Detached set of frames with a call in flight.
    #[must_use]
    pub fn get_active(&self) -> FrameSet {
        self.frames.filter(|f| f.state() == FrameState::Active)
    }

    /// First waiting frame in queue order, without changing its state.
    #[must_use]
    pub fn get_frame(&self) -> Option<&Frame> {
        self.frames
            .iter()
            .find(|f| f.state() == FrameState::Waiting)
    }

    #[must_use]
    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id)
    }

    pub fn frame_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.frames.get_mut(id)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.count(FrameState::Active)
    }

    #[must_use]
    pub fn waiting_count(&self) -> usize {
        self.count(FrameState::Waiting)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.frames.is_full()
    }

    #[must_use]
    pub fn max_size(&self) -> Option<usize> {
        self.frames.max_size()
    }

    /// Drop every frame, returning them in queue order.
    pub fn clear(&mut self) -> Vec<Frame> {
        self.frames.clear()
    }

    fn count(&self, state: FrameState) -> usize {
        self.frames
            .iter()
            .filter(|f| f.state() == state)
            .count()
    }
}

#[cfg(test)]
#[path = "frame_manager_test.rs"]
mod tests;
