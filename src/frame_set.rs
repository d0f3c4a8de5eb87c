//! Ordered, optionally bounded collection of frames.
//!
//! DESIGN
//! ======
//! FIFO by default. An optional comparer lets `sort` reorder in place; it is
//! never applied implicitly. `filter` produces a detached set: same bound and
//! comparer, separate backing storage, so edits to the copy never reach the
//! source.
//!
//! Enqueueing on a full set drops the frame and reports `false`. Back-pressure
//! is the caller's job.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::frame::{Frame, FrameId};

/// Ordering used by [`FrameSet::sort`].
pub type Comparer = Arc<dyn Fn(&Frame, &Frame) -> Ordering + Send + Sync>;

#[derive(Clone, Default)]
pub struct FrameSet {
    frames: VecDeque<Frame>,
    max_size: Option<usize>,
    comparer: Option<Comparer>,
}

impl FrameSet {
    /// Unbounded, unsorted set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set holding at most `max_size` frames.
    #[must_use]
    pub fn bounded(max_size: usize) -> Self {
        Self { max_size: Some(max_size), ..Self::default() }
    }

    #[must_use]
    pub fn with_comparer(mut self, comparer: Comparer) -> Self {
        self.comparer = Some(comparer);
        self
    }

    #[must_use]
    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    // =========================================================================
    // QUEUE OPERATIONS
    // =========================================================================

    /// Append `frame` at the back. Returns `false` and drops it if full.
    pub fn enqueue(&mut self, frame: Frame) -> bool {
        if self.is_full() {
            return false;
        }
        self.frames.push_back(frame);
        true
    }

    /// Remove and return the front frame.
    pub fn dequeue(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }

    #[must_use]
    pub fn front(&self) -> Option<&Frame> {
        self.frames.front()
    }

    #[must_use]
    pub fn back(&self) -> Option<&Frame> {
        self.frames.back()
    }

    /// Remove `frame` by identity.
    pub fn remove(&mut self, frame: &Frame) -> Option<Frame> {
        self.remove_id(frame.id())
    }

    pub fn remove_id(&mut self, id: FrameId) -> Option<Frame> {
        let idx = self.frames.iter().position(|f| f.id() == id)?;
        self.frames.remove(idx)
    }

    /// Drop every frame, returning them in order.
    pub fn clear(&mut self) -> Vec<Frame> {
        self.frames.drain(..).collect()
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    #[must_use]
    pub fn get(&self, id: FrameId) -> Option<&Frame> {
        self.frames.iter().find(|f| f.id() == id)
    }

    pub fn get_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.frames.iter_mut().find(|f| f.id() == id)
    }

    /// New set holding read-only views of the frames matching `predicate`.
    /// Views never settle a caller.
    #[must_use]
    pub fn filter(&self, predicate: impl Fn(&Frame) -> bool) -> FrameSet {
        FrameSet {
            frames: self.frames.iter().filter(|f| predicate(f)).cloned().collect(),
            max_size: self.max_size,
            comparer: self.comparer.clone(),
        }
    }

    /// Stable in-place sort using the comparer. No-op without one.
    pub fn sort(&mut self) {
        let Some(comparer) = &self.comparer else {
            return;
        };
        self.frames
            .make_contiguous()
            .sort_by(|a, b| comparer(a, b));
    }

    /// Iterate in current order. Each call walks the live contents.
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
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
        self.max_size.is_some_and(|max| self.frames.len() >= max)
    }
}

impl<'a> IntoIterator for &'a FrameSet {
    type Item = &'a Frame;
    type IntoIter = std::collections::vec_deque::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

impl std::fmt::Debug for FrameSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSet")
            .field("frames", &self.frames)
            .field("max_size", &self.max_size)
            .field("sorted", &self.comparer.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "frame_set_test.rs"]
mod tests;
