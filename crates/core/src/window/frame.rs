use std::collections::BTreeMap;

/// Layout writes produced since the last display refresh.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameWrites {
    /// Row index → top offset of the target bound to it.
    pub placements: Vec<(usize, f64)>,
    /// Total scrollable height, when it changed.
    pub content_height: Option<f64>,
}

impl FrameWrites {
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty() && self.content_height.is_none()
    }
}

/// Coalesces layout writes so they are applied at most once per frame.
///
/// A later write for the same row replaces an earlier one that has not been
/// flushed yet.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    placements: BTreeMap<usize, f64>,
    content_height: Option<f64>,
    frames: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(&mut self, index: usize, top: f64) {
        self.placements.insert(index, top);
    }

    pub fn cancel(&mut self, index: usize) {
        self.placements.remove(&index);
    }

    pub fn set_content_height(&mut self, height: f64) {
        self.content_height = Some(height);
    }

    /// Whether the host should request a frame.
    pub fn needs_frame(&self) -> bool {
        !self.placements.is_empty() || self.content_height.is_some()
    }

    /// Drain everything queued for this frame.
    pub fn take(&mut self) -> FrameWrites {
        if self.needs_frame() {
            self.frames += 1;
        }
        FrameWrites {
            placements: std::mem::take(&mut self.placements).into_iter().collect(),
            content_height: self.content_height.take(),
        }
    }

    /// Frames that carried at least one write.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_writes_supersede_earlier_ones() {
        let mut frame = FrameScheduler::new();
        frame.place(3, 144.0);
        frame.place(3, 96.0);
        frame.place(1, 48.0);
        frame.set_content_height(480.0);
        assert!(frame.needs_frame());

        let writes = frame.take();
        assert_eq!(writes.placements, vec![(1, 48.0), (3, 96.0)]);
        assert_eq!(writes.content_height, Some(480.0));
        assert!(!frame.needs_frame());
        assert!(frame.take().is_empty());
        assert_eq!(frame.frames(), 1);
    }

    #[test]
    fn cancelled_rows_are_not_written() {
        let mut frame = FrameScheduler::new();
        frame.place(2, 96.0);
        frame.cancel(2);
        assert!(frame.take().placements.is_empty());
    }
}
