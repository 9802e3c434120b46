use std::ops::Range;

/// Half-open interval of row indices currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
}

impl VisibleRange {
    pub const EMPTY: VisibleRange = VisibleRange { start: 0, end: 0 };

    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end,
        }
    }

    /// Rows intersecting the viewport `[scroll_offset, scroll_offset +
    /// container_height)`, clamped to `[0, item_count]`.
    pub fn compute(
        scroll_offset: f64,
        container_height: f64,
        item_height: f64,
        item_count: usize,
    ) -> Self {
        if !item_height.is_finite() || item_height <= 0.0 {
            return Self::EMPTY;
        }
        let scroll = non_negative(scroll_offset);
        let height = non_negative(container_height);

        // Float → usize casts saturate, so huge offsets clamp to `item_count`.
        let start = (scroll / item_height).floor() as usize;
        let end = (((scroll + height) / item_height).ceil() as usize).min(item_count);
        Self::new(start, end)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }

    pub fn iter(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Rows to (re)bind and rows to release when moving from `old` to `new`.
    ///
    /// `added` is all of `new`: rows that were already visible are re-checked
    /// for content changes by the caller. `removed` is `old \ new`.
    pub fn diff(old: VisibleRange, new: VisibleRange) -> RangeDiff {
        RangeDiff {
            added: new.iter().collect(),
            removed: old.iter().filter(|&i| !new.contains(i)).collect(),
        }
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RangeDiff {
    pub added: Vec<usize>,
    pub removed: Vec<usize>,
}
