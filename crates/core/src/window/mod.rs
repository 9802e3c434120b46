//! Virtualized rendering of a long, growing list of fixed-height rows.

mod frame;
mod pool;
mod range;
mod renderer;

pub use frame::{FrameScheduler, FrameWrites};
pub use pool::RenderTargetPool;
pub use range::{RangeDiff, VisibleRange};
pub use renderer::{Disposer, RowPresenter, WindowedRenderer};

use thiserror::Error;

/// Random-access list the renderer draws from.
pub trait RowSource {
    type Item;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn item(&self, index: usize) -> Option<Self::Item>;
}

impl<T: Clone> RowSource for Vec<T> {
    type Item = T;

    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn item(&self, index: usize) -> Option<T> {
        self.get(index).cloned()
    }
}

/// Geometry the renderer cannot work with. Fatal at construction.
#[derive(Debug, Error, PartialEq)]
pub enum WindowError {
    #[error("item height must be positive and finite, got {0}")]
    InvalidItemHeight(f64),
    #[error("container height must be non-negative and finite, got {0}")]
    InvalidContainerHeight(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Click,
    DoubleClick,
    Move,
}

/// Row interaction, delivered synchronously from `pointer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowEvent {
    Click(usize),
    DoubleClick(usize),
    Hover(usize),
}
