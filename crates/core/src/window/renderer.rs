use std::collections::BTreeMap;

use spark_signals::{Derived, Signal, derived, signal};
use tracing::{trace, warn};

use super::{
    FrameScheduler, FrameWrites, PointerKind, RangeDiff, RenderTargetPool, RowEvent, RowSource,
    VisibleRange, WindowError,
};

/// Undoes a presenter's bindings before its target is reused.
pub type Disposer<T> = Box<dyn FnOnce(&mut T)>;

type RangeFn = Box<dyn Fn() -> VisibleRange>;

/// Draws one row into a reusable render target.
///
/// Presenting the same item again must leave the target in the same state;
/// the renderer skips such calls anyway, but a presenter may not rely on it.
pub trait RowPresenter {
    type Item: PartialEq;
    type Target;

    fn create_target(&mut self) -> Self::Target;

    fn present(
        &mut self,
        index: usize,
        item: &Self::Item,
        target: &mut Self::Target,
    ) -> Disposer<Self::Target>;

    /// Move the target to its absolute vertical offset.
    fn place(&mut self, target: &mut Self::Target, top: f64);

    /// Take the target off screen before it returns to the pool.
    fn detach(&mut self, _target: &mut Self::Target) {}
}

struct Binding<P: RowPresenter> {
    item: P::Item,
    target: P::Target,
    disposer: Option<Disposer<P::Target>>,
}

impl<P: RowPresenter> Binding<P> {
    fn dispose(&mut self) {
        if let Some(disposer) = self.disposer.take() {
            disposer(&mut self.target);
        }
    }
}

/// Renders only the rows inside the viewport, recycling targets as rows
/// scroll in and out.
pub struct WindowedRenderer<P: RowPresenter> {
    presenter: P,
    item_height: f64,
    item_count: Signal<usize>,
    container_height: Signal<f64>,
    scroll_offset: Signal<f64>,
    range: Derived<VisibleRange>,
    current: VisibleRange,
    bindings: BTreeMap<usize, Binding<P>>,
    pool: RenderTargetPool<P::Target>,
    frame: FrameScheduler,
    listener: Option<Box<dyn FnMut(RowEvent)>>,
    hovered: Option<usize>,
    presents: u64,
}

impl<P: RowPresenter> WindowedRenderer<P> {
    pub fn new(presenter: P, item_height: f64, container_height: f64) -> Result<Self, WindowError> {
        if !item_height.is_finite() || item_height <= 0.0 {
            return Err(WindowError::InvalidItemHeight(item_height));
        }
        if !container_height.is_finite() || container_height < 0.0 {
            return Err(WindowError::InvalidContainerHeight(container_height));
        }
        let item_count = signal(0usize);
        let container_height = signal(container_height);
        let scroll_offset = signal(0.0f64);
        let range: RangeFn = {
            let (count, height, scroll) = (
                item_count.clone(),
                container_height.clone(),
                scroll_offset.clone(),
            );
            Box::new(move || {
                VisibleRange::compute(scroll.get(), height.get(), item_height, count.get())
            })
        };
        Ok(Self {
            presenter,
            item_height,
            item_count,
            container_height,
            scroll_offset,
            range: derived(range),
            current: VisibleRange::EMPTY,
            bindings: BTreeMap::new(),
            pool: RenderTargetPool::new(),
            frame: FrameScheduler::new(),
            listener: None,
            hovered: None,
            presents: 0,
        })
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn item_height(&self) -> f64 {
        self.item_height
    }

    pub fn item_count(&self) -> usize {
        self.item_count.get()
    }

    pub fn container_height(&self) -> f64 {
        self.container_height.get()
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset.get()
    }

    /// Range as of the last `update`.
    pub fn visible_range(&self) -> VisibleRange {
        self.current
    }

    pub fn max_scroll(&self) -> f64 {
        (self.item_count() as f64 * self.item_height - self.container_height()).max(0.0)
    }

    /// Number of times the presenter has been asked to draw a row.
    pub fn presents(&self) -> u64 {
        self.presents
    }

    pub fn pool(&self) -> &RenderTargetPool<P::Target> {
        &self.pool
    }

    pub fn bound_indices(&self) -> Vec<usize> {
        self.bindings.keys().copied().collect()
    }

    pub fn target(&self, index: usize) -> Option<&P::Target> {
        self.bindings.get(&index).map(|b| &b.target)
    }

    /// Register the handler for click, double-click and hover events.
    pub fn on_event(&mut self, listener: impl FnMut(RowEvent) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// The list only grows; a smaller count is ignored.
    pub fn set_item_count(&mut self, count: usize) -> bool {
        let current = self.item_count();
        if count < current {
            warn!(current, count, "ignoring shrinking item count");
            return false;
        }
        if count == current {
            return false;
        }
        self.item_count.set(count);
        self.frame
            .set_content_height(count as f64 * self.item_height);
        self.set_scroll_offset(self.scroll_offset());
        true
    }

    /// Resize the viewport. The scroll offset is re-clamped so a taller
    /// viewport pulls earlier rows into view.
    pub fn set_container_height(&mut self, height: f64) -> bool {
        if !height.is_finite() || height < 0.0 {
            warn!(height, "ignoring invalid container height");
            return false;
        }
        if height == self.container_height() {
            return false;
        }
        self.container_height.set(height);
        self.set_scroll_offset(self.scroll_offset());
        true
    }

    /// Set the scroll offset, clamped to `[0, max_scroll]`.
    pub fn set_scroll_offset(&mut self, offset: f64) -> bool {
        let offset = if offset.is_finite() { offset } else { 0.0 };
        let clamped = offset.clamp(0.0, self.max_scroll());
        if clamped == self.scroll_offset() {
            return false;
        }
        self.scroll_offset.set(clamped);
        true
    }

    pub fn scroll_by(&mut self, delta: f64) -> bool {
        self.set_scroll_offset(self.scroll_offset() + delta)
    }

    /// Scroll just enough to bring `index` fully into view.
    pub fn scroll_to(&mut self, index: usize) -> bool {
        let index = index.min(self.item_count().saturating_sub(1));
        let item_top = index as f64 * self.item_height;
        let item_bottom = item_top + self.item_height;
        let scroll = self.scroll_offset();
        let height = self.container_height();

        if item_top < scroll {
            self.set_scroll_offset(item_top)
        } else if item_bottom > scroll + height {
            self.set_scroll_offset(item_bottom - height)
        } else {
            false
        }
    }

    /// Row under a pointer at `pointer_y`, measured from the viewport top.
    pub fn index_at(&self, pointer_y: f64) -> Option<usize> {
        if !pointer_y.is_finite() || pointer_y < 0.0 {
            return None;
        }
        let index = ((self.scroll_offset() + pointer_y) / self.item_height).floor() as usize;
        (index < self.item_count()).then_some(index)
    }

    /// Map a pointer event to a row and notify the listener right away.
    pub fn pointer(&mut self, kind: PointerKind, pointer_y: f64) -> Option<usize> {
        let index = self.index_at(pointer_y);
        let event = match (kind, index) {
            (_, None) => {
                if kind == PointerKind::Move {
                    self.hovered = None;
                }
                return None;
            }
            (PointerKind::Click, Some(i)) => RowEvent::Click(i),
            (PointerKind::DoubleClick, Some(i)) => RowEvent::DoubleClick(i),
            (PointerKind::Move, Some(i)) => {
                if self.hovered == Some(i) {
                    return index;
                }
                self.hovered = Some(i);
                RowEvent::Hover(i)
            }
        };
        if let Some(listener) = self.listener.as_mut() {
            listener(event);
        }
        index
    }

    /// Pull the current inputs and re-render if the visible range moved.
    ///
    /// Returns the applied diff, or `None` when the range is unchanged.
    pub fn update<S>(&mut self, source: &S) -> Option<RangeDiff>
    where
        S: RowSource<Item = P::Item>,
    {
        self.set_item_count(source.len());

        let range = self.range.get();
        if range == self.current {
            return None;
        }

        let old = std::mem::replace(&mut self.current, range);
        Some(self.on_range_change(old, range, source))
    }

    fn on_range_change<S>(&mut self, old: VisibleRange, new: VisibleRange, source: &S) -> RangeDiff
    where
        S: RowSource<Item = P::Item>,
    {
        let diff = VisibleRange::diff(old, new);
        for &index in &diff.removed {
            self.release(index);
        }
        for &index in &diff.added {
            self.bind(index, source);
        }
        trace!(
            start = new.start,
            end = new.end,
            removed = diff.removed.len(),
            bound = self.bindings.len(),
            "visible range changed"
        );
        diff
    }

    /// Re-bind the visible rows among `indices` whose item changed.
    ///
    /// Returns how many rows were presented again.
    pub fn invalidate<S>(&mut self, indices: impl IntoIterator<Item = usize>, source: &S) -> usize
    where
        S: RowSource<Item = P::Item>,
    {
        let mut rebound = 0;
        for index in indices {
            if self.current.contains(index) && self.bind(index, source) {
                rebound += 1;
            }
        }
        rebound
    }

    /// Apply queued layout writes. Call once per display refresh.
    pub fn flush_frame(&mut self) -> FrameWrites {
        let writes = self.frame.take();
        for &(index, top) in &writes.placements {
            if let Some(binding) = self.bindings.get_mut(&index) {
                self.presenter.place(&mut binding.target, top);
            }
        }
        writes
    }

    pub fn needs_frame(&self) -> bool {
        self.frame.needs_frame()
    }

    /// Bind `index` to a target unless it already shows an equal item.
    fn bind<S>(&mut self, index: usize, source: &S) -> bool
    where
        S: RowSource<Item = P::Item>,
    {
        let Some(item) = source.item(index) else {
            self.release(index);
            return false;
        };

        let mut target = match self.bindings.remove(&index) {
            Some(existing) if existing.item == item => {
                self.bindings.insert(index, existing);
                return false;
            }
            Some(mut existing) => {
                existing.dispose();
                existing.target
            }
            None => self.pool.allocate(|| self.presenter.create_target()),
        };

        let disposer = self.presenter.present(index, &item, &mut target);
        self.presents += 1;
        self.frame.place(index, index as f64 * self.item_height);
        self.bindings.insert(
            index,
            Binding {
                item,
                target,
                disposer: Some(disposer),
            },
        );
        true
    }

    fn release(&mut self, index: usize) {
        if let Some(mut binding) = self.bindings.remove(&index) {
            binding.dispose();
            self.presenter.detach(&mut binding.target);
            self.frame.cancel(index);
            self.pool.release(binding.target);
        }
    }
}
