//! One open history view: paging, lanes, the window and the selection.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;

use lanegraph_protocol::{Point, Rect, RenderCommand, Viewport};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ConfigError, GraphConfig};
use crate::content::{LatestRequest, Ticket};
use crate::lanes::LaneEngine;
use crate::model::{Commit, CommitDetail, CommitId, Ref, primary_head};
use crate::presenter::{GraphRowPresenter, RowSurface};
use crate::source::FetchError;
use crate::store::{CommitStore, PageTracker};
use crate::window::{
    FrameWrites, PointerKind, RowEvent, VisibleRange, WindowError, WindowedRenderer,
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Window(#[from] WindowError),
}

/// A page the front end should fetch with
/// [`CommitSource::fetch_commits`](crate::source::CommitSource::fetch_commits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub skip: usize,
    pub limit: usize,
}

/// Detail the front end should fetch for the newly selected commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub ticket: Ticket,
    pub id: CommitId,
}

pub struct GraphSession {
    config: GraphConfig,
    store: CommitStore,
    pages: PageTracker,
    /// Pages whose last fetch failed; not re-requested until `retry_failed`.
    failed: BTreeSet<usize>,
    engine: LaneEngine,
    renderer: WindowedRenderer<GraphRowPresenter>,
    events: Rc<RefCell<VecDeque<RowEvent>>>,
    selected: Option<usize>,
    hovered: Option<usize>,
    detail: LatestRequest<CommitId, CommitDetail>,
}

impl GraphSession {
    /// Open a view over `total` rows. Lane 0 is seeded with the primary
    /// branch head among `refs`.
    pub fn new(config: GraphConfig, refs: &[Ref], total: usize) -> Result<Self, SessionError> {
        config.validate()?;

        let engine = match primary_head(refs) {
            Some(head) => {
                debug!(head = head.target.short(), name = %head.name, "seeding lanes");
                LaneEngine::seeded(head.target.clone())
            }
            None => LaneEngine::new(),
        };

        let mut store = CommitStore::new(config.page_size);
        store.extend_to(total);

        let mut renderer = WindowedRenderer::new(
            GraphRowPresenter::new(config.clone()),
            config.row_height,
            0.0,
        )?;
        let events = Rc::new(RefCell::new(VecDeque::new()));
        let sink = events.clone();
        renderer.on_event(move |event| sink.borrow_mut().push_back(event));
        renderer.update(&store);

        Ok(Self {
            config,
            store,
            pages: PageTracker::new(),
            failed: BTreeSet::new(),
            engine,
            renderer,
            events,
            selected: None,
            hovered: None,
            detail: LatestRequest::new(),
        })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn store(&self) -> &CommitStore {
        &self.store
    }

    pub fn engine(&self) -> &LaneEngine {
        &self.engine
    }

    pub fn renderer(&self) -> &WindowedRenderer<GraphRowPresenter> {
        &self.renderer
    }

    pub fn visible_range(&self) -> VisibleRange {
        self.renderer.visible_range()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn detail(&self) -> &LatestRequest<CommitId, CommitDetail> {
        &self.detail
    }

    pub fn pending_pages(&self) -> usize {
        self.pages.pending_count()
    }

    pub fn failed_pages(&self) -> usize {
        self.failed.len()
    }

    /// New page fetches needed for the visible rows, plus the page the lane
    /// engine is waiting on when the visible rows lie past it. Each page is
    /// returned once until it completes or fails.
    pub fn pending_requests(&mut self) -> Vec<PageRequest> {
        self.renderer.update(&self.store);
        let range = self.renderer.visible_range();

        let mut wanted = BTreeSet::new();
        if !range.is_empty() {
            let first = self.store.page_of(range.start);
            let last = self.store.page_of(range.end - 1);
            wanted.extend(first..=last);

            let resume = self.engine.next_row();
            if resume < range.end && resume < self.store.len() {
                wanted.insert(self.store.page_of(resume));
            }
        }

        let page_size = self.store.page_size();
        let requests: Vec<PageRequest> = wanted
            .into_iter()
            .filter(|page| !self.failed.contains(page))
            .filter(|&page| self.pages.request(page))
            .map(|page| PageRequest {
                page,
                skip: page * page_size,
                limit: page_size,
            })
            .collect();
        if !requests.is_empty() {
            debug!(pages = ?requests.iter().map(|r| r.page).collect::<Vec<_>>(), "requesting pages");
        }
        requests
    }

    /// Apply a page fetch result. Returns how many visible rows were redrawn.
    ///
    /// Stored rows are passed through the lane engine as soon as they extend
    /// the contiguous loaded prefix; later pages wait in the store.
    pub fn complete_page(
        &mut self,
        request: PageRequest,
        result: Result<Vec<Commit>, FetchError>,
    ) -> usize {
        let mut changed = match result {
            Ok(commits) => {
                self.pages.complete(request.page);
                self.failed.remove(&request.page);
                self.store.fill_page(request.page, commits)
            }
            Err(err) => {
                warn!(page = request.page, error = %err, "page fetch failed");
                self.pages.fail(request.page);
                self.failed.insert(request.page);
                self.store.fail_page(request.page, &err.to_string())
            }
        };

        let laned = self.engine.advance_store(&mut self.store);
        changed.extend(laned);
        changed.sort_unstable();
        changed.dedup();

        self.renderer.update(&self.store);
        self.renderer.invalidate(changed, &self.store)
    }

    /// Allow failed pages to be requested again.
    pub fn retry_failed(&mut self) -> usize {
        let count = self.failed.len();
        self.failed.clear();
        count
    }

    pub fn resize(&mut self, height: f64) {
        self.renderer.set_container_height(height);
        self.renderer.update(&self.store);
    }

    pub fn scroll_by(&mut self, delta: f64) {
        self.renderer.scroll_by(delta);
        self.renderer.update(&self.store);
    }

    pub fn scroll_to(&mut self, index: usize) {
        self.renderer.scroll_to(index);
        self.renderer.update(&self.store);
    }

    /// Feed a pointer event at `y` (relative to the viewport top). A click
    /// selects the row under the pointer.
    pub fn pointer(&mut self, kind: PointerKind, y: f64) -> Option<DetailRequest> {
        self.renderer.pointer(kind, y);
        if kind == PointerKind::Move && self.renderer.index_at(y).is_none() {
            self.hovered = None;
        }

        let mut request = None;
        let pending = std::mem::take(&mut *self.events.borrow_mut());
        for event in pending {
            match event {
                RowEvent::Hover(index) => self.hovered = Some(index),
                RowEvent::Click(index) | RowEvent::DoubleClick(index) => {
                    request = self.select(index);
                }
            }
        }
        request
    }

    /// Select `index`, scroll it into view and start loading its detail.
    ///
    /// Returns `None` when the row has no commit yet; any previous detail is
    /// dropped in that case.
    pub fn select(&mut self, index: usize) -> Option<DetailRequest> {
        if index >= self.store.len() {
            return None;
        }
        self.selected = Some(index);
        self.scroll_to(index);

        let Some(commit) = self.store.commit(index) else {
            self.detail.clear();
            return None;
        };
        if self.detail.key() == Some(&commit.id) {
            return None;
        }
        let id = commit.id.clone();
        let ticket = self.detail.request(id.clone());
        Some(DetailRequest { ticket, id })
    }

    /// Move the selection by `delta` rows, clamped to the history.
    pub fn move_selection(&mut self, delta: isize) -> Option<DetailRequest> {
        let last = self.store.len().checked_sub(1)?;
        let target = match self.selected {
            Some(current) => current.saturating_add_signed(delta).min(last),
            None => self.visible_range().start.min(last),
        };
        self.select(target)
    }

    /// Apply a detail fetch. Stale tickets are ignored.
    pub fn complete_detail(
        &mut self,
        ticket: Ticket,
        result: Result<CommitDetail, FetchError>,
    ) -> bool {
        self.detail.complete(ticket, result)
    }

    /// Apply queued row placements. Call once per redraw.
    pub fn flush_frame(&mut self) -> FrameWrites {
        self.renderer.flush_frame()
    }

    /// Bound rows in index order.
    pub fn visible_rows(&self) -> impl Iterator<Item = (usize, &RowSurface)> {
        self.renderer
            .bound_indices()
            .into_iter()
            .filter_map(|index| self.renderer.target(index).map(|t| (index, t)))
    }

    /// The visible window at the current scroll offset, `width` wide.
    pub fn viewport(&self, width: f64) -> Viewport {
        Viewport {
            y: self.renderer.scroll_offset(),
            ..Viewport::new(width, self.renderer.container_height())
        }
    }

    /// Commands for `viewport`, each bound row translated to its place
    /// relative to the viewport top and clipped to the viewport.
    pub fn scene_commands(&self, viewport: &Viewport) -> Vec<RenderCommand> {
        let mut commands = vec![RenderCommand::SetClip {
            rect: Rect::new(0.0, 0.0, viewport.width, viewport.height),
        }];
        for (_, surface) in self.visible_rows() {
            commands.push(RenderCommand::PushTransform {
                translate: Point::new(viewport.x, surface.top - viewport.y),
                scale: Point::new(1.0, 1.0),
            });
            commands.extend(surface.commands.iter().cloned());
            commands.push(RenderCommand::PopTransform);
        }
        commands.push(RenderCommand::ClearClip);
        commands
    }
}
