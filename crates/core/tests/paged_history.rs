//! Integration test: page a fixture history into a session in arbitrary
//! order and check lanes, redraws and selection against a one-shot run.

use std::sync::Arc;

use lanegraph_core::model::{CommitId, RowItem, primary_head};
use lanegraph_core::parsers::parse_auto;
use lanegraph_core::{
    CommitSource, GraphConfig, GraphSession, LaneEngine, MemorySource, PageRequest,
};

const FIXTURE: &[u8] = include_bytes!("fixtures/history.json");

fn source() -> MemorySource {
    MemorySource::new(parse_auto(FIXTURE).expect("fixture parses"))
}

fn open(source: &mut MemorySource, rows_visible: f64) -> GraphSession {
    let config = GraphConfig {
        page_size: 4,
        ..GraphConfig::terminal()
    };
    let refs = source.fetch_refs().expect("refs");
    let total = source.count_commits().expect("count");
    let mut session = GraphSession::new(config, &refs, total).expect("session");
    session.resize(rows_visible);
    session
}

fn fetch(source: &mut MemorySource, session: &mut GraphSession, request: PageRequest) {
    let result = source.fetch_commits(request.skip, request.limit);
    session.complete_page(request, result);
}

fn tracks(session: &GraphSession, index: usize) -> Arc<lanegraph_core::model::TrackRow> {
    match session.store().item(index) {
        Some(RowItem::Commit {
            tracks: Some(tracks),
            ..
        }) => tracks,
        other => panic!("row {index} has no lanes: {other:?}"),
    }
}

#[test]
fn out_of_order_pages_match_a_single_pass() {
    let mut src = source();
    let mut session = open(&mut src, 12.0);

    let mut requests = session.pending_requests();
    assert_eq!(requests.len(), 3);
    requests.reverse();

    // Pages 2 and 1 land first; lanes cannot start until page 0 arrives.
    fetch(&mut src, &mut session, requests[0]);
    fetch(&mut src, &mut session, requests[1]);
    assert_eq!(session.engine().next_row(), 0);
    assert!(session.store().is_loaded(11));

    fetch(&mut src, &mut session, requests[2]);
    assert_eq!(session.engine().next_row(), 12);
    assert_eq!(session.engine().open_lanes(), 0);

    let dump = src.dump();
    let head = primary_head(&dump.refs).expect("head").target.clone();
    let commits: Vec<_> = dump.commits.iter().cloned().map(Arc::new).collect();
    let expected = LaneEngine::seeded(head).advance(&commits);
    for (index, row) in expected.iter().enumerate() {
        assert_eq!(*tracks(&session, index), *row, "row {index}");
    }
}

#[test]
fn merges_and_orphan_branches() {
    let mut src = source();
    let mut session = open(&mut src, 12.0);
    for request in session.pending_requests() {
        fetch(&mut src, &mut session, request);
    }

    // The merge at the head opens lane 1 for the feature branch.
    let head = tracks(&session, 0);
    let primary = head.primary().expect("primary");
    assert_eq!(primary.depth, 0);
    assert_eq!(primary.outgoing, vec![0, 1]);

    // The release commit absorbs both lanes.
    let release = tracks(&session, 4);
    assert_eq!(release.primary().expect("primary").incoming, vec![0, 1]);

    // gh-pages shares no history: a fresh tip on the lowest free lane.
    let pages = tracks(&session, 10);
    let tip = pages.primary().expect("primary");
    assert_eq!(tip.depth, 0);
    assert!(tip.incoming.is_empty());

    // Every outgoing column continues into the next row.
    for index in 0..11 {
        let row = tracks(&session, index);
        let next = tracks(&session, index + 1);
        for track in row.occupied() {
            for &k in &track.outgoing {
                assert!(
                    next.occupied().any(|t| t.incoming.contains(&k)),
                    "row {index} lane {k} does not continue"
                );
            }
        }
    }
}

#[test]
fn scrolling_requests_each_page_once() {
    let mut src = source();
    let mut session = open(&mut src, 3.0);

    let first = session.pending_requests();
    assert_eq!(first.iter().map(|r| r.page).collect::<Vec<_>>(), vec![0]);

    // Scroll before page 0 returns: page 0 stays pending, page 2 is new.
    session.scroll_to(11);
    let second = session.pending_requests();
    assert_eq!(second.iter().map(|r| r.page).collect::<Vec<_>>(), vec![2]);
    assert!(session.pending_requests().is_empty());

    for request in first.into_iter().chain(second) {
        fetch(&mut src, &mut session, request);
    }
    // Lanes stop at the gap left by page 1.
    assert_eq!(session.engine().next_row(), 4);
    let gap = session.pending_requests();
    assert_eq!(gap.iter().map(|r| r.page).collect::<Vec<_>>(), vec![1]);
    assert_eq!(src.fetches(), 2);
}

#[test]
fn failed_page_shows_errors_then_recovers() {
    let mut src = source();
    let mut session = open(&mut src, 4.0);
    src.fail_next(1);

    let request = session.pending_requests()[0];
    fetch(&mut src, &mut session, request);
    session.flush_frame();
    assert!(matches!(session.store().item(0), Some(RowItem::Failed(_))));
    let (_, surface) = session.visible_rows().next().expect("bound row");
    assert!(!surface.commands.is_empty());
    assert!(session.pending_requests().is_empty());

    session.retry_failed();
    for request in session.pending_requests() {
        fetch(&mut src, &mut session, request);
    }
    assert!(session.store().is_loaded(0));
    assert_eq!(session.engine().next_row(), 4);
}

#[test]
fn selection_loads_stored_detail() {
    let mut src = source();
    let mut session = open(&mut src, 4.0);
    for request in session.pending_requests() {
        fetch(&mut src, &mut session, request);
    }

    let request = session.select(0).expect("detail request");
    assert_eq!(request.id, CommitId::parse("c0ffee01").expect("valid id"));
    let detail = src.fetch_detail(&request.id);
    assert!(session.complete_detail(request.ticket, detail));

    let detail = session.detail().value().expect("ready");
    assert_eq!(detail.files.len(), 3);
    assert_eq!(detail.total_insertions(), 42);
    assert!(detail.files[2].is_binary());
}
