use serde::{Deserialize, Serialize};

/// How a lane is drawn at a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// No real commit has occupied the lane yet.
    Hidden,
    /// First real commit on the lane; drawn with a dashed lead-in.
    Emerging,
    Established,
}

/// One lane's passage through one row.
///
/// `incoming` lists the columns whose curves enter this row from above and
/// end at this track; `outgoing` lists the columns this track's curves
/// leave through at the bottom of the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub depth: usize,
    pub visibility: Visibility,
    pub incoming: Vec<usize>,
    pub outgoing: Vec<usize>,
    /// Whether the commit node is drawn on this track.
    pub active: bool,
}

impl Track {
    pub fn pass_through(depth: usize, visibility: Visibility) -> Self {
        Self {
            depth,
            visibility,
            incoming: vec![depth],
            outgoing: vec![depth],
            active: false,
        }
    }

    pub(crate) fn push_outgoing(&mut self, lane: usize) {
        if !self.outgoing.contains(&lane) {
            self.outgoing.push(lane);
        }
    }

    pub(crate) fn push_incoming(&mut self, lane: usize) {
        if !self.incoming.contains(&lane) {
            self.incoming.push(lane);
        }
    }
}

/// The sparse lane → track mapping of a single row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackRow {
    tracks: Vec<Option<Track>>,
}

impl TrackRow {
    pub fn with_width(width: usize) -> Self {
        Self {
            tracks: vec![None; width],
        }
    }

    /// Number of columns this row spans, occupied or not.
    pub fn width(&self) -> usize {
        self.tracks.len()
    }

    pub fn get(&self, lane: usize) -> Option<&Track> {
        self.tracks.get(lane).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, lane: usize) -> Option<&mut Track> {
        self.tracks.get_mut(lane).and_then(Option::as_mut)
    }

    pub(crate) fn insert(&mut self, track: Track) {
        let lane = track.depth;
        if lane >= self.tracks.len() {
            self.tracks.resize(lane + 1, None);
        }
        self.tracks[lane] = Some(track);
    }

    /// Occupied tracks in ascending lane order.
    pub fn occupied(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().flatten()
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied().count()
    }

    /// The track carrying the commit node, if any.
    pub fn primary(&self) -> Option<&Track> {
        self.occupied().find(|t| t.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_lookup_and_iteration() {
        let mut row = TrackRow::with_width(1);
        row.insert(Track::pass_through(3, Visibility::Established));
        assert_eq!(row.width(), 4);
        assert!(row.get(0).is_none());
        assert!(row.get(10).is_none());
        assert_eq!(row.get(3).map(|t| t.depth), Some(3));
        assert_eq!(row.occupied_count(), 1);
        assert!(row.primary().is_none());
    }

    #[test]
    fn edge_lists_do_not_duplicate() {
        let mut track = Track::pass_through(0, Visibility::Established);
        track.push_outgoing(0);
        track.push_outgoing(2);
        track.push_incoming(0);
        assert_eq!(track.outgoing, vec![0, 2]);
        assert_eq!(track.incoming, vec![0]);
    }
}
