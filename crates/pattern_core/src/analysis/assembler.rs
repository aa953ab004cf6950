//! # Event Assembler
//!
//! Turns a per-frame classification into merged hit windows and windows into
//! [`PatternEvent`]s.
//!
//! ## Algorithm
//! 1. Walk frames in row order
//! 2. A hit opens a window or extends the open one
//! 3. Occluded frames are counted; a run longer than the tolerance closes the window
//! 4. A miss always closes the window
//! 5. Windows only ever end on a hit, so no event starts or ends on an occluded frame

use std::collections::BTreeSet;

use crate::data::TrajectoryDataset;
use crate::error::{PatternError, Result};
use crate::models::{Coordinate, PatternEvent, TimeWindow, Visualization};

/// Per-frame verdict of an analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameHit {
    /// Condition holds; carries the metric used to pick the peak frame
    Hit(f64),
    Miss,
    /// Not enough data to decide
    Occluded,
}

/// Inclusive run of rows merged from hits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitWindow {
    pub first: usize,
    pub last: usize,
    /// Row with the largest metric, earliest on ties
    pub peak: usize,
    pub peak_value: f64,
}

impl HitWindow {
    fn open(row: usize, value: f64) -> Self {
        Self { first: row, last: row, peak: row, peak_value: value }
    }

    fn extend(&mut self, row: usize, value: f64) {
        self.last = row;
        if value > self.peak_value {
            self.peak = row;
            self.peak_value = value;
        }
    }

    pub fn contains(&self, row: usize) -> bool {
        self.first <= row && row <= self.last
    }

    /// `(start, event, end)` timestamps of the window.
    pub fn times(&self, dataset: &TrajectoryDataset) -> (f64, f64, f64) {
        (dataset.timestamp(self.first), dataset.timestamp(self.peak), dataset.timestamp(self.last))
    }
}

/// Merges hit frames into disjoint, ordered windows.
///
/// Two hits share a window iff every row between them is occluded and that
/// run is at most `max_gap` rows long.
pub fn merge_hits(frames: &[FrameHit], max_gap: usize) -> Vec<HitWindow> {
    let mut windows = Vec::new();
    let mut current: Option<HitWindow> = None;
    let mut gap = 0usize;

    for (row, frame) in frames.iter().enumerate() {
        match *frame {
            FrameHit::Hit(value) => {
                match current.as_mut() {
                    Some(window) => window.extend(row, value),
                    None => current = Some(HitWindow::open(row, value)),
                }
                gap = 0;
            }
            FrameHit::Occluded => {
                if current.is_some() {
                    gap += 1;
                    if gap > max_gap {
                        windows.extend(current.take());
                        gap = 0;
                    }
                }
            }
            FrameHit::Miss => {
                windows.extend(current.take());
                gap = 0;
            }
        }
    }
    windows.extend(current);
    windows
}

/// Fluent builder for one [`PatternEvent`].
#[derive(Debug, Clone)]
pub struct EventBuilder {
    pattern: String,
    start_time: f64,
    event_time: f64,
    end_time: f64,
    coordinates: Vec<Coordinate>,
    visualizations: Vec<Visualization>,
    tags: BTreeSet<String>,
}

impl EventBuilder {
    pub fn new(pattern: impl Into<String>, start_time: f64, event_time: f64, end_time: f64) -> Self {
        Self {
            pattern: pattern.into(),
            start_time,
            event_time,
            end_time,
            coordinates: Vec::new(),
            visualizations: Vec::new(),
            tags: BTreeSet::new(),
        }
    }

    pub fn from_window(pattern: impl Into<String>, window: &HitWindow, dataset: &TrajectoryDataset) -> Self {
        let (start, event, end) = window.times(dataset);
        Self::new(pattern, start, event, end)
    }

    /// Event window for windowed visualizations.
    pub fn window(&self) -> Result<TimeWindow> {
        TimeWindow::new(self.start_time, self.end_time)
    }

    pub fn coordinate(mut self, coordinate: Coordinate) -> Self {
        self.coordinates.push(coordinate);
        self
    }

    pub fn coordinates(mut self, coordinates: impl IntoIterator<Item = Coordinate>) -> Self {
        self.coordinates.extend(coordinates);
        self
    }

    pub fn visualization(mut self, visualization: Visualization) -> Self {
        self.visualizations.push(visualization);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn build(self) -> Result<PatternEvent> {
        let ordered = self.start_time <= self.event_time && self.event_time <= self.end_time;
        if !ordered {
            return Err(PatternError::InvalidVisualization(format!(
                "pattern {}: event times out of order ({} / {} / {})",
                self.pattern, self.start_time, self.event_time, self.end_time
            )));
        }
        Ok(PatternEvent {
            pattern: self.pattern,
            start_time: self.start_time,
            event_time: self.event_time,
            end_time: self.end_time,
            coordinates: self.coordinates,
            visualizations: self.visualizations,
            tags: self.tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::spread_dataset;
    use super::FrameHit::{Hit, Miss, Occluded};

    #[test]
    fn test_contiguous_hits_merge() {
        let frames = [Miss, Hit(1.0), Hit(3.0), Hit(2.0), Miss];
        let windows = merge_hits(&frames, 2);
        assert_eq!(windows, vec![HitWindow { first: 1, last: 3, peak: 2, peak_value: 3.0 }]);
    }

    #[test]
    fn test_peak_ties_keep_first() {
        let windows = merge_hits(&[Hit(5.0), Hit(5.0)], 0);
        assert_eq!(windows[0].peak, 0);
    }

    #[test]
    fn test_short_occlusion_is_bridged() {
        let frames = [Hit(1.0), Occluded, Occluded, Hit(1.0)];
        let windows = merge_hits(&frames, 2);
        assert_eq!(windows.len(), 1);
        assert_eq!((windows[0].first, windows[0].last), (0, 3));
    }

    #[test]
    fn test_long_occlusion_splits() {
        let frames = [Hit(1.0), Occluded, Occluded, Occluded, Hit(1.0)];
        let windows = merge_hits(&frames, 2);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].last, 0);
        assert_eq!(windows[1].first, 4);
    }

    #[test]
    fn test_miss_always_splits() {
        let windows = merge_hits(&[Hit(1.0), Miss, Hit(1.0)], 10);
        assert_eq!(windows.len(), 2);
    }

    #[test]
    fn test_windows_never_end_on_occlusion() {
        let frames = [Occluded, Hit(1.0), Occluded, Miss, Occluded, Hit(2.0), Occluded];
        let windows = merge_hits(&frames, 5);
        assert_eq!(windows.len(), 2);
        assert_eq!((windows[0].first, windows[0].last), (1, 1));
        assert_eq!((windows[1].first, windows[1].last), (5, 5));
    }

    #[test]
    fn test_no_hits_no_windows() {
        assert!(merge_hits(&[], 2).is_empty());
        assert!(merge_hits(&[Miss, Occluded], 2).is_empty());
    }

    #[test]
    fn test_builder_uses_frame_timestamps() {
        let dataset = spread_dataset(&[1.0, 1.0, 1.0, 1.0]);
        let window = HitWindow { first: 1, last: 3, peak: 2, peak_value: 1.0 };
        let event = EventBuilder::from_window("CB_001", &window, &dataset)
            .tag("b")
            .tag("a")
            .tag("a")
            .build()
            .unwrap();
        assert!((event.start_time - 0.1).abs() < 1e-9);
        assert!((event.event_time - 0.2).abs() < 1e-9);
        assert!((event.end_time - 0.3).abs() < 1e-9);
        assert_eq!(event.tags.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_builder_rejects_unordered_times() {
        assert!(EventBuilder::new("X", 2.0, 1.0, 3.0).build().is_err());
        assert!(EventBuilder::new("X", 1.0, 1.0, 1.0).build().is_ok());
    }
}

#[cfg(all(test, feature = "proptest"))]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn frame_strategy() -> impl Strategy<Value = FrameHit> {
        prop_oneof![
            (0.0f64..100.0).prop_map(FrameHit::Hit),
            Just(FrameHit::Miss),
            Just(FrameHit::Occluded),
        ]
    }

    proptest! {
        #[test]
        fn windows_are_disjoint_and_cover_hits(
            frames in prop::collection::vec(frame_strategy(), 0..200),
            max_gap in 0usize..6,
        ) {
            let windows = merge_hits(&frames, max_gap);

            for pair in windows.windows(2) {
                prop_assert!(pair[0].last < pair[1].first);
            }
            for (row, frame) in frames.iter().enumerate() {
                if matches!(frame, FrameHit::Hit(_)) {
                    prop_assert!(windows.iter().any(|w| w.contains(row)));
                }
            }
            for w in &windows {
                prop_assert!(matches!(frames[w.first], FrameHit::Hit(_)));
                prop_assert!(matches!(frames[w.last], FrameHit::Hit(_)));
                prop_assert!(w.contains(w.peak));
                prop_assert!(frames[w.first..=w.last].iter().all(|f| !matches!(f, FrameHit::Miss)));

                let mut run = 0usize;
                for f in &frames[w.first..=w.last] {
                    if matches!(f, FrameHit::Occluded) {
                        run += 1;
                        prop_assert!(run <= max_gap);
                    } else {
                        run = 0;
                    }
                }
            }
        }
    }
}
