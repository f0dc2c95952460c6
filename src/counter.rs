use std::collections::BTreeSet;

use serde_derive::{Deserialize, Serialize};

use crate::classifier::Fallen;
use crate::track::TrackId;

/// A snapshot to take for a track that just fell.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub id: TrackId,
    /// Fall count including this fall
    pub sequence: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FallEvents {
    pub newly_fallen: Vec<TrackId>,
    pub snapshots: Vec<Snapshot>,
    pub count: u64,
}

/// Counts not-fallen to fallen transitions between consecutive frames.
///
/// Only entries into the fallen set count; leaving it, staying in it, or
/// vanishing from tracking altogether is silent.
#[derive(Debug, Clone, Default)]
pub struct FallCounter {
    count: u64,
    prev_fallen: BTreeSet<TrackId>,
}

impl FallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[inline]
    pub fn previous(&self) -> &BTreeSet<TrackId> {
        &self.prev_fallen
    }

    /// Compares against the previous frame's fallen set and replaces it.
    pub fn update(&mut self, fallen: &Fallen) -> FallEvents {
        let mut events = FallEvents::default();

        for &id in fallen.keys() {
            if self.prev_fallen.contains(&id) {
                continue;
            }

            self.count += 1;
            events.newly_fallen.push(id);
            events.snapshots.push(Snapshot {
                id,
                sequence: self.count,
            });
        }

        self.prev_fallen = fallen.keys().copied().collect();
        events.count = self.count;

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;

    fn fallen(ids: &[TrackId]) -> Fallen {
        ids.iter()
            .map(|&id| (id, BBox::ltwh(0.0, 0.0, 30.0, 10.0)))
            .collect()
    }

    #[test]
    fn test_counts_each_entry_once() {
        let mut c = FallCounter::new();

        let events = c.update(&fallen(&[1]));
        assert_eq!(events.newly_fallen, vec![1]);
        assert_eq!(events.snapshots, vec![Snapshot { id: 1, sequence: 1 }]);
        assert_eq!(events.count, 1);

        let events = c.update(&fallen(&[1]));
        assert!(events.newly_fallen.is_empty());
        assert!(events.snapshots.is_empty());
        assert_eq!(events.count, 1);
    }

    #[test]
    fn test_sequence_numbers_within_frame() {
        let mut c = FallCounter::new();
        c.update(&fallen(&[0]));

        let events = c.update(&fallen(&[0, 2, 5]));
        assert_eq!(events.newly_fallen, vec![2, 5]);
        assert_eq!(
            events.snapshots,
            vec![
                Snapshot { id: 2, sequence: 2 },
                Snapshot { id: 5, sequence: 3 }
            ]
        );
        assert_eq!(c.count(), 3);
    }

    #[test]
    fn test_flapping_counts_twice() {
        let mut c = FallCounter::new();

        c.update(&fallen(&[4]));
        let events = c.update(&fallen(&[]));
        assert!(events.snapshots.is_empty());
        assert_eq!(events.count, 1);

        let events = c.update(&fallen(&[4]));
        assert_eq!(events.snapshots, vec![Snapshot { id: 4, sequence: 2 }]);
    }

    #[test]
    fn test_vanished_ids_are_forgotten() {
        let mut c = FallCounter::new();

        c.update(&fallen(&[1, 2]));
        c.update(&fallen(&[2]));
        assert_eq!(c.previous().iter().copied().collect::<Vec<_>>(), vec![2]);
        assert_eq!(c.count(), 2);
    }

    #[test]
    fn test_count_is_monotonic() {
        let mut c = FallCounter::new();
        let frames: [&[TrackId]; 6] = [&[], &[1], &[1, 2], &[], &[2], &[3]];

        let mut last = 0;
        for ids in frames {
            let events = c.update(&fallen(ids));
            assert!(events.count >= last);
            assert_eq!(events.count - last, events.newly_fallen.len() as u64);
            last = events.count;
        }
        assert_eq!(last, 4);
    }
}
