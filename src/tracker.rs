use std::collections::BTreeMap;

use log::{debug, trace};

use crate::config::TrackerConfig;
use crate::error::Error;
use crate::math;
use crate::observation::Observation;
use crate::track::{Placement, Track, TrackId};

/// Live tracks keyed by id. Ids are allocated in increasing order, so
/// iteration order is creation order.
pub type Tracks = BTreeMap<TrackId, Placement>;

/// Keeps subject identities across frames by greedy nearest-centroid matching.
#[derive(Debug)]
pub struct CentroidTracker {
    config: TrackerConfig,
    tracks: Vec<Track>,
    next_id: TrackId,
    next_frame: u64,
    updates: u64,
}

impl CentroidTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            config,
            tracks: Vec::with_capacity(16),
            next_id: 0,
            next_frame: 0,
            updates: 0,
        })
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Number of updates processed so far.
    #[inline]
    pub fn frames_seen(&self) -> u64 {
        self.updates
    }

    #[inline]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Associates this frame's observations with live tracks, numbering the
    /// frame right after the previous one.
    #[inline]
    pub fn update(&mut self, observations: &[Observation], fps: f32) -> Result<Tracks, Error> {
        self.update_at(self.next_frame, observations, fps)
    }

    /// Associates the observations of frame `frame` with live tracks.
    ///
    /// Invalid observations are dropped. Fails without touching any state
    /// when `fps` is not a positive finite number.
    pub fn update_at(
        &mut self,
        frame: u64,
        observations: &[Observation],
        fps: f32,
    ) -> Result<Tracks, Error> {
        let fps = math::check_fps(fps)?;
        self.next_frame = frame.saturating_add(1);
        self.updates += 1;

        let dets: Vec<&Observation> = observations
            .iter()
            .filter(|obs| {
                let valid = obs.is_valid();
                if !valid {
                    trace!("frame {}: dropping malformed observation {:?}", frame, obs);
                }
                valid
            })
            .collect();

        let mut matched = vec![false; dets.len()];

        // `tracks` is kept sorted by id: new tracks are only ever appended
        for track in &mut self.tracks {
            let mut best: Option<(usize, f32)> = None;

            for (idx, obs) in dets.iter().enumerate() {
                if matched[idx] {
                    continue;
                }

                let dist = track.distance_to(obs);
                if dist >= self.config.max_distance {
                    continue;
                }

                // strict comparison keeps the first observation on ties
                if best.map_or(true, |(_, d)| dist < d) {
                    best = Some((idx, dist));
                }
            }

            if let Some((idx, dist)) = best {
                trace!("frame {}: track {} matched at {:.2}px", frame, track.id, dist);
                matched[idx] = true;
                track.update(frame, dets[idx]);
            } else {
                track.mark_missed();
            }
        }

        let tolerance = self.config.max_missed.frames(fps);
        self.tracks.retain(|t| {
            let keep = t.missed_frames <= tolerance;
            if !keep {
                debug!(
                    "frame {}: evicting track {} last seen at frame {} after {} missed frames",
                    frame, t.id, t.last_seen_frame, t.missed_frames
                );
            }
            keep
        });

        for (obs, _) in dets.iter().zip(&matched).filter(|(_, m)| !**m) {
            let id = self.next_id;
            self.next_id += 1;

            debug!(
                "frame {}: new track {} at ({:.1}, {:.1})",
                frame, id, obs.centroid.x, obs.centroid.y
            );
            self.tracks.push(Track::new(id, frame, obs));
        }

        Ok(self.tracks.iter().map(|t| (t.id, t.placement())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use crate::config::Tolerance;
    use nalgebra as na;

    fn obs(x: f32, y: f32) -> Observation {
        Observation::new(na::Point2::new(x, y), BBox::ltwh(x - 5.0, y - 10.0, 10.0, 20.0))
    }

    fn tracker(max_missed: usize) -> CentroidTracker {
        CentroidTracker::new(TrackerConfig {
            max_distance: 50.0,
            max_missed: Tolerance::Frames(max_missed),
        })
        .unwrap()
    }

    #[test]
    fn test_assigns_ids_in_input_order() {
        let mut t = tracker(2);
        let out = t.update(&[obs(10.0, 10.0), obs(200.0, 200.0)], 25.0).unwrap();

        assert_eq!(out.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(out[&0].centroid, na::Point2::new(10.0, 10.0));
        assert_eq!(out[&1].centroid, na::Point2::new(200.0, 200.0));
    }

    #[test]
    fn test_follows_moving_subject() {
        let mut t = tracker(2);
        t.update(&[obs(10.0, 10.0), obs(200.0, 200.0)], 25.0).unwrap();

        // input order swapped and both moved a little
        let out = t.update(&[obs(205.0, 198.0), obs(14.0, 12.0)], 25.0).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[&0].centroid, na::Point2::new(14.0, 12.0));
        assert_eq!(out[&1].centroid, na::Point2::new(205.0, 198.0));
    }

    #[test]
    fn test_far_observation_spawns_new_track() {
        let mut t = tracker(2);
        t.update(&[obs(10.0, 10.0)], 25.0).unwrap();

        let out = t.update(&[obs(100.0, 10.0)], 25.0).unwrap();
        assert_eq!(out.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(t.tracks()[0].missed_frames, 1);
        // missing track is still reported at its last position
        assert_eq!(out[&0].centroid, na::Point2::new(10.0, 10.0));
    }

    #[test]
    fn test_lower_id_wins_contested_observation() {
        let mut t = tracker(2);
        t.update(&[obs(0.0, 0.0), obs(60.0, 0.0)], 25.0).unwrap();

        // single observation within reach of both, closer to track 1
        let out = t.update(&[obs(35.0, 0.0)], 25.0).unwrap();

        assert_eq!(out[&0].centroid, na::Point2::new(35.0, 0.0));
        assert_eq!(t.tracks()[1].missed_frames, 1);
    }

    #[test]
    fn test_tie_goes_to_first_observation() {
        let mut t = tracker(2);
        t.update(&[obs(50.0, 50.0)], 25.0).unwrap();

        let out = t.update(&[obs(40.0, 50.0), obs(60.0, 50.0)], 25.0).unwrap();

        assert_eq!(out[&0].centroid, na::Point2::new(40.0, 50.0));
        assert_eq!(out[&1].centroid, na::Point2::new(60.0, 50.0));
    }

    #[test]
    fn test_eviction_after_tolerance() {
        let mut t = tracker(2);
        t.update(&[obs(10.0, 10.0)], 25.0).unwrap();

        assert_eq!(t.update(&[], 25.0).unwrap().len(), 1);
        assert_eq!(t.update(&[], 25.0).unwrap().len(), 1);
        assert!(t.update(&[], 25.0).unwrap().is_empty());

        let out = t.update(&[obs(10.0, 10.0)], 25.0).unwrap();
        assert_eq!(out.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_tolerance_in_seconds_scales_with_fps() {
        let mut t = CentroidTracker::new(TrackerConfig {
            max_distance: 50.0,
            max_missed: Tolerance::Seconds(0.5),
        })
        .unwrap();
        t.update(&[obs(10.0, 10.0)], 4.0).unwrap();

        // 0.5s at 4fps is 2 frames
        assert_eq!(t.update(&[], 4.0).unwrap().len(), 1);
        assert_eq!(t.update(&[], 4.0).unwrap().len(), 1);
        assert!(t.update(&[], 4.0).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_observations_dropped() {
        let mut t = tracker(2);
        let bad = Observation::new(na::Point2::new(f32::NAN, 1.0), BBox::ltwh(0.0, 0.0, 1.0, 1.0));
        let flat = Observation::new(na::Point2::new(5.0, 5.0), BBox::ltwh(0.0, 0.0, 0.0, 1.0));

        assert!(t.update(&[bad, flat], 25.0).unwrap().is_empty());
        assert_eq!(t.update(&[obs(1.0, 1.0)], 25.0).unwrap().keys().next(), Some(&0));
    }

    #[test]
    fn test_invalid_fps_leaves_state_untouched() {
        let mut t = tracker(2);
        t.update(&[obs(10.0, 10.0)], 25.0).unwrap();

        assert!(matches!(t.update(&[], 0.0), Err(Error::InvalidFps(_))));
        assert!(t.update(&[], f32::NAN).is_err());
        assert_eq!(t.frames_seen(), 1);
        assert_eq!(t.tracks()[0].missed_frames, 0);
    }

    #[test]
    fn test_last_seen_follows_caller_frame_index() {
        let mut t = tracker(2);
        t.update_at(40, &[obs(10.0, 10.0), obs(200.0, 200.0)], 25.0).unwrap();
        t.update_at(41, &[obs(12.0, 10.0)], 25.0).unwrap();

        assert_eq!(t.tracks()[0].last_seen_frame, 41);
        assert_eq!(t.tracks()[1].last_seen_frame, 40);
        assert_eq!(t.tracks()[1].missed_frames, 1);

        // plain update carries on from the last index
        t.update(&[obs(200.0, 200.0)], 25.0).unwrap();
        assert_eq!(t.tracks()[1].last_seen_frame, 42);
        assert_eq!(t.frames_seen(), 3);
    }

    #[test]
    fn test_replay_is_idempotent() {
        let mut t = tracker(2);
        let frame = [obs(10.0, 10.0), obs(200.0, 200.0)];

        let first = t.update(&frame, 25.0).unwrap();
        let second = t.update(&frame, 25.0).unwrap();

        assert_eq!(first, second);
    }
}
