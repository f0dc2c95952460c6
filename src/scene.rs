use log::{info, warn};
use serde_derive::Serialize;

use crate::classifier::{FallClassifier, Fallen};
use crate::config::MonitorConfig;
use crate::counter::{FallCounter, Snapshot};
use crate::error::Error;
use crate::frame::Frame;
use crate::math;
use crate::sink::SnapshotSink;
use crate::tracker::CentroidTracker;
use crate::track::Subject;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    /// Every live subject, fallen or not, in track order
    pub subjects: Vec<Subject>,
    pub fallen: Fallen,
    pub new_falls: Vec<Snapshot>,
    pub fall_count: u64,
}

/// Tracker, classifier and fall counter of a single stream, run in that
/// order once per frame.
#[derive(Debug)]
pub struct Scene {
    tracker: CentroidTracker,
    classifier: FallClassifier,
    counter: FallCounter,
    subjects: Vec<Subject>,
    last_frame: Option<u64>,
}

impl Scene {
    pub fn new(config: &MonitorConfig) -> Result<Self, Error> {
        Ok(Self {
            tracker: CentroidTracker::new(config.tracker.clone())?,
            classifier: FallClassifier::new(config.classifier.clone())?,
            counter: FallCounter::new(),
            subjects: Vec::new(),
            last_frame: None,
        })
    }

    #[inline]
    pub fn fall_count(&self) -> u64 {
        self.counter.count()
    }

    /// Subjects as of the last processed frame.
    #[inline]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    #[inline]
    pub fn tracker(&self) -> &CentroidTracker {
        &self.tracker
    }

    #[inline]
    pub fn classifier(&self) -> &FallClassifier {
        &self.classifier
    }

    /// Runs one frame through the pipeline and fires a snapshot per new fall.
    ///
    /// An invalid fps rejects the frame before any state changes. Sink
    /// failures are logged; the fall they belong to stays counted.
    pub fn update<S>(&mut self, frame: &Frame, src: &str, sink: &mut S) -> Result<FrameReport, Error>
    where
        S: SnapshotSink + ?Sized,
    {
        math::check_fps(frame.fps)?;

        if let Some(last) = self.last_frame {
            if frame.index <= last {
                warn!(
                    "{}: frame index {} does not follow {}",
                    src, frame.index, last
                );
            }
        }
        self.last_frame = Some(frame.index);

        let tracks = self
            .tracker
            .update_at(frame.index, &frame.observations, frame.fps)?;
        let fallen = self.classifier.update(&tracks, frame.index, frame.fps)?;
        let events = self.counter.update(&fallen);

        for snapshot in &events.snapshots {
            info!(
                "{}: frame {}: track {} fell, fall count {}",
                src, frame.index, snapshot.id, snapshot.sequence
            );

            if let Err(err) = sink.write(src, snapshot.sequence) {
                warn!(
                    "{}: snapshot {} for track {} failed: {}",
                    src, snapshot.sequence, snapshot.id, err
                );
            }
        }

        self.subjects = tracks
            .iter()
            .map(|(&id, p)| Subject {
                id,
                centroid: p.centroid,
                bbox: p.bbox,
                is_fallen: fallen.contains_key(&id),
            })
            .collect();

        Ok(FrameReport {
            frame_index: frame.index,
            subjects: self.subjects.clone(),
            fallen,
            new_falls: events.snapshots,
            fall_count: events.count,
        })
    }
}
