use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltwh};
use crate::observation::Observation;
use nalgebra as na;

pub type TrackId = u64;

/// Where a live track currently is.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub centroid: na::Point2<f32>,
    pub bbox: BBox<Ltwh>,
}

#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub last_centroid: na::Point2<f32>,
    pub last_bbox: BBox<Ltwh>,
    pub last_seen_frame: u64,

    // consecutive frames without a matching observation
    pub missed_frames: usize,
}

impl Track {
    pub fn new(id: TrackId, frame: u64, obs: &Observation) -> Self {
        Self {
            id,
            last_centroid: obs.centroid,
            last_bbox: obs.bbox,
            last_seen_frame: frame,
            missed_frames: 0,
        }
    }

    pub fn update(&mut self, frame: u64, obs: &Observation) {
        self.last_centroid = obs.centroid;
        self.last_bbox = obs.bbox;
        self.last_seen_frame = frame;
        self.missed_frames = 0;
    }

    #[inline]
    pub fn mark_missed(&mut self) {
        self.missed_frames += 1;
    }

    #[inline]
    pub fn distance_to(&self, obs: &Observation) -> f32 {
        na::distance(&self.last_centroid, &obs.centroid)
    }

    #[inline]
    pub fn placement(&self) -> Placement {
        Placement {
            centroid: self.last_centroid,
            bbox: self.last_bbox,
        }
    }
}

/// Per-frame result for one live subject, for the renderer to branch on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Subject {
    pub id: TrackId,
    pub centroid: na::Point2<f32>,
    pub bbox: BBox<Ltwh>,
    pub is_fallen: bool,
}
