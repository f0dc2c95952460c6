use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltwh};
use nalgebra as na;

const LEFT_SHOULDER: usize = 5;
const RIGHT_SHOULDER: usize = 6;

/// One detected subject in one frame, not yet associated with a track.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub centroid: na::Point2<f32>,
    pub bbox: BBox<Ltwh>,
}

impl Observation {
    #[inline]
    pub fn new(centroid: na::Point2<f32>, bbox: BBox<Ltwh>) -> Self {
        Self { centroid, bbox }
    }

    /// Finite centroid and a finite box with positive width and height.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.centroid.coords.iter().all(|v| v.is_finite()) && self.bbox.is_valid()
    }

    /// Builds an observation centered between the shoulders of a COCO-ordered
    /// `[x, y, confidence]` keypoint list.
    ///
    /// Each axis falls back to the single visible shoulder. Returns `None`
    /// when an axis has no visible shoulder at all.
    pub fn from_keypoints(keypoints: &[[f32; 3]], bbox: BBox<Ltwh>) -> Option<Self> {
        let left = keypoints.get(LEFT_SHOULDER).filter(|k| k[2] > 0.0);
        let right = keypoints.get(RIGHT_SHOULDER).filter(|k| k[2] > 0.0);

        let x = shoulder_mid(left.map(|k| k[0]), right.map(|k| k[0]))?;
        let y = shoulder_mid(left.map(|k| k[1]), right.map(|k| k[1]))?;

        Some(Self::new(na::Point2::new(x, y), bbox))
    }
}

fn shoulder_mid(left: Option<f32>, right: Option<f32>) -> Option<f32> {
    let left = left.filter(|v| *v != 0.0);
    let right = right.filter(|v| *v != 0.0);

    match (left, right) {
        (Some(l), Some(r)) => Some((l + r) / 2.0),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn keypoints(left: [f32; 3], right: [f32; 3]) -> Vec<[f32; 3]> {
        let mut kps = vec![[0.0; 3]; 17];
        kps[LEFT_SHOULDER] = left;
        kps[RIGHT_SHOULDER] = right;
        kps
    }

    #[test]
    fn test_validity() {
        let bbox = BBox::ltwh(8.0, 8.0, 4.0, 20.0);

        assert!(Observation::new(na::Point2::new(10.0, 10.0), bbox).is_valid());
        assert!(!Observation::new(na::Point2::new(f32::NAN, 10.0), bbox).is_valid());
        assert!(!Observation::new(na::Point2::new(10.0, f32::INFINITY), bbox).is_valid());
        assert!(
            !Observation::new(na::Point2::new(10.0, 10.0), BBox::ltwh(8.0, 8.0, 4.0, 0.0))
                .is_valid()
        );
    }

    #[test]
    fn test_shoulder_midpoint() {
        let bbox = BBox::ltwh(0.0, 0.0, 40.0, 100.0);
        let obs = Observation::from_keypoints(
            &keypoints([10.0, 20.0, 0.9], [30.0, 24.0, 0.8]),
            bbox,
        )
        .unwrap();

        assert_relative_eq!(obs.centroid.x, 20.0);
        assert_relative_eq!(obs.centroid.y, 22.0);
        assert_eq!(obs.bbox, bbox);
    }

    #[test]
    fn test_single_shoulder_fallback() {
        let bbox = BBox::ltwh(0.0, 0.0, 40.0, 100.0);
        let obs =
            Observation::from_keypoints(&keypoints([0.0; 3], [30.0, 24.0, 0.8]), bbox).unwrap();

        assert_relative_eq!(obs.centroid.x, 30.0);
        assert_relative_eq!(obs.centroid.y, 24.0);
    }

    #[test]
    fn test_no_shoulders() {
        let bbox = BBox::ltwh(0.0, 0.0, 40.0, 100.0);

        assert!(Observation::from_keypoints(&keypoints([0.0; 3], [0.0; 3]), bbox).is_none());
        assert!(Observation::from_keypoints(&[[1.0, 1.0, 1.0]; 3], bbox).is_none());
    }
}
