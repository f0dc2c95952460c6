use serde_derive::{Deserialize, Serialize};

use crate::observation::Observation;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Frame {
    /// Monotonic, starting at 0 for the first frame of a stream
    pub index: u64,
    pub fps: f32,
    pub observations: Vec<Observation>,
}

impl Frame {
    #[inline]
    pub fn new(index: u64, fps: f32, observations: Vec<Observation>) -> Self {
        Self {
            index,
            fps,
            observations,
        }
    }

    /// The frame following this one at the same fps.
    #[inline]
    pub fn next(&self, observations: Vec<Observation>) -> Self {
        Self::new(self.index + 1, self.fps, observations)
    }
}
