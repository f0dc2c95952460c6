pub mod bbox;
pub mod classifier;
pub mod config;
pub mod counter;
pub mod error;
pub mod frame;
pub mod math;
pub mod observation;
pub mod scene;
pub mod sink;
pub mod tracker;

mod circular_queue;
mod track;

pub use config::MonitorConfig;
pub use frame::Frame;
pub use observation::Observation;
pub use scene::{FrameReport, Scene};
pub use sink::SnapshotSink;
pub use track::{Placement, Subject, Track, TrackId};

use error::Error;
use std::collections::HashMap;
use std::rc::Rc;

pub trait Monitoring {
    fn update(&mut self, frame: &Frame, src: &str) -> Result<FrameReport, Error>;
    fn fall_count(&self, src: &str) -> u64;
    fn subjects(&self, src: &str) -> Rc<[Subject]>;
}

/// Fall monitoring for any number of streams, one [`Scene`] per stream
/// identifier. Snapshots go to the shared sink tagged with that identifier.
pub struct FallMonitor<S: SnapshotSink> {
    config: MonitorConfig,
    scenes: HashMap<String, Scene>,
    sink: S,
}

impl<S: SnapshotSink> FallMonitor<S> {
    pub fn new(config: MonitorConfig, sink: S) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            config,
            scenes: HashMap::new(),
            sink,
        })
    }

    #[inline]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    #[inline]
    pub fn scene(&self, src: &str) -> Option<&Scene> {
        self.scenes.get(src)
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Forgets a stream, e.g. when its video ends. Returns the final count.
    pub fn reset(&mut self, src: &str) -> Option<u64> {
        self.scenes.remove(src).map(|scene| scene.fall_count())
    }
}

impl<S: SnapshotSink> Monitoring for FallMonitor<S> {
    fn update(&mut self, frame: &Frame, src: &str) -> Result<FrameReport, Error> {
        let item = self.scenes.get_mut(src);
        let scene = if let Some(scene) = item {
            scene
        } else {
            let scene = Scene::new(&self.config)?;

            self.scenes.entry(src.to_string()).or_insert(scene)
        };

        scene.update(frame, src, &mut self.sink)
    }

    #[inline]
    fn fall_count(&self, src: &str) -> u64 {
        self.scenes.get(src).map_or(0, |scene| scene.fall_count())
    }

    #[inline]
    fn subjects(&self, src: &str) -> Rc<[Subject]> {
        if let Some(scene) = self.scenes.get(src) {
            return scene.subjects().into();
        }

        Rc::new([])
    }
}
