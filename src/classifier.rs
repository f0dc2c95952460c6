use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::bbox::{BBox, Ltwh};
use crate::circular_queue::CircularQueue;
use crate::config::ClassifierConfig;
use crate::error::Error;
use crate::math;
use crate::track::{Placement, TrackId};
use crate::tracker::Tracks;
use nalgebra as na;

/// Currently fallen track ids with their latest box, in track order.
pub type Fallen = BTreeMap<TrackId, BBox<Ltwh>>;

#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub frame: u64,
    pub centroid: na::Point2<f32>,
    pub bbox: BBox<Ltwh>,
}

impl Sample {
    #[inline]
    fn new(frame: u64, p: &Placement) -> Self {
        Self {
            frame,
            centroid: p.centroid,
            bbox: p.bbox,
        }
    }

    #[inline]
    fn is_flat(&self, config: &ClassifierConfig) -> bool {
        self.bbox.as_xyah().aspect_ratio() > config.flat_aspect_ratio
    }
}

#[derive(Debug, Clone)]
pub struct FallState {
    history: CircularQueue<Sample>,
    is_fallen: bool,
}

impl FallState {
    fn new(window: usize) -> Self {
        Self {
            history: CircularQueue::with_capacity(window),
            is_fallen: false,
        }
    }

    fn push(&mut self, sample: Sample, window: usize) {
        self.history.set_capacity(window);
        self.history.push(sample);

        let now = sample.frame;
        self.history
            .evict_while(|s| s.frame > now || s.frame.saturating_add(window as u64) <= now);
    }

    #[inline]
    pub fn is_fallen(&self) -> bool {
        self.is_fallen
    }

    /// Window length in frames as of the last update.
    #[inline]
    pub fn window(&self) -> usize {
        self.history.capacity()
    }

    #[inline]
    pub fn latest(&self) -> Option<&Sample> {
        self.history.latest()
    }

    #[inline]
    pub fn history(&self) -> impl Iterator<Item = &Sample> {
        self.history.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// Decides whether a history window shows a subject that has fallen.
///
/// All of the following must hold:
/// - the window is filled (`window` samples),
/// - the latest box is flat,
/// - at least `min_flat_fraction` of the window is flat,
/// - if the window still holds upright samples, the latest height dropped
///   to at most `max_height_ratio` of the tallest of them.
pub fn looks_fallen<'a, I>(history: I, window: usize, config: &ClassifierConfig) -> bool
where
    I: IntoIterator<Item = &'a Sample>,
{
    let mut count = 0usize;
    let mut flat = 0usize;
    let mut tallest_upright: Option<f32> = None;
    let mut latest: Option<&Sample> = None;

    for s in history {
        count += 1;

        if s.is_flat(config) {
            flat += 1;
        } else {
            let h = s.bbox.height();
            tallest_upright = Some(tallest_upright.map_or(h, |t| t.max(h)));
        }

        latest = Some(s);
    }

    let latest = match latest {
        Some(s) if count >= window => s,
        _ => return false,
    };

    if !latest.is_flat(config) {
        return false;
    }

    if (flat as f32 / count as f32) < config.min_flat_fraction {
        return false;
    }

    match tallest_upright {
        Some(h) => latest.bbox.height() <= config.max_height_ratio * h,
        None => true,
    }
}

/// Keeps a rolling geometry history per track and flags fallen subjects.
#[derive(Debug)]
pub struct FallClassifier {
    config: ClassifierConfig,
    states: HashMap<TrackId, FallState>,
}

impl FallClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            config,
            states: HashMap::new(),
        })
    }

    #[inline]
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self, id: TrackId) -> Option<&FallState> {
        self.states.get(&id)
    }

    /// Number of tracks with fall state.
    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Window length in frames at `fps`.
    #[inline]
    pub fn window(&self, fps: f32) -> usize {
        math::frames_for(self.config.window_seconds, fps)
    }

    pub fn update(&mut self, tracks: &Tracks, frame_index: u64, fps: f32) -> Result<Fallen, Error> {
        let fps = math::check_fps(fps)?;
        let window = self.window(fps);

        self.states.retain(|id, _| {
            let live = tracks.contains_key(id);
            if !live {
                debug!("frame {}: dropping fall state of track {}", frame_index, id);
            }
            live
        });

        let mut fallen = Fallen::new();

        for (&id, placement) in tracks {
            let first_sighting = !self.states.contains_key(&id);
            let state = self
                .states
                .entry(id)
                .or_insert_with(|| FallState::new(window));

            state.push(Sample::new(frame_index, placement), window);

            // no judgement on the frame a track is first seen
            if !first_sighting {
                let is_fallen = looks_fallen(state.history(), window, &self.config);

                if is_fallen != state.is_fallen {
                    debug!(
                        "frame {}: track {} {}",
                        frame_index,
                        id,
                        if is_fallen { "fell" } else { "got up" }
                    );
                }

                state.is_fallen = is_fallen;
            }

            if state.is_fallen {
                fallen.insert(id, placement.bbox);
            }
        }

        Ok(fallen)
    }
}
