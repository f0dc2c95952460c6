use crate::error::Error;

#[inline]
pub fn check_fps(fps: f32) -> Result<f32, Error> {
    if fps.is_finite() && fps > 0.0 {
        Ok(fps)
    } else {
        Err(Error::InvalidFps(fps))
    }
}

/// Upper bound of any window or tolerance expressed in frames, about 36
/// minutes at 30 fps.
pub const MAX_FRAMES: usize = 1 << 16;

/// Number of frames covering `seconds` at `fps`, rounded up, clamped to
/// `1..=MAX_FRAMES`.
///
/// Tracker tolerances and classifier windows both go through here so the two
/// stay consistent when fps changes between calls.
#[inline]
pub fn frames_for(seconds: f32, fps: f32) -> usize {
    let frames = (seconds * fps).ceil();

    if frames.is_nan() || frames < 1.0 {
        1
    } else if frames >= MAX_FRAMES as f32 {
        MAX_FRAMES
    } else {
        frames as usize
    }
}
