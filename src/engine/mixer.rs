// Mix-path math used inside the real-time callback. Everything here is
// allocation-free and branch-light so it can run per sample on the audio
// thread; keeping it pure also makes it testable without a device.

use cpal::{FromSample, Sample};
use std::f32::consts::FRAC_PI_2;

/// Flush denormals to zero. Values this small can cause large CPU spikes on
/// some processors; the threshold sits far below 32-bit float noise.
#[inline]
pub fn flush_denormals_to_zero(x: f32) -> f32 {
    if x.abs() < 1e-15 { 0.0 } else { x }
}

/// Soft clipping with tanh. Keeps the summed mix inside [-1, 1] without the
/// hard harmonics of a plain clamp.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

/// Equal-power pan law: pan in [-1, 1] maps to (left, right) gains along a
/// quarter circle, so overall power stays constant across the sweep.
#[inline]
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let angle = (pan.clamp(-1.0, 1.0) * 0.5 + 0.5) * FRAC_PI_2;
    (angle.cos(), angle.sin())
}

/// Write one stereo sample into an interleaved device frame, converting to
/// the device sample format. Extra channels beyond stereo get silence; a
/// mono device gets the average.
#[inline]
pub fn write_stereo_to_interleaved_frame<T>(sample: (f32, f32), frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    match frame.len() {
        0 => {}
        1 => frame[0] = T::from_sample((sample.0 + sample.1) * 0.5),
        _ => {
            frame[0] = T::from_sample(sample.0);
            frame[1] = T::from_sample(sample.1);
            for channel in frame.iter_mut().skip(2) {
                *channel = T::from_sample(0.0);
            }
        }
    }
}
