//! Generative lighting effects.
//!
//! Pure application-level math over [`Led`] values, built on top of
//! the frame-send API: every function returns a payload (or a sequence
//! of payloads) ready for [`Device::send_leds`](crate::Device::send_leds).

use rand::Rng;

use crate::color::Led;

/// One full spectrum cycle, in spectrum steps (3 ramps of 256).
const SPECTRUM_PERIOD: i64 = 768;

/// Fill `count` LEDs with a single color.
pub fn solid(color: Led, count: usize) -> Vec<Led> {
    vec![color; count]
}

/// A moving rainbow across `count` LEDs.
///
/// `speed` advances the spectrum per animation frame, `multiplier`
/// stretches it across the strip; increment `frame` to animate.
pub fn rainbow(speed: u32, multiplier: u32, frame: u32, count: usize) -> Vec<Led> {
    (0..count)
        .map(|i| spectrum(frame as i64 * speed as i64 + i as i64 * multiplier as i64))
        .collect()
}

/// Color of the spectrum at `value`; loops every 768 steps.
fn spectrum(value: i64) -> Led {
    let i = value.rem_euclid(SPECTRUM_PERIOD) as i32;

    let mut red = 0;
    if (0..256).contains(&i) {
        red = 255 - i;
    } else if i > 512 && i < 768 {
        red = 255 - (i - 768).abs();
    }

    let mut green = 0;
    if i > 0 && i < 512 {
        green = 255 - (i - 256).abs();
    }

    let mut blue = 0;
    if i > 256 && i < 768 {
        blue = 255 - (i - 512).abs();
    }

    Led::new(red as u8, green as u8, blue as u8)
}

/// Additively mix two colors, saturating each channel at 255.
pub fn combine(a: Led, b: Led) -> Led {
    Led::new(
        a.red().saturating_add(b.red()),
        a.green().saturating_add(b.green()),
        a.blue().saturating_add(b.blue()),
    )
}

/// Linearly blend from `a` (t = 0.0) to `b` (t = 1.0).
pub fn blend(a: Led, b: Led, t: f32) -> Led {
    let t = t.clamp(0.0, 1.0);
    let lerp = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * t).round() as u8;
    Led::new(
        lerp(a.red(), b.red()),
        lerp(a.green(), b.green()),
        lerp(a.blue(), b.blue()),
    )
}

/// A glow around `center` that falls off linearly to black over
/// `width` LEDs on each side.
pub fn shine(color: Led, center: usize, width: usize, count: usize) -> Vec<Led> {
    (0..count)
        .map(|i| {
            let distance = center.abs_diff(i);
            if width == 0 || distance >= width {
                return Led::BLACK;
            }
            scale(color, 1.0 - distance as f32 / width as f32)
        })
        .collect()
}

/// A random lightning strike: a glow at a random position that decays
/// over `frames` payloads with per-frame flicker.
pub fn lightning(count: usize, frames: usize) -> Vec<Vec<Led>> {
    if count == 0 {
        return vec![Vec::new(); frames];
    }

    let mut rng = rand::thread_rng();
    let strike = rng.gen_range(0..count);
    let width = (count / 8).max(1);

    (0..frames)
        .map(|frame| {
            let flicker: f32 = rng.gen_range(0.6..=1.0);
            let brightness = 0.5f32.powi(frame as i32) * flicker;
            shine(scale(Led::WHITE, brightness), strike, width, count)
        })
        .collect()
}

fn scale(color: Led, factor: f32) -> Led {
    let factor = factor.clamp(0.0, 1.0);
    Led::new(
        (color.red() as f32 * factor).round() as u8,
        (color.green() as f32 * factor).round() as u8,
        (color.blue() as f32 * factor).round() as u8,
    )
}
