//! Procedurally generated media, so the demo runs without asset files.

use std::f32::consts::TAU;

use room_engine::content::{AudioClip, ContentError, ImageData};
use room_engine::MediaSet;

pub(crate) const ORB_FRAMES: u32 = 4;
const ORB_SIZE: u32 = 16;
const TILE_SIZE: u32 = 16;
const SAMPLE_RATE: u32 = 22_050;

pub(crate) fn generate() -> Result<MediaSet, ContentError> {
    let mut media = MediaSet::new();
    media.insert_image("orb_default", orb_strip([120, 200, 255])?);
    media.insert_image("orb_lit", orb_strip([255, 214, 96])?);
    media.insert_image("checker", checker([28, 34, 52], [36, 44, 66])?);
    media.insert_image("logo", logo()?);
    media.insert_clip("theme", theme());
    media.insert_clip("blip", blip());
    Ok(media)
}

/// Pulsing disc, one frame per pulse step, laid out left to right.
fn orb_strip(tint: [u8; 3]) -> Result<ImageData, ContentError> {
    let width = ORB_SIZE * ORB_FRAMES;
    let mut rgba = vec![0u8; (width * ORB_SIZE * 4) as usize];
    let center = (ORB_SIZE as f32 - 1.0) / 2.0;
    for frame in 0..ORB_FRAMES {
        let radius = 5.0 + frame.min(ORB_FRAMES - frame) as f32;
        for y in 0..ORB_SIZE {
            for x in 0..ORB_SIZE {
                let (dx, dy) = (x as f32 - center, y as f32 - center);
                let distance = (dx * dx + dy * dy).sqrt();
                if distance > radius {
                    continue;
                }
                let shade = 1.0 - 0.5 * distance / radius;
                let offset = ((y * width + frame * ORB_SIZE + x) * 4) as usize;
                rgba[offset] = (f32::from(tint[0]) * shade) as u8;
                rgba[offset + 1] = (f32::from(tint[1]) * shade) as u8;
                rgba[offset + 2] = (f32::from(tint[2]) * shade) as u8;
                rgba[offset + 3] = 255;
            }
        }
    }
    ImageData::new(width, ORB_SIZE, rgba)
}

fn checker(dark: [u8; 3], light: [u8; 3]) -> Result<ImageData, ContentError> {
    let mut rgba = Vec::with_capacity((TILE_SIZE * TILE_SIZE * 4) as usize);
    for y in 0..TILE_SIZE {
        for x in 0..TILE_SIZE {
            let [r, g, b] = if (x < TILE_SIZE / 2) == (y < TILE_SIZE / 2) {
                dark
            } else {
                light
            };
            rgba.extend_from_slice(&[r, g, b, 255]);
        }
    }
    ImageData::new(TILE_SIZE, TILE_SIZE, rgba)
}

/// Framed banner with a diagonal stripe pattern.
fn logo() -> Result<ImageData, ContentError> {
    let (width, height) = (96u32, 24u32);
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let border = x < 2 || y < 2 || x >= width - 2 || y >= height - 2;
            let pixel = if border {
                [250, 250, 250, 255]
            } else if (x + y) % 8 < 4 {
                [210, 70, 90, 255]
            } else {
                [150, 40, 70, 255]
            };
            rgba.extend_from_slice(&pixel);
        }
    }
    ImageData::new(width, height, rgba)
}

/// Four-bar arpeggio that loops cleanly.
fn theme() -> AudioClip {
    const NOTES: [f32; 8] = [220.0, 277.18, 329.63, 440.0, 329.63, 277.18, 246.94, 293.66];
    let note_samples = (SAMPLE_RATE / 4) as usize;
    let mut samples = Vec::with_capacity(NOTES.len() * note_samples);
    for frequency in NOTES {
        for i in 0..note_samples {
            let t = i as f32 / SAMPLE_RATE as f32;
            let envelope = 1.0 - i as f32 / note_samples as f32;
            samples.push(0.2 * envelope * (TAU * frequency * t).sin());
        }
    }
    AudioClip::new(samples, 1, SAMPLE_RATE)
}

fn blip() -> AudioClip {
    let length = (SAMPLE_RATE / 12) as usize;
    let samples = (0..length)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let square = if (t * 880.0).fract() < 0.5 { 1.0 } else { -1.0 };
            0.15 * square * (1.0 - i as f32 / length as f32)
        })
        .collect();
    AudioClip::new(samples, 1, SAMPLE_RATE)
}
