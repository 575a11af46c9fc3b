// ============================================================================
// CHROMA-KEY FILTER — near-white background removal with feathered edges
// ============================================================================

use image::{RgbaImage, imageops};
use rayon::prelude::*;
use serde::Deserialize;

/// Chroma-key parameters. `tolerance` is the RGB-distance-from-white below
/// which a pixel becomes fully transparent; `feather` is the band above the
/// tolerance over which alpha ramps linearly back to the original value;
/// `max_dimension` caps the longer image edge before filtering so cost stays
/// bounded on large sources.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChromaKeyParams {
    pub tolerance: f32,
    pub feather: f32,
    pub max_dimension: u32,
}

impl Default for ChromaKeyParams {
    fn default() -> Self {
        Self { tolerance: 30.0, feather: 20.0, max_dimension: 1024 }
    }
}

/// Outcome of filtering an ingredient image. The caller always gets an image
/// back: `Unfiltered` carries the original raster plus the reason filtering
/// was skipped, so a failed filter can never leave a drop without pixels.
pub enum FilterOutcome {
    Filtered(RgbaImage),
    Unfiltered { image: RgbaImage, reason: String },
}

impl FilterOutcome {
    pub fn is_filtered(&self) -> bool {
        matches!(self, FilterOutcome::Filtered(_))
    }

    pub fn into_image(self) -> RgbaImage {
        match self {
            FilterOutcome::Filtered(img) => img,
            FilterOutcome::Unfiltered { image, .. } => image,
        }
    }
}

/// Filter an ingredient image, falling back to the original on degenerate
/// input instead of failing the placement that requested it.
pub fn filter_ingredient(src: &RgbaImage, params: &ChromaKeyParams) -> FilterOutcome {
    if src.width() == 0 || src.height() == 0 {
        return FilterOutcome::Unfiltered {
            image: src.clone(),
            reason: "source image has no pixels".to_string(),
        };
    }
    FilterOutcome::Filtered(apply_chroma_key(src, params))
}

/// Pure white-key filter: downscale to the configured bound, then map each
/// pixel's alpha from its RGB distance to pure white. RGB channels are never
/// modified.
///
///   dist ≤ tolerance            → alpha 0
///   tolerance < dist ≤ t+f      → alpha × (dist − tolerance) / feather
///   dist > tolerance + feather  → alpha unchanged
///
/// A non-positive feather degenerates to a hard cutoff at the tolerance.
/// Zero-dimension images come back unchanged; there is no row to key.
pub fn apply_chroma_key(src: &RgbaImage, params: &ChromaKeyParams) -> RgbaImage {
    if src.width() == 0 || src.height() == 0 {
        return src.clone();
    }
    let mut out = match fit_within(src, params.max_dimension) {
        Some(resized) => resized,
        None => src.clone(),
    };

    let width = out.width() as usize;
    let tolerance = params.tolerance.max(0.0);
    let feather = params.feather.max(0.0);

    out.par_chunks_exact_mut(width * 4).for_each(|row| {
        for px in row.chunks_exact_mut(4) {
            let dist = white_distance(px[0], px[1], px[2]);
            if dist <= tolerance {
                px[3] = 0;
            } else if dist <= tolerance + feather && feather > 0.0 {
                let ramp = (dist - tolerance) / feather;
                px[3] = (px[3] as f32 * ramp).round().clamp(0.0, 255.0) as u8;
            }
            // Beyond the feather band the pixel is left untouched.
        }
    });

    out
}

/// Downscale so the longer edge equals `max_dimension`, preserving aspect
/// ratio. Returns `None` when the image already fits — images are never
/// upscaled.
pub fn fit_within(src: &RgbaImage, max_dimension: u32) -> Option<RgbaImage> {
    let (w, h) = src.dimensions();
    let longest = w.max(h);
    if max_dimension == 0 || longest <= max_dimension {
        return None;
    }
    let ratio = max_dimension as f32 / longest as f32;
    let new_w = ((w as f32 * ratio).round() as u32).max(1);
    let new_h = ((h as f32 * ratio).round() as u32).max(1);
    Some(imageops::resize(src, new_w, new_h, imageops::FilterType::Triangle))
}

/// Euclidean distance from pure white in RGB space.
#[inline]
fn white_distance(r: u8, g: u8, b: u8) -> f32 {
    let dr = 255.0 - r as f32;
    let dg = 255.0 - g as f32;
    let db = 255.0 - b as f32;
    (dr * dr + dg * dg + db * db).sqrt()
}
