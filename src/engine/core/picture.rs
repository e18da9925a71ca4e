//! Picture geometry helpers: crop cleanup and modulus rounding.
//!
//! One rounding rule is used everywhere: user-entered sizes snap to the
//! nearest multiple of the active modulus (ties round up), derived sizes
//! floor to it. The modulus passed in is always the one from the settings.

use serde::{Deserialize, Serialize};

use super::settings::Cropping;

/// Storage size of the source title, before cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDimensions {
    pub width: u32,
    pub height: u32,
}

impl SourceDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn cropped(&self, crop: &Cropping) -> (u32, u32) {
        (
            self.width.saturating_sub(crop.left.saturating_add(crop.right)),
            self.height.saturating_sub(crop.top.saturating_add(crop.bottom)),
        )
    }
}

/// Crop values must be even; odd values round up, or down at `u32::MAX`.
pub fn clean_crop(value: u32) -> u32 {
    value.checked_add(value % 2).unwrap_or(value & !1)
}

/// Snap to the nearest multiple of `modulus`, rounding ties up.
pub fn round_to_modulus(value: u32, modulus: u32) -> u32 {
    if modulus == 0 {
        return value;
    }
    let remainder = value % modulus;
    if remainder == 0 {
        value
    } else if remainder >= modulus - remainder {
        value
            .checked_add(modulus - remainder)
            .unwrap_or(value - remainder)
    } else {
        value - remainder
    }
}

pub fn floor_to_modulus(value: u32, modulus: u32) -> u32 {
    if modulus == 0 {
        return value;
    }
    value - value % modulus
}

/// Height that keeps the cropped source aspect at `width`, floored to `modulus`.
pub fn keep_aspect_height(
    source: SourceDimensions,
    crop: &Cropping,
    width: u32,
    modulus: u32,
) -> Option<u32> {
    let (cropped_w, cropped_h) = source.cropped(crop);
    if cropped_w == 0 || cropped_h == 0 {
        return None;
    }
    let raw = (width as u64 * cropped_h as u64 / cropped_w as u64) as u32;
    match floor_to_modulus(raw, modulus) {
        0 => None,
        h => Some(h),
    }
}

/// Display width produced by a custom pixel aspect ratio.
pub fn display_width_for_par(width: u32, pixel_aspect: (u32, u32)) -> Option<u32> {
    let (par_w, par_h) = pixel_aspect;
    if par_h == 0 {
        return None;
    }
    Some((width as u64 * par_w as u64 / par_h as u64) as u32)
}
