//! Rule checks for settings before a query is handed to the encoder.
//!
//! Query generation never fails; this is where conflicting or out-of-range
//! fields are reported so a caller can surface them.

use crate::engine::core::{
    Anamorphic, Decomb, Deinterlace, EncodeSettings, RateControl, VALID_MODULI,
};
use crate::engine::core::{DEBLOCK_MAX, DEBLOCK_OFF};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// Collect every rule violation in `settings`.
pub fn validate_settings(settings: &EncodeSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.source.trim().is_empty() {
        errors.push(err("source", "source path is empty"));
    }
    if settings.destination.trim().is_empty() {
        errors.push(err("destination", "destination path is empty"));
    }

    if let Some(range) = settings.chapters {
        if range.end < range.start {
            errors.push(err("chapters", "chapter start is after chapter end"));
        }
    }

    // Picture
    if let Some(crop) = settings.cropping() {
        if !crop.is_even() {
            errors.push(err("cropping", "crop values must be even"));
        }
    }
    if !VALID_MODULI.contains(&settings.modulus()) {
        errors.push(err("modulus", "modulus must be 16, 8, 4 or 2"));
    }
    if settings.width == Some(0) || settings.height == Some(0) {
        errors.push(err("picture", "width and height must be positive"));
    }
    if settings.anamorphic != Anamorphic::Custom
        && settings.custom_anamorphic != Default::default()
    {
        errors.push(err(
            "custom_anamorphic",
            "custom anamorphic options are ignored unless anamorphic mode is Custom",
        ));
    }
    if let Some((par_w, par_h)) = settings.custom_anamorphic.pixel_aspect {
        if par_w == 0 || par_h == 0 {
            errors.push(err("pixel_aspect", "pixel aspect parts must be positive"));
        }
    }

    // Filters
    let filters = &settings.filters;
    if *filters.decomb() != Decomb::Off && *filters.deinterlace() != Deinterlace::Off {
        errors.push(err(
            "filters",
            "decomb and deinterlace can not be enabled together",
        ));
    }
    if filters.deblock < DEBLOCK_OFF || filters.deblock > DEBLOCK_MAX {
        errors.push(err("deblock", "deblock must be between 4 (off) and 15"));
    }

    // Output
    if !settings.container().is_mp4_family() && (settings.ipod_atom || settings.optimize_mp4) {
        errors.push(err(
            "container",
            "iPod atom and MP4 optimization require an MP4 or M4V container",
        ));
    }

    // Video
    match settings.rate_control {
        None => errors.push(err("rate_control", "no rate control mode selected")),
        Some(RateControl::ConstantQuality(q)) if !q.is_finite() || q < 0.0 => {
            errors.push(err("rate_control", "constant quality must be a positive number"))
        }
        Some(RateControl::AverageBitrate(0)) | Some(RateControl::TargetFileSize(0)) => {
            errors.push(err("rate_control", "bitrate and target size must be positive"))
        }
        _ => {}
    }
    if (settings.two_pass || settings.turbo_first_pass) && !settings.uses_two_pass() {
        errors.push(err(
            "two_pass",
            "two-pass encoding is only used with an average bitrate",
        ));
    }
    if settings.turbo_first_pass && !settings.two_pass {
        errors.push(err("turbo_first_pass", "turbo first pass requires two-pass"));
    }

    // Audio
    for (i, track) in settings.audio_tracks.iter().enumerate() {
        if track.encoder().is_passthru()
            && (!track.bitrate.eq_ignore_ascii_case("auto")
                || !track.sample_rate.eq_ignore_ascii_case("auto"))
        {
            errors.push(err(
                &format!("audio_tracks[{}]", i),
                "passthru tracks must use automatic bitrate and samplerate",
            ));
        }
        if track.drc < 0.0 {
            errors.push(err(&format!("audio_tracks[{}]", i), "DRC can not be negative"));
        }
    }

    // Subtitles
    let tracks = settings.subtitle_tracks();
    let mut selectors: Vec<&str> = Vec::with_capacity(tracks.len());
    for (i, track) in tracks.iter().enumerate() {
        let selector = track.source_track.trim();
        if selector.is_empty() {
            errors.push(err(
                &format!("subtitle_tracks[{}]", i),
                "subtitle track selector is empty",
            ));
        } else if selectors.contains(&selector) {
            errors.push(err(
                &format!("subtitle_tracks[{}]", i),
                "subtitle track selector is used by another track",
            ));
        } else {
            selectors.push(selector);
        }
    }
    if tracks.iter().filter(|t| t.burned_in).count() > 1 {
        errors.push(err("subtitle_tracks", "only one subtitle track can be burned in"));
    }
    if tracks.iter().filter(|t| t.is_default).count() > 1 {
        errors.push(err("subtitle_tracks", "only one subtitle track can be default"));
    }
    if settings.container().is_mp4_family() {
        let bitmap: Vec<_> = tracks.iter().filter(|t| t.bitmap).collect();
        if bitmap.len() > 1 {
            errors.push(err(
                "subtitle_tracks",
                "MP4 supports a single bitmap subtitle track",
            ));
        }
        if bitmap.iter().any(|t| !t.burned_in) {
            errors.push(err(
                "subtitle_tracks",
                "bitmap subtitles must be burned in for MP4",
            ));
        }
    }

    if settings.chapter_markers_file.is_some() && !settings.chapter_markers {
        errors.push(err(
            "chapter_markers_file",
            "a markers file is set but chapter markers are disabled",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn err(field: &str, message: &str) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.to_string(),
    }
}
