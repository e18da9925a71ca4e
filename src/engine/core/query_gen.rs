use tracing::debug;

use super::settings::{AudioTrack, EncodeSettings, RateControl, SubtitleTrack};
use super::types::{Anamorphic, Decomb, Detelecine, FramerateMode, VideoEncoder};

/// Accumulates query arguments in emission order.
#[derive(Debug, Default)]
struct QueryBuilder {
    parts: Vec<String>,
}

impl QueryBuilder {
    fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.parts.push(arg.into());
        self
    }

    fn quoted(&mut self, flag: &str, value: &str) -> &mut Self {
        self.arg(flag).arg(format!("\"{}\"", value))
    }

    fn finish(self) -> String {
        self.parts.join(" ")
    }
}

/// Invariant decimal formatting: period separator, no trailing zeros, and the
/// shortest digits that parse back to the same value.
pub fn format_decimal(value: f64) -> String {
    if value == 0.0 {
        // avoid "-0"
        return "0".to_string();
    }
    format!("{}", value)
}

/// Convert a quality slider position to the encoder's `-q` value.
///
/// * FFmpeg: quantizer `31 - (slider - 1)`
/// * x264: RF `51 - slider * cq_step`, two decimals
/// * Theora: the slider value itself
pub fn quality_from_slider(encoder: VideoEncoder, slider: u32, cq_step: f64) -> f64 {
    let slider = slider as f64;
    match encoder {
        VideoEncoder::FFmpeg => 31.0 - (slider - 1.0),
        VideoEncoder::X264 => ((51.0 - slider * cq_step) * 100.0).round() / 100.0,
        VideoEncoder::Theora => slider,
    }
}

fn apply_source(q: &mut QueryBuilder, s: &EncodeSettings) {
    if !s.source.trim().is_empty() {
        q.quoted("-i", &s.source);
    }
    if let Some(title) = s.title {
        q.arg("-t").arg(title.to_string());
    }
    if let Some(angle) = s.angle {
        q.arg("--angle").arg(angle.to_string());
    }
    if let Some(range) = s.chapters {
        let value = if range.start == range.end {
            range.start.to_string()
        } else {
            format!("{}-{}", range.start, range.end)
        };
        q.arg("-c").arg(value);
    }
}

fn apply_destination(q: &mut QueryBuilder, destination: &str) {
    if !destination.trim().is_empty() {
        q.quoted("-o", destination);
    }
}

fn apply_output_settings(q: &mut QueryBuilder, s: &EncodeSettings) {
    let container = s.container();
    q.arg("-f").arg(container.cli_token());
    if s.large_file {
        q.arg("-4");
    }
    if container.is_mp4_family() {
        if s.ipod_atom {
            q.arg("-I");
        }
        if s.optimize_mp4 {
            q.arg("-O");
        }
    }
}

fn apply_picture_settings(q: &mut QueryBuilder, s: &EncodeSettings) {
    // Strict anamorphic derives both dimensions; loose derives the height.
    if s.anamorphic != Anamorphic::Strict {
        if let Some(max_width) = s.max_width {
            q.arg("-X").arg(max_width.to_string());
        } else if let Some(width) = s.width {
            q.arg("-w").arg(width.to_string());
        }
    }
    if matches!(s.anamorphic, Anamorphic::None | Anamorphic::Custom) {
        if let Some(max_height) = s.max_height {
            q.arg("-Y").arg(max_height.to_string());
        } else if let Some(height) = s.height.filter(|h| *h > 0) {
            q.arg("-l").arg(height.to_string());
        }
    }

    if let Some(crop) = s.cropping() {
        q.arg("--crop").arg(format!(
            "{}:{}:{}:{}",
            crop.top, crop.bottom, crop.left, crop.right
        ));
    }

    if let Some(flag) = s.anamorphic.cli_flag() {
        q.arg(flag);
    }
    if s.anamorphic == Anamorphic::Custom {
        let custom = &s.custom_anamorphic;
        if let Some(display_width) = custom.display_width {
            q.arg("--display-width").arg(display_width.to_string());
        }
        if custom.keep_display_aspect {
            q.arg("--keep-display-aspect");
        }
        if let Some((par_w, par_h)) = custom.pixel_aspect {
            q.arg("--pixel-aspect").arg(format!("{}:{}", par_w, par_h));
        }
    }

    if s.modulus() != super::settings::DEFAULT_MODULUS {
        q.arg("--modulus").arg(s.modulus().to_string());
    }
}

fn apply_filters(q: &mut QueryBuilder, s: &EncodeSettings) {
    let filters = &s.filters;

    match &filters.detelecine {
        Detelecine::Off => {}
        Detelecine::Default => {
            q.arg("--detelecine");
        }
        Detelecine::Custom(value) => {
            q.arg(format!("--detelecine=\"{}\"", value));
        }
    }

    match filters.decomb() {
        Decomb::Off => {}
        Decomb::Default => {
            q.arg("--decomb");
        }
        Decomb::Bob => {
            q.arg("--decomb=\"bob\"");
        }
        Decomb::Fast => {
            q.arg("--decomb=\"fast\"");
        }
        Decomb::Custom(value) => {
            q.arg(format!("--decomb=\"{}\"", value));
        }
    }

    if let Some(value) = filters.deinterlace().cli_value() {
        q.arg(format!("--deinterlace=\"{}\"", value));
    }
    if let Some(value) = filters.denoise.cli_value() {
        q.arg(format!("--denoise=\"{}\"", value));
    }
    if filters.deblock_enabled() {
        q.arg(format!("--deblock={}", filters.deblock));
    }
    if filters.grayscale {
        q.arg("-g");
    }
}

fn apply_video_settings(q: &mut QueryBuilder, s: &EncodeSettings) {
    q.arg("-e").arg(s.video_encoder.cli_token());

    match s.rate_control {
        Some(RateControl::AverageBitrate(kbps)) => {
            q.arg("-b").arg(kbps.to_string());
        }
        Some(RateControl::TargetFileSize(mb)) => {
            q.arg("-S").arg(mb.to_string());
        }
        Some(RateControl::ConstantQuality(quality)) => {
            q.arg("-q").arg(format_decimal(quality));
        }
        None => {}
    }

    if s.uses_two_pass() {
        q.arg("-2");
        if s.turbo_first_pass {
            q.arg("-T");
        }
    }

    let framerate = s
        .framerate
        .as_deref()
        .map(str::trim)
        .filter(|fps| !fps.is_empty() && !fps.eq_ignore_ascii_case("same as source"));
    if let Some(fps) = framerate {
        q.arg("-r").arg(fps);
    }
    if framerate.is_some() || s.framerate_mode != FramerateMode::Vfr {
        q.arg(s.framerate_mode.cli_flag());
    }
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

/// Audio lists are built in parallel so every list has one entry per track.
fn apply_audio_settings(q: &mut QueryBuilder, tracks: &[AudioTrack]) {
    if tracks.is_empty() {
        q.arg("-a").arg("none");
        return;
    }

    let mut sources = Vec::with_capacity(tracks.len());
    let mut codecs = Vec::with_capacity(tracks.len());
    let mut mixdowns = Vec::with_capacity(tracks.len());
    let mut samplerates = Vec::with_capacity(tracks.len());
    let mut bitrates = Vec::with_capacity(tracks.len());
    let mut drcs = Vec::with_capacity(tracks.len());

    for track in tracks {
        let encoder = track.encoder();
        sources.push(or_placeholder(&track.source_track, "1"));
        codecs.push(encoder.cli_token().to_string());
        if encoder.is_passthru() {
            mixdowns.push("auto".to_string());
            samplerates.push("auto".to_string());
            bitrates.push("auto".to_string());
            drcs.push("0".to_string());
        } else {
            mixdowns.push(track.mixdown.cli_token().to_string());
            samplerates.push(or_placeholder(&track.sample_rate, "auto").to_ascii_lowercase());
            bitrates.push(or_placeholder(&track.bitrate, "auto").to_ascii_lowercase());
            drcs.push(format_decimal(track.drc));
        }
    }

    q.arg("-a").arg(sources.join(","));
    q.arg("-E").arg(codecs.join(","));
    q.arg("-6").arg(mixdowns.join(","));
    q.arg("-R").arg(samplerates.join(","));
    q.arg("-B").arg(bitrates.join(","));
    q.arg("-D").arg(drcs.join(","));
}

/// Tracks with a blank selector can not be referenced and are skipped.
fn apply_subtitle_settings(q: &mut QueryBuilder, s: &EncodeSettings) {
    let tracks: Vec<&SubtitleTrack> = s
        .subtitle_tracks()
        .iter()
        .filter(|t| !t.source_track.trim().is_empty())
        .collect();
    if tracks.is_empty() {
        return;
    }

    let ids: Vec<&str> = tracks.iter().map(|t| t.source_track.trim()).collect();
    q.arg("--subtitle").arg(ids.join(","));

    let forced: Vec<&str> = tracks
        .iter()
        .filter(|t| t.forced)
        .map(|t| t.source_track.trim())
        .collect();
    if !forced.is_empty() {
        q.arg("--subtitle-forced").arg(forced.join(","));
    }
    if let Some(burned) = tracks.iter().find(|t| t.burned_in) {
        q.arg("--subtitle-burn").arg(burned.source_track.trim());
    }
    if let Some(default) = tracks.iter().find(|t| t.is_default) {
        q.arg("--subtitle-default").arg(default.source_track.trim());
    }
}

fn apply_tail(q: &mut QueryBuilder, s: &EncodeSettings) {
    if s.chapter_markers {
        match s.chapter_markers_file.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => {
                q.arg(format!("--markers=\"{}\"", path));
            }
            _ => {
                q.arg("-m");
            }
        }
    }

    if !s.advanced_options.is_empty() {
        q.arg("-x").arg(s.advanced_options.to_query_string());
    }

    q.arg("-v").arg(s.verbosity.to_string());
}

fn apply_tabbed_components(q: &mut QueryBuilder, s: &EncodeSettings) {
    apply_output_settings(q, s);
    apply_picture_settings(q, s);
    apply_filters(q, s);
    apply_video_settings(q, s);
    apply_audio_settings(q, &s.audio_tracks);
    apply_subtitle_settings(q, s);
    apply_tail(q, s);
}

/// Build the full encoder query for a job.
pub fn generate_query(settings: &EncodeSettings) -> String {
    let mut q = QueryBuilder::default();
    apply_source(&mut q, settings);
    apply_destination(&mut q, &settings.destination);
    apply_tabbed_components(&mut q, settings);

    let query = q.finish();
    debug!(query = %query, "generated encoder query");
    query
}

/// `movie.mp4` -> `movie_sample.mp4`; other names are left alone.
fn sample_destination(destination: &str) -> String {
    for ext in [".mp4", ".m4v", ".mkv"] {
        if let Some(stem) = destination.strip_suffix(ext) {
            return format!("{}_sample{}", stem, ext);
        }
    }
    destination.to_string()
}

/// Build a shortened query that encodes `duration_secs` starting at preview `preview`.
pub fn generate_preview_query(
    settings: &EncodeSettings,
    preview: u32,
    duration_secs: u32,
) -> String {
    let mut q = QueryBuilder::default();
    apply_source(&mut q, settings);
    q.arg("--start-at-preview").arg(preview.to_string());
    q.arg("--stop-at").arg(format!("duration:{}", duration_secs));
    apply_destination(&mut q, &sample_destination(&settings.destination));
    apply_tabbed_components(&mut q, settings);

    let query = q.finish();
    debug!(query = %query, preview, duration_secs, "generated preview query");
    query
}
