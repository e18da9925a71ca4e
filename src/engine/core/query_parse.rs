//! Best-effort reconstruction of `EncodeSettings` from an encoder query.
//!
//! Each flag has its own pattern and is matched independently against the
//! whole string, so flag order does not matter. Unmatched flags leave the
//! field at its default; malformed numbers are logged and ignored.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::settings::{AudioTrack, ChapterRange, EncodeSettings, RateControl, SubtitleTrack};
use super::types::{
    Anamorphic, AudioEncoder, Container, Decomb, Deinterlace, Denoise, Detelecine, FramerateMode,
    Mixdown, VideoEncoder,
};
use crate::engine::x264::AdvancedOptionSet;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("invalid query regex")
}

macro_rules! flag_regex {
    ($($name:ident = $pattern:literal;)*) => {
        $(static $name: LazyLock<Regex> = LazyLock::new(|| re($pattern));)*
    };
}

flag_regex! {
    // Source / destination
    SOURCE = r#"(?:^|\s)-i\s+"([^"]*)""#;
    TITLE = r"(?:^|\s)-t\s+(\S+)";
    ANGLE = r"(?:^|\s)--angle\s+(\S+)";
    CHAPTERS = r"(?:^|\s)-c\s+(\S+)";
    DESTINATION = r#"(?:^|\s)-o\s+"([^"]*)""#;

    // Output
    CONTAINER = r"(?:^|\s)-f\s+(\S+)";
    LARGE_FILE = r"(?:^|\s)-4(?:\s|$)";
    IPOD_ATOM = r"(?:^|\s)-I(?:\s|$)";
    OPTIMIZE = r"(?:^|\s)-O(?:\s|$)";

    // Picture
    WIDTH = r"(?:^|\s)-w\s+(\S+)";
    HEIGHT = r"(?:^|\s)-l\s+(\S+)";
    MAX_WIDTH = r"(?:^|\s)-X\s+(\S+)";
    MAX_HEIGHT = r"(?:^|\s)-Y\s+(\S+)";
    CROP = r"(?:^|\s)--crop\s+(\S+)";
    STRICT = r"(?:^|\s)--strict-anamorphic(?:\s|$)";
    LOOSE = r"(?:^|\s)--loose-anamorphic(?:\s|$)";
    CUSTOM = r"(?:^|\s)--custom-anamorphic(?:\s|$)";
    DISPLAY_WIDTH = r"(?:^|\s)--display-width\s+(\S+)";
    KEEP_DISPLAY_ASPECT = r"(?:^|\s)--keep-display-aspect(?:\s|$)";
    PIXEL_ASPECT = r"(?:^|\s)--pixel-aspect\s+(\d+):(\d+)";
    MODULUS = r"(?:^|\s)--modulus\s+(\S+)";

    // Filters
    DETELECINE = r#"(?:^|\s)--detelecine(?:="([^"]*)")?(?:\s|$)"#;
    DECOMB = r#"(?:^|\s)--decomb(?:="([^"]*)")?(?:\s|$)"#;
    DEINTERLACE = r#"(?:^|\s)--deinterlace="([^"]*)""#;
    DENOISE = r#"(?:^|\s)--denoise="([^"]*)""#;
    DEBLOCK = r"(?:^|\s)--deblock=(\S+)";
    GRAYSCALE = r"(?:^|\s)-g(?:\s|$)";

    // Video
    VIDEO_ENCODER = r"(?:^|\s)-e\s+(\S+)";
    BITRATE = r"(?:^|\s)-b\s+(\S+)";
    TARGET_SIZE = r"(?:^|\s)-S\s+(\S+)";
    QUALITY = r"(?:^|\s)-q\s+(\S+)";
    TWO_PASS = r"(?:^|\s)-2(?:\s|$)";
    TURBO = r"(?:^|\s)-T(?:\s|$)";
    FRAMERATE = r"(?:^|\s)-r\s+(\S+)";
    PFR = r"(?:^|\s)--pfr(?:\s|$)";
    CFR = r"(?:^|\s)--cfr(?:\s|$)";
    VFR = r"(?:^|\s)--vfr(?:\s|$)";

    // Audio
    AUDIO_TRACKS = r"(?:^|\s)-a\s+(\S+)";
    AUDIO_ENCODERS = r"(?:^|\s)-E\s+(\S+)";
    AUDIO_MIXDOWNS = r"(?:^|\s)-6\s+(\S+)";
    AUDIO_SAMPLERATES = r"(?:^|\s)-R\s+(\S+)";
    AUDIO_BITRATES = r"(?:^|\s)-B\s+(\S+)";
    AUDIO_DRC = r"(?:^|\s)-D\s+(\S+)";

    // Subtitles
    SUBTITLES = r"(?:^|\s)--subtitle\s+(\S+)";
    SUBTITLE_FORCED = r"(?:^|\s)--subtitle-forced(?:\s+([^\s-]\S*))?(?:\s|$)";
    SUBTITLE_BURN = r"(?:^|\s)--subtitle-burn\s+(\S+)";
    SUBTITLE_DEFAULT = r"(?:^|\s)--subtitle-default\s+(\S+)";
    LEGACY_SUBTITLE = r"(?:^|\s)-s\s+(\S+)";
    LEGACY_FORCED = r"(?:^|\s)-F(?:\s|$)";

    // Chapters / advanced / logging
    MARKERS = r"(?:^|\s)-m(?:\s|$)";
    MARKERS_FILE = r#"(?:^|\s)--markers="([^"]*)""#;
    ADVANCED = r"(?:^|\s)-x\s+(\S+)";
    VERBOSITY = r"(?:^|\s)-v\s+(\S+)";
}

/// Replace the contents of double-quoted spans with `_`, keeping byte offsets.
///
/// Patterns run against the masked text so a path like `"a -t 5.mkv"` can not
/// satisfy another flag; captured values are sliced from the original.
fn mask_quoted(query: &str) -> String {
    let mut masked = String::with_capacity(query.len());
    let mut in_quotes = false;
    for c in query.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
            masked.push(c);
        } else if in_quotes {
            for _ in 0..c.len_utf8() {
                masked.push('_');
            }
        } else {
            masked.push(c);
        }
    }
    masked
}

struct Query<'a> {
    original: &'a str,
    masked: String,
}

impl<'a> Query<'a> {
    fn new(original: &'a str) -> Self {
        Self {
            original,
            masked: mask_quoted(original),
        }
    }

    fn has(&self, re: &Regex) -> bool {
        re.is_match(&self.masked)
    }

    /// Capture group `group` of the first match, sliced from the original text.
    fn group(&self, re: &Regex, group: usize) -> Option<&'a str> {
        let caps = re.captures(&self.masked)?;
        let m = caps.get(group)?;
        Some(&self.original[m.range()])
    }

    fn value(&self, re: &Regex, flag: &str) -> Option<&'a str> {
        let value = self.group(re, 1)?;
        debug!(flag, value, "matched query flag");
        Some(value)
    }

    fn number<T: FromStr>(&self, re: &Regex, flag: &str) -> Option<T> {
        parse_number(self.value(re, flag)?, flag)
    }

    fn list(&self, re: &Regex, flag: &str) -> Vec<&'a str> {
        self.value(re, flag)
            .map(|v| v.split(',').map(str::trim).collect())
            .unwrap_or_default()
    }
}

fn parse_number<T: FromStr>(raw: &str, flag: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(flag, value = raw, "ignoring malformed numeric value");
            None
        }
    }
}

/// `N`, `S-E`. Either side failing to parse drops the whole range.
fn parse_chapters(raw: &str) -> Option<ChapterRange> {
    match raw.split_once('-') {
        Some((start, end)) => Some(ChapterRange::new(
            parse_number(start, "-c")?,
            parse_number(end, "-c")?,
        )),
        None => parse_number(raw, "-c").map(ChapterRange::single),
    }
}

fn parse_source(q: &Query, s: &mut EncodeSettings) {
    if let Some(source) = q.value(&SOURCE, "-i") {
        s.source = source.to_string();
    }
    s.title = q.number(&TITLE, "-t");
    s.angle = q.number(&ANGLE, "--angle");
    s.chapters = q.value(&CHAPTERS, "-c").and_then(parse_chapters);
    if let Some(destination) = q.value(&DESTINATION, "-o") {
        s.destination = destination.to_string();
    }
}

fn parse_output(q: &Query, s: &mut EncodeSettings) {
    if let Some(token) = q.value(&CONTAINER, "-f") {
        match Container::from_cli_token(token) {
            Some(container) => s.set_container(container),
            None => warn!(value = token, "unknown container token"),
        }
    }
    s.large_file = q.has(&LARGE_FILE);
    s.ipod_atom = q.has(&IPOD_ATOM);
    s.optimize_mp4 = q.has(&OPTIMIZE);
}

fn parse_picture(q: &Query, s: &mut EncodeSettings) {
    s.width = q.number(&WIDTH, "-w");
    s.height = q.number(&HEIGHT, "-l");
    s.max_width = q.number(&MAX_WIDTH, "-X");
    s.max_height = q.number(&MAX_HEIGHT, "-Y");

    if let Some(raw) = q.value(&CROP, "--crop") {
        let values: Option<Vec<u32>> = raw.split(':').map(|v| parse_number(v, "--crop")).collect();
        match values.as_deref() {
            Some(&[top, bottom, left, right]) => s.set_cropping(top, bottom, left, right),
            _ => warn!(value = raw, "crop needs four values"),
        }
    }

    s.anamorphic = if q.has(&STRICT) {
        Anamorphic::Strict
    } else if q.has(&LOOSE) {
        Anamorphic::Loose
    } else if q.has(&CUSTOM) {
        Anamorphic::Custom
    } else {
        Anamorphic::None
    };

    s.custom_anamorphic.display_width = q.number(&DISPLAY_WIDTH, "--display-width");
    s.custom_anamorphic.keep_display_aspect = q.has(&KEEP_DISPLAY_ASPECT);
    s.custom_anamorphic.pixel_aspect = match (q.group(&PIXEL_ASPECT, 1), q.group(&PIXEL_ASPECT, 2))
    {
        (Some(w), Some(h)) => {
            parse_number(w, "--pixel-aspect").zip(parse_number(h, "--pixel-aspect"))
        }
        _ => None,
    };

    if let Some(modulus) = q.number::<u32>(&MODULUS, "--modulus") {
        if !s.set_modulus(modulus) {
            warn!(modulus, "ignoring unsupported modulus");
        }
    }
}

fn parse_filters(q: &Query, s: &mut EncodeSettings) {
    if q.has(&DETELECINE) {
        s.filters.detelecine = match q.group(&DETELECINE, 1).map(str::trim) {
            Some(value) if !value.is_empty() => Detelecine::Custom(value.to_string()),
            _ => Detelecine::Default,
        };
    }
    if let Some(value) = q.value(&DEINTERLACE, "--deinterlace") {
        s.filters.set_deinterlace(Deinterlace::from_value(value));
    }
    // Applied after deinterlace so decomb wins when both are present.
    if q.has(&DECOMB) {
        let value = q.group(&DECOMB, 1).unwrap_or_default();
        s.filters.set_decomb(Decomb::from_value(value));
    }
    if let Some(value) = q.value(&DENOISE, "--denoise") {
        s.filters.denoise = Denoise::from_value(value);
    }
    if let Some(deblock) = q.number::<u8>(&DEBLOCK, "--deblock") {
        s.filters.set_deblock(deblock);
    }
    s.filters.grayscale = q.has(&GRAYSCALE);
}

fn parse_video(q: &Query, s: &mut EncodeSettings) {
    if let Some(token) = q.value(&VIDEO_ENCODER, "-e") {
        match VideoEncoder::from_cli_token(token) {
            Some(encoder) => s.video_encoder = encoder,
            None => warn!(value = token, "unknown video encoder token"),
        }
    }

    // Later modes override earlier ones: bitrate, then size, then quality.
    if let Some(kbps) = q.number(&BITRATE, "-b") {
        s.rate_control = Some(RateControl::AverageBitrate(kbps));
    }
    if let Some(mb) = q.number::<f64>(&TARGET_SIZE, "-S") {
        s.rate_control = Some(RateControl::TargetFileSize(mb.max(0.0).round() as u32));
    }
    if let Some(quality) = q.number(&QUALITY, "-q") {
        s.rate_control = Some(RateControl::ConstantQuality(quality));
    }

    s.two_pass = q.has(&TWO_PASS);
    s.turbo_first_pass = q.has(&TURBO);

    s.framerate = q.value(&FRAMERATE, "-r").map(str::to_string);
    s.framerate_mode = if q.has(&PFR) {
        FramerateMode::Pfr
    } else if q.has(&CFR) {
        FramerateMode::Cfr
    } else {
        if !q.has(&VFR) {
            debug!("no framerate mode flag, assuming variable");
        }
        FramerateMode::Vfr
    };
}

/// Entry `i` of an audio list, `None` when missing or blank.
fn nth(list: &[&str], i: usize) -> Option<String> {
    list.get(i)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_audio(q: &Query, s: &mut EncodeSettings) {
    let sources = q.list(&AUDIO_TRACKS, "-a");
    if sources.first().is_some_and(|t| t.eq_ignore_ascii_case("none")) {
        s.audio_tracks.clear();
        return;
    }
    let encoders = q.list(&AUDIO_ENCODERS, "-E");
    let mixdowns = q.list(&AUDIO_MIXDOWNS, "-6");
    let samplerates = q.list(&AUDIO_SAMPLERATES, "-R");
    let bitrates = q.list(&AUDIO_BITRATES, "-B");
    let drcs = q.list(&AUDIO_DRC, "-D");

    let count = if encoders.is_empty() {
        sources.len()
    } else {
        encoders.len()
    };

    s.audio_tracks = (0..count)
        .map(|i| {
            let source = nth(&sources, i).unwrap_or_else(|| "1".to_string());
            let encoder = match nth(&encoders, i) {
                Some(token) => AudioEncoder::from_cli_token(&token).unwrap_or_else(|| {
                    warn!(value = %token, "unknown audio encoder token");
                    AudioEncoder::default()
                }),
                None => AudioEncoder::default(),
            };
            let mixdown = nth(&mixdowns, i)
                .and_then(|m| Mixdown::from_cli_token(&m))
                .unwrap_or_default();
            let drc = nth(&drcs, i)
                .and_then(|d| parse_number::<f64>(&d, "-D"))
                .unwrap_or(0.0);

            AudioTrack::new(source, encoder)
                .with_mixdown(mixdown)
                .with_sample_rate(
                    nth(&samplerates, i)
                        .unwrap_or_else(|| "auto".to_string())
                        .to_ascii_lowercase(),
                )
                .with_bitrate(
                    nth(&bitrates, i)
                        .unwrap_or_else(|| "auto".to_string())
                        .to_ascii_lowercase(),
                )
                .with_drc(drc)
        })
        .collect();
}

fn parse_subtitles(q: &Query, s: &mut EncodeSettings) {
    s.clear_subtitle_tracks();

    let ids = q.list(&SUBTITLES, "--subtitle");
    if ids.is_empty() {
        if let Some(id) = q.value(&LEGACY_SUBTITLE, "-s") {
            s.add_subtitle_track(SubtitleTrack {
                forced: q.has(&LEGACY_FORCED),
                ..SubtitleTrack::new(id)
            });
        }
        return;
    }

    // A bare --subtitle-forced applies to every listed track.
    let forced_all = q.has(&SUBTITLE_FORCED) && q.group(&SUBTITLE_FORCED, 1).is_none();
    let forced = q.list(&SUBTITLE_FORCED, "--subtitle-forced");
    let burned = q.value(&SUBTITLE_BURN, "--subtitle-burn");
    let default = q.value(&SUBTITLE_DEFAULT, "--subtitle-default");

    for id in ids {
        s.add_subtitle_track(SubtitleTrack {
            forced: forced_all || forced.contains(&id),
            burned_in: burned == Some(id),
            is_default: default == Some(id),
            ..SubtitleTrack::new(id)
        });
    }
}

fn parse_tail(q: &Query, s: &mut EncodeSettings) {
    if let Some(path) = q.value(&MARKERS_FILE, "--markers") {
        s.chapter_markers = true;
        s.chapter_markers_file = Some(path.to_string());
    } else {
        s.chapter_markers = q.has(&MARKERS);
    }

    if let Some(raw) = q.value(&ADVANCED, "-x") {
        s.advanced_options = AdvancedOptionSet::parse(raw);
    }

    if let Some(verbosity) = q.number(&VERBOSITY, "-v") {
        s.verbosity = verbosity;
    }
}

/// Rebuild settings from a query string. Never fails; unknown input yields defaults.
pub fn parse_query(query: &str) -> EncodeSettings {
    let q = Query::new(query);
    let mut settings = EncodeSettings::default();

    parse_source(&q, &mut settings);
    parse_output(&q, &mut settings);
    parse_picture(&q, &mut settings);
    parse_filters(&q, &mut settings);
    parse_video(&q, &mut settings);
    parse_audio(&q, &mut settings);
    parse_subtitles(&q, &mut settings);
    parse_tail(&q, &mut settings);

    settings
}
