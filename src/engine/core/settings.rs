use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use super::picture::{self, SourceDimensions};
use super::types::{
    Anamorphic, AudioEncoder, Container, Decomb, Deinterlace, Denoise, Detelecine, FramerateMode,
    Mixdown, VideoEncoder,
};
use crate::engine::x264::AdvancedOptionSet;

/// Deblock slider value that means "off".
pub const DEBLOCK_OFF: u8 = 4;
pub const DEBLOCK_MAX: u8 = 15;

pub const DEFAULT_MODULUS: u32 = 16;
pub const VALID_MODULI: [u32; 4] = [16, 8, 4, 2];

fn default_modulus() -> u32 {
    DEFAULT_MODULUS
}
fn default_deblock() -> u8 {
    DEBLOCK_OFF
}
fn default_verbosity() -> u8 {
    1
}
fn default_auto() -> String {
    "auto".to_string()
}
fn default_track() -> String {
    "1".to_string()
}

/// Crop values in pixels. Always even.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cropping {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl Cropping {
    /// Odd inputs are rounded up to the next even number.
    pub fn new(top: u32, bottom: u32, left: u32, right: u32) -> Self {
        Self {
            top: picture::clean_crop(top),
            bottom: picture::clean_crop(bottom),
            left: picture::clean_crop(left),
            right: picture::clean_crop(right),
        }
    }

    pub fn is_even(&self) -> bool {
        [self.top, self.bottom, self.left, self.right]
            .iter()
            .all(|v| v % 2 == 0)
    }
}

/// Chapter range. A start of 0 means "from the first chapter".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRange {
    pub start: u32,
    pub end: u32,
}

impl ChapterRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn single(chapter: u32) -> Self {
        Self {
            start: chapter,
            end: chapter,
        }
    }
}

/// Sub-settings that only apply to custom anamorphic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomAnamorphic {
    #[serde(default)]
    pub display_width: Option<u32>,
    #[serde(default)]
    pub keep_display_aspect: bool,
    #[serde(default)]
    pub pixel_aspect: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default)]
    pub detelecine: Detelecine,
    #[serde(default)]
    decomb: Decomb,
    #[serde(default)]
    deinterlace: Deinterlace,
    #[serde(default)]
    pub denoise: Denoise,
    #[serde(default = "default_deblock")]
    pub deblock: u8, // 4 = off, 5-15 = strength
    #[serde(default)]
    pub grayscale: bool,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            detelecine: Detelecine::Off,
            decomb: Decomb::Off,
            deinterlace: Deinterlace::Off,
            denoise: Denoise::Off,
            deblock: DEBLOCK_OFF,
            grayscale: false,
        }
    }
}

impl Filters {
    pub fn decomb(&self) -> &Decomb {
        &self.decomb
    }

    pub fn deinterlace(&self) -> &Deinterlace {
        &self.deinterlace
    }

    /// Decomb and deinterlace are mutually exclusive; the latest call wins.
    pub fn set_decomb(&mut self, decomb: Decomb) {
        if decomb != Decomb::Off {
            self.deinterlace = Deinterlace::Off;
        }
        self.decomb = decomb;
    }

    pub fn set_deinterlace(&mut self, deinterlace: Deinterlace) {
        if deinterlace != Deinterlace::Off {
            self.decomb = Decomb::Off;
        }
        self.deinterlace = deinterlace;
    }

    /// Values above 15 clamp to 15, values at or below 4 mean off.
    pub fn set_deblock(&mut self, value: u8) {
        self.deblock = value.clamp(DEBLOCK_OFF, DEBLOCK_MAX);
    }

    pub fn deblock_enabled(&self) -> bool {
        self.deblock > DEBLOCK_OFF
    }
}

/// Video rate control. Exactly one mode is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RateControl {
    AverageBitrate(u32), // kbps
    TargetFileSize(u32), // MB
    ConstantQuality(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrack {
    #[serde(default = "default_track")]
    pub source_track: String,
    #[serde(default)]
    encoder: AudioEncoder,
    #[serde(default)]
    pub mixdown: Mixdown,
    #[serde(default = "default_auto")]
    pub sample_rate: String, // "auto" or kHz, e.g. "48"
    #[serde(default = "default_auto")]
    pub bitrate: String, // "auto" or kbps
    #[serde(default)]
    pub drc: f64, // 0 = off
}

impl Default for AudioTrack {
    fn default() -> Self {
        Self {
            source_track: default_track(),
            encoder: AudioEncoder::default(),
            mixdown: Mixdown::Auto,
            sample_rate: default_auto(),
            bitrate: default_auto(),
            drc: 0.0,
        }
    }
}

impl AudioTrack {
    pub fn new(source_track: impl Into<String>, encoder: AudioEncoder) -> Self {
        let mut track = Self {
            source_track: source_track.into(),
            ..Self::default()
        };
        track.set_encoder(encoder);
        track
    }

    pub fn encoder(&self) -> AudioEncoder {
        self.encoder
    }

    /// Passthru encoders pin bitrate and samplerate to "auto" and reset mixdown/DRC.
    pub fn set_encoder(&mut self, encoder: AudioEncoder) {
        self.encoder = encoder;
        if encoder.is_passthru() {
            self.mixdown = Mixdown::Auto;
            self.sample_rate = default_auto();
            self.bitrate = default_auto();
            self.drc = 0.0;
        }
    }

    pub fn with_mixdown(mut self, mixdown: Mixdown) -> Self {
        if !self.encoder.is_passthru() {
            self.mixdown = mixdown;
        }
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: impl Into<String>) -> Self {
        if !self.encoder.is_passthru() {
            self.sample_rate = sample_rate.into();
        }
        self
    }

    pub fn with_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        if !self.encoder.is_passthru() {
            self.bitrate = bitrate.into();
        }
        self
    }

    pub fn with_drc(mut self, drc: f64) -> Self {
        if !self.encoder.is_passthru() {
            self.drc = drc;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub source_track: String, // track number or "scan" for foreign audio search
    #[serde(default)]
    pub forced: bool,
    #[serde(default)]
    pub burned_in: bool,
    #[serde(default)]
    pub is_default: bool,
    /// Bitmap subtitles (VobSub) cannot be muxed as text into MP4.
    #[serde(default)]
    pub bitmap: bool,
}

impl SubtitleTrack {
    pub fn new(source_track: impl Into<String>) -> Self {
        Self {
            source_track: source_track.into(),
            ..Self::default()
        }
    }
}

/// Every user-configurable option of one encode job.
///
/// Deserializing runs [`EncodeSettings::normalize`], so JSON input obeys the
/// same rules as the setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct EncodeSettings {
    // Source
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub title: Option<u32>, // None = automatic
    #[serde(default)]
    pub angle: Option<u32>,
    #[serde(default)]
    pub chapters: Option<ChapterRange>,

    // Destination / output
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    container: Container,
    #[serde(default)]
    pub large_file: bool,
    #[serde(default)]
    pub ipod_atom: bool,
    #[serde(default)]
    pub optimize_mp4: bool,

    // Picture
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub max_width: Option<u32>,
    #[serde(default)]
    pub max_height: Option<u32>,
    #[serde(default)]
    cropping: Option<Cropping>, // None = automatic crop
    #[serde(default)]
    pub anamorphic: Anamorphic,
    #[serde(default)]
    pub custom_anamorphic: CustomAnamorphic,
    #[serde(default = "default_modulus")]
    modulus: u32,

    #[serde(default)]
    pub filters: Filters,

    // Video
    #[serde(default)]
    pub video_encoder: VideoEncoder,
    #[serde(default)]
    pub rate_control: Option<RateControl>,
    #[serde(default)]
    pub framerate: Option<String>, // None = same as source
    #[serde(default)]
    pub framerate_mode: FramerateMode,
    #[serde(default)]
    pub two_pass: bool,
    #[serde(default)]
    pub turbo_first_pass: bool,

    // Audio / subtitles (order is encode order)
    #[serde(default)]
    pub audio_tracks: Vec<AudioTrack>,
    #[serde(default)]
    subtitle_tracks: Vec<SubtitleTrack>,

    // Chapters
    #[serde(default)]
    pub chapter_markers: bool,
    #[serde(default)]
    pub chapter_markers_file: Option<String>,

    // Advanced
    #[serde(default)]
    pub advanced_options: AdvancedOptionSet,

    #[serde(default = "default_verbosity")]
    pub verbosity: u8,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            source: String::new(),
            title: None,
            angle: None,
            chapters: None,
            destination: String::new(),
            container: Container::default(),
            large_file: false,
            ipod_atom: false,
            optimize_mp4: false,
            width: None,
            height: None,
            max_width: None,
            max_height: None,
            cropping: None,
            anamorphic: Anamorphic::None,
            custom_anamorphic: CustomAnamorphic::default(),
            modulus: DEFAULT_MODULUS,
            filters: Filters::default(),
            video_encoder: VideoEncoder::default(),
            rate_control: None,
            framerate: None,
            framerate_mode: FramerateMode::default(),
            two_pass: false,
            turbo_first_pass: false,
            audio_tracks: Vec::new(),
            subtitle_tracks: Vec::new(),
            chapter_markers: false,
            chapter_markers_file: None,
            advanced_options: AdvancedOptionSet::default(),
            verbosity: default_verbosity(),
        }
    }
}

impl Serialize for EncodeSettings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        EncodeSettings::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for EncodeSettings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut settings = EncodeSettings::deserialize(deserializer)?;
        settings.normalize();
        Ok(settings)
    }
}

impl EncodeSettings {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn container(&self) -> Container {
        self.container
    }

    /// Switching into MP4/M4V re-applies the bitmap subtitle rules.
    pub fn set_container(&mut self, container: Container) {
        self.container = container;
        if container.is_mp4_family() {
            let tracks = std::mem::take(&mut self.subtitle_tracks);
            for track in tracks {
                self.add_subtitle_track(track);
            }
        }
    }

    pub fn cropping(&self) -> Option<Cropping> {
        self.cropping
    }

    /// Values pass through `Cropping::new`, so odd crops become even.
    pub fn set_cropping(&mut self, top: u32, bottom: u32, left: u32, right: u32) {
        self.cropping = Some(Cropping::new(top, bottom, left, right));
    }

    pub fn clear_cropping(&mut self) {
        self.cropping = None;
    }

    pub fn modulus(&self) -> u32 {
        self.modulus
    }

    /// Only 16, 8, 4 and 2 are accepted; anything else leaves the modulus unchanged.
    pub fn set_modulus(&mut self, modulus: u32) -> bool {
        if VALID_MODULI.contains(&modulus) {
            self.modulus = modulus;
            true
        } else {
            false
        }
    }

    /// Set the output width and derive the height from the cropped source aspect.
    pub fn set_width_keep_aspect(&mut self, source: SourceDimensions, width: u32) {
        let width = picture::round_to_modulus(width, self.modulus);
        let crop = self.cropping.unwrap_or_default();
        self.width = Some(width);
        self.height = picture::keep_aspect_height(source, &crop, width, self.modulus);
    }

    pub fn subtitle_tracks(&self) -> &[SubtitleTrack] {
        &self.subtitle_tracks
    }

    /// Add a subtitle track, keeping the burn/default/bitmap invariants.
    ///
    /// The most recently added track wins any conflict: a new burned-in or
    /// default track clears that flag on the others, and under MP4 a new
    /// bitmap track replaces the previous one and is always burned in.
    pub fn add_subtitle_track(&mut self, mut track: SubtitleTrack) {
        if self.container.is_mp4_family() && track.bitmap {
            self.subtitle_tracks.retain(|t| !t.bitmap);
            track.burned_in = true;
        }
        if track.burned_in {
            for t in &mut self.subtitle_tracks {
                t.burned_in = false;
            }
        }
        if track.is_default {
            for t in &mut self.subtitle_tracks {
                t.is_default = false;
            }
        }
        self.subtitle_tracks.push(track);
    }

    pub fn remove_subtitle_track(&mut self, index: usize) -> Option<SubtitleTrack> {
        if index < self.subtitle_tracks.len() {
            Some(self.subtitle_tracks.remove(index))
        } else {
            None
        }
    }

    pub fn clear_subtitle_tracks(&mut self) {
        self.subtitle_tracks.clear();
    }

    /// Re-apply every setter rule to fields that were written directly.
    ///
    /// Odd crops round up, an unsupported modulus falls back to 16, deblock is
    /// clamped, decomb wins over deinterlace, passthru tracks are pinned and
    /// subtitle tracks are re-added in order.
    pub fn normalize(&mut self) {
        if let Some(crop) = self.cropping {
            self.set_cropping(crop.top, crop.bottom, crop.left, crop.right);
        }
        if !VALID_MODULI.contains(&self.modulus) {
            warn!(modulus = self.modulus, "unsupported modulus, using {}", DEFAULT_MODULUS);
            self.modulus = DEFAULT_MODULUS;
        }

        let deblock = self.filters.deblock;
        self.filters.set_deblock(deblock);
        if self.filters.decomb != Decomb::Off && self.filters.deinterlace != Deinterlace::Off {
            warn!("decomb and deinterlace both set, keeping decomb");
            let decomb = self.filters.decomb.clone();
            self.filters.set_decomb(decomb);
        }

        for track in &mut self.audio_tracks {
            let encoder = track.encoder();
            track.set_encoder(encoder);
        }

        let subtitles = std::mem::take(&mut self.subtitle_tracks);
        for track in subtitles {
            self.add_subtitle_track(track);
        }
    }

    /// Two-pass and turbo only mean something for average bitrate encodes.
    pub fn uses_two_pass(&self) -> bool {
        self.two_pass && matches!(self.rate_control, Some(RateControl::AverageBitrate(_)))
    }
}
