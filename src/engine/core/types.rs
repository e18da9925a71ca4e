//! Token enums shared by the query generator and parser.
//!
//! Every enum here knows its own CLI token so the generator and the parser
//! stay in sync without string tables scattered across call sites.

use serde::{Deserialize, Serialize};

/// Output container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Container {
    #[default]
    Mp4,
    M4v,
    Mkv,
}

impl Container {
    pub fn cli_token(&self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::M4v => "m4v",
            Container::Mkv => "mkv",
        }
    }

    /// Accepts both the bare token ("mkv") and the display form ("MKV File").
    pub fn from_cli_token(token: &str) -> Option<Self> {
        let token = token.trim().to_ascii_lowercase();
        match token.trim_end_matches(" file") {
            "mp4" => Some(Container::Mp4),
            "m4v" => Some(Container::M4v),
            "mkv" => Some(Container::Mkv),
            _ => None,
        }
    }

    /// iPod atom and MP4 optimization only exist for the MP4 family.
    pub fn is_mp4_family(&self) -> bool {
        matches!(self, Container::Mp4 | Container::M4v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Anamorphic {
    #[default]
    None,
    Strict,
    Loose,
    Custom,
}

impl Anamorphic {
    pub fn cli_flag(&self) -> Option<&'static str> {
        match self {
            Anamorphic::None => None,
            Anamorphic::Strict => Some("--strict-anamorphic"),
            Anamorphic::Loose => Some("--loose-anamorphic"),
            Anamorphic::Custom => Some("--custom-anamorphic"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoEncoder {
    #[default]
    X264,
    FFmpeg,
    Theora,
}

impl VideoEncoder {
    pub fn cli_token(&self) -> &'static str {
        match self {
            VideoEncoder::X264 => "x264",
            VideoEncoder::FFmpeg => "ffmpeg",
            VideoEncoder::Theora => "theora",
        }
    }

    pub fn from_cli_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "x264" => Some(VideoEncoder::X264),
            "ffmpeg" | "ffmpeg4" => Some(VideoEncoder::FFmpeg),
            "theora" => Some(VideoEncoder::Theora),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AudioEncoder {
    #[default]
    Faac,
    Lame,
    Vorbis,
    Ac3Passthru,
    DtsPassthru,
}

impl AudioEncoder {
    pub fn cli_token(&self) -> &'static str {
        match self {
            AudioEncoder::Faac => "faac",
            AudioEncoder::Lame => "lame",
            AudioEncoder::Vorbis => "vorbis",
            AudioEncoder::Ac3Passthru => "ac3",
            AudioEncoder::DtsPassthru => "dts",
        }
    }

    pub fn from_cli_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "faac" | "aac" => Some(AudioEncoder::Faac),
            "lame" | "mp3" => Some(AudioEncoder::Lame),
            "vorbis" => Some(AudioEncoder::Vorbis),
            "ac3" | "copy:ac3" => Some(AudioEncoder::Ac3Passthru),
            "dts" | "copy:dts" => Some(AudioEncoder::DtsPassthru),
            _ => None,
        }
    }

    /// Passthru encoders copy the bitstream, so bitrate/samplerate/mixdown/DRC are fixed.
    pub fn is_passthru(&self) -> bool {
        matches!(self, AudioEncoder::Ac3Passthru | AudioEncoder::DtsPassthru)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mixdown {
    #[default]
    Auto,
    Mono,
    Stereo,
    DolbySurround,
    DolbyProLogicII,
    SixChannel,
}

impl Mixdown {
    pub fn cli_token(&self) -> &'static str {
        match self {
            Mixdown::Auto => "auto",
            Mixdown::Mono => "mono",
            Mixdown::Stereo => "stereo",
            Mixdown::DolbySurround => "dpl1",
            Mixdown::DolbyProLogicII => "dpl2",
            Mixdown::SixChannel => "6ch",
        }
    }

    pub fn from_cli_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Mixdown::Auto),
            "mono" => Some(Mixdown::Mono),
            "stereo" => Some(Mixdown::Stereo),
            "dpl1" => Some(Mixdown::DolbySurround),
            "dpl2" => Some(Mixdown::DolbyProLogicII),
            "6ch" => Some(Mixdown::SixChannel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Detelecine {
    #[default]
    Off,
    Default,
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Decomb {
    #[default]
    Off,
    Default,
    Bob,
    Fast,
    Custom(String),
}

/// Custom decomb string that is equivalent to the "fast" preset.
pub const DECOMB_FAST_CUSTOM: &str = "7:2:6:9:1:80";

impl Decomb {
    pub fn from_value(value: &str) -> Self {
        match value.trim() {
            "" => Decomb::Default,
            "bob" => Decomb::Bob,
            "fast" | DECOMB_FAST_CUSTOM => Decomb::Fast,
            other => Decomb::Custom(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Deinterlace {
    #[default]
    Off,
    Fast,
    Slow,
    Slower,
    Bob,
    Custom(String),
}

impl Deinterlace {
    pub fn from_value(value: &str) -> Self {
        let value = value.trim().to_ascii_lowercase();
        match value.as_str() {
            "fast" => Deinterlace::Fast,
            "slow" => Deinterlace::Slow,
            "slower" => Deinterlace::Slower,
            "bob" => Deinterlace::Bob,
            _ => Deinterlace::Custom(value),
        }
    }

    /// Value written inside `--deinterlace="..."`, `None` when off.
    pub fn cli_value(&self) -> Option<&str> {
        match self {
            Deinterlace::Off => None,
            Deinterlace::Fast => Some("fast"),
            Deinterlace::Slow => Some("slow"),
            Deinterlace::Slower => Some("slower"),
            Deinterlace::Bob => Some("bob"),
            Deinterlace::Custom(s) => Some(s.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Denoise {
    #[default]
    Off,
    Weak,
    Medium,
    Strong,
    Custom(String),
}

impl Denoise {
    pub fn from_value(value: &str) -> Self {
        match value.trim() {
            "weak" => Denoise::Weak,
            "medium" => Denoise::Medium,
            "strong" => Denoise::Strong,
            other => Denoise::Custom(other.to_string()),
        }
    }

    pub fn cli_value(&self) -> Option<&str> {
        match self {
            Denoise::Off => None,
            Denoise::Weak => Some("weak"),
            Denoise::Medium => Some("medium"),
            Denoise::Strong => Some("strong"),
            Denoise::Custom(s) => Some(s.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FramerateMode {
    #[default]
    Vfr,
    Cfr,
    Pfr,
}

impl FramerateMode {
    pub fn cli_flag(&self) -> &'static str {
        match self {
            FramerateMode::Vfr => "--vfr",
            FramerateMode::Cfr => "--cfr",
            FramerateMode::Pfr => "--pfr",
        }
    }
}
