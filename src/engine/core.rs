mod picture;
mod query_gen;
mod query_parse;
mod settings;
mod types;

pub use picture::{
    SourceDimensions, clean_crop, display_width_for_par, floor_to_modulus, keep_aspect_height,
    round_to_modulus,
};
pub use query_gen::{format_decimal, generate_preview_query, generate_query, quality_from_slider};
pub use query_parse::parse_query;
pub use settings::{
    AudioTrack, ChapterRange, Cropping, CustomAnamorphic, DEBLOCK_MAX, DEBLOCK_OFF,
    DEFAULT_MODULUS, EncodeSettings, Filters, RateControl, SubtitleTrack, VALID_MODULI,
};
pub use types::{
    Anamorphic, AudioEncoder, Container, DECOMB_FAST_CUSTOM, Decomb, Deinterlace, Denoise,
    Detelecine, FramerateMode, Mixdown, VideoEncoder,
};
