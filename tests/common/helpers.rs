#![allow(dead_code)]

use encquery::engine::{
    Anamorphic, AudioEncoder, AudioTrack, ChapterRange, Container, Decomb, Deinterlace, Denoise,
    Detelecine, EncodeSettings, FramerateMode, Mixdown, RateControl, SubtitleTrack, VALID_MODULI,
    VideoEncoder,
};
use proptest::prelude::*;
use proptest::sample::select;

/// Typical DVD rip used across tests
pub fn dvd_settings() -> EncodeSettings {
    let mut s = EncodeSettings::new(r"C:\in.iso");
    s.title = Some(1);
    s.destination = r"C:\out.mp4".to_string();
    s.width = Some(720);
    s.height = Some(400);
    s.set_cropping(0, 0, 0, 0);
    s.rate_control = Some(RateControl::AverageBitrate(2500));
    s.audio_tracks.push(
        AudioTrack::new("1", AudioEncoder::Faac)
            .with_mixdown(Mixdown::DolbyProLogicII)
            .with_sample_rate("48")
            .with_bitrate("160"),
    );
    s
}

/// Assert every needle appears in `query`, in the given order
pub fn assert_in_order(query: &str, needles: &[&str]) {
    let mut from = 0;
    for needle in needles {
        match query[from..].find(needle) {
            Some(pos) => from += pos + needle.len(),
            None => panic!("'{}' missing or out of order in: {}", needle, query),
        }
    }
}

// ============================================================================
// STRATEGIES: settings the serializer emits in full
// ============================================================================

pub fn arb_path() -> impl Strategy<Value = String> {
    "/[a-zA-Z0-9_.-]{1,24}"
}

pub fn arb_container() -> impl Strategy<Value = Container> {
    select(vec![Container::Mp4, Container::M4v, Container::Mkv])
}

pub fn arb_anamorphic() -> impl Strategy<Value = Anamorphic> {
    select(vec![
        Anamorphic::None,
        Anamorphic::Strict,
        Anamorphic::Loose,
        Anamorphic::Custom,
    ])
}

pub fn arb_video_encoder() -> impl Strategy<Value = VideoEncoder> {
    select(vec![
        VideoEncoder::X264,
        VideoEncoder::FFmpeg,
        VideoEncoder::Theora,
    ])
}

pub fn arb_audio_encoder() -> impl Strategy<Value = AudioEncoder> {
    select(vec![
        AudioEncoder::Faac,
        AudioEncoder::Lame,
        AudioEncoder::Vorbis,
        AudioEncoder::Ac3Passthru,
        AudioEncoder::DtsPassthru,
    ])
}

pub fn arb_mixdown() -> impl Strategy<Value = Mixdown> {
    select(vec![
        Mixdown::Auto,
        Mixdown::Mono,
        Mixdown::Stereo,
        Mixdown::DolbySurround,
        Mixdown::DolbyProLogicII,
        Mixdown::SixChannel,
    ])
}

pub fn arb_framerate_mode() -> impl Strategy<Value = FramerateMode> {
    select(vec![
        FramerateMode::Vfr,
        FramerateMode::Cfr,
        FramerateMode::Pfr,
    ])
}

pub fn arb_rate_control() -> impl Strategy<Value = Option<RateControl>> {
    prop_oneof![
        Just(None),
        (1u32..20_000).prop_map(|k| Some(RateControl::AverageBitrate(k))),
        (1u32..8_000).prop_map(|m| Some(RateControl::TargetFileSize(m))),
        (0.0f64..=51.0).prop_map(|q| Some(RateControl::ConstantQuality(q))),
    ]
}

pub fn arb_detelecine() -> impl Strategy<Value = Detelecine> {
    prop_oneof![
        Just(Detelecine::Off),
        Just(Detelecine::Default),
        Just(Detelecine::Custom("1:1:4:4:0:0".to_string())),
    ]
}

pub fn arb_denoise() -> impl Strategy<Value = Denoise> {
    select(vec![
        Denoise::Off,
        Denoise::Weak,
        Denoise::Medium,
        Denoise::Strong,
        Denoise::Custom("2:1:2:3".to_string()),
    ])
}

/// Decomb or deinterlace, never both
#[derive(Debug, Clone)]
pub enum Interlace {
    Decomb(Decomb),
    Deinterlace(Deinterlace),
}

pub fn arb_interlace() -> impl Strategy<Value = Interlace> {
    select(vec![
        Interlace::Decomb(Decomb::Off),
        Interlace::Decomb(Decomb::Default),
        Interlace::Decomb(Decomb::Bob),
        Interlace::Decomb(Decomb::Fast),
        Interlace::Decomb(Decomb::Custom("2:1:6".to_string())),
        Interlace::Deinterlace(Deinterlace::Fast),
        Interlace::Deinterlace(Deinterlace::Slow),
        Interlace::Deinterlace(Deinterlace::Slower),
        Interlace::Deinterlace(Deinterlace::Bob),
        Interlace::Deinterlace(Deinterlace::Custom("1:-1".to_string())),
    ])
}

prop_compose! {
    pub fn arb_audio_track()(
        source in select(vec!["1", "2", "3", "4"]),
        encoder in arb_audio_encoder(),
        mixdown in arb_mixdown(),
        sample_rate in select(vec!["auto", "48", "44.1", "32"]),
        bitrate in select(vec!["auto", "128", "160", "320"]),
        drc in prop_oneof![Just(0.0), 0.0f64..4.0],
    ) -> AudioTrack {
        AudioTrack::new(source, encoder)
            .with_mixdown(mixdown)
            .with_sample_rate(sample_rate)
            .with_bitrate(bitrate)
            .with_drc(drc)
    }
}

prop_compose! {
    pub fn arb_subtitle_tracks()(
        ids in proptest::sample::subsequence(vec!["1", "2", "3", "4", "scan"], 0..=3),
        flags in proptest::collection::vec((any::<bool>(), any::<bool>(), any::<bool>()), 3),
    ) -> Vec<SubtitleTrack> {
        ids.into_iter()
            .zip(flags)
            .map(|(id, (forced, burned_in, is_default))| SubtitleTrack {
                forced,
                burned_in,
                is_default,
                ..SubtitleTrack::new(id)
            })
            .collect()
    }
}

prop_compose! {
    fn arb_source_block()(
        source in arb_path(),
        title in proptest::option::of(1u32..100),
        angle in proptest::option::of(1u32..10),
        chapters in proptest::option::of((0u32..30, 0u32..30)),
        destination in arb_path(),
    ) -> (String, Option<u32>, Option<u32>, Option<ChapterRange>, String) {
        let chapters = chapters.map(|(a, b)| ChapterRange::new(a.min(b), a.max(b)));
        (source, title, angle, chapters, destination)
    }
}

prop_compose! {
    fn arb_picture_block()(
        anamorphic in arb_anamorphic(),
        width in proptest::option::of(16u32..4096),
        height in proptest::option::of(16u32..2160),
        max_width in proptest::option::of(16u32..4096),
        max_height in proptest::option::of(16u32..2160),
        crop in proptest::option::of((0u32..100, 0u32..100, 0u32..100, 0u32..100)),
        display_width in proptest::option::of(16u32..4096),
        keep_display_aspect in any::<bool>(),
        pixel_aspect in proptest::option::of((1u32..100, 1u32..100)),
        modulus in select(VALID_MODULI.to_vec()),
    ) -> (Anamorphic, [Option<u32>; 4], Option<(u32, u32, u32, u32)>, (Option<u32>, bool, Option<(u32, u32)>), u32) {
        (
            anamorphic,
            [width, height, max_width, max_height],
            crop.map(|(t, b, l, r)| (t * 2, b * 2, l * 2, r * 2)),
            (display_width, keep_display_aspect, pixel_aspect),
            modulus,
        )
    }
}

prop_compose! {
    fn arb_video_block()(
        encoder in arb_video_encoder(),
        rate_control in arb_rate_control(),
        two_pass in any::<bool>(),
        turbo in any::<bool>(),
        framerate in proptest::option::of(select(vec!["23.976", "25", "29.97"])),
        mode in arb_framerate_mode(),
    ) -> (VideoEncoder, Option<RateControl>, bool, bool, Option<String>, FramerateMode) {
        (encoder, rate_control, two_pass, turbo, framerate.map(str::to_string), mode)
    }
}

prop_compose! {
    /// Settings in which every field is either emitted or at its default
    pub fn arb_settings()(
        (source, title, angle, chapters, destination) in arb_source_block(),
        container in arb_container(),
        output_flags in (any::<bool>(), any::<bool>(), any::<bool>()),
        (anamorphic, [width, height, max_width, max_height], crop, custom, modulus) in arb_picture_block(),
        filters in (arb_detelecine(), arb_interlace(), arb_denoise(), 4u8..=15, any::<bool>()),
        (encoder, rate_control, two_pass, turbo, framerate, mode) in arb_video_block(),
        audio in proptest::collection::vec(arb_audio_track(), 0..4),
        subtitles in arb_subtitle_tracks(),
        markers in (any::<bool>(), proptest::option::of(arb_path())),
        verbosity in 0u8..5,
    ) -> EncodeSettings {
        let mut s = EncodeSettings::new(source);
        s.title = title;
        s.angle = angle;
        s.chapters = chapters;
        s.destination = destination;

        s.set_container(container);
        let (large_file, ipod_atom, optimize_mp4) = output_flags;
        s.large_file = large_file;
        s.ipod_atom = ipod_atom && container.is_mp4_family();
        s.optimize_mp4 = optimize_mp4 && container.is_mp4_family();

        s.anamorphic = anamorphic;
        if anamorphic != Anamorphic::Strict {
            s.max_width = max_width;
            s.width = if max_width.is_some() { None } else { width };
        }
        if matches!(anamorphic, Anamorphic::None | Anamorphic::Custom) {
            s.max_height = max_height;
            s.height = if max_height.is_some() { None } else { height };
        }
        if let Some((t, b, l, r)) = crop {
            s.set_cropping(t, b, l, r);
        }
        if anamorphic == Anamorphic::Custom {
            let (display_width, keep_display_aspect, pixel_aspect) = custom;
            s.custom_anamorphic.display_width = display_width;
            s.custom_anamorphic.keep_display_aspect = keep_display_aspect;
            s.custom_anamorphic.pixel_aspect = pixel_aspect;
        }
        s.set_modulus(modulus);

        let (detelecine, interlace, denoise, deblock, grayscale) = filters;
        s.filters.detelecine = detelecine;
        match interlace {
            Interlace::Decomb(d) => s.filters.set_decomb(d),
            Interlace::Deinterlace(d) => s.filters.set_deinterlace(d),
        }
        s.filters.denoise = denoise;
        s.filters.set_deblock(deblock);
        s.filters.grayscale = grayscale;

        s.video_encoder = encoder;
        s.rate_control = rate_control;
        let average = matches!(rate_control, Some(RateControl::AverageBitrate(_)));
        s.two_pass = two_pass && average;
        s.turbo_first_pass = turbo && s.two_pass;
        s.framerate = framerate;
        s.framerate_mode = mode;

        s.audio_tracks = audio;
        for track in subtitles {
            s.add_subtitle_track(track);
        }

        let (chapter_markers, markers_file) = markers;
        s.chapter_markers = chapter_markers;
        s.chapter_markers_file = if chapter_markers { markers_file } else { None };
        s.verbosity = verbosity;
        s
    }
}

/// Advanced option strings built from known names, aliases and unknown names
pub fn arb_x264_string() -> impl Strategy<Value = String> {
    let name = select(vec![
        "ref", "frameref", "subme", "subq", "me_range", "weight-b", "b_pyramid", "direct_pred",
        "filter", "partitions", "nofast_pskip", "no_dct_decimate", "keyint", "psy-rd", "",
    ]);
    let value = prop_oneof![
        Just(None),
        "[0-9]{1,2}".prop_map(Some),
        Just(Some("umh".to_string())),
        Just(Some("-1,-1".to_string())),
        Just(Some(" 5 ".to_string())),
    ];
    proptest::collection::vec((name, value), 0..8).prop_map(|segments| {
        segments
            .into_iter()
            .map(|(name, value)| match value {
                Some(v) => format!("{}={}", name, v),
                None => name.to_string(),
            })
            .collect::<Vec<_>>()
            .join(":")
    })
}
