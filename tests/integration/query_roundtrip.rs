// Round-trip tests: settings -> query -> settings
//
// The parser recovers every field the serializer emits. The reverse direction
// (query -> settings -> query) is only guaranteed to be stable after one pass.

use encquery::engine::{
    AudioEncoder, AudioTrack, Decomb, Deinterlace, EncodeSettings, RateControl, generate_query,
    parse_query,
};
use proptest::prelude::*;

use crate::common::helpers::*;

#[test]
fn test_dvd_settings_roundtrip() {
    let settings = dvd_settings();
    let query = generate_query(&settings);
    assert_eq!(parse_query(&query), settings);
}

#[test]
fn test_passthru_roundtrip_ignores_edited_fields() {
    let mut settings = dvd_settings();
    let mut track = AudioTrack::new("2", AudioEncoder::Ac3Passthru);
    track.bitrate = "640".to_string();
    track.sample_rate = "48".to_string();
    settings.audio_tracks.push(track);

    let query = generate_query(&settings);
    assert!(query.contains("-a 1,2 -E faac,ac3 -6 dpl2,auto -R 48,auto -B 160,auto -D 0,0"));

    let parsed = parse_query(&query);
    assert_eq!(parsed.audio_tracks[1].bitrate, "auto");
    assert_eq!(parsed.audio_tracks[1].sample_rate, "auto");
}

#[test]
fn test_zero_audio_tracks_roundtrip() {
    let mut settings = dvd_settings();
    settings.audio_tracks.clear();
    let query = generate_query(&settings);
    assert!(query.contains("-a none"));
    assert!(!query.contains("-E "));
    assert!(parse_query(&query).audio_tracks.is_empty());
}

#[test]
fn test_paths_with_spaces_and_flags() {
    let mut settings = EncodeSettings::new("/media/My Movie -t 4 (2009).mkv");
    settings.destination = "/out/My Movie -w 10.m4v".to_string();
    settings.rate_control = Some(RateControl::ConstantQuality(21.0));

    let parsed = parse_query(&generate_query(&settings));
    assert_eq!(parsed.source, settings.source);
    assert_eq!(parsed.destination, settings.destination);
    assert_eq!(parsed.title, None);
    assert_eq!(parsed.width, None);
}

#[test]
fn test_precise_decimals_roundtrip() {
    let mut settings = dvd_settings();
    settings.rate_control = Some(RateControl::ConstantQuality(20.125));
    settings.audio_tracks[0].drc = 1.333;

    let query = generate_query(&settings);
    assert!(query.contains("-q 20.125"));
    assert!(query.contains("-D 1.333"));
    assert_eq!(parse_query(&query), settings);
}

#[test]
fn test_settings_json_is_normalized_before_generation() {
    let json = r#"{
        "source": "/in.mkv",
        "cropping": {"top": 1, "bottom": 3, "left": 0, "right": 0},
        "filters": {"decomb": "Default", "deinterlace": "Slow"},
        "modulus": 10
    }"#;
    let settings: EncodeSettings = serde_json::from_str(json).unwrap();
    assert_eq!(settings.filters.decomb(), &Decomb::Default);
    assert_eq!(settings.filters.deinterlace(), &Deinterlace::Off);

    let query = generate_query(&settings);
    assert_eq!(query, r#"-i "/in.mkv" -f mp4 --crop 2:4:0:0 --decomb -e x264 -a none -v 1"#);
    assert_eq!(parse_query(&query), settings);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Parse(Serialize(s)) == s for settings whose fields are all emitted
    #[test]
    fn prop_parse_recovers_generated_query(settings in arb_settings()) {
        let query = generate_query(&settings);
        let parsed = parse_query(&query);
        prop_assert_eq!(parsed, settings, "query: {}", query);
    }

    /// After one normalization pass the query is a fixed point
    #[test]
    fn prop_generated_query_is_stable(settings in arb_settings()) {
        let once = generate_query(&settings);
        let twice = generate_query(&parse_query(&once));
        prop_assert_eq!(once, twice);
    }

    /// Audio lists always have one entry per track
    #[test]
    fn prop_audio_lists_are_aligned(settings in arb_settings()) {
        prop_assume!(!settings.audio_tracks.is_empty());
        let query = generate_query(&settings);
        let tokens: Vec<&str> = query.split_whitespace().collect();
        for flag in ["-a", "-E", "-6", "-R", "-B", "-D"] {
            let pos = tokens.iter().position(|t| *t == flag);
            prop_assert!(pos.is_some(), "missing {} in {}", flag, query);
            let list = tokens[pos.unwrap() + 1];
            prop_assert_eq!(list.split(',').count(), settings.audio_tracks.len());
        }
    }

    /// The verbosity flag always comes last
    #[test]
    fn prop_verbosity_is_last(settings in arb_settings()) {
        let query = generate_query(&settings);
        let expected_tail = format!("-v {}", settings.verbosity);
        prop_assert!(query.ends_with(&expected_tail));
    }
}
