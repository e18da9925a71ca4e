// Snapshot tests for full generated queries

use encquery::engine::x264::AdvancedOptionSet;
use encquery::engine::{
    Anamorphic, AudioEncoder, AudioTrack, ChapterRange, Container, Decomb, Denoise,
    EncodeSettings, FramerateMode, Mixdown, RateControl, SubtitleTrack, generate_preview_query,
    generate_query,
};
use insta::assert_snapshot;

use crate::common::helpers::*;

fn mkv_job() -> EncodeSettings {
    let mut s = EncodeSettings::new("/media/in.mkv");
    s.title = Some(2);
    s.chapters = Some(ChapterRange::single(3));
    s.destination = "/media/out.mkv".to_string();
    s.set_container(Container::Mkv);
    s.large_file = true;
    s.anamorphic = Anamorphic::Strict;
    s.filters.set_decomb(Decomb::Fast);
    s.filters.denoise = Denoise::Weak;
    s.filters.set_deblock(8);
    s.rate_control = Some(RateControl::ConstantQuality(19.75));
    s.framerate_mode = FramerateMode::Cfr;
    s.audio_tracks = vec![
        AudioTrack::new("2", AudioEncoder::Lame)
            .with_mixdown(Mixdown::Stereo)
            .with_sample_rate("44.1")
            .with_bitrate("192")
            .with_drc(2.0),
        AudioTrack::new("1", AudioEncoder::Ac3Passthru),
    ];
    s.add_subtitle_track(SubtitleTrack {
        forced: true,
        is_default: true,
        ..SubtitleTrack::new("1")
    });
    s.add_subtitle_track(SubtitleTrack {
        burned_in: true,
        ..SubtitleTrack::new("3")
    });
    s.chapter_markers = true;
    s.advanced_options = AdvancedOptionSet::parse("ref=5:psy-rd=0.8,0.1:filter=-2,-1");
    s
}

#[test]
fn snapshot_dvd_query() {
    assert_snapshot!(
        generate_query(&dvd_settings()),
        @r#"-i "C:\in.iso" -t 1 -o "C:\out.mp4" -f mp4 -w 720 -l 400 --crop 0:0:0:0 -e x264 -b 2500 -a 1 -E faac -6 dpl2 -R 48 -B 160 -D 0 -v 1"#
    );
}

#[test]
fn snapshot_mkv_query() {
    assert_snapshot!(
        generate_query(&mkv_job()),
        @r#"-i "/media/in.mkv" -t 2 -c 3 -o "/media/out.mkv" -f mkv -4 --strict-anamorphic --decomb="fast" --denoise="weak" --deblock=8 -e x264 -q 19.75 --cfr -a 2,1 -E lame,ac3 -6 stereo,auto -R 44.1,auto -B 192,auto -D 2,0 --subtitle 1,3 --subtitle-forced 1 --subtitle-burn 3 --subtitle-default 1 -m -x ref=5:psy-rd=0.8,0.1:deblock=-2,-1 -v 1"#
    );
}

#[test]
fn snapshot_preview_query() {
    assert_snapshot!(
        generate_preview_query(&dvd_settings(), 5, 30),
        @r#"-i "C:\in.iso" -t 1 --start-at-preview 5 --stop-at duration:30 -o "C:\out_sample.mp4" -f mp4 -w 720 -l 400 --crop 0:0:0:0 -e x264 -b 2500 -a 1 -E faac -6 dpl2 -R 48 -B 160 -D 0 -v 1"#
    );
}

#[test]
fn test_emission_order() {
    let query = generate_query(&mkv_job());
    assert_in_order(
        &query,
        &[
            "-i ", "-t ", "-c ", "-o ", "-f ", "--strict-anamorphic", "--decomb", "-e ", "-q ",
            "-a ", "-E ", "-6 ", "-R ", "-B ", "-D ", "--subtitle ", " -m ", "-x ", "-v ",
        ],
    );
}
