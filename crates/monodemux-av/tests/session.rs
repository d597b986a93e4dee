//! Session behaviour against the in-memory engine.

use monodemux_av::engine::memory::{MemoryEngine, MemoryMedia, MemoryStream, PacketRecord};
use monodemux_av::{
    DemuxSession, EngineError, EngineOperation, EnginePacket, Error, MediaKind, Rational, SeekFlags,
};

const CLIP: &str = "clip.mp4";
const VIDEO_FRAMES: i64 = 150;
const AUDIO_PACKETS: i64 = 235;
const AUDIO_FRAME: i64 = 1024;

fn video_stream() -> MemoryStream {
    MemoryStream::video(Rational::new(1, 30))
}

fn audio_stream() -> MemoryStream {
    MemoryStream::audio(Rational::new(1, 48_000))
}

/// Five seconds of 30 fps video (keyframe every second) interleaved with
/// 48 kHz audio in 1024-sample packets. Video is stream 0, audio stream 1.
fn interleaved_packets() -> Vec<PacketRecord> {
    let video = (0..VIDEO_FRAMES).map(|pts| {
        let at = pts * 1_000_000 / 30;
        (at, PacketRecord::new(0, pts, 1, pts % 30 == 0).with_data(vec![0u8; 64]))
    });
    let audio = (0..AUDIO_PACKETS).map(|i| {
        let pts = i * AUDIO_FRAME;
        let at = pts * 1_000_000 / 48_000;
        (at, PacketRecord::new(1, pts, AUDIO_FRAME, true).with_data(vec![1u8; 16]))
    });

    let mut all: Vec<(i64, PacketRecord)> = video.chain(audio).collect();
    all.sort_by_key(|(at, p)| (*at, p.stream_index));
    all.into_iter().map(|(_, p)| p).collect()
}

fn five_second_clip() -> MemoryMedia {
    MemoryMedia::new()
        .stream(video_stream().with_duration(VIDEO_FRAMES))
        .stream(audio_stream().with_duration(AUDIO_PACKETS * AUDIO_FRAME))
        .container_duration(5_000_000)
        .packets(interleaved_packets())
}

fn engine_with(media: MemoryMedia) -> MemoryEngine {
    MemoryEngine::new().with_file(CLIP, media)
}

fn open_session(media: MemoryMedia, kind: MediaKind) -> DemuxSession<MemoryEngine> {
    let mut session = DemuxSession::new(engine_with(media), kind);
    session.open(CLIP).unwrap();
    session
}

fn drain(session: &mut DemuxSession<MemoryEngine>) -> Vec<i64> {
    let mut pts = Vec::new();
    while let Some(packet) = session.read_packet().unwrap() {
        pts.push(packet.pts().unwrap());
    }
    pts
}

// ===== Lifecycle =====

#[test]
fn test_new_session_is_closed() {
    let session = DemuxSession::new(engine_with(five_second_clip()), MediaKind::Video);
    assert!(!session.is_open());
    assert_eq!(session.kind(), MediaKind::Video);
    assert_eq!(session.stream_index(), None);
    assert!(!session.is_eof());
}

#[test]
fn test_operations_after_close_fail_with_not_open() {
    let mut session = open_session(five_second_clip(), MediaKind::Video);
    session.close();

    assert!(!session.is_open());
    assert!(matches!(session.read_packet(), Err(Error::NotOpen)));
    assert!(matches!(session.seek_default(0), Err(Error::NotOpen)));
    assert_eq!(session.duration_us(), 0);
    assert_eq!(session.stream_index(), None);
    assert_eq!(session.stream(), None);
}

#[test]
fn test_repeated_close_is_side_effect_free() {
    let mut session = open_session(five_second_clip(), MediaKind::Video);
    let stats = session.engine().stats();

    session.close();
    assert_eq!(stats.closes(), 1);
    session.close();
    session.close();
    assert_eq!(stats.closes(), 1);
    assert_eq!(stats.live_contexts(), 0);
}

#[test]
fn test_open_empty_path_fails_without_touching_state() {
    let mut session = DemuxSession::new(engine_with(five_second_clip()), MediaKind::Video);
    let stats = session.engine().stats();

    let err = session.open("").unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(!session.is_open());
    assert_eq!(session.video_stream_index(), None);
    assert_eq!(session.audio_stream_index(), None);
    assert!(!session.is_eof());
    assert_eq!(stats.opens(), 0);
}

#[test]
fn test_open_empty_path_keeps_open_session_open() {
    let mut session = open_session(five_second_clip(), MediaKind::Video);
    assert!(session.open("").is_err());
    assert!(session.is_open());
    assert_eq!(session.stream_index(), Some(0));
}

#[test]
fn test_open_nonexistent_path_leaves_session_closed() {
    let mut session = DemuxSession::new(engine_with(five_second_clip()), MediaKind::Video);

    let err = session.open("non_existent_file.mp4").unwrap_err();
    match err {
        Error::Engine { operation, source } => {
            assert_eq!(operation, EngineOperation::Open);
            assert!(source.message.contains("No such file"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!session.is_open());
}

#[test]
fn test_failed_probe_releases_context() {
    let media = five_second_clip().fail_probe(EngineError::new(
        -1094995529,
        "Invalid data found when processing input",
    ));
    let mut session = DemuxSession::new(engine_with(media), MediaKind::Video);
    let stats = session.engine().stats();

    let err = session.open(CLIP).unwrap_err();
    assert!(matches!(
        err,
        Error::Engine {
            operation: EngineOperation::Probe,
            ..
        }
    ));
    assert!(!session.is_open());
    assert_eq!(stats.opens(), 1);
    assert_eq!(stats.live_contexts(), 0);
}

#[test]
fn test_reopen_closes_previous_context() {
    let mut session = open_session(five_second_clip(), MediaKind::Video);
    let stats = session.engine().stats();

    session.read_packet().unwrap();
    session.open(CLIP).unwrap();

    assert_eq!(stats.opens(), 2);
    assert_eq!(stats.closes(), 1);
    assert_eq!(stats.live_contexts(), 1);
    // The new context starts from the beginning.
    assert_eq!(session.read_packet().unwrap().unwrap().pts(), Some(0));
}

#[test]
fn test_reopen_at_eof_clears_eof() {
    let mut session = open_session(five_second_clip(), MediaKind::Video);
    drain(&mut session);
    assert!(session.is_eof());

    session.open(CLIP).unwrap();

    assert!(!session.is_eof());
    assert_eq!(session.read_packet().unwrap().unwrap().pts(), Some(0));
    assert_eq!(session.engine().stats().live_contexts(), 1);
}

#[test]
fn test_failed_reopen_leaves_session_closed() {
    let mut session = open_session(five_second_clip(), MediaKind::Video);
    let stats = session.engine().stats();

    assert!(session.open("missing.mp4").is_err());
    assert!(!session.is_open());
    assert_eq!(session.stream_index(), None);
    assert_eq!(stats.live_contexts(), 0);
}

#[test]
fn test_multiple_open_close_cycles() {
    let mut session = DemuxSession::new(engine_with(five_second_clip()), MediaKind::Video);
    let stats = session.engine().stats();

    for _ in 0..3 {
        session.open(CLIP).unwrap();
        assert!(session.is_open());
        session.close();
    }
    assert_eq!(stats.opens(), 3);
    assert_eq!(stats.live_contexts(), 0);
}

#[test]
fn test_close_error_is_swallowed() {
    let media = five_second_clip().fail_close(EngineError::new(-5, "I/O error"));
    let mut session = open_session(media, MediaKind::Audio);
    let stats = session.engine().stats();

    session.close();
    assert!(!session.is_open());
    assert_eq!(session.audio_stream_index(), None);
    assert_eq!(stats.live_contexts(), 0);
}

#[test]
fn test_drop_releases_context() {
    let engine = engine_with(five_second_clip());
    let stats = engine.stats();
    {
        let mut session = DemuxSession::new(engine, MediaKind::Video);
        session.open(CLIP).unwrap();
        assert_eq!(stats.live_contexts(), 1);
    }
    assert_eq!(stats.live_contexts(), 0);
}

// ===== Stream selection =====

#[test]
fn test_video_and_audio_sessions_select_different_streams() {
    let video = open_session(five_second_clip(), MediaKind::Video);
    let audio = open_session(five_second_clip(), MediaKind::Audio);

    assert_eq!(video.stream_index(), Some(0));
    assert_eq!(audio.stream_index(), Some(1));
    assert_ne!(video.stream_index(), audio.stream_index());

    // Both kinds are discovered regardless of the session's kind.
    assert_eq!(video.audio_stream_index(), Some(1));
    assert_eq!(audio.video_stream_index(), Some(0));
}

#[test]
fn test_best_stream_wins_among_several() {
    let media = MemoryMedia::new()
        .stream(audio_stream())
        .stream(video_stream())
        .stream(audio_stream().with_score(10))
        .packets([
            PacketRecord::new(0, 0, 1024, true),
            PacketRecord::new(2, 0, 1024, true),
            PacketRecord::new(1, 0, 1, true),
        ]);
    let mut session = open_session(media, MediaKind::Audio);

    assert_eq!(session.stream_index(), Some(2));
    let packet = session.read_packet().unwrap().unwrap();
    assert_eq!(packet.stream_index(), 2);
}

#[test]
fn test_active_stream_info() {
    let session = open_session(five_second_clip(), MediaKind::Audio);
    let stream = session.stream().unwrap();

    assert_eq!(stream.index, 1);
    assert_eq!(stream.kind, Some(MediaKind::Audio));
    assert_eq!(stream.time_base, Rational::new(1, 48_000));
}

#[test]
fn test_missing_kind_opens_but_has_no_active_stream() {
    let media = MemoryMedia::new()
        .stream(audio_stream().with_duration(144_000))
        .packet(PacketRecord::new(0, 0, 1024, true));
    let mut session = open_session(media, MediaKind::Video);

    assert!(session.is_open());
    assert_eq!(session.stream_index(), None);
    assert_eq!(session.audio_stream_index(), Some(0));
    assert!(matches!(
        session.read_packet(),
        Err(Error::NoActiveStream(MediaKind::Video))
    ));
    assert!(matches!(
        session.seek_default(0),
        Err(Error::NoActiveStream(MediaKind::Video))
    ));
    // Duration still falls back to the audio stream.
    assert_eq!(session.duration_us(), 3_000_000);
}

// ===== Packet reads =====

#[test]
fn test_reads_only_active_stream_packets() {
    for (kind, expected) in [
        (MediaKind::Video, VIDEO_FRAMES as usize),
        (MediaKind::Audio, AUDIO_PACKETS as usize),
    ] {
        let mut session = open_session(five_second_clip(), kind);
        let active = session.stream_index().unwrap();
        let mut count = 0;
        while let Some(packet) = session.read_packet().unwrap() {
            assert_eq!(packet.stream_index(), active);
            count += 1;
        }
        assert_eq!(count, expected);
    }
}

#[test]
fn test_packets_arrive_in_order() {
    let mut session = open_session(five_second_clip(), MediaKind::Video);
    let pts = drain(&mut session);
    assert_eq!(pts, (0..VIDEO_FRAMES).collect::<Vec<_>>());
}

#[test]
fn test_skipped_packets_are_released() {
    let mut session = open_session(five_second_clip(), MediaKind::Video);
    let stats = session.engine().stats();

    let first = session.read_packet().unwrap().unwrap();
    let second = session.read_packet().unwrap().unwrap();
    // Only the packets the caller holds are alive; skipped audio is gone.
    assert_eq!(stats.live_packets(), 2);
    drop(first);
    drop(second);
    assert_eq!(stats.live_packets(), 0);

    drain(&mut session);
    assert_eq!(stats.live_packets(), 0);
}

#[test]
fn test_many_skipped_packets_between_matches() {
    let mut packets = vec![PacketRecord::new(0, 0, 1, true)];
    packets.extend((0..10_000).map(|i| PacketRecord::new(1, i * AUDIO_FRAME, AUDIO_FRAME, true)));
    packets.push(PacketRecord::new(0, 1, 1, false));
    let media = MemoryMedia::new()
        .stream(video_stream())
        .stream(audio_stream())
        .packets(packets);
    let mut session = open_session(media, MediaKind::Video);

    assert_eq!(drain(&mut session), vec![0, 1]);
}

#[test]
fn test_eof_is_sticky() {
    let mut session = open_session(five_second_clip(), MediaKind::Video);
    assert!(!session.is_eof());

    drain(&mut session);
    assert!(session.is_eof());
    for _ in 0..3 {
        assert!(session.read_packet().unwrap().is_none());
        assert!(session.is_eof());
    }
}

#[test]
fn test_read_error_is_reported_and_eof_untouched() {
    let media = five_second_clip().fail_read_at(3, EngineError::new(-5, "I/O error"));
    let mut session = open_session(media, MediaKind::Video);

    let mut result = session.read_packet();
    while let Ok(Some(_)) = result {
        result = session.read_packet();
    }
    match result {
        Err(Error::Engine { operation, source }) => {
            assert_eq!(operation, EngineOperation::Read);
            assert_eq!(source.message, "I/O error");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(!session.is_eof());
    assert!(session.is_open());
}

// ===== Seeking =====

#[test]
fn test_seek_rescales_into_stream_timebase() {
    let mut session = open_session(five_second_clip(), MediaKind::Video);

    // 2.5 s is frame 75; the keyframe at or before it is frame 60.
    session.seek_default(2_500_000).unwrap();
    let packet = session.read_packet().unwrap().unwrap();
    assert_eq!(packet.pts(), Some(60));
    assert!(packet.is_key());
}

#[test]
fn test_forward_seek_lands_on_next_keyframe() {
    let mut session = open_session(five_second_clip(), MediaKind::Video);

    session.seek(2_500_000, SeekFlags::empty()).unwrap();
    assert_eq!(session.read_packet().unwrap().unwrap().pts(), Some(90));
}

#[test]
fn test_audio_seek() {
    let mut session = open_session(five_second_clip(), MediaKind::Audio);

    // 1 s is sample 48000; packet 46 starts at 47104.
    session.seek_default(1_000_000).unwrap();
    assert_eq!(session.read_packet().unwrap().unwrap().pts(), Some(46 * AUDIO_FRAME));
}

#[test]
fn test_successful_seek_clears_eof() {
    let mut session = open_session(five_second_clip(), MediaKind::Video);
    drain(&mut session);
    assert!(session.is_eof());

    session.seek_default(0).unwrap();
    assert!(!session.is_eof());
    assert_eq!(drain(&mut session).len(), VIDEO_FRAMES as usize);
}

#[test]
fn test_failed_seek_leaves_eof_unchanged() {
    let mut session = open_session(five_second_clip().unseekable(), MediaKind::Video);

    assert!(session.seek_default(1_000_000).unwrap_err().is_engine_failure());
    assert!(!session.is_eof());

    drain(&mut session);
    let err = session.seek_default(0).unwrap_err();
    assert!(matches!(
        err,
        Error::Engine {
            operation: EngineOperation::Seek,
            ..
        }
    ));
    assert!(session.is_eof());
}

// ===== Duration =====

#[test]
fn test_duration_of_five_second_clip() {
    let session = open_session(five_second_clip(), MediaKind::Video);
    let duration = session.duration_us();
    assert!((4_000_000..=6_000_000).contains(&duration));
}

#[test]
fn test_duration_prefers_container() {
    let media = MemoryMedia::new()
        .stream(video_stream().with_duration(60))
        .container_duration(4_200_000);
    let session = open_session(media, MediaKind::Video);
    assert_eq!(session.duration_us(), 4_200_000);
}

#[test]
fn test_duration_falls_back_to_active_stream() {
    let media = MemoryMedia::new()
        .stream(video_stream().with_duration(90))
        .stream(audio_stream().with_duration(96_000));
    let video = open_session(media.clone(), MediaKind::Video);
    let audio = open_session(media, MediaKind::Audio);

    assert_eq!(video.duration_us(), 3_000_000);
    assert_eq!(audio.duration_us(), 2_000_000);
}

#[test]
fn test_duration_falls_back_across_kinds() {
    let video_only_duration = MemoryMedia::new()
        .stream(video_stream().with_duration(120))
        .stream(audio_stream());
    let session = open_session(video_only_duration, MediaKind::Audio);
    assert_eq!(session.duration_us(), 4_000_000);

    let audio_only_duration = MemoryMedia::new()
        .stream(video_stream())
        .stream(audio_stream().with_duration(48_000));
    let session = open_session(audio_only_duration, MediaKind::Video);
    assert_eq!(session.duration_us(), 1_000_000);
}

#[test]
fn test_duration_unknown_is_zero() {
    let media = MemoryMedia::new().stream(video_stream()).stream(audio_stream());
    let session = open_session(media, MediaKind::Video);
    assert_eq!(session.duration_us(), 0);
}

// ===== Replay =====

#[test]
fn test_reopen_after_full_read_is_deterministic() {
    let mut session = open_session(five_second_clip(), MediaKind::Audio);
    let first_index = session.read_packet().unwrap().unwrap().stream_index();
    let first_duration = session.duration_us();
    let first_pass = drain(&mut session);
    session.close();

    session.open(CLIP).unwrap();
    assert_eq!(
        session.read_packet().unwrap().unwrap().stream_index(),
        first_index
    );
    let second_duration = session.duration_us();
    assert!((4_000_000..=6_000_000).contains(&first_duration));
    assert!((4_000_000..=6_000_000).contains(&second_duration));
    assert_eq!(drain(&mut session), first_pass);
}
