//! Session lifecycle tests: load, ingestion, open gating, pacing to end of
//! stream, backpressure, cancellation and terminal failures.

mod common;

use std::time::Duration;

use bytes::Bytes;
use common::{collect_until, next_event, wait_for_status, FakeFactory, FakePlan};
use core_player::{spawn_player, Command, PlayerConfig, PlayerEvent, SourceSpec};

use bridge_traits::NullVideoSink;

fn memory_source(bytes: usize) -> SourceSpec {
    SourceSpec::Memory(Bytes::from(vec![0x2Au8; bytes]))
}

fn load(source: SourceSpec) -> Command {
    Command::Load {
        source,
        format_hint: Some("webm".into()),
        buffer_bytes: None,
    }
}

#[tokio::test(start_paused = true)]
async fn plays_a_small_source_to_the_end() {
    let factory = FakeFactory::new(FakePlan {
        end_pts: 2.0,
        with_audio: true,
        ..FakePlan::default()
    });
    let mut handle = spawn_player(
        factory.clone(),
        Box::new(NullVideoSink),
        PlayerConfig::default(),
    )
    .unwrap();

    assert!(matches!(next_event(&mut handle.events).await, PlayerEvent::Ready));

    handle.commands.send(load(memory_source(100 * 1024))).unwrap();
    let seen = collect_until(&mut handle.events, |e| matches!(e, PlayerEvent::Ended)).await;

    // Seeking is available for a memory source.
    assert!(seen
        .iter()
        .any(|e| matches!(e, PlayerEvent::SeekInfo { enabled: true, .. })));
    // The container opened and playback was announced.
    assert!(seen
        .iter()
        .any(|e| matches!(e, PlayerEvent::Status(s) if s == "Playing")));
    // Resolution is reported exactly once for a constant-size stream.
    let resolutions = seen
        .iter()
        .filter(|e| matches!(e, PlayerEvent::Resolution { width: 640, height: 360 }))
        .count();
    assert_eq!(resolutions, 1);
    // One audio chunk per video frame (pts 0, 1, 2).
    let audio_chunks = seen
        .iter()
        .filter(|e| matches!(e, PlayerEvent::Audio(_)))
        .count();
    assert_eq!(audio_chunks, 3);

    // Final forced stats carry the full picture.
    let last_stats = seen
        .iter()
        .rev()
        .find_map(|e| match e {
            PlayerEvent::Stats(s) => Some(*s),
            _ => None,
        })
        .expect("stats emitted");
    assert_eq!(last_stats.frames, 3);
    assert_eq!(last_stats.pts, 2.0);
    assert_eq!(last_stats.duration, 3.0);
    assert_eq!(last_stats.bytes, 100 * 1024);
    assert_eq!(last_stats.audio_channels, 2);
    assert_eq!(last_stats.audio_sample_rate, 48000);

    assert_eq!(factory.sessions_created(), 1);
    assert_eq!(factory.bytes_appended(), 100 * 1024);
}

#[tokio::test(start_paused = true)]
async fn pacer_recovers_after_starving_for_input() {
    // Frames cost 256 KiB each; the container opens at 64 KiB, so early
    // reads starve until the pump catches up.
    let mut config = PlayerConfig::default();
    config.min_open_bytes = 64 * 1024;
    config.min_open_bytes_small = 16 * 1024;

    let factory = FakeFactory::new(FakePlan {
        end_pts: 10.0,
        bytes_per_frame: 256 * 1024,
        ..FakePlan::default()
    });
    let mut handle = spawn_player(factory.clone(), Box::new(NullVideoSink), config).unwrap();

    handle.commands.send(load(memory_source(600 * 1024))).unwrap();
    let seen = collect_until(&mut handle.events, |e| matches!(e, PlayerEvent::Ended)).await;

    // 600 KiB buys exactly two frames before the drain ends the stream.
    let last_stats = seen
        .iter()
        .rev()
        .find_map(|e| match e {
            PlayerEvent::Stats(s) => Some(*s),
            _ => None,
        })
        .expect("stats emitted");
    assert_eq!(last_stats.frames, 2);
    assert_eq!(last_stats.bytes, 600 * 1024);
}

#[tokio::test(start_paused = true)]
async fn backpressure_caps_the_decoder_backlog() {
    // Nothing is ever consumed (the open threshold is unreachable), so the
    // backlog equals appended bytes and the pump must stall at the ceiling.
    let mut config = PlayerConfig::default();
    config.max_buffered_bytes = 1024 * 1024;
    config.seek_buffered_bytes = 256 * 1024;
    config.min_open_bytes = 8 * 1024 * 1024;

    let factory = FakeFactory::new(FakePlan::default());
    let mut handle = spawn_player(factory.clone(), Box::new(NullVideoSink), config).unwrap();

    handle.commands.send(load(memory_source(4 * 1024 * 1024))).unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    let appended = factory.bytes_appended();
    assert!(appended >= 1024 * 1024, "pump never reached the ceiling");
    // Ceiling plus at most one in-flight slice.
    assert!(
        appended <= 1024 * 1024 + 256 * 1024,
        "backlog exceeded the ceiling: {appended}"
    );

    // Stop invalidates the stream token; the stalled pump must exit
    // without appending anything further.
    handle.commands.send(Command::Stop).unwrap();
    wait_for_status(&mut handle.events, "Ready").await;
    let at_stop = factory.bytes_appended();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(factory.bytes_appended(), at_stop);
}

#[tokio::test(start_paused = true)]
async fn reload_replaces_the_session() {
    let factory = FakeFactory::new(FakePlan {
        end_pts: 1000.0,
        ..FakePlan::default()
    });
    let mut handle = spawn_player(
        factory.clone(),
        Box::new(NullVideoSink),
        PlayerConfig::default(),
    )
    .unwrap();

    handle.commands.send(load(memory_source(64 * 1024))).unwrap();
    wait_for_status(&mut handle.events, "Playing").await;

    handle.commands.send(load(memory_source(32 * 1024))).unwrap();
    // Reset announces Ready and clears audio before the new load starts.
    let seen = wait_for_status(&mut handle.events, "Ready").await;
    assert!(seen.iter().any(|e| matches!(e, PlayerEvent::AudioClear)));

    wait_for_status(&mut handle.events, "Playing").await;
    assert_eq!(factory.sessions_created(), 2);
    assert_eq!(factory.bytes_appended(), 32 * 1024);
}

#[tokio::test(start_paused = true)]
async fn pause_suspends_and_play_resumes() {
    let factory = FakeFactory::new(FakePlan {
        end_pts: 1000.0,
        ..FakePlan::default()
    });
    let mut handle = spawn_player(
        factory.clone(),
        Box::new(NullVideoSink),
        PlayerConfig::default(),
    )
    .unwrap();

    handle.commands.send(load(memory_source(64 * 1024))).unwrap();
    wait_for_status(&mut handle.events, "Playing").await;

    handle.commands.send(Command::Pause).unwrap();
    wait_for_status(&mut handle.events, "Paused").await;

    handle.commands.send(Command::Play).unwrap();
    wait_for_status(&mut handle.events, "Playing").await;

    handle.commands.send(Command::Stop).unwrap();
    wait_for_status(&mut handle.events, "Ready").await;
}

#[tokio::test(start_paused = true)]
async fn open_failure_is_terminal_once_the_source_drains() {
    let factory = FakeFactory::new(FakePlan {
        open_fail_code: Some(-42),
        ..FakePlan::default()
    });
    let mut handle = spawn_player(
        factory.clone(),
        Box::new(NullVideoSink),
        PlayerConfig::default(),
    )
    .unwrap();

    handle.commands.send(load(memory_source(16 * 1024))).unwrap();
    let seen = collect_until(&mut handle.events, |e| matches!(e, PlayerEvent::Ended)).await;

    assert!(seen
        .iter()
        .any(|e| matches!(e, PlayerEvent::Status(s) if s == "Open failed")));
    // The failure code is surfaced exactly once per distinct code.
    let described = seen
        .iter()
        .filter(|e| matches!(e, PlayerEvent::Log(m) if m.contains("code -42") && m.contains("Failed to open")))
        .count();
    assert_eq!(described, 1);
}

#[tokio::test(start_paused = true)]
async fn decode_failure_ends_the_session() {
    let factory = FakeFactory::new(FakePlan {
        end_pts: 1000.0,
        fail_after_frames: Some((2, -99)),
        ..FakePlan::default()
    });
    let mut handle = spawn_player(
        factory.clone(),
        Box::new(NullVideoSink),
        PlayerConfig::default(),
    )
    .unwrap();

    handle.commands.send(load(memory_source(64 * 1024))).unwrap();
    let seen = collect_until(&mut handle.events, |e| matches!(e, PlayerEvent::Ended)).await;

    assert!(seen
        .iter()
        .any(|e| matches!(e, PlayerEvent::Log(m) if m.contains("code -99"))));
    assert!(seen
        .iter()
        .any(|e| matches!(e, PlayerEvent::Status(s) if s == "Error")));
}

#[tokio::test(start_paused = true)]
async fn decoder_allocation_failure_never_starts_the_session() {
    let factory = FakeFactory::failing_create(-12);
    let mut handle = spawn_player(
        factory.clone(),
        Box::new(NullVideoSink),
        PlayerConfig::default(),
    )
    .unwrap();

    handle.commands.send(load(memory_source(16 * 1024))).unwrap();
    let seen = collect_until(&mut handle.events, |e| matches!(e, PlayerEvent::Ended)).await;

    assert!(seen
        .iter()
        .any(|e| matches!(e, PlayerEvent::Log(m) if m.contains("Failed to create decoder context"))));
    assert_eq!(factory.sessions_created(), 0);
    assert_eq!(factory.bytes_appended(), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_file_reports_and_stays_ready() {
    let factory = FakeFactory::new(FakePlan::default());
    let mut handle = spawn_player(
        factory.clone(),
        Box::new(NullVideoSink),
        PlayerConfig::default(),
    )
    .unwrap();

    handle
        .commands
        .send(load(SourceSpec::File("/nonexistent/path/movie.webm".into())))
        .unwrap();
    let seen = wait_for_status(&mut handle.events, "Ready").await;

    // The reset's "Ready" comes first; collect until the post-failure one.
    let seen = if seen
        .iter()
        .any(|e| matches!(e, PlayerEvent::Log(m) if m.contains("Failed to open source")))
    {
        seen
    } else {
        let mut more = wait_for_status(&mut handle.events, "Ready").await;
        let mut all = seen;
        all.append(&mut more);
        all
    };
    assert!(seen
        .iter()
        .any(|e| matches!(e, PlayerEvent::Log(m) if m.contains("Failed to open source"))));
    assert_eq!(factory.sessions_created(), 0);
}

#[tokio::test(start_paused = true)]
async fn speed_changes_are_clamped_and_logged() {
    let factory = FakeFactory::new(FakePlan {
        end_pts: 1000.0,
        ..FakePlan::default()
    });
    let mut handle = spawn_player(
        factory.clone(),
        Box::new(NullVideoSink),
        PlayerConfig::default(),
    )
    .unwrap();

    handle.commands.send(load(memory_source(64 * 1024))).unwrap();
    wait_for_status(&mut handle.events, "Playing").await;

    handle.commands.send(Command::SetSpeed { speed: 9.0 }).unwrap();
    let seen = collect_until(
        &mut handle.events,
        |e| matches!(e, PlayerEvent::Log(m) if m.contains("speed")),
    )
    .await;
    assert!(seen
        .iter()
        .any(|e| matches!(e, PlayerEvent::Log(m) if m.contains("2.00x"))));
}
