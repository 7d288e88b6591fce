//! Integration tests for progress stream parsing.

use ffweave::{ProgressConfig, ProgressParser, ProgressUpdate, ProgressValue};
use std::sync::{Arc, Mutex};

/// A realistic `-progress pipe:1` stream for two records, interleaved with
/// log output and a redrawn status line.
const STREAM: &str = "\
ffmpeg version 6.1 Copyright (c) 2000-2023 the FFmpeg developers\n\
Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'in.mp4':\n\
frame=   12 fps=0.0 q=28.0 size=       0kB time=00:00:00.40 bitrate=   0.9kbits/s speed=0.8x\r\
frame=48\n\
fps=24.00\n\
stream_0_0_q=28.0\n\
bitrate=N/A\n\
total_size=48\n\
out_time_us=2000000\n\
out_time_ms=2000000\n\
out_time=00:00:02.000000\n\
dup_frames=0\n\
drop_frames=0\n\
speed=1.99x\n\
progress=continue\n\
[libx264 @ 0x55d0] using cpu capabilities: MMX2 SSE2Fast\n\
frame=96\n\
fps=24.00\n\
out_time_us=4000000\n\
out_time_ms=4000000\n\
out_time=00:00:04.000000\n\
speed=2.01x\n\
progress=end\n";

fn recording_parser() -> (ProgressParser, Arc<Mutex<Vec<ProgressUpdate>>>) {
    let mut parser = ProgressParser::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    parser.on_update(move |update| sink.lock().unwrap().push(update.clone()));
    (parser, seen)
}

#[test]
fn whole_stream_at_once() {
    let (mut parser, seen) = recording_parser();
    parser.feed(STREAM);
    parser.finish();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);

    assert_eq!(seen[0].frame(), Some(48));
    assert_eq!(seen[0].fps(), Some(24.0));
    assert_eq!(seen[0].out_time_us(), Some(2_000_000));
    assert_eq!(seen[0].get("out_time_ms"), Some(&ProgressValue::Number(2000.0)));
    assert_eq!(seen[0].get("bitrate"), Some(&ProgressValue::Text("N/A".into())));
    assert!(!seen[0].is_end());

    assert_eq!(seen[1].frame(), Some(96));
    assert!(seen[1].is_end());
    assert_eq!(parser.last_media_time(), "00:00:04.000000");
}

#[test]
fn byte_sized_chunks_give_the_same_result() {
    let (mut whole, whole_seen) = recording_parser();
    whole.feed(STREAM);
    whole.finish();

    let (mut split, split_seen) = recording_parser();
    let mut buf = [0u8; 4];
    for c in STREAM.chars() {
        split.feed(c.encode_utf8(&mut buf));
    }
    split.finish();

    assert_eq!(*whole_seen.lock().unwrap(), *split_seen.lock().unwrap());
    assert_eq!(whole.formatted_log(), split.formatted_log());
}

#[test]
fn log_lines_are_attributed_to_committed_time() {
    let (mut parser, _) = recording_parser();
    parser.feed(STREAM);

    let log: Vec<_> = parser.log().map(|e| (e.time.as_str(), e.text.as_str())).collect();
    assert_eq!(
        log,
        vec![
            ("0", "ffmpeg version 6.1 Copyright (c) 2000-2023 the FFmpeg developers"),
            ("0", "Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'in.mp4':"),
            ("00:00:02.000000", "[libx264 @ 0x55d0] using cpu capabilities: MMX2 SSE2Fast"),
        ]
    );
    assert_eq!(parser.last(), Some("[libx264 @ 0x55d0] using cpu capabilities: MMX2 SSE2Fast"));
    assert_eq!(parser.last_n(2).len(), 2);
}

#[test]
fn fixup_applies_only_to_equal_values() {
    let (mut parser, seen) = recording_parser();
    parser.push_line("out_time_ms=5000\n");
    parser.push_line("out_time_us=5000\n");
    parser.push_line("progress=continue\n");

    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(
        parser.committed().get("out_time_ms"),
        Some(&ProgressValue::Number(5.0))
    );
}

#[test]
fn carriage_return_chunk_changes_nothing() {
    let (mut parser, seen) = recording_parser();
    parser.feed("frame=1\nprogress=continue\n");
    let committed = parser.committed().clone();

    parser.push_line("frame=  2 fps=0.0 q=0.0 size=0kB\r");

    assert_eq!(parser.committed(), &committed);
    assert!(parser.pending().is_empty());
    assert!(parser.last().is_none());
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn config_controls_log_capacity_and_default_time() {
    let config = ProgressConfig {
        log_capacity: Some(1),
        default_time: "--:--".into(),
    };
    let mut parser = ProgressParser::from_config(&config);
    parser.feed("first\nsecond\n");

    assert_eq!(parser.last_n(10), vec!["second"]);
    assert_eq!(parser.formatted_log(), "[--:--] second\n");
}

#[tokio::test]
async fn channel_subscribers_see_every_update() {
    let mut parser = ProgressParser::new();
    let mut rx = parser.subscribe();

    ffweave::consume(&mut parser, STREAM.as_bytes()).await.unwrap();
    drop(parser);

    let mut frames = Vec::new();
    while let Some(update) = rx.recv().await {
        frames.push(update.frame());
    }
    assert_eq!(frames, vec![Some(48), Some(96)]);
}
