use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use log::info;

use syncwave::player::{PlaybackSnapshot, PlayerEvent, SharedPlayer};
use syncwave::provider::StaticProvider;
use syncwave::sync::{spawn_engine, Segment, SyncEngine, TrackAnalysis, CHROMA_BINS};

#[derive(Parser)]
#[command(
    name = "sync-demo",
    about = "Drive the sync engine against a synthetic playback session"
)]
struct Args {
    /// Tempo of the synthetic track
    #[arg(long, default_value_t = 128.0)]
    bpm: f32,

    /// How long to run the session
    #[arg(long, default_value_t = 10.0)]
    seconds: f32,

    /// Animation frame rate
    #[arg(long, default_value_t = 60)]
    fps: u32,
}

/// Build a contiguous synthetic analysis: quarter-second segments that
/// alternate between a loud, bass-heavy profile and a quiet one, so the
/// demo produces visible beat pulses and spectrum movement.
fn synthetic_analysis(bpm: f32, duration_seconds: f32) -> TrackAnalysis {
    let segment_duration = 0.25;
    let count = (duration_seconds / segment_duration).ceil() as usize;

    let segments = (0..count)
        .map(|i| {
            let loud = i % 2 == 0;
            let mut timbre = vec![0.0; CHROMA_BINS];
            if loud {
                timbre[..4].fill(5.0);
            } else {
                timbre[4..8].fill(1.0);
            }
            Segment {
                start: i as f32 * segment_duration,
                duration: segment_duration,
                confidence: 0.9,
                loudness_max: if loud { -8.0 } else { -25.0 },
                pitches: vec![0.5; CHROMA_BINS],
                timbre,
            }
        })
        .collect();

    TrackAnalysis {
        bpm,
        energy: 0.8,
        valence: 0.7,
        segments,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!(
        "Starting syncwave demo: {:.0} bpm, {:.1}s, {} fps",
        args.bpm, args.seconds, args.fps
    );

    let provider = Arc::new(StaticProvider::new(synthetic_analysis(
        args.bpm,
        args.seconds,
    )));
    let player = SharedPlayer::new();
    player.set(PlaybackSnapshot {
        position_seconds: 0.0,
        duration_seconds: args.seconds,
        is_paused: false,
    });

    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let handle = spawn_engine(
        SyncEngine::new(),
        player.clone(),
        event_rx,
        provider,
        args.fps,
    );
    event_tx.send(PlayerEvent::TrackChanged("demo-track".into()))?;

    let frames = handle.frames();
    let start = Instant::now();
    let mut last_report = Instant::now();

    while start.elapsed().as_secs_f32() < args.seconds {
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Stand in for the host player's transport advancing in real time.
        player.set(PlaybackSnapshot {
            position_seconds: start.elapsed().as_secs_f32(),
            duration_seconds: args.seconds,
            is_paused: false,
        });

        if last_report.elapsed() >= Duration::from_secs(1) {
            last_report = Instant::now();
            let frame = frames.read();
            let (bass, mid, treble) = frame
                .spectrum
                .map(|s| (s.bass, s.mid, s.treble))
                .unwrap_or_default();
            info!(
                "frame {:>5}  beat {:.2}  bass {:.2} mid {:.2} treble {:.2}  mood {}  tempo x{:.2}",
                frame.frame_index,
                frame.beat_intensity,
                bass,
                mid,
                treble,
                frame
                    .mood
                    .map(|m| m.mood.to_string())
                    .unwrap_or_else(|| "-".into()),
                frame.tempo_multiplier
            );
        }
    }

    event_tx.send(PlayerEvent::SessionEnded)?;
    handle.stopped().await;
    info!("Demo finished");

    Ok(())
}
