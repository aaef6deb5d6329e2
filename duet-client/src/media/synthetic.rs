use crate::error::MediaError;
use crate::media::{LocalStream, LocalTrack, MediaConstraints, MediaSource, TrackKind};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tracing::debug;

/// Opus TOC byte plus padding for a 20ms silent frame.
const SILENT_OPUS_FRAME: &[u8] = &[0xf8, 0xff, 0xfe];
const AUDIO_FRAME: Duration = Duration::from_millis(20);

const BLANK_VP8_FRAME: &[u8] = &[0x10, 0x02, 0x00, 0x9d, 0x01, 0x2a, 0x10, 0x00, 0x10, 0x00];
const VIDEO_FRAME: Duration = Duration::from_millis(100);

/// Produces tracks without touching any device. Useful headless and in tests.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    pump_samples: bool,
    delay: Duration,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self {
            pump_samples: true,
            delay: Duration::ZERO,
        }
    }

    /// Tracks are created but never written to.
    pub fn without_samples() -> Self {
        Self {
            pump_samples: false,
            delay: Duration::ZERO,
        }
    }

    /// Simulates a slow permission prompt.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaSource for SyntheticSource {
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<LocalStream, MediaError> {
        if !constraints.audio && !constraints.video {
            return Err(MediaError::Unavailable("no track kinds requested".into()));
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut stream = LocalStream::with_random_id();
        if constraints.audio {
            let track = stream.new_track(TrackKind::Audio);
            if self.pump_samples {
                spawn_pump(track, Bytes::from_static(SILENT_OPUS_FRAME), AUDIO_FRAME);
            }
        }
        if constraints.video {
            let track = stream.new_track(TrackKind::Video);
            if self.pump_samples {
                spawn_pump(track, Bytes::from_static(BLANK_VP8_FRAME), VIDEO_FRAME);
            }
        }

        Ok(stream)
    }
}

fn spawn_pump(track: LocalTrack, frame: Bytes, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match track.write_sample(frame.clone(), period).await {
                Ok(()) => {}
                Err(MediaError::Stopped) => break,
                Err(e) => debug!("Sample write failed on {}: {}", track.id(), e),
            }
        }
        debug!("Sample pump for {} stopped", track.id());
    });
}
