//! Gong track selection and debounced playback

use std::{
    path::PathBuf,
    process::Stdio,
    sync::Arc,
};

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::state::GongCue;

/// Minimum spacing between two successful plays
pub const DEBOUNCE_MS: i64 = 1000;

/// The fixed set of gong recordings shipped with gongy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GongTrack {
    Bong,
    Gong,
    SoftGong,
}

impl GongTrack {
    pub const ALL: [GongTrack; 3] = [GongTrack::Bong, GongTrack::Gong, GongTrack::SoftGong];

    /// File name of the recording inside the sounds directory
    pub fn file_name(self) -> &'static str {
        match self {
            GongTrack::Bong => "bong-105459.mp3",
            GongTrack::Gong => "gong-79191.mp3",
            GongTrack::SoftGong => "instrument_gong_soft-107870.mp3",
        }
    }

    /// Pick a track uniformly at random
    pub fn random() -> Self {
        Self::random_with(&mut rand::thread_rng())
    }

    pub fn random_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// Something that can make a gong sound
pub trait AudioBackend: Send + Sync {
    /// Start playing `track`. Must not block until playback ends.
    fn play(&self, track: GongTrack) -> Result<(), String>;
}

/// Plays tracks by spawning an external audio player (e.g. `paplay`)
#[derive(Debug, Clone)]
pub struct CommandAudio {
    program: String,
    args: Vec<String>,
    sounds_dir: PathBuf,
}

impl CommandAudio {
    /// `player` is a command line such as `paplay` or `mpv --no-video`;
    /// the track path is appended as the last argument.
    pub fn new(player: &str, sounds_dir: PathBuf) -> Self {
        let mut parts = player.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| "paplay".to_string());
        Self {
            program,
            args: parts.collect(),
            sounds_dir,
        }
    }

    pub fn track_path(&self, track: GongTrack) -> PathBuf {
        self.sounds_dir.join(track.file_name())
    }
}

impl AudioBackend for CommandAudio {
    fn play(&self, track: GongTrack) -> Result<(), String> {
        let path = self.track_path(track);
        if !path.is_file() {
            return Err(format!("Sound file not found: {}", path.display()));
        }

        debug!("Spawning {} for {}", self.program, path.display());
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| format!("Failed to execute {}: {}", self.program, e))?;

        let program = self.program.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if !status.success() => {
                    warn!("{} exited with {}", program, status);
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to wait for {}: {}", program, e),
            }
        });

        Ok(())
    }
}

/// Per-session gong player: one track, one debounce window
pub struct GongPlayer {
    backend: Arc<dyn AudioBackend>,
    track: GongTrack,
    last_played_at: Option<DateTime<Utc>>,
}

impl GongPlayer {
    /// Create a player with a freshly chosen random track
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self::with_track(backend, GongTrack::random())
    }

    pub fn with_track(backend: Arc<dyn AudioBackend>, track: GongTrack) -> Self {
        Self {
            backend,
            track,
            last_played_at: None,
        }
    }

    pub fn track(&self) -> GongTrack {
        self.track
    }

    pub fn last_played_at(&self) -> Option<DateTime<Utc>> {
        self.last_played_at
    }

    /// Play the session track for `cue`.
    ///
    /// Returns whether a sound was actually started. Plays within
    /// [`DEBOUNCE_MS`] of the last successful one are dropped, and backend
    /// failures are logged rather than returned.
    pub fn play(&mut self, cue: GongCue, now: DateTime<Utc>) -> bool {
        if let Some(last) = self.last_played_at {
            if now - last < Duration::milliseconds(DEBOUNCE_MS) {
                debug!("Skipping {:?} gong, last one played {}ms ago", cue, (now - last).num_milliseconds());
                return false;
            }
        }

        match self.backend.play(self.track) {
            Ok(()) => {
                info!("Playing {:?} gong ({:?})", cue, self.track);
                self.last_played_at = Some(now);
                true
            }
            Err(e) => {
                error!("Audio play failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::{rngs::StdRng, SeedableRng};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        plays: Mutex<Vec<GongTrack>>,
    }

    impl AudioBackend for Recorder {
        fn play(&self, track: GongTrack) -> Result<(), String> {
            self.plays.lock().unwrap().push(track);
            Ok(())
        }
    }

    struct Refusing;

    impl AudioBackend for Refusing {
        fn play(&self, _track: GongTrack) -> Result<(), String> {
            Err("NotAllowedError: playback requires a user gesture".to_string())
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap()
    }

    #[test]
    fn plays_within_debounce_collapse() {
        let recorder = Arc::new(Recorder::default());
        let mut player = GongPlayer::with_track(recorder.clone(), GongTrack::Gong);

        assert!(player.play(GongCue::Start, t0()));
        assert!(!player.play(GongCue::Warning, t0() + Duration::milliseconds(999)));
        assert!(player.play(GongCue::Expiry, t0() + Duration::milliseconds(1000)));

        assert_eq!(*recorder.plays.lock().unwrap(), vec![GongTrack::Gong, GongTrack::Gong]);
        assert_eq!(player.last_played_at(), Some(t0() + Duration::milliseconds(1000)));
    }

    #[test]
    fn failed_play_is_swallowed_and_not_debounced() {
        let mut player = GongPlayer::with_track(Arc::new(Refusing), GongTrack::Bong);
        assert!(!player.play(GongCue::Start, t0()));
        assert_eq!(player.last_played_at(), None);
    }

    #[test]
    fn random_selection_covers_every_track() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = Vec::new();
        for _ in 0..200 {
            let track = GongTrack::random_with(&mut rng);
            if !seen.contains(&track) {
                seen.push(track);
            }
        }
        assert_eq!(seen.len(), GongTrack::ALL.len());
    }

    #[test]
    fn command_audio_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let audio = CommandAudio::new("paplay --volume 40000", dir.path().to_path_buf());
        let err = audio.play(GongTrack::SoftGong).unwrap_err();
        assert!(err.contains("instrument_gong_soft-107870.mp3"));
        assert_eq!(audio.args, vec!["--volume".to_string(), "40000".to_string()]);
    }
}
