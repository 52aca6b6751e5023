//! Audio playback to speakers

use std::ffi::OsString;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::{Error, Result};

/// Sample rate for playback (matches common TTS output)
const PLAYBACK_SAMPLE_RATE: u32 = 24000;

/// Plays synthesized MP3 audio, blocking until playback ends
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Play MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if the audio cannot be played
    async fn play_mp3(&self, mp3_data: &[u8]) -> Result<()>;
}

/// Reject audio that is empty or does not start like an MP3 stream
///
/// # Errors
///
/// Returns [`Error::Playback`] for malformed audio
pub fn check_mp3(data: &[u8]) -> Result<()> {
    match data {
        [] => Err(Error::Playback("empty audio".to_string())),
        [b'I', b'D', b'3', ..] => Ok(()),
        [0xFF, second, ..] if second & 0xE0 == 0xE0 => Ok(()),
        _ => Err(Error::Playback("audio is not MP3".to_string())),
    }
}

/// Writes audio to a transient file and hands it to the platform player
///
/// The file is overwritten by every call.
pub struct SystemPlayer {
    path: PathBuf,
}

impl SystemPlayer {
    /// Create a player writing to `path`
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Transient file location
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AudioPlayer for SystemPlayer {
    async fn play_mp3(&self, mp3_data: &[u8]) -> Result<()> {
        tokio::fs::write(&self.path, mp3_data).await?;

        let (program, args) = player_invocation(&self.path)?;
        tracing::debug!(program = %program.to_string_lossy(), path = %self.path.display(), "playing audio file");

        let status = tokio::process::Command::new(&program)
            .args(&args)
            .status()
            .await?;

        if !status.success() {
            return Err(Error::Playback(format!(
                "{} exited with {status}",
                program.to_string_lossy()
            )));
        }

        Ok(())
    }
}

/// Pick the platform player command for an audio file
fn player_invocation(path: &Path) -> Result<(OsString, Vec<OsString>)> {
    let file = path.as_os_str().to_owned();

    if cfg!(target_os = "macos") {
        return Ok(("afplay".into(), vec![file]));
    }

    if cfg!(target_os = "windows") {
        let mut script = OsString::from("Start-Process -FilePath '");
        script.push(&file);
        script.push("'");
        return Ok((
            "powershell".into(),
            vec!["-NoProfile".into(), "-Command".into(), script],
        ));
    }

    if which::which("mpg123").is_ok() {
        return Ok(("mpg123".into(), vec!["-q".into(), file]));
    }
    if which::which("ffplay").is_ok() {
        return Ok((
            "ffplay".into(),
            vec![
                "-nodisp".into(),
                "-autoexit".into(),
                "-loglevel".into(),
                "quiet".into(),
                file,
            ],
        ));
    }
    if which::which("xdg-open").is_ok() {
        return Ok(("xdg-open".into(), vec![file]));
    }

    Err(Error::Playback("no audio player found".to_string()))
}

/// Decodes audio in-process and plays it on the default output device
#[derive(Clone)]
pub struct DevicePlayer {
    config: StreamConfig,
}

impl DevicePlayer {
    /// Create a new audio playback instance
    ///
    /// # Errors
    ///
    /// Returns error if audio device cannot be opened
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let supported_config = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
            })
            .or_else(|| {
                // Fallback: try stereo
                device.supported_output_configs().ok()?.find(|c| {
                    c.channels() == 2
                        && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                        && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
                })
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = PLAYBACK_SAMPLE_RATE,
            channels = config.channels,
            "audio playback initialized"
        );

        Ok(Self { config })
    }

    /// Play audio samples (f32 format)
    ///
    /// # Errors
    ///
    /// Returns error if playback fails
    pub fn play_samples(&self, samples: Vec<f32>) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device".to_string()))?;

        let config = self.config.clone();
        let channels = config.channels as usize;
        let sample_count = samples.len();

        let samples = Arc::new(samples);
        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let stream = {
            let samples = Arc::clone(&samples);
            let position = Arc::clone(&position);
            let finished = Arc::clone(&finished);

            device
                .build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        for frame in data.chunks_mut(channels) {
                            let pos = position.load(Ordering::Relaxed);
                            let sample = samples.get(pos).copied().unwrap_or_else(|| {
                                finished.store(true, Ordering::Relaxed);
                                0.0
                            });

                            for out in frame.iter_mut() {
                                *out = sample;
                            }

                            if pos < samples.len() {
                                position.store(pos + 1, Ordering::Relaxed);
                            }
                        }
                    },
                    |err| {
                        tracing::error!(error = %err, "audio playback error");
                    },
                    None,
                )
                .map_err(|e| Error::Audio(e.to_string()))?
        };

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        // Wait for playback to finish
        let duration_ms = (sample_count as u64 * 1000) / u64::from(PLAYBACK_SAMPLE_RATE);

        // Poll for completion with timeout
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(duration_ms + 500);

        while !finished.load(Ordering::Relaxed) {
            if start.elapsed() > timeout {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }

        // Small delay to ensure audio finishes
        std::thread::sleep(std::time::Duration::from_millis(100));

        drop(stream);
        tracing::debug!(samples = sample_count, "playback complete");

        Ok(())
    }
}

#[async_trait]
impl AudioPlayer for DevicePlayer {
    async fn play_mp3(&self, mp3_data: &[u8]) -> Result<()> {
        let samples = decode_mp3(mp3_data)?;
        if samples.is_empty() {
            return Err(Error::Playback("no audio frames decoded".to_string()));
        }

        // Playback polls with thread sleeps until the stream drains
        let player = self.clone();
        tokio::task::spawn_blocking(move || player.play_samples(samples))
            .await
            .map_err(|e| Error::Playback(e.to_string()))?
    }
}

/// Decode MP3 bytes to f32 samples
fn decode_mp3(mp3_data: &[u8]) -> Result<Vec<f32>> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                // Convert i16 samples to f32 and handle stereo to mono
                if frame.channels == 2 {
                    samples.extend(frame.data.chunks(2).map(|chunk| {
                        let left = f32::from(chunk[0]) / 32768.0;
                        let right = f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                        f32::midpoint(left, right)
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Playback(format!("MP3 decode error: {e}"))),
        }
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_mp3() {
        assert!(check_mp3(b"").is_err());
        assert!(check_mp3(b"ID3\x04\x00").is_ok());
        assert!(check_mp3(&[0xFF, 0xFB, 0x90, 0x00]).is_ok());
        assert!(check_mp3(b"<html>error</html>").is_err());
    }

    #[test]
    fn test_device_player_moves_to_blocking_pool() {
        fn assert_blocking_safe<T: Clone + Send + 'static>() {}
        assert_blocking_safe::<DevicePlayer>();
    }

    #[test]
    fn test_decode_garbage_yields_no_samples_or_error() {
        let decoded = decode_mp3(b"definitely not audio");
        assert!(decoded.map_or(true, |s| s.is_empty()));
    }
}
