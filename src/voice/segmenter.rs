//! Energy-based utterance segmentation
//!
//! Splits the microphone stream into a single utterance: waits for energy
//! above the speech threshold, accumulates until a pause, and caps the
//! utterance at a maximum length.

use std::time::Duration;

use super::SAMPLE_RATE;

/// Minimum speech duration to accept (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Multiplier applied to ambient noise when the threshold is dynamic
const DYNAMIC_FACTOR: f32 = 1.5;

/// State of the segmenter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// Waiting for speech to start
    Waiting,
    /// Speech started, accumulating
    Speaking,
    /// Utterance ended (pause or length limit), ready to take
    Complete,
}

/// Detects the start and end of one spoken utterance
#[derive(Debug)]
pub struct UtteranceSegmenter {
    base_threshold: f32,
    threshold: f32,
    pause_samples: usize,
    max_samples: usize,
    state: SegmenterState,
    speech_buffer: Vec<f32>,
    silence_counter: usize,
}

impl UtteranceSegmenter {
    /// Create a new segmenter
    ///
    /// # Arguments
    ///
    /// * `threshold` - Minimum RMS energy treated as speech
    /// * `pause` - Silence that ends an utterance
    /// * `max_duration` - Maximum utterance length
    #[must_use]
    pub fn new(threshold: f32, pause: Duration, max_duration: Duration) -> Self {
        Self {
            base_threshold: threshold,
            threshold,
            pause_samples: duration_to_samples(pause),
            max_samples: duration_to_samples(max_duration),
            state: SegmenterState::Waiting,
            speech_buffer: Vec::new(),
            silence_counter: 0,
        }
    }

    /// Adjust the speech threshold to measured ambient noise
    ///
    /// With `dynamic` the threshold rises above the ambient level but never
    /// drops below the configured base. Returns the threshold now in effect.
    pub fn calibrate(&mut self, ambient: f32, dynamic: bool) -> f32 {
        self.threshold = if dynamic {
            self.base_threshold.max(ambient * DYNAMIC_FACTOR)
        } else {
            self.base_threshold
        };
        tracing::debug!(ambient, threshold = self.threshold, "noise calibrated");
        self.threshold
    }

    /// Change the maximum utterance length
    pub fn set_max_duration(&mut self, max_duration: Duration) {
        self.max_samples = duration_to_samples(max_duration);
    }

    /// Process a chunk of samples and return the resulting state
    pub fn process(&mut self, samples: &[f32]) -> SegmenterState {
        if samples.is_empty() {
            return self.state;
        }

        let energy = calculate_energy(samples);
        let is_speech = energy > self.threshold;

        match self.state {
            SegmenterState::Waiting => {
                if is_speech {
                    self.state = SegmenterState::Speaking;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech started");
                }
            }
            SegmenterState::Speaking => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.speech_buffer.len() >= self.max_samples {
                    self.speech_buffer.truncate(self.max_samples);
                    self.state = SegmenterState::Complete;
                    tracing::debug!(samples = self.speech_buffer.len(), "phrase limit reached");
                } else if self.silence_counter > self.pause_samples {
                    let spoken = self.speech_buffer.len().saturating_sub(self.silence_counter);
                    if spoken > MIN_SPEECH_SAMPLES {
                        self.state = SegmenterState::Complete;
                        tracing::debug!(samples = self.speech_buffer.len(), "utterance complete");
                    } else {
                        // Too short to be speech (click, cough), keep waiting
                        tracing::trace!(spoken, "discarding short noise burst");
                        self.reset();
                    }
                }
            }
            SegmenterState::Complete => {}
        }

        self.state
    }

    /// Take the completed utterance, resetting to [`SegmenterState::Waiting`]
    pub fn take_utterance(&mut self) -> Vec<f32> {
        let utterance = std::mem::take(&mut self.speech_buffer);
        self.reset();
        utterance
    }

    /// Reset to waiting, keeping the calibrated threshold
    pub fn reset(&mut self) {
        self.state = SegmenterState::Waiting;
        self.speech_buffer.clear();
        self.silence_counter = 0;
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> SegmenterState {
        self.state
    }

    /// Speech threshold in effect
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn duration_to_samples(duration: Duration) -> usize {
    (duration.as_secs_f64() * f64::from(SAMPLE_RATE)) as usize
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter() -> UtteranceSegmenter {
        UtteranceSegmenter::new(0.03, Duration::from_millis(500), Duration::from_secs(10))
    }

    #[test]
    fn test_energy_calculation() {
        let silence = vec![0.0f32; 100];
        assert!(calculate_energy(&silence) < 0.001);

        let loud = vec![0.5f32; 100];
        assert!(calculate_energy(&loud) > 0.4);
    }

    #[test]
    fn test_silence_stays_waiting() {
        let mut s = segmenter();
        assert_eq!(s.process(&[0.0; 1600]), SegmenterState::Waiting);
    }

    #[test]
    fn test_short_burst_is_discarded() {
        let mut s = segmenter();
        assert_eq!(s.process(&[0.5; 800]), SegmenterState::Speaking);
        assert_eq!(s.process(&[0.0; 9000]), SegmenterState::Waiting);
    }

    #[test]
    fn test_empty_chunks_never_complete_an_utterance() {
        let mut s = segmenter();
        assert_eq!(s.process(&[0.5; 8000]), SegmenterState::Speaking);
        for _ in 0..100 {
            assert_eq!(s.process(&[]), SegmenterState::Speaking);
        }
    }

    #[test]
    fn test_dynamic_calibration_never_lowers_threshold() {
        let mut s = segmenter();
        assert!((s.calibrate(0.001, true) - 0.03).abs() < f32::EPSILON);
        assert!((s.calibrate(0.1, true) - 0.15).abs() < 1e-6);
        assert!((s.calibrate(0.1, false) - 0.03).abs() < f32::EPSILON);
    }
}
