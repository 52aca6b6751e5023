//! Voice processing module
//!
//! Speech input (capture, segmentation, recognition with language fallback)
//! and speech output (remote synthesis with local fallback).

mod capture;
mod input;
mod local;
mod output;
mod playback;
mod segmenter;
mod stt;
mod tts;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
pub use input::{ConsoleInput, DEVICE_RETRY_DELAY, Listen, Microphone, SpeechInput, UtteranceIn};
pub use local::{LocalSpeech, pick_voice};
pub use output::{RemoteSpeech, SpeechOutput, SpeechProvider, UtteranceOut};
pub use playback::{AudioPlayer, DevicePlayer, SystemPlayer, check_mp3};
pub use segmenter::{SegmenterState, UtteranceSegmenter, calculate_energy};
pub use stt::{SpeechToText, Transcriber};
pub use tts::{Synthesizer, TextToSpeech, VoiceGender};
