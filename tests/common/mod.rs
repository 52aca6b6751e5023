//! Shared test utilities
//!
//! In-memory stand-ins for every collaborator the assistant talks to, so the
//! dialogue can be driven without audio hardware or network access.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use url::Url;

use pasha::voice::{
    AudioPlayer, Listen, Microphone, SpeechOutput, SpeechProvider, Synthesizer, Transcriber,
    UtteranceIn, UtteranceOut, VoiceGender,
};
use pasha::{
    Assistant, Error, JokeSource, Language, LanguageModel, Result, Session, SystemControl,
};

pub const USER: &str = "sir";
pub const JOKE: &str = "I would tell you a UDP joke, but you might not get it.";

/// Shared log of calls made to a fake
pub type Calls = Arc<Mutex<Vec<String>>>;

/// Shared log of everything spoken
pub type Spoken = Arc<Mutex<Vec<UtteranceOut>>>;

#[must_use]
pub fn session(language: Language) -> Session {
    Session::new(language, "pasha", USER)
}

/// 2024-03-05 15:04 local time
#[must_use]
pub fn fixed_time() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2024, 3, 5, 15, 4, 0)
        .single()
        .expect("unambiguous local time")
}

/// Texts spoken so far
#[must_use]
pub fn texts(spoken: &Spoken) -> Vec<String> {
    spoken.lock().unwrap().iter().map(|u| u.text.clone()).collect()
}

/// Last utterance spoken
#[must_use]
pub fn last(spoken: &Spoken) -> UtteranceOut {
    spoken
        .lock()
        .unwrap()
        .last()
        .cloned()
        .expect("nothing was spoken")
}

/// Recorders attached to an assistant built by [`assistant`]
pub struct Harness {
    pub spoken: Spoken,
    pub system: Calls,
    pub jokes: Calls,
}

/// Assistant fed by `script`, with recording output, fake system control,
/// a fixed clock and no language model
#[must_use]
pub fn assistant(language: Language, script: &[&str]) -> (Assistant, Harness) {
    assistant_with_system(language, script, FakeSystem::default())
}

#[must_use]
pub fn assistant_with_system(
    language: Language,
    script: &[&str],
    system: FakeSystem,
) -> (Assistant, Harness) {
    let spoken = Spoken::default();
    let output = SpeechOutput::new().with_provider(Box::new(RecordingSpeaker::new(
        "recording",
        Arc::clone(&spoken),
    )));
    let jokes = FakeJokes::default();

    let harness = Harness {
        spoken,
        system: Arc::clone(&system.calls),
        jokes: Arc::clone(&jokes.calls),
    };

    let assistant = Assistant::new(
        session(language),
        Box::new(ScriptedListener::new(script)),
        output,
    )
    .with_system(Box::new(system))
    .with_jokes(Box::new(jokes))
    .with_clock(fixed_time);

    (assistant, harness)
}

/// Yields a fixed list of utterances, then reports closed
pub struct ScriptedListener {
    script: VecDeque<String>,
}

impl ScriptedListener {
    #[must_use]
    pub fn new(script: &[&str]) -> Self {
        Self {
            script: script.iter().map(ToString::to_string).collect(),
        }
    }
}

#[async_trait(?Send)]
impl Listen for ScriptedListener {
    async fn listen(&mut self, session: &mut Session) -> Option<UtteranceIn> {
        self.script.pop_front().map(|text| UtteranceIn {
            text: text.to_lowercase(),
            language: session.language(),
        })
    }

    fn is_closed(&self) -> bool {
        self.script.is_empty()
    }
}

/// Speech provider that records instead of speaking
pub struct RecordingSpeaker {
    name: String,
    spoken: Spoken,
    fail: bool,
}

impl RecordingSpeaker {
    #[must_use]
    pub fn new(name: &str, spoken: Spoken) -> Self {
        Self {
            name: name.to_string(),
            spoken,
            fail: false,
        }
    }

    /// A provider that always fails without recording
    #[must_use]
    pub fn failing(name: &str, spoken: Spoken) -> Self {
        Self {
            fail: true,
            ..Self::new(name, spoken)
        }
    }
}

#[async_trait]
impl SpeechProvider for RecordingSpeaker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn speak(&self, text: &str, language: Language) -> Result<()> {
        if self.fail {
            return Err(Error::Tts(format!("{} unavailable", self.name)));
        }
        self.spoken
            .lock()
            .unwrap()
            .push(UtteranceOut::new(text, language));
        Ok(())
    }
}

/// Synthesizer returning fixed bytes
pub struct FakeSynthesizer {
    pub audio: Vec<u8>,
}

#[async_trait]
impl Synthesizer for FakeSynthesizer {
    fn name(&self) -> &str {
        "fake"
    }

    async fn synthesize(
        &self,
        _text: &str,
        _language: Language,
        _gender: VoiceGender,
    ) -> Result<Vec<u8>> {
        Ok(self.audio.clone())
    }
}

/// Player recording how many bytes it was asked to play
#[derive(Default)]
pub struct FakePlayer {
    pub played: Arc<Mutex<Vec<usize>>>,
}

#[async_trait]
impl AudioPlayer for FakePlayer {
    async fn play_mp3(&self, mp3_data: &[u8]) -> Result<()> {
        self.played.lock().unwrap().push(mp3_data.len());
        Ok(())
    }
}

/// How the fake transcriber answers for one language
#[derive(Debug, Clone)]
pub enum Heard {
    Text(String),
    NoMatch,
    ServiceDown,
}

/// Transcriber answering per language and recording which languages it tried
#[derive(Default)]
pub struct FakeTranscriber {
    pub answers: HashMap<Language, Heard>,
    pub attempts: Arc<Mutex<Vec<Language>>>,
}

impl FakeTranscriber {
    #[must_use]
    pub fn with(mut self, language: Language, heard: Heard) -> Self {
        self.answers.insert(language, heard);
        self
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _wav: &[u8], language: Language) -> Result<String> {
        self.attempts.lock().unwrap().push(language);
        match self.answers.get(&language) {
            Some(Heard::Text(text)) => Ok(text.clone()),
            Some(Heard::ServiceDown) => Err(Error::Stt("service unavailable".to_string())),
            Some(Heard::NoMatch) | None => Err(Error::NoMatch),
        }
    }
}

/// Microphone producing one canned utterance, timing out, or unplugged
pub struct FakeMicrophone {
    pub samples: Option<Vec<f32>>,
    pub unplugged: bool,
    pub events: Calls,
}

impl FakeMicrophone {
    #[must_use]
    pub fn speaking() -> Self {
        Self {
            samples: Some(vec![0.25; 16_000]),
            unplugged: false,
            events: Calls::default(),
        }
    }

    #[must_use]
    pub fn silent() -> Self {
        Self {
            samples: None,
            unplugged: false,
            events: Calls::default(),
        }
    }

    /// Every open fails
    #[must_use]
    pub fn unplugged() -> Self {
        Self {
            unplugged: true,
            ..Self::silent()
        }
    }
}

#[async_trait(?Send)]
impl Microphone for FakeMicrophone {
    async fn open(&mut self) -> Result<()> {
        self.events.lock().unwrap().push("open".to_string());
        if self.unplugged {
            return Err(Error::Audio("no input device available".to_string()));
        }
        Ok(())
    }

    async fn calibrate_noise(&mut self, _duration: Duration) -> Result<f32> {
        self.events.lock().unwrap().push("calibrate".to_string());
        Ok(0.01)
    }

    async fn capture_utterance(
        &mut self,
        _start_timeout: Duration,
        _max_duration: Duration,
    ) -> Result<Vec<f32>> {
        self.events.lock().unwrap().push("capture".to_string());
        self.samples.clone().ok_or(Error::ListenTimeout)
    }

    async fn close(&mut self) {
        self.events.lock().unwrap().push("close".to_string());
    }
}

/// Language model with a canned answer, or failing when there is none
#[derive(Default)]
pub struct FakeModel {
    pub answer: Option<String>,
    pub prompts: Calls,
}

impl FakeModel {
    #[must_use]
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            prompts: Calls::default(),
        }
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push(format!("{max_tokens}: {prompt}"));
        self.answer
            .clone()
            .ok_or_else(|| Error::Llm("model unavailable".to_string()))
    }
}

/// System control recording every call
#[derive(Default)]
pub struct FakeSystem {
    pub calls: Calls,
    pub fail: bool,
}

impl FakeSystem {
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            Err(Error::System("not supported".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SystemControl for FakeSystem {
    async fn set_volume(&self, level: f32) -> Result<()> {
        self.record(format!("volume {level:.2}"))
    }

    async fn launch_app(&self, name: &str) -> Result<()> {
        self.record(format!("launch {name}"))
    }

    async fn open_url(&self, url: &Url) -> Result<()> {
        self.record(format!("url {url}"))
    }
}

/// Joke source with a single joke
#[derive(Default)]
pub struct FakeJokes {
    pub calls: Calls,
}

#[async_trait]
impl JokeSource for FakeJokes {
    async fn joke(&self) -> Result<String> {
        self.calls.lock().unwrap().push("joke".to_string());
        Ok(JOKE.to_string())
    }
}
