//! Dialogue loop
//!
//! Listens for utterances, waits for the wake word, classifies the command
//! and dispatches it to a handler until the user says goodbye.

mod handlers;

use chrono::{DateTime, Local};

use crate::intent::{IntentRouter, Route};
use crate::jokes::{BuiltinJokes, JokeSource};
use crate::llm::LanguageModel;
use crate::system::{NativeSystem, SystemControl};
use crate::voice::{Listen, SpeechOutput};
use crate::{Language, Session};

/// Completion budget for generated answers
pub const DEFAULT_MAX_TOKENS: u32 = 100;

/// Whether the dialogue loop keeps running after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Where the dialogue loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// Waiting for an utterance containing the wake word
    #[default]
    Idle,
    /// Wake word heard, command extracted
    Awake,
    /// A handler is running
    Dispatching,
    /// The user ended the conversation or input closed
    Terminated,
}

type Clock = Box<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// Voice assistant
///
/// Owns the session and every collaborator it talks to. The language model
/// is optional; without one, open questions get a fixed apology.
pub struct Assistant {
    session: Session,
    name: String,
    input: Box<dyn Listen>,
    output: SpeechOutput,
    router: IntentRouter,
    answerer: Option<Box<dyn LanguageModel>>,
    max_tokens: u32,
    system: Box<dyn SystemControl>,
    jokes: Box<dyn JokeSource>,
    clock: Clock,
    state: LoopState,
}

impl Assistant {
    /// Create an assistant with native system control, built-in jokes and
    /// no language model
    #[must_use]
    pub fn new(session: Session, input: Box<dyn Listen>, output: SpeechOutput) -> Self {
        Self {
            name: session.wake_word().to_string(),
            session,
            input,
            output,
            router: IntentRouter::new(),
            answerer: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            system: Box::new(NativeSystem::new()),
            jokes: Box::new(BuiltinJokes),
            clock: Box::new(Local::now),
            state: LoopState::Idle,
        }
    }

    /// Use `model` for open questions and encyclopedia lookups
    #[must_use]
    pub fn with_language_model(mut self, model: Box<dyn LanguageModel>) -> Self {
        self.answerer = Some(model);
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_system(mut self, system: Box<dyn SystemControl>) -> Self {
        self.system = system;
        self
    }

    #[must_use]
    pub fn with_jokes(mut self, jokes: Box<dyn JokeSource>) -> Self {
        self.jokes = jokes;
        self
    }

    /// Replace the wall clock used for time and date answers
    #[must_use]
    pub fn with_clock(
        mut self,
        clock: impl Fn() -> DateTime<Local> + Send + Sync + 'static,
    ) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Name announced at startup
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// Announce the assistant and run until the user says goodbye or the
    /// input closes
    pub async fn run(&mut self) {
        tracing::info!(
            name = %self.name,
            language = %self.session.language(),
            answerer = self.answerer.is_some(),
            "assistant starting"
        );
        self.output
            .say(format!("{} is online.", self.name), Language::English)
            .await;

        loop {
            if self.input.is_closed() {
                tracing::info!("input closed, stopping");
                self.state = LoopState::Terminated;
                break;
            }
            if self.turn().await == Flow::Stop {
                break;
            }
        }

        tracing::info!("assistant stopped");
    }

    /// Handle a single utterance
    ///
    /// Utterances without the wake word are ignored. The bare wake word gets
    /// an acknowledgement.
    pub async fn turn(&mut self) -> Flow {
        self.state = LoopState::Idle;

        let Some(utterance) = self.input.listen(&mut self.session).await else {
            return Flow::Continue;
        };
        let Some(command) = self.session.extract_command(&utterance.text) else {
            tracing::debug!(text = %utterance.text, "no wake word, ignoring");
            return Flow::Continue;
        };

        self.state = LoopState::Awake;
        if command.is_empty() {
            self.say("Yes?").await;
            self.state = LoopState::Idle;
            return Flow::Continue;
        }

        tracing::info!(%command, "command received");
        self.route(&command).await
    }

    /// Classify and handle one wake-word-stripped command
    pub async fn route(&mut self, command: &str) -> Flow {
        self.state = LoopState::Dispatching;

        let flow = match self.router.classify(command, self.session.language()) {
            Route::SwitchLanguage(language) => {
                self.switch_language(language).await;
                Flow::Continue
            }
            Route::Intent(intent) => self.handle(intent).await,
        };

        self.state = match flow {
            Flow::Continue => LoopState::Idle,
            Flow::Stop => LoopState::Terminated,
        };
        flow
    }

    /// Speak in the session's current language
    async fn say(&self, text: impl Into<String>) {
        self.output.say(text, self.session.language()).await;
    }
}
