//! Pasha - Bilingual voice assistant
//!
//! This library provides the building blocks of the assistant:
//! - Speech input with English/Hindi recognition fallback
//! - Speech output through remote synthesis with a local engine fallback
//! - Wake word handling and per-language intent routing
//! - System actions (volume, applications, browser) and LLM answers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │        Microphone → Transcriber   │   stdin         │
//! └────────────────────┬────────────────────────────────┘
//!                      │ UtteranceIn
//! ┌────────────────────▼────────────────────────────────┐
//! │                    Assistant                         │
//! │   Session  │  Wake Word  │  IntentRouter  │ Handlers │
//! └────────────────────┬────────────────────────────────┘
//!                      │ UtteranceOut
//! ┌────────────────────▼────────────────────────────────┐
//! │   Google/OpenAI TTS → player   │   local engine     │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod assistant;
pub mod config;
pub mod error;
pub mod intent;
pub mod jokes;
pub mod language;
pub mod llm;
pub mod session;
pub mod system;
pub mod voice;

pub use assistant::{Assistant, Flow, LoopState};
pub use config::Config;
pub use error::{Error, Result};
pub use intent::{Intent, IntentRouter, Route};
pub use jokes::{BuiltinJokes, JokeSource};
pub use language::Language;
pub use llm::{LanguageModel, OpenAiChat};
pub use session::Session;
pub use system::{NativeSystem, SystemControl};
