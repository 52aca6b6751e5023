//! Intent handlers
//!
//! Each handler speaks its reply in the session's current language. Hindi
//! mode supports fewer actions than English; unsupported ones
//! get an apology instead of silently doing nothing.

use super::{Assistant, Flow};
use crate::intent::Intent;
use crate::system::{resolve_app_alias, website_url};
use crate::Language;

const NO_ANSWERER: &str = "OpenAI API key is not configured. I cannot answer that.";

impl Assistant {
    pub(super) async fn handle(&self, intent: Intent) -> Flow {
        match intent {
            Intent::Greeting => self.greet().await,
            Intent::Time => self.tell_time().await,
            Intent::Date => self.tell_date().await,
            Intent::Knowledge { topic } => self.look_up(&topic).await,
            Intent::Open { target } => self.open(&target).await,
            Intent::SetVolume { level } => self.set_volume(level).await,
            Intent::Joke => self.tell_joke().await,
            Intent::Thanks => self.say("आपका स्वागत है।").await,
            Intent::Farewell => {
                self.farewell().await;
                return Flow::Stop;
            }
            Intent::Question { text } => self.answer(&text).await,
        }
        Flow::Continue
    }

    pub(super) async fn switch_language(&mut self, language: Language) {
        self.session.switch_to(language);
        let confirmation = match language {
            Language::English => "Alright, I will now speak in English.",
            Language::Hindi => "ठीक है, मैं अब हिंदी में बात करूँगा।",
        };
        self.say(confirmation).await;
    }

    async fn greet(&self) {
        let user = self.session.user_name();
        let reply = match self.session.language() {
            Language::English => format!("Hello {user}, how can I assist?"),
            Language::Hindi => format!("नमस्ते {user}, मैं आपकी क्या सहायता कर सकता हूँ?"),
        };
        self.say(reply).await;
    }

    async fn tell_time(&self) {
        let time = (self.clock)().format("%I:%M %p").to_string();
        let reply = match self.session.language() {
            Language::English => format!("The current time is {time}"),
            Language::Hindi => format!("अभी {time} बजे हैं"),
        };
        self.say(reply).await;
    }

    async fn tell_date(&self) {
        let date = (self.clock)().format("%A, %B %d, %Y").to_string();
        let reply = match self.session.language() {
            Language::English => format!("Today is {date}"),
            Language::Hindi => format!("आज {date} है"),
        };
        self.say(reply).await;
    }

    async fn look_up(&self, topic: &str) {
        let prompt = match self.session.language() {
            Language::English => {
                format!("Summarize the wikipedia page for {topic} in 2 sentences.")
            }
            Language::Hindi => format!("विकिपीडिया पर '{topic}' का 2 वाक्यों में सारांश दें।"),
        };
        let reply = self.ask(&prompt).await;
        self.say(reply).await;
    }

    async fn open(&self, target: &str) {
        let language = self.session.language();

        if let Some(url) = website_url(target) {
            let reply = match (self.system.open_url(&url).await, language) {
                (Ok(()), Language::English) => format!("Opening {target}"),
                (Ok(()), Language::Hindi) => format!("{target} खोल रहा हूँ।"),
                (Err(e), Language::English) => {
                    tracing::warn!(%url, error = %e, "failed to open browser");
                    format!("I couldn't open {target}.")
                }
                (Err(e), Language::Hindi) => {
                    tracing::warn!(%url, error = %e, "failed to open browser");
                    format!("माफ़ कीजिये, मैं {target} नहीं खोल सका।")
                }
            };
            self.say(reply).await;
            return;
        }

        if language == Language::Hindi {
            self.say("माफ़ कीजिये, मैं अभी हिंदी में एप्लीकेशन नहीं खोल सकता।")
                .await;
            return;
        }

        let app = resolve_app_alias(target);
        match self.system.launch_app(app).await {
            Ok(()) => {
                tracing::info!(%app, "application launched");
                self.say(format!("Opening {target}")).await;
            }
            Err(e) => {
                tracing::warn!(%app, error = %e, "failed to launch application");
                self.say(format!("I couldn't find or open the application {target}."))
                    .await;
            }
        }
    }

    async fn set_volume(&self, level: Option<u32>) {
        let Some(level) = level else {
            self.say("Please specify a volume level from 0 to 100.").await;
            return;
        };

        let level = level.min(100);
        #[allow(clippy::cast_precision_loss)]
        let fraction = level as f32 / 100.0;

        match self.system.set_volume(fraction).await {
            Ok(()) => self.say(format!("Volume set to {level} percent.")).await,
            Err(e) => {
                tracing::warn!(level, error = %e, "volume control failed");
                self.say("I am unable to control the volume on this system.")
                    .await;
            }
        }
    }

    async fn tell_joke(&self) {
        if self.session.language() == Language::Hindi {
            self.say("माफ़ कीजिये, मेरे पास अभी हिंदी में चुटकुले नहीं हैं।")
                .await;
            return;
        }

        match self.jokes.joke().await {
            Ok(joke) => self.say(joke).await,
            Err(e) => {
                tracing::warn!(error = %e, "no joke available");
                self.say("Sorry, I couldn't think of a joke right now.").await;
            }
        }
    }

    async fn farewell(&self) {
        let user = self.session.user_name();
        let reply = match self.session.language() {
            Language::English => format!("Goodbye, {user}."),
            Language::Hindi => format!("अलविदा, {user}."),
        };
        self.say(reply).await;
    }

    async fn answer(&self, question: &str) {
        let reply = self.ask(question).await;
        self.say(reply).await;
    }

    /// Send a prompt to the language model, returning the text to speak
    ///
    /// Never fails: a missing model or a failed call yields an apology.
    async fn ask(&self, prompt: &str) -> String {
        let Some(model) = &self.answerer else {
            return NO_ANSWERER.to_string();
        };

        self.say("Thinking...").await;
        match model.complete(prompt, self.max_tokens).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!(error = %e, "language model request failed");
                format!(
                    "I encountered an error with my AI core, {}.",
                    self.session.user_name()
                )
            }
        }
    }
}
