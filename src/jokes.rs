//! Joke source

use async_trait::async_trait;
use rand::seq::SliceRandom;

use crate::{Error, Result};

/// Supplies jokes to tell
#[async_trait]
pub trait JokeSource: Send + Sync {
    /// Fetch one joke
    ///
    /// # Errors
    ///
    /// Returns error if no joke is available
    async fn joke(&self) -> Result<String>;
}

const PROGRAMMER_JOKES: &[&str] = &[
    "Why do programmers prefer dark mode? Because light attracts bugs.",
    "There are 10 kinds of people in the world: those who understand binary and those who don't.",
    "A SQL query walks into a bar, walks up to two tables and asks, can I join you?",
    "How many programmers does it take to change a light bulb? None, that's a hardware problem.",
    "Why did the developer go broke? Because he used up all his cache.",
    "I would tell you a UDP joke, but you might not get it.",
    "Debugging is like being the detective in a crime movie where you are also the murderer.",
    "Why do Java developers wear glasses? Because they don't C sharp.",
    "The best thing about a boolean is that even if you are wrong, you are only off by a bit.",
    "Knock knock. Race condition. Who's there?",
    "To understand recursion, you must first understand recursion.",
    "Programming is ten percent writing code and ninety percent understanding why it doesn't work.",
];

/// Offline jokes picked at random from a built-in list
#[derive(Debug, Default)]
pub struct BuiltinJokes;

#[async_trait]
impl JokeSource for BuiltinJokes {
    async fn joke(&self) -> Result<String> {
        PROGRAMMER_JOKES
            .choose(&mut rand::thread_rng())
            .map(|joke| (*joke).to_string())
            .ok_or_else(|| Error::Config("joke list is empty".to_string()))
    }
}
