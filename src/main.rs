use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pasha::config::{PlayerKind, SttProviderKind, TtsProviderKind};
use pasha::voice::{
    AudioCapture, AudioPlayer, ConsoleInput, DevicePlayer, Listen, LocalSpeech, Microphone,
    RemoteSpeech, SpeechInput, SpeechOutput, SpeechToText, SystemPlayer, TextToSpeech,
    calculate_energy,
};
use pasha::{Assistant, Config, Language, NativeSystem, OpenAiChat, Session};

/// Pasha - Bilingual English/Hindi voice assistant
#[derive(Parser)]
#[command(name = "pasha", version, about)]
struct Cli {
    /// Starting language (en-US or hi-IN)
    #[arg(short, long, env = "PASHA_LANGUAGE")]
    language: Option<Language>,

    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read commands from stdin instead of the microphone
    #[arg(long)]
    text: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test speech output through the configured providers
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Handle a single command and exit
    Ask {
        /// Command text, with or without the wake word
        command: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,pasha=info",
        1 => "info,pasha=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(language) = cli.language {
        config.language = language;
    }
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(&config, duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text } => test_tts(&config, &text).await,
            Command::Ask { command } => ask(config, &command).await,
        };
    }

    let input: Box<dyn Listen> = if cli.text {
        println!("Type commands starting with \"{}\", Ctrl-D to quit.", config.assistant_name);
        Box::new(ConsoleInput::stdin())
    } else {
        build_speech_input(&config)?
    };

    let output = build_output(&config).await;
    let mut assistant = build_assistant(config, input, output);
    assistant.run().await;

    Ok(())
}

/// Microphone plus the configured recognizer
fn build_speech_input(config: &Config) -> anyhow::Result<Box<dyn Listen>> {
    let provider = config.stt.provider.ok_or_else(|| {
        anyhow::anyhow!(
            "no speech recognition provider configured; set GOOGLE_API_KEY, OPENAI_API_KEY or DEEPGRAM_API_KEY, or run with --text"
        )
    })?;

    let key = match provider {
        SttProviderKind::Google => config.api_keys.google.clone(),
        SttProviderKind::Whisper => config.api_keys.openai.clone(),
        SttProviderKind::Deepgram => config.api_keys.deepgram.clone(),
    };
    let transcriber = SpeechToText::new(provider, key, config.stt.model.clone())?;
    let microphone = AudioCapture::new(&config.listen)?;

    tracing::info!(?provider, "speech input ready");
    Ok(Box::new(SpeechInput::new(
        Box::new(microphone),
        Box::new(transcriber),
        config.listen.clone(),
    )))
}

/// Remote synthesis when configured, then the local engine
async fn build_output(config: &Config) -> SpeechOutput {
    let mut output = SpeechOutput::new();

    let synthesizer = match config.speech.tts_provider {
        Some(TtsProviderKind::Google) => {
            Some(TextToSpeech::new_google(config.api_keys.google.clone()))
        }
        Some(TtsProviderKind::OpenAi) => Some(TextToSpeech::new_openai(
            config.api_keys.openai.clone(),
            config.speech.openai_voice.clone(),
        )),
        None => None,
    };

    match synthesizer {
        Some(Ok(synthesizer)) => match build_player(config) {
            Ok(player) => {
                output = output.with_provider(Box::new(RemoteSpeech::new(
                    Box::new(synthesizer),
                    player,
                )));
            }
            Err(e) => tracing::warn!(error = %e, "audio player unavailable, remote speech disabled"),
        },
        Some(Err(e)) => tracing::warn!(error = %e, "remote speech disabled"),
        None => tracing::info!("no remote speech provider configured"),
    }

    let local = LocalSpeech::detect(config.speech.local_rate, &config.speech.local_voice_hints).await;
    output = output.with_provider(Box::new(local));

    tracing::debug!(providers = ?output.provider_names(), "speech output ready");
    output
}

fn build_player(config: &Config) -> pasha::Result<Box<dyn AudioPlayer>> {
    let player: Box<dyn AudioPlayer> = match config.speech.player {
        PlayerKind::System => Box::new(SystemPlayer::new(config.speech.audio_file.clone())),
        PlayerKind::Device => Box::new(DevicePlayer::new()?),
    };
    Ok(player)
}

fn build_assistant(config: Config, input: Box<dyn Listen>, output: SpeechOutput) -> Assistant {
    let session = Session::new(config.language, &config.assistant_name, &config.user_name);

    let mut assistant = Assistant::new(session, input, output)
        .with_name(config.assistant_name.clone())
        .with_max_tokens(config.llm.max_tokens)
        .with_system(Box::new(NativeSystem::new()));

    match OpenAiChat::new(
        config.api_keys.openai.clone(),
        config.llm.model.clone(),
        &config.assistant_name,
    ) {
        Ok(chat) => assistant = assistant.with_language_model(Box::new(chat)),
        Err(e) => tracing::warn!(error = %e, "open questions disabled"),
    }

    assistant
}

/// Handle one command given on the command line
#[allow(clippy::future_not_send)]
async fn ask(config: Config, text: &str) -> anyhow::Result<()> {
    let output = build_output(&config).await;
    let mut assistant = build_assistant(config, Box::new(ConsoleInput::stdin()), output);

    let command = assistant
        .session()
        .extract_command(text)
        .unwrap_or_else(|| text.trim().to_lowercase());
    if command.is_empty() {
        anyhow::bail!("empty command");
    }

    assistant.route(&command).await;
    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(config: &Config, duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new(&config.listen)?;
    capture.open().await?;

    let sample_rate = capture.sample_rate();
    println!("Sample rate: {sample_rate} Hz");
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.peek_buffer();
        let energy = calculate_energy(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );

        capture.clear_buffer();
    }

    capture.close().await;

    println!("\n---");
    println!(
        "Speech threshold is {:.4}; if RMS stayed near 0, check your input device.",
        config.listen.energy_threshold
    );

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let player = DevicePlayer::new()?;

    let sample_rate = 24000_i32;
    let frequency = 440.0_f32;
    let duration_secs = 2.0_f32;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let num_samples = (sample_rate as f32 * duration_secs) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
        })
        .collect();

    println!("Playing {} samples at {} Hz...", samples.len(), sample_rate);
    tokio::task::spawn_blocking(move || player.play_samples(samples)).await??;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");

    Ok(())
}

/// Speak `text` through the configured output chain
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    let output = build_output(config).await;
    println!("Speech providers: {}", output.provider_names().join(" → "));
    println!("Speaking in {}: \"{text}\"", config.language);

    output.say(text, config.language).await;

    println!("\n---");
    println!("If you heard the speech, speech output is working!");

    Ok(())
}
