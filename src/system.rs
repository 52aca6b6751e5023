//! Operating system actions: volume, application launch, browser

use async_trait::async_trait;
use tokio::process::Command;
use url::Url;

use crate::{Error, Result};

/// Spoken application names mapped to launchable names
const APP_ALIASES: &[(&str, &str)] = &[("visual studio code", "Code"), ("vs code", "Code")];

/// Operating system facilities the assistant drives
#[async_trait]
pub trait SystemControl: Send + Sync {
    /// Set the output volume, `level` in `0.0..=1.0`
    ///
    /// # Errors
    ///
    /// Returns error if the volume cannot be changed on this system
    async fn set_volume(&self, level: f32) -> Result<()>;

    /// Launch an application by name
    ///
    /// # Errors
    ///
    /// Returns error if the application cannot be found or started
    async fn launch_app(&self, name: &str) -> Result<()>;

    /// Open a URL in the default browser
    ///
    /// # Errors
    ///
    /// Returns error if no browser could be started
    async fn open_url(&self, url: &Url) -> Result<()>;
}

/// Resolve a spoken application name through the alias table
#[must_use]
pub fn resolve_app_alias(target: &str) -> &str {
    APP_ALIASES
        .iter()
        .find(|(spoken, _)| *spoken == target)
        .map_or(target, |(_, app)| app)
}

/// Treat a target containing a domain separator as a website
///
/// Returns the `https://` URL for website-like targets, `None` otherwise.
#[must_use]
pub fn website_url(target: &str) -> Option<Url> {
    let target = target.trim();
    if !target.contains('.') || target.contains(char::is_whitespace) {
        return None;
    }

    let candidate = if target.starts_with("http://") || target.starts_with("https://") {
        target.to_string()
    } else {
        format!("https://{target}")
    };

    Url::parse(&candidate).ok().filter(|url| url.host_str().is_some())
}

/// Convert a `0.0..=1.0` level to a whole percentage
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn level_to_percent(level: f32) -> u8 {
    (level.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Shells out to platform tools
#[derive(Debug, Default)]
pub struct NativeSystem;

impl NativeSystem {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SystemControl for NativeSystem {
    async fn set_volume(&self, level: f32) -> Result<()> {
        let percent = level_to_percent(level);

        let mut cmd = if cfg!(target_os = "macos") {
            let mut cmd = Command::new("osascript");
            cmd.arg("-e")
                .arg(format!("set volume output volume {percent}"));
            cmd
        } else if which::which("pactl").is_ok() {
            let mut cmd = Command::new("pactl");
            cmd.args(["set-sink-volume", "@DEFAULT_SINK@"])
                .arg(format!("{percent}%"));
            cmd
        } else if which::which("amixer").is_ok() {
            let mut cmd = Command::new("amixer");
            cmd.args(["-q", "sset", "Master"]).arg(format!("{percent}%"));
            cmd
        } else {
            return Err(Error::System(
                "no volume control available on this system".to_string(),
            ));
        };

        run(&mut cmd).await?;
        tracing::info!(percent, "volume set");
        Ok(())
    }

    async fn launch_app(&self, name: &str) -> Result<()> {
        if cfg!(target_os = "macos") {
            return run(Command::new("open").args(["-a", name])).await;
        }
        if cfg!(target_os = "windows") {
            return run(Command::new("cmd").args(["/C", "start", "", name])).await;
        }

        // Prefer an executable of the same name, detached from the assistant
        if let Ok(binary) = which::which(name.to_lowercase()) {
            Command::new(binary).spawn()?;
            return Ok(());
        }

        run(Command::new("xdg-open").arg(name)).await
    }

    async fn open_url(&self, url: &Url) -> Result<()> {
        let mut cmd = if cfg!(target_os = "macos") {
            Command::new("open")
        } else if cfg!(target_os = "windows") {
            let mut cmd = Command::new("rundll32");
            cmd.arg("url.dll,FileProtocolHandler");
            cmd
        } else {
            Command::new("xdg-open")
        };

        run(cmd.arg(url.as_str())).await
    }
}

/// Run a command to completion, mapping failure to [`Error::System`]
async fn run(cmd: &mut Command) -> Result<()> {
    let output = cmd.output().await?;
    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(Error::System(format!(
            "command exited with {}: {}",
            output.status,
            stderr.trim()
        )))
    }
}
