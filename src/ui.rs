// Terminal side of the CLI: prompts (via `dialoguer`), spinners and progress
// bars (via `indicatif`) and colored status lines (via `crossterm`).
//
// Every prompt has a headless counterpart that fails instead of blocking, so
// the same code paths work from cron jobs and pipelines.

use std::io;
use std::time::Duration;

use crossterm::style::{style, Color, Stylize};
use crossterm::tty::IsTty;
use dialoguer::{Input, MultiSelect, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};

use crate::auth::{CredentialPrompt, Credentials};
use crate::error::{Error, Result};
use crate::resolver::{Choice, Chooser, Level};

/// Whether prompts may be shown: stdin is a terminal and the user did not
/// pass `--no-interactive`.
pub fn is_interactive(disabled: bool) -> bool {
    !disabled && io::stdin().is_tty()
}

/// Selection from a list of labels.
pub trait Picker {
    fn pick_one(&self, prompt: &str, items: &[String]) -> Result<usize>;
    fn pick_many(&self, prompt: &str, items: &[String]) -> Result<Vec<usize>>;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Terminal;

impl Picker for Terminal {
    fn pick_one(&self, prompt: &str, items: &[String]) -> Result<usize> {
        // `Select` is keyboard driven: arrows to move, Enter to pick, Esc to cancel.
        Select::new()
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt()?
            .ok_or_else(|| Error::InvalidInput("selection cancelled".into()))
    }

    fn pick_many(&self, prompt: &str, items: &[String]) -> Result<Vec<usize>> {
        let picked = MultiSelect::new()
            .with_prompt(format!("{prompt} (space to toggle, enter to confirm)"))
            .items(items)
            .interact_opt()?
            .ok_or_else(|| Error::InvalidInput("selection cancelled".into()))?;
        Ok(picked)
    }
}

impl Chooser for Terminal {
    fn choose(&self, level: Level, options: &[Choice]) -> Result<usize> {
        let labels: Vec<String> = options
            .iter()
            .map(|o| {
                if o.label == o.id {
                    o.id.clone()
                } else {
                    format!("{} ({})", o.label, o.id)
                }
            })
            .collect();
        self.pick_one(&format!("Select {level}"), &labels)
    }
}

impl CredentialPrompt for Terminal {
    fn credentials(&self, username: Option<&str>) -> Result<Credentials> {
        let username: String = match username {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => Input::<String>::new()
                .with_prompt("Kidsview username (email)")
                .interact_text()?,
        };
        // `Password` hides what is typed.
        let password = Password::new().with_prompt("Password").interact()?;
        Ok(Credentials { username, password })
    }
}

/// Used when nobody can answer a prompt. Every question is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl Picker for Headless {
    fn pick_one(&self, prompt: &str, _items: &[String]) -> Result<usize> {
        Err(Error::InvalidInput(format!(
            "{prompt}: cannot ask without a terminal; pass the id explicitly"
        )))
    }

    fn pick_many(&self, prompt: &str, items: &[String]) -> Result<Vec<usize>> {
        self.pick_one(prompt, items).map(|i| vec![i])
    }
}

impl Chooser for Headless {
    fn choose(&self, level: Level, options: &[Choice]) -> Result<usize> {
        Err(Error::AmbiguousContext {
            level: level.to_string(),
            options: options.len(),
        })
    }
}

impl CredentialPrompt for Headless {
    fn credentials(&self, _username: Option<&str>) -> Result<Credentials> {
        Err(Error::NotLoggedIn)
    }
}

/// Spinner on stderr while a request runs. Hidden when stderr is not a
/// terminal.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    if !io::stderr().is_tty() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Progress bar for `len` steps, e.g. images of one gallery.
pub fn progress_bar(len: u64, message: impl Into<String>) -> ProgressBar {
    if !io::stderr().is_tty() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::with_template("{msg:30!} [{bar:30.cyan/blue}] {pos}/{len} ({eta})")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message(message.into());
    bar
}

fn paint(text: &str, color: Color) -> String {
    if io::stderr().is_tty() {
        style(text).with(color).to_string()
    } else {
        text.to_string()
    }
}

/// Green status line on stderr.
pub fn success(message: &str) {
    eprintln!("{}", paint(message, Color::Green));
}

/// Yellow status line on stderr.
pub fn warn(message: &str) {
    eprintln!("{}", paint(message, Color::Yellow));
}

/// `Error: ...` in red on stderr.
pub fn error(message: &str) {
    eprintln!("{} {message}", paint("Error:", Color::Red));
}
