use crate::error::GluError;

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::ui::{Color, RenderConfig, Styled};
use inquire::{Confirm, Editor, MultiSelect, Select, Text, set_global_render_config};
use parking_lot::Mutex;
use std::time::Duration;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Interactive decisions the workflows need from the user.
///
/// Every method returns `GluError::Cancelled` when the user aborts the prompt.
pub trait Prompter {
    /// Pick one option; returns its index
    fn select(&self, message: &str, options: &[String]) -> Result<usize>;

    /// Pick any number of options; returns their indices
    fn multi_select(&self, message: &str, options: &[String]) -> Result<Vec<usize>>;

    fn text(&self, message: &str, default: Option<&str>) -> Result<String>;

    fn confirm(&self, message: &str, default: bool) -> Result<bool>;

    /// Open the user's editor seeded with `initial`
    fn editor(&self, message: &str, initial: &str) -> Result<String>;
}

/// `Prompter` backed by inquire terminal prompts
#[derive(Debug, Default, Clone, Copy)]
pub struct InquirePrompter;

impl InquirePrompter {
    pub fn new() -> Self {
        init_render_config();
        Self
    }
}

/// Initialize the global render configuration for inquire prompts
pub fn init_render_config() {
    let mut style = RenderConfig::default_colored();
    style.prompt_prefix = Styled::new(">").with_fg(Color::LightGreen);
    set_global_render_config(style);
}

impl Prompter for InquirePrompter {
    fn select(&self, message: &str, options: &[String]) -> Result<usize> {
        let choice = Select::new(message, options.to_vec())
            .with_page_size(10)
            .raw_prompt()
            .map_err(GluError::from)?;
        Ok(choice.index)
    }

    fn multi_select(&self, message: &str, options: &[String]) -> Result<Vec<usize>> {
        let chosen = MultiSelect::new(message, options.to_vec())
            .with_page_size(10)
            .raw_prompt()
            .map_err(GluError::from)?;
        Ok(chosen.into_iter().map(|opt| opt.index).collect())
    }

    fn text(&self, message: &str, default: Option<&str>) -> Result<String> {
        let mut prompt = Text::new(message);
        if let Some(default) = default {
            prompt = prompt.with_default(default);
        }
        Ok(prompt.prompt().map_err(GluError::from)?)
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        Ok(Confirm::new(message)
            .with_default(default)
            .prompt()
            .map_err(GluError::from)?)
    }

    fn editor(&self, message: &str, initial: &str) -> Result<String> {
        Ok(Editor::new(message)
            .with_predefined_text(initial)
            .with_file_extension(".md")
            .prompt()
            .map_err(GluError::from)?)
    }
}

static QUIET_MODE: std::sync::LazyLock<Mutex<bool>> =
    std::sync::LazyLock::new(|| Mutex::new(false));

pub fn set_quiet_mode(enabled: bool) {
    *QUIET_MODE.lock() = enabled;
}

pub fn is_quiet_mode() -> bool {
    *QUIET_MODE.lock()
}

pub fn create_spinner(message: &str) -> ProgressBar {
    if is_quiet_mode() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.bright_cyan.bold} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn print_info(message: &str) {
    if !is_quiet_mode() {
        println!("{}", message.bright_black());
    }
}

pub fn print_warning(message: &str) {
    if !is_quiet_mode() {
        println!("{}", message.yellow().bold());
    }
}

pub fn print_error(message: &str) {
    // Errors are printed even in quiet mode
    eprintln!("{} {}", "Error:".red().bold(), message.red());
}

pub fn print_success(message: &str) {
    if !is_quiet_mode() {
        println!("{}", message.green().bold());
    }
}

pub fn print_message(message: &str) {
    if !is_quiet_mode() {
        println!("{message}");
    }
}

/// Print content between horizontal rules
pub fn print_bordered_content(title: &str, content: &str) {
    if !is_quiet_mode() {
        println!("{} {}", "━━".bright_black(), title.bold());
        println!("{}", "━".repeat(50).bright_black());
        println!("{content}");
        println!("{}", "━".repeat(50).bright_black());
    }
}

/// Pads `text` to `width` display columns, truncating with an ellipsis when longer
pub fn fit(text: &str, width: usize) -> String {
    let current = UnicodeWidthStr::width(text);
    if current <= width {
        return format!("{text}{}", " ".repeat(width - current));
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    used += 1;
    format!("{out}{}", " ".repeat(width.saturating_sub(used)))
}

/// "Jane Doe" -> "Jane D."
pub fn abbreviate_last_name(name: Option<&str>) -> String {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return String::new();
    };

    let mut parts: Vec<&str> = name.split_whitespace().collect();
    if parts.len() < 2 {
        return name.to_string();
    }

    let last = parts.pop().unwrap_or_default();
    let initial = last.chars().next().map(|c| c.to_uppercase().to_string()).unwrap_or_default();
    format!("{} {initial}.", parts.join(" "))
}
