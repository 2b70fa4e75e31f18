//! Screen state and key handling, independent of the terminal.

use crate::controller::Outcome;
use crate::scraper::Article;
use crate::stats::SummaryStats;
use crate::summarizer::SummaryConfig;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Text,
    Url,
}

impl InputMode {
    pub const LABELS: [&'static str; 2] = ["Enter Text", "Paste URL"];

    pub fn index(self) -> usize {
        match self {
            InputMode::Text => 0,
            InputMode::Url => 1,
        }
    }

    fn toggled(self) -> Self {
        match self {
            InputMode::Text => InputMode::Url,
            InputMode::Url => InputMode::Text,
        }
    }
}

/// Which widget receives keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Mode,
    Input,
    MaxLength,
    MinLength,
}

impl Focus {
    const ORDER: [Focus; 4] = [Focus::Mode, Focus::Input, Focus::MaxLength, Focus::MinLength];

    fn step(self, forward: bool) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        let n = Self::ORDER.len();
        let next = if forward { (i + 1) % n } else { (i + n - 1) % n };
        Self::ORDER[next]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    Busy(String),
    Success(String),
    Error(String),
}

/// Work the event loop has to carry out for a key press
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    None,
    Quit,
    Extract { url: String, then_summarize: bool },
    Summarize { text: String, config: SummaryConfig },
}

#[derive(Debug, Clone)]
pub struct App {
    pub mode: InputMode,
    pub focus: Focus,
    pub text: String,
    pub url: String,
    pub config: SummaryConfig,
    pub article: Option<Article>,
    pub show_article: bool,
    pub status: Status,
    pub result: Option<(String, SummaryStats)>,
}

impl App {
    pub fn new(config: SummaryConfig) -> Self {
        Self {
            mode: InputMode::Text,
            focus: Focus::Input,
            text: String::new(),
            url: String::new(),
            config,
            article: None,
            show_article: false,
            status: Status::Idle,
            result: None,
        }
    }

    /// The text the next summarise action would use, if any
    pub fn text_to_summarize(&self) -> Option<&str> {
        let text = match self.mode {
            InputMode::Text => self.text.as_str(),
            InputMode::Url => self.article.as_ref()?.text.as_str(),
        };
        (!text.trim().is_empty()).then_some(text)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Command {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return Command::Quit,
            KeyCode::Char('c') if ctrl => return Command::Quit,
            KeyCode::Char('s') if ctrl => return self.submit(),
            KeyCode::Char('o') if ctrl => {
                self.show_article = !self.show_article;
                return Command::None;
            }
            KeyCode::Tab => {
                self.focus = self.focus.step(true);
                return Command::None;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.step(false);
                return Command::None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Mode => {
                if matches!(key.code, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) {
                    self.mode = self.mode.toggled();
                }
                Command::None
            }
            Focus::Input => self.edit(key),
            Focus::MaxLength => {
                if let Some(delta) = slider_delta(key.code) {
                    self.config.nudge_max(delta);
                }
                Command::None
            }
            Focus::MinLength => {
                if let Some(delta) = slider_delta(key.code) {
                    self.config.nudge_min(delta);
                }
                Command::None
            }
        }
    }

    fn edit(&mut self, key: KeyEvent) -> Command {
        match (self.mode, key.code) {
            (InputMode::Url, KeyCode::Enter) => {
                if self.url.trim().is_empty() {
                    Command::None
                } else {
                    Command::Extract {
                        url: self.url.clone(),
                        then_summarize: false,
                    }
                }
            }
            (InputMode::Text, KeyCode::Enter) => {
                self.text.push('\n');
                Command::None
            }
            (mode, KeyCode::Backspace) => {
                self.buffer_mut(mode).pop();
                Command::None
            }
            (mode, KeyCode::Char(c)) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.buffer_mut(mode).push(c);
                Command::None
            }
            _ => Command::None,
        }
    }

    fn buffer_mut(&mut self, mode: InputMode) -> &mut String {
        match mode {
            InputMode::Text => &mut self.text,
            InputMode::Url => {
                // A different URL makes the extracted article stale.
                self.article = None;
                &mut self.url
            }
        }
    }

    fn submit(&mut self) -> Command {
        if let Some(text) = self.text_to_summarize() {
            return Command::Summarize {
                text: text.to_string(),
                config: self.config,
            };
        }
        if self.mode == InputMode::Url && !self.url.trim().is_empty() {
            return Command::Extract {
                url: self.url.clone(),
                then_summarize: true,
            };
        }
        Command::None
    }

    pub fn set_busy(&mut self, message: impl Into<String>) {
        self.status = Status::Busy(message.into());
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = Status::Error(message.into());
    }

    /// Fold a handler result into the screen state
    pub fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Idle => self.status = Status::Idle,
            Outcome::Extracted(article) => {
                self.article = Some(article);
                self.result = None;
                self.status = Status::Success("Article extracted successfully!".to_string());
            }
            Outcome::ExtractionFailed(message) => {
                self.article = None;
                self.result = None;
                self.status = Status::Error(message);
            }
            Outcome::Summarized { summary, stats } => {
                self.result = Some((summary, stats));
                self.status = Status::Idle;
            }
        }
    }
}

fn slider_delta(code: KeyCode) -> Option<isize> {
    match code {
        KeyCode::Left => Some(-1),
        KeyCode::Right => Some(1),
        KeyCode::Down => Some(-10),
        KeyCode::Up => Some(10),
        _ => None,
    }
}
