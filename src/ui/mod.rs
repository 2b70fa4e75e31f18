//! TUI module using ratatui.
//!
//! One screen: input method, input, length sliders, summary and statistics.
//! Every key press is turned into at most one controller call; long calls
//! block the loop after a busy frame has been drawn.

pub mod app;
pub mod view;

use crate::controller::{ArticleSource, Controller};
use crate::generation::Seq2SeqModel;
use crate::summarizer::SummaryConfig;
use app::{App, Command};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::fmt::Display;

/// Run the TUI until the user quits
pub async fn run<M, S>(controller: &mut Controller<M, S>, config: SummaryConfig) -> anyhow::Result<()>
where
    M: Seq2SeqModel,
    M::Error: Display,
    S: ArticleSource,
{
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, controller, App::new(config)).await;
    ratatui::restore();
    result
}

async fn event_loop<M, S>(
    terminal: &mut DefaultTerminal,
    controller: &mut Controller<M, S>,
    mut app: App,
) -> anyhow::Result<()>
where
    M: Seq2SeqModel,
    M::Error: Display,
    S: ArticleSource,
{
    loop {
        terminal.draw(|frame| view::render(frame, &app))?;

        // Key reads and model calls block the runtime thread. Only
        // extraction yields, and nothing else is scheduled meanwhile.
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.handle_key(key) {
            Command::None => {}
            Command::Quit => return Ok(()),
            Command::Extract {
                url,
                then_summarize,
            } => {
                app.set_busy("Extracting article...");
                terminal.draw(|frame| view::render(frame, &app))?;
                let outcome = controller.extract(&url).await;
                app.apply(outcome);

                if then_summarize {
                    if let Some(text) = app.text_to_summarize().map(str::to_string) {
                        summarize(terminal, controller, &mut app, &text)?;
                    }
                }
            }
            Command::Summarize { text, config } => {
                app.config = config;
                summarize(terminal, controller, &mut app, &text)?;
            }
        }
    }
}

fn summarize<M, S>(
    terminal: &mut DefaultTerminal,
    controller: &mut Controller<M, S>,
    app: &mut App,
    text: &str,
) -> anyhow::Result<()>
where
    M: Seq2SeqModel,
    M::Error: Display,
    S: ArticleSource,
{
    app.set_busy("Generating summary...");
    terminal.draw(|frame| view::render(frame, app))?;

    match controller.summarize(text, &app.config) {
        Ok(outcome) => app.apply(outcome),
        Err(e) => {
            log::error!("summarization failed: {}", e);
            app.fail(format!("Summarization failed: {}", e));
        }
    }
    Ok(())
}
