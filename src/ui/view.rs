//! Rendering of the single screen.

use super::app::{App, Focus, InputMode, Status};
use crate::config::{MAX_LENGTH_RANGE, MIN_LENGTH_RANGE};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Gauge, Paragraph, Tabs, Wrap};
use ratatui::Frame;

const HELP: &str =
    "Tab focus · ←/→ change · Enter extract URL · Ctrl+S summarize · Ctrl+O original article · Esc quit";

pub fn render(frame: &mut Frame, app: &App) {
    let input_height = match app.mode {
        InputMode::Text => Constraint::Min(6),
        InputMode::Url => Constraint::Length(3),
    };
    let article_height = match (&app.article, app.show_article) {
        (Some(_), true) => Constraint::Min(6),
        (Some(_), false) => Constraint::Length(1),
        (None, _) => Constraint::Length(0),
    };

    let [header, mode, input, status, article, sliders, summary, metrics, help] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(3),
        input_height,
        Constraint::Length(1),
        article_height,
        Constraint::Length(3),
        Constraint::Min(4),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, header);
    render_mode(frame, app, mode);
    render_input(frame, app, input);
    render_status(frame, app, status);
    render_article(frame, app, article);
    render_sliders(frame, app, sliders);
    render_summary(frame, app, summary);
    render_metrics(frame, app, metrics);
    frame.render_widget(Paragraph::new(HELP).dark_gray(), help);
}

fn focused_block(title: &str, focused: bool) -> Block<'_> {
    let block = Block::bordered().title(title);
    if focused {
        block.border_style(Style::new().fg(Color::Cyan))
    } else {
        block
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from("📝 Text Summarization Tool".bold()),
        Line::from("Summarizes text or web articles with a local encoder-decoder model."),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_mode(frame: &mut Frame, app: &App, area: Rect) {
    let tabs = Tabs::new(InputMode::LABELS)
        .select(app.mode.index())
        .highlight_style(Style::new().fg(Color::Yellow).bold())
        .block(focused_block("Choose input method", app.focus == Focus::Mode));
    frame.render_widget(tabs, area);
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Input;
    let (title, value) = match app.mode {
        InputMode::Text => ("Enter the text to summarize", app.text.as_str()),
        InputMode::Url => ("Enter the URL of the article", app.url.as_str()),
    };
    let mut content = value.to_string();
    if focused {
        content.push('▏');
    }

    let paragraph = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .block(focused_block(title, focused));
    frame.render_widget(paragraph, area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.status {
        Status::Idle => Line::default(),
        Status::Busy(message) => Line::from(format!("⏳ {}", message)).yellow(),
        Status::Success(message) => Line::from(format!("✔ {}", message)).green(),
        Status::Error(message) => Line::from(format!("✘ {}", message)).red(),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_article(frame: &mut Frame, app: &App, area: Rect) {
    let Some(article) = &app.article else {
        return;
    };
    if !app.show_article {
        frame.render_widget(Paragraph::new("▶ Show original article (Ctrl+O)").cyan(), area);
        return;
    }

    let title = article.title.as_deref().unwrap_or("Original article");
    let paragraph = Paragraph::new(article.text.as_str())
        .wrap(Wrap { trim: false })
        .block(Block::bordered().title(format!("▼ {}", title)));
    frame.render_widget(paragraph, area);
}

fn render_sliders(frame: &mut Frame, app: &App, area: Rect) {
    let [left, right] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);

    frame.render_widget(
        slider(
            "Maximum summary length",
            app.config.max_length,
            MAX_LENGTH_RANGE,
            app.focus == Focus::MaxLength,
        ),
        left,
    );
    frame.render_widget(
        slider(
            "Minimum summary length",
            app.config.min_length,
            MIN_LENGTH_RANGE,
            app.focus == Focus::MinLength,
        ),
        right,
    );
}

fn slider(title: &str, value: usize, (lo, hi): (usize, usize), focused: bool) -> Gauge<'_> {
    let ratio = (value.saturating_sub(lo)) as f64 / (hi - lo).max(1) as f64;
    Gauge::default()
        .block(focused_block(title, focused))
        .gauge_style(Style::new().fg(Color::Blue))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!("{} ({}–{})", value, lo, hi))
}

fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let text = match &app.result {
        Some((summary, _)) => summary.as_str(),
        None => "",
    };
    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::bordered().title("Summary"));
    frame.render_widget(paragraph, area);
}

fn render_metrics(frame: &mut Frame, app: &App, area: Rect) {
    let Some((_, stats)) = &app.result else {
        frame.render_widget(Block::bordered().title("Statistics"), area);
        return;
    };

    let cells = [
        ("Original Length", format!("{} words", stats.original_words)),
        ("Summary Length", format!("{} words", stats.summary_words)),
        ("Reduction", stats.reduction_display().to_string()),
    ];
    let areas = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(area);
    for ((label, value), cell) in cells.into_iter().zip(areas.iter()) {
        let line = Line::from(vec![Span::from(value).bold()]);
        frame.render_widget(
            Paragraph::new(line).block(Block::bordered().title(label)),
            *cell,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Outcome;
    use crate::scraper::Article;
    use crate::stats::SummaryStats;
    use crate::summarizer::SummaryConfig;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn shows_metrics_after_summarizing() {
        let mut app = App::new(SummaryConfig::default());
        app.apply(Outcome::Summarized {
            summary: "A short summary.".to_string(),
            stats: SummaryStats::new(100, 25),
        });
        let screen = screen(&app);
        assert!(screen.contains("A short summary."));
        assert!(screen.contains("100 words"));
        assert!(screen.contains("25 words"));
        assert!(screen.contains("75.0%"));
    }

    #[test]
    fn article_panel_collapses_and_expands() {
        let mut app = App::new(SummaryConfig::default());
        app.mode = InputMode::Url;
        app.apply(Outcome::Extracted(Article {
            url: "https://example.com".to_string(),
            title: Some("Valley floods".to_string()),
            text: "Rivers rose overnight.".to_string(),
        }));
        let collapsed = screen(&app);
        assert!(collapsed.contains("Show original article"));
        assert!(!collapsed.contains("Rivers rose overnight."));

        app.show_article = true;
        let expanded = screen(&app);
        assert!(expanded.contains("Valley floods"));
        assert!(expanded.contains("Rivers rose overnight."));
    }

    #[test]
    fn slider_values_are_visible() {
        let app = App::new(SummaryConfig::new(200, 20));
        let screen = screen(&app);
        assert!(screen.contains("200 (50–200)"));
        assert!(screen.contains("20 (20–100)"));
    }
}
