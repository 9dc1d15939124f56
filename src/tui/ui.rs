use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::agent::PanelBody;
use crate::app::App;

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Summary panel
            Constraint::Length(1), // Panel footer
            Constraint::Length(1), // Key hints
        ])
        .split(frame.area());

    render_tabs(frame, app, chunks[0]);
    render_panel(frame, app, chunks[1]);
    render_footer(frame, app, chunks[2]);
    render_hints(frame, app, chunks[3]);

    // Render URL input popup if active
    if app.url_input_active {
        render_url_input(frame, app);
    }

    // Render help popup if active
    if app.show_help {
        render_help(frame);
    }
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = app
        .tabs
        .iter()
        .map(|tab| Line::from(format!(" {} ", tab.title())))
        .collect();

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .title(" yt-digest ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .select(app.selected_tab)
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

fn render_panel(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.selected().and_then(|t| t.view()).filter(|v| v.visible);

    let (content, style) = match view.as_ref().map(|v| &v.body) {
        None => (
            if app.tabs.is_empty() {
                "Press 'o' to open a YouTube video.".to_string()
            } else {
                "Press 1-4 to summarize this video:\n\n 1  All key points\n 2  3 key points\n 3  Short summary\n 4  Pareto (80/20)".to_string()
            },
            Style::default().fg(Color::DarkGray),
        ),
        Some(PanelBody::Loading) => (
            format!("{} Generating video summary...", app.spinner()),
            Style::default().fg(Color::Cyan),
        ),
        Some(PanelBody::Summary(text)) => (text.clone(), Style::default().fg(Color::White)),
        Some(PanelBody::Error(text)) => (text.clone(), Style::default().fg(Color::LightRed)),
        Some(PanelBody::Empty) => (
            "Nothing to show.".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    };

    let block = Block::default()
        .title(" Gemini - Video summary ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let paragraph = Paragraph::new(content)
        .style(style)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.selected().and_then(|t| t.view()).filter(|v| v.visible);

    let mut spans = Vec::new();
    if let Some(view) = view {
        if let Some(provenance) = view.provenance {
            spans.push(Span::styled(
                provenance.label(),
                Style::default().fg(Color::DarkGray),
            ));
        }
        if let Some(model) = view.model_used {
            spans.push(Span::styled(
                format!(" | {model}"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        if view.save_visible {
            spans.push(Span::styled(
                " | s:save summary",
                Style::default().fg(Color::Green),
            ));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_hints(frame: &mut Frame, app: &App, area: Rect) {
    let text = match &app.status_message {
        Some(message) => format!("{message}  |  ?:help  q:quit"),
        None => "o:open  1-4:summarize  s:save  x:close panel  w:close tab  ?:help  q:quit".to_string(),
    };

    let paragraph = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_url_input(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 20, frame.area());

    let block = Block::default()
        .title(" Open video - paste a YouTube URL ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(area);

    // Clear the area first
    frame.render_widget(ratatui::widgets::Clear, area);
    frame.render_widget(block, area);

    let input_text = format!("> {}_", app.url_input);
    let paragraph = Paragraph::new(input_text).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(50, 60, frame.area());

    let help_text = vec![
        "",
        " Tabs:",
        "   o        Open a video in a new tab",
        "   Tab / →  Next tab",
        "   ← / S-Tab Previous tab",
        "   w        Close tab",
        "   b        Open video in browser",
        "",
        " Summaries:",
        "   1        All key points",
        "   2        3 key points",
        "   3        Short summary",
        "   4        Pareto (80/20)",
        "   s        Save the latest summary",
        "   x / Esc  Close the panel",
        "",
        " General:",
        "   ?        Toggle this help",
        "   q        Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(ratatui::widgets::Clear, area);
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
