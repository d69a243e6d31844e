use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use haqooq_core::Message;

use crate::app::App;
use crate::markdown;

const PLACEHOLDER: &str = "Type your legal question... (Shift+Enter for newline)";
const MAX_INPUT_LINES: u16 = 6;
const TYPING_FRAMES: [&str; 4] = ["●○○", "○●○", "○○●", "○●○"];

pub fn draw(f: &mut Frame, app: &mut App) {
    let input_lines = (app.composer.line_count() as u16).clamp(1, MAX_INPUT_LINES);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(3),               // Header
            Constraint::Min(5),                  // Messages
            Constraint::Length(input_lines + 2), // Input
            Constraint::Length(1),               // Status bar
        ])
        .split(f.size());

    draw_header(f, app, chunks[0]);
    draw_messages(f, app, chunks[1]);
    draw_input(f, app, chunks[2]);
    draw_status_bar(f, app, chunks[3]);
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let (status, status_color) = if app.is_pending() {
        ("◐ Typing...", Color::Yellow)
    } else {
        ("● Online", Color::Green)
    };

    let header_text = Line::from(vec![
        Span::styled(" ⚖ ", Style::default()),
        Span::styled(
            app.ui.title.clone(),
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Cyan),
        ),
        Span::styled("  |  ", Style::default().fg(Color::Gray)),
        Span::styled(app.ui.subtitle.clone(), Style::default().fg(Color::Gray)),
        Span::styled("  |  ", Style::default().fg(Color::Gray)),
        Span::styled(status, Style::default().fg(status_color)),
    ]);

    let header = Paragraph::new(header_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .alignment(Alignment::Left);

    f.render_widget(header, area);
}

fn draw_messages(f: &mut Frame, app: &mut App, area: Rect) {
    let mut lines = greeting_lines(app);
    for msg in app.session.messages() {
        lines.extend(format_message(msg, &app.ui.title));
    }
    if app.is_pending() {
        lines.push(typing_line(app));
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let visible_height = area.height.saturating_sub(2) as usize;
    let lines = wrap_lines(lines, inner_width);

    app.max_scroll = lines.len().saturating_sub(visible_height);
    app.scroll_offset = app.scroll_offset.min(app.max_scroll);
    let top = app.max_scroll - app.scroll_offset;

    let title = if app.scroll_offset > 0 {
        format!("Conversation (↑{})", app.scroll_offset)
    } else {
        "Conversation".to_string()
    };

    // Lines are pre-wrapped so the scroll math matches what is drawn
    let messages = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .scroll((top.min(u16::MAX as usize) as u16, 0));

    f.render_widget(messages, area);
}

fn greeting_lines(app: &App) -> Vec<Line<'static>> {
    if app.ui.greeting.trim().is_empty() {
        return Vec::new();
    }
    vec![
        Line::from(Span::styled(
            app.ui.greeting.clone(),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::ITALIC),
        )),
        Line::from(""),
    ]
}

fn format_message(msg: &Message, assistant_name: &str) -> Vec<Line<'static>> {
    let (label, style) = if msg.is_user() {
        ("👤 You".to_string(), Style::default().fg(Color::Cyan))
    } else {
        (format!("🤖 {}", assistant_name), Style::default().fg(Color::Green))
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(label, style.add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("  {}", msg.time_label()),
            Style::default().fg(Color::DarkGray),
        ),
    ])];

    let parts = msg.parts();
    if msg.is_user() {
        lines.extend(
            parts
                .body
                .lines()
                .map(|line| Line::from(Span::styled(format!("  {}", line), style))),
        );
    } else {
        lines.extend(markdown::render(parts.body, Style::default()));
    }

    if let Some(citation) = parts.citation {
        lines.push(Line::from(vec![
            Span::styled(
                "  Source: ",
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::BOLD | Modifier::ITALIC),
            ),
            Span::styled(
                citation.to_string(),
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]));
    }

    lines.push(Line::from(""));
    lines
}

fn typing_line(app: &App) -> Line<'static> {
    let frame = TYPING_FRAMES[(app.tick as usize / 3) % TYPING_FRAMES.len()];
    Line::from(vec![
        Span::styled(
            format!("🤖 {} ", app.ui.title),
            Style::default().fg(Color::Green),
        ),
        Span::styled(frame, Style::default().fg(Color::Yellow)),
    ])
}

/// Word-wrap `lines` to `width` columns. Words wider than a row are split,
/// whitespace at a break is dropped.
fn wrap_lines(lines: Vec<Line<'static>>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return lines;
    }
    let mut rows = Vec::with_capacity(lines.len());
    for line in &lines {
        wrap_line(line, width, &mut rows);
    }
    rows
}

fn wrap_line(line: &Line<'_>, width: usize, rows: &mut Vec<Line<'static>>) {
    let cells: Vec<(char, Style)> = line
        .spans
        .iter()
        .flat_map(|span| span.content.chars().map(move |c| (c, span.style)))
        .collect();

    let first_row = rows.len();
    let mut row: Vec<(char, Style)> = Vec::new();
    let mut row_width = 0;
    let mut rest = cells.as_slice();

    while let Some(&(head, _)) = rest.first() {
        let is_space = head.is_whitespace();
        let len = rest
            .iter()
            .take_while(|(c, _)| c.is_whitespace() == is_space)
            .count();
        let (token, tail) = rest.split_at(len);
        rest = tail;
        let token_width: usize = token.iter().map(|(c, _)| c.width().unwrap_or(0)).sum();

        if row_width + token_width <= width {
            row.extend_from_slice(token);
            row_width += token_width;
        } else if is_space {
            if !row.is_empty() {
                rows.push(cells_to_line(std::mem::take(&mut row)));
            }
            row_width = 0;
        } else if token_width <= width {
            if !row.is_empty() {
                rows.push(cells_to_line(std::mem::take(&mut row)));
            }
            row.extend_from_slice(token);
            row_width = token_width;
        } else {
            for &(c, style) in token {
                let w = c.width().unwrap_or(0);
                if row_width + w > width && !row.is_empty() {
                    rows.push(cells_to_line(std::mem::take(&mut row)));
                    row_width = 0;
                }
                row.push((c, style));
                row_width += w;
            }
        }
    }

    if !row.is_empty() || rows.len() == first_row {
        rows.push(cells_to_line(row));
    }
}

fn cells_to_line(cells: Vec<(char, Style)>) -> Line<'static> {
    let mut spans = Vec::new();
    let mut text = String::new();
    let mut current: Option<Style> = None;
    for (c, style) in cells {
        if current != Some(style) {
            if let Some(prev) = current {
                spans.push(Span::styled(std::mem::take(&mut text), prev));
            }
            current = Some(style);
        }
        text.push(c);
    }
    if let Some(style) = current {
        spans.push(Span::styled(text, style));
    }
    Line::from(spans)
}

fn draw_input(f: &mut Frame, app: &App, area: Rect) {
    let prompt_color = if app.is_pending() {
        Color::Yellow
    } else {
        Color::Green
    };

    let text = if app.composer.draft().is_empty() {
        Text::from(Line::from(vec![
            Span::styled("> ", Style::default().fg(prompt_color)),
            Span::styled(
                PLACEHOLDER,
                Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            ),
        ]))
    } else {
        let draft = app.composer.draft();
        let mut lines: Vec<Line<'static>> = draft
            .split('\n')
            .enumerate()
            .map(|(i, line)| {
                let prefix = if i == 0 { "> " } else { "  " };
                Line::from(vec![
                    Span::styled(prefix, Style::default().fg(prompt_color)),
                    Span::styled(line.to_string(), Style::default().fg(Color::White)),
                ])
            })
            .collect();
        if let Some(last) = lines.last_mut() {
            last.spans
                .push(Span::styled("▌", Style::default().fg(prompt_color)));
        }
        // Keep the cursor row visible once the draft outgrows the box
        let mut rows = wrap_lines(lines, area.width.saturating_sub(2) as usize);
        let overflow = rows.len().saturating_sub(area.height.saturating_sub(2) as usize);
        Text::from(rows.split_off(overflow))
    };

    let title = if app.is_pending() {
        "Input (waiting for answer)"
    } else {
        "Input"
    };

    let input = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(Color::Blue)),
    );

    f.render_widget(input, area);
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let help_text = if app.is_pending() {
        "[↑↓/PgUp/PgDn] Scroll  [Esc] Quit"
    } else {
        "[Enter] Send  [Shift+Enter] Newline  [Ctrl+U] Clear  [↑↓] Scroll  [Esc] Quit"
    };

    let status = format!(
        " {} | Messages: {} | {}",
        app.endpoint,
        app.session.len(),
        help_text
    );

    let status_bar = Paragraph::new(status)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::REVERSED));

    f.render_widget(status_bar, area);
}
