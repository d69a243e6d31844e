//! Markdown to ratatui lines.
//!
//! Covers what the answer service actually produces: paragraphs, headings,
//! emphasis, inline and fenced code, nested lists, block quotes, rules,
//! links and GFM tables.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthStr;

/// Render markdown `source` with `base` as the default style.
pub fn render(source: &str, base: Style) -> Vec<Line<'static>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut renderer = Renderer::new(base);
    for event in Parser::new_ext(source, options) {
        renderer.handle(event);
    }
    renderer.finish()
}

#[derive(Default)]
struct TableBuilder {
    rows: Vec<Vec<String>>,
    header_rows: usize,
    cell: Option<String>,
    in_head: bool,
}

impl TableBuilder {
    fn start_row(&mut self) {
        self.rows.push(Vec::new());
    }

    fn end_cell(&mut self) {
        if let Some(cell) = self.cell.take() {
            if self.rows.is_empty() {
                self.start_row();
            }
            if let Some(row) = self.rows.last_mut() {
                row.push(cell.trim().to_string());
            }
        }
    }

    fn render(self, base: Style) -> Vec<Line<'static>> {
        let columns = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for row in &self.rows {
            for (idx, cell) in row.iter().enumerate() {
                widths[idx] = widths[idx].max(cell.width());
            }
        }

        let border = Style::default().fg(Color::DarkGray);
        let mut lines = Vec::new();
        for (row_idx, row) in self.rows.iter().enumerate() {
            let is_header = row_idx < self.header_rows;
            let cell_style = if is_header {
                base.add_modifier(Modifier::BOLD)
            } else {
                base
            };

            let mut spans = vec![Span::styled("│ ", border)];
            for (idx, width) in widths.iter().enumerate() {
                let cell = row.get(idx).map(String::as_str).unwrap_or("");
                let pad = width.saturating_sub(cell.width());
                spans.push(Span::styled(format!("{}{}", cell, " ".repeat(pad)), cell_style));
                spans.push(Span::styled(" │ ", border));
            }
            if let Some(last) = spans.last_mut() {
                *last = Span::styled(" │", border);
            }
            lines.push(Line::from(spans));

            if is_header && row_idx + 1 == self.header_rows {
                let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
                lines.push(Line::from(Span::styled(
                    format!("├─{}─┤", rule.join("─┼─")),
                    border,
                )));
            }
        }
        lines
    }
}

struct Renderer {
    base: Style,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    lists: Vec<Option<u64>>,
    quote_depth: usize,
    in_code_block: bool,
    links: Vec<String>,
    table: Option<TableBuilder>,
}

impl Renderer {
    fn new(base: Style) -> Self {
        Self {
            base,
            lines: Vec::new(),
            current: Vec::new(),
            styles: Vec::new(),
            lists: Vec::new(),
            quote_depth: 0,
            in_code_block: false,
            links: Vec::new(),
            table: None,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or(self.base)
    }

    fn push_style(&mut self, patch: Style) {
        let style = self.style().patch(patch);
        self.styles.push(style);
    }

    fn pop_style(&mut self) {
        self.styles.pop();
    }

    fn quote_prefix(&self) -> Option<Span<'static>> {
        if self.quote_depth == 0 {
            None
        } else {
            Some(Span::styled(
                "│ ".repeat(self.quote_depth),
                Style::default().fg(Color::DarkGray),
            ))
        }
    }

    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let mut spans = Vec::with_capacity(self.current.len() + 1);
        if let Some(prefix) = self.quote_prefix() {
            spans.push(prefix);
        }
        spans.append(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    /// Separate top-level blocks with one blank line
    fn start_block(&mut self) {
        self.flush();
        let last_blank = self
            .lines
            .last()
            .map_or(true, |line| line.spans.iter().all(|s| s.content.trim().is_empty()));
        if self.lists.is_empty() && !last_blank {
            self.lines.push(Line::from(""));
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(table) = self.table.as_mut() {
            if let Some(cell) = table.cell.as_mut() {
                cell.push_str(text);
            }
            return;
        }

        if self.in_code_block {
            let style = Style::default().fg(Color::Yellow);
            for line in text.lines() {
                self.current.push(Span::styled(format!("    {}", line), style));
                self.flush();
            }
            return;
        }

        let style = self.style();
        self.current.push(Span::styled(text.to_string(), style));
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                if let Some(table) = self.table.as_mut() {
                    if let Some(cell) = table.cell.as_mut() {
                        cell.push_str(&code);
                    }
                } else {
                    let style = self.style().fg(Color::Yellow);
                    self.current.push(Span::styled(format!("`{}`", code), style));
                }
            }
            Event::SoftBreak => {
                if let Some(table) = self.table.as_mut() {
                    if let Some(cell) = table.cell.as_mut() {
                        cell.push(' ');
                    }
                } else {
                    let style = self.style();
                    self.current.push(Span::styled(" ", style));
                }
            }
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.start_block();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(24),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            Event::TaskListMarker(checked) => {
                let mark = if checked { "[x] " } else { "[ ] " };
                let style = self.style();
                self.current.push(Span::styled(mark, style));
            }
            Event::Html(html) | Event::InlineHtml(html) => self.text(&html),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.lists.is_empty() {
                    self.start_block();
                }
            }
            Tag::Heading { .. } => {
                self.start_block();
                self.push_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                );
            }
            Tag::BlockQuote { .. } => {
                self.start_block();
                self.quote_depth += 1;
                self.push_style(Style::default().add_modifier(Modifier::ITALIC));
            }
            Tag::CodeBlock(_) => {
                self.start_block();
                self.in_code_block = true;
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.start_block();
                } else {
                    self.flush();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.current.push(Span::styled(
                    format!("{}{}", "  ".repeat(depth), marker),
                    Style::default().fg(Color::Magenta),
                ));
            }
            Tag::Table(_) => {
                self.start_block();
                self.table = Some(TableBuilder::default());
            }
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.in_head = true;
                    table.start_row();
                }
            }
            Tag::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    if !table.in_head {
                        table.start_row();
                    }
                }
            }
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.cell = Some(String::new());
                }
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.links.push(dest_url.to_string());
                self.push_style(
                    Style::default()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.flush(),
            TagEnd::Heading { .. } => {
                self.pop_style();
                self.flush();
            }
            TagEnd::BlockQuote { .. } => {
                self.flush();
                self.pop_style();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => {
                self.flush();
                self.in_code_block = false;
            }
            TagEnd::List { .. } => {
                self.flush();
                self.lists.pop();
            }
            TagEnd::Item => self.flush(),
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    let rendered = table.render(self.base);
                    self.lines.extend(rendered);
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.end_cell();
                    table.in_head = false;
                    table.header_rows = table.rows.len();
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.end_cell();
                }
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(url) = self.links.pop() {
                    if !url.is_empty() {
                        self.current.push(Span::styled(
                            format!(" ({})", url),
                            Style::default().fg(Color::DarkGray),
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self
            .lines
            .last()
            .is_some_and(|line| line.spans.iter().all(|s| s.content.trim().is_empty()))
        {
            self.lines.pop();
        }
        self.lines
    }
}
