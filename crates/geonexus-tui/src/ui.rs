use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block as Panel, Borders, Paragraph, Wrap},
};
use geonexus_core::{Block, ChatExchange, Message, Rendered, Sender, QUICK_SUGGESTIONS};

use crate::app::{App, InputMode};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str, base: Style) -> Vec<Span<'static>> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            // Consume the second *
            chars.next();

            // Push any accumulated plain text
            if !current_text.is_empty() {
                spans.push(Span::styled(std::mem::take(&mut current_text), base));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next(); // consume second *
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(bold_text, base.add_modifier(Modifier::BOLD)));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    // Push any remaining text
    if !current_text.is_empty() {
        spans.push(Span::styled(current_text, base));
    }

    spans
}

fn heading_style(level: u8) -> Style {
    match level {
        1 => Style::default().fg(Color::LightBlue).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        2 => Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        _ => Style::default().fg(Color::Blue),
    }
}

fn block_lines(block: &Block, lines: &mut Vec<Line<'static>>) {
    match block {
        Block::Heading { level, text } => {
            lines.push(Line::from(parse_markdown_line(text, heading_style(*level))));
        }
        Block::List { items } => {
            for item in items {
                let mut spans = vec![Span::styled("  • ", Style::default().fg(Color::Blue))];
                spans.extend(parse_markdown_line(item, Style::default()));
                lines.push(Line::from(spans));
            }
        }
        Block::Paragraph { text } => {
            lines.push(Line::from(parse_markdown_line(text, Style::default())));
        }
    }
}

fn message_lines(message: &Message, lines: &mut Vec<Line<'static>>) {
    let (label, color) = match message.sender {
        Sender::User => ("You:", Color::Cyan),
        Sender::Assistant => ("GeoNexus:", Color::Yellow),
    };
    lines.push(Line::from(Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )));

    match ChatExchange::render(message) {
        Rendered::Plain(text) => {
            for line in text.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        Rendered::Formatted(blocks) => {
            for block in &blocks {
                block_lines(block, lines);
            }
        }
    }
    lines.push(Line::default());
}

/// Every line of the transcript, including the thinking indicator while awaiting
pub fn transcript_lines(chat: &ChatExchange, animation_frame: u8) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for message in chat.messages() {
        message_lines(message, &mut lines);
    }

    if chat.is_awaiting() {
        lines.push(Line::from(Span::styled(
            "GeoNexus:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("{} {}", chat.status_text(), dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn transcript_paragraph(lines: Vec<Line<'static>>) -> Paragraph<'static> {
    Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false })
}

/// Rows the paragraph occupies once word-wrapped to `width` columns
fn wrapped_height(paragraph: &Paragraph, width: u16) -> u16 {
    paragraph.line_count(width.max(1)).min(u16::MAX as usize) as u16
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let suggestions_height = if app.show_suggestions() { 3 } else { 0 };

    // Main layout: header, transcript, suggestions, input, footer
    let [header_area, chat_area, suggestions_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(suggestions_height),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, chat_area);
    if suggestions_height > 0 {
        render_suggestions(frame, suggestions_area);
    }
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = if app.chat.is_awaiting() {
        Span::styled("● Thinking", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("● Online", Style::default().fg(Color::Green))
    };

    let title = Line::from(vec![
        Span::styled(" GeoNexus AI ", Style::default().fg(Color::Cyan).bold()),
        status,
        Span::raw(" "),
        Span::styled(app.client.endpoint().to_string(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let chat = transcript_paragraph(transcript_lines(&app.chat, app.animation_frame));
    // Measured before the border is attached so only the text rows count
    let total = wrapped_height(&chat, app.chat_width);
    app.max_scroll = total.saturating_sub(app.chat_height);
    if app.follow || app.scroll > app.max_scroll {
        app.scroll = app.max_scroll;
    }

    let border_color = if app.input_mode == InputMode::Normal { Color::Cyan } else { Color::DarkGray };
    let panel = Panel::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Conversation ");

    let chat = chat.block(panel).scroll((app.scroll, 0));

    frame.render_widget(chat, area);
}

fn render_suggestions(frame: &mut Frame, area: Rect) {
    let mut spans: Vec<Span> = Vec::new();
    for (i, suggestion) in QUICK_SUGGESTIONS.iter().enumerate() {
        spans.push(Span::styled(format!(" [{}] ", i + 1), Style::default().fg(Color::Yellow).bold()));
        spans.push(Span::raw(*suggestion));
        spans.push(Span::raw("  "));
    }

    let panel = Panel::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Try asking (Esc, then 1-3) ");

    frame.render_widget(Paragraph::new(Line::from(spans)).block(panel), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let title = if app.chat.is_awaiting() {
        " Ask (waiting for reply) "
    } else {
        " Ask (Enter to send) "
    };

    let input_block = Panel::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    // Show cursor when editing
    if app.input_mode == InputMode::Editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style, hints) = match app.input_mode {
        InputMode::Normal => (
            " NORMAL ",
            Style::default().bg(Color::Blue).fg(Color::White),
            " i: type  j/k: scroll  G: bottom  n: new chat  q: quit ",
        ),
        InputMode::Editing => (
            " INSERT ",
            Style::default().bg(Color::Yellow).fg(Color::Black),
            " Enter: send  Esc: normal mode  PgUp/PgDn: scroll  Ctrl+L: new chat  Ctrl+C: quit ",
        ),
    };

    let footer = Line::from(vec![
        Span::styled(mode_text, mode_style),
        Span::styled(hints, Style::default().fg(Color::Gray)),
    ]);
    frame.render_widget(Paragraph::new(footer), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use geonexus_core::QueryClient;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_bold_markers_become_bold_span() {
        let spans = parse_markdown_line("The **INSAT-3DR** imager", Style::default());
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[1].content, "INSAT-3DR");
        assert!(spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_unclosed_bold_is_literal() {
        let spans = parse_markdown_line("a **b", Style::default());
        let text: String = spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "a **b");
    }

    #[test]
    fn test_formatted_answer_lines() {
        let mut chat = ChatExchange::new();
        let pending = chat.begin_submit("docs").unwrap();
        chat.complete(
            pending.ticket,
            Ok(serde_json::json!({"answer": "# Title\n* a\n* b\nplain line"})),
        );

        let lines = transcript_lines(&chat, 0);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        let tail: Vec<&str> = texts.iter().rev().take(6).rev().map(String::as_str).collect();
        assert_eq!(tail, vec!["GeoNexus:", "Title", "  • a", "  • b", "plain line", ""]);
    }

    #[test]
    fn test_thinking_indicator_shows_status() {
        let mut chat = ChatExchange::new();
        chat.begin_submit("hello").unwrap();
        let lines = transcript_lines(&chat, 2);
        assert_eq!(line_text(lines.last().unwrap()), "Analyzing query... ...");
    }

    #[test]
    fn test_wrapped_height_counts_wrapped_rows() {
        let lines = vec![Line::from("abcdefghij"), Line::default(), Line::from("abc")];
        assert_eq!(wrapped_height(&transcript_paragraph(lines), 4), 3 + 1 + 1);
    }

    #[test]
    fn test_wrapped_height_follows_word_breaks() {
        // 12 characters fit two 6-column rows, but word wrapping needs three
        let lines = vec![Line::from("aaaa bbbb cc")];
        assert_eq!(wrapped_height(&transcript_paragraph(lines), 6), 3);
    }

    #[test]
    fn test_long_wrapped_answer_tail_stays_in_view() {
        let mut app = App::new(QueryClient::new(
            "http://127.0.0.1:9/api/query",
            Duration::from_secs(2),
        ));
        let pending = app.chat.begin_submit("long answer").unwrap();
        let mut answer: Vec<String> = (10..22)
            .map(|n| format!("aaaaaaaaaaaa bbbbbbbbbbbb cccccccccc{}", n))
            .collect();
        answer.push("FINALMARK".to_string());
        app.chat.complete(
            pending.ticket,
            Ok(serde_json::json!({ "answer": answer.join("\n") })),
        );

        let mut terminal = Terminal::new(TestBackend::new(24, 30)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        assert!(app.follow);
        assert_eq!(app.scroll, app.max_scroll);
        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(screen.contains("FINALMARK"));
    }

    #[test]
    fn test_render_shows_greeting_and_suggestions() {
        let mut app = App::new(QueryClient::new(
            "http://127.0.0.1:9/api/query",
            Duration::from_secs(2),
        ));
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(screen.contains("GeoNexus AI"));
        assert!(screen.contains("Hello! I'm GeoNexus AI"));
        assert!(screen.contains("Cartosat-3 docs"));
    }
}
