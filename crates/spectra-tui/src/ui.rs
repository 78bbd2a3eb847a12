use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
};
use spectra_core::{Connectivity, Message, Sender};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, InputMode};

const USER_COLOR: Color = Color::Cyan;
const ASSISTANT_COLOR: Color = Color::Magenta;
const ERROR_COLOR: Color = Color::Red;

/// Parse a reply line, rendering `**bold**` spans. Unclosed markers stay literal.
fn styled_reply_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("**") else {
            break;
        };
        if close == 0 {
            // "****" has nothing to embolden
            spans.push(Span::raw(rest[..open + 4].to_string()));
            rest = &rest[open + 4..];
            continue;
        }
        if open > 0 {
            spans.push(Span::raw(rest[..open].to_string()));
        }
        spans.push(Span::styled(
            after_open[..close].to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        rest = &after_open[close + 2..];
    }

    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    Line::from(spans)
}

fn message_lines(msg: &Message) -> Vec<Line<'static>> {
    let name_color = match (msg.sender, msg.is_error) {
        (Sender::User, _) => USER_COLOR,
        (Sender::Assistant, false) => ASSISTANT_COLOR,
        (Sender::Assistant, true) => ERROR_COLOR,
    };
    let alignment = match msg.sender {
        Sender::User => Alignment::Right,
        Sender::Assistant => Alignment::Left,
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(
            msg.sender.display_name(),
            Style::default().fg(name_color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", msg.timestamp.format("%H:%M")),
            Style::default().fg(Color::DarkGray),
        ),
    ])];

    for line in msg.content.lines() {
        let line = match (msg.sender, msg.is_error) {
            (Sender::Assistant, false) => styled_reply_line(line),
            (Sender::Assistant, true) => Line::from(Span::styled(
                line.to_string(),
                Style::default().fg(ERROR_COLOR),
            )),
            (Sender::User, _) => Line::raw(line.to_string()),
        };
        lines.push(line);
    }
    lines.push(Line::default());

    lines.into_iter().map(|line| line.alignment(alignment)).collect()
}

fn typing_lines(frame: u8) -> Vec<Line<'static>> {
    // Animated ellipsis: cycles through ".", "..", "..."
    let dots = ".".repeat(frame as usize + 1);
    vec![
        Line::from(Span::styled(
            Sender::Assistant.display_name(),
            Style::default().fg(ASSISTANT_COLOR).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("typing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ]
}

fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

type Cells = Vec<(char, Style)>;

fn cells_width(cells: &[(char, Style)]) -> usize {
    cells.iter().map(|(c, _)| char_width(*c)).sum()
}

/// Wrap a styled line at word boundaries so every row fits in `width` columns.
/// Spacing between words on one row is kept, and breaks drop it. A word wider
/// than the row is split. The row count is exact, so the thread can be rendered
/// without ratatui's wrapping and its height is known up front.
fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return vec![line];
    }

    // Alternating runs of whitespace and words, each char keeping its span style
    let mut tokens: Vec<(bool, Cells)> = Vec::new();
    for span in &line.spans {
        for c in span.content.chars() {
            let is_space = c.is_whitespace();
            match tokens.last_mut() {
                Some((space, run)) if *space == is_space => run.push((c, span.style)),
                _ => tokens.push((is_space, vec![(c, span.style)])),
            }
        }
    }

    let mut rows: Vec<Cells> = Vec::new();
    let mut row: Cells = Vec::new();
    let mut row_width = 0;
    let mut gap: Cells = Vec::new();

    for (is_space, word) in tokens {
        if is_space {
            gap = word;
            continue;
        }

        let gap_width = cells_width(&gap);
        if row_width + gap_width + cells_width(&word) <= width {
            row_width += gap_width;
            row.append(&mut gap);
        } else if row_width > 0 {
            rows.push(std::mem::take(&mut row));
            row_width = 0;
        }
        gap.clear();

        for (c, style) in word {
            let w = char_width(c);
            if row_width > 0 && row_width + w > width {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            row.push((c, style));
            row_width += w;
        }
    }
    if !row.is_empty() || rows.is_empty() {
        rows.push(row);
    }

    rows.into_iter()
        .map(|row| {
            let mut wrapped = Line::from(group_spans(row)).style(line.style);
            wrapped.alignment = line.alignment;
            wrapped
        })
        .collect()
}

/// Merge neighbouring cells with the same style back into spans.
fn group_spans(cells: Cells) -> Vec<Span<'static>> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    for (c, style) in cells {
        match spans.last_mut() {
            Some(span) if span.style == style => span.content.to_mut().push(c),
            _ => spans.push(Span::styled(c.to_string(), style)),
        }
    }
    spans
}

/// The slice of the compose box that fits in `width` columns with the cursor
/// in view, and the cursor's column within it.
fn input_view(input: &str, cursor: usize, width: usize) -> (String, u16) {
    let chars: Vec<char> = input.chars().collect();
    let cursor = cursor.min(chars.len());

    // Drop leading chars until the text before the cursor plus the cursor cell fits
    let mut start = 0;
    let mut before_cursor: usize = chars[..cursor].iter().map(|c| char_width(*c)).sum();
    while width > 0 && before_cursor + 1 > width && start < cursor {
        before_cursor -= char_width(chars[start]);
        start += 1;
    }

    let mut used = 0;
    let visible: String = chars[start..]
        .iter()
        .take_while(|c| {
            used += char_width(**c);
            used <= width
        })
        .collect();

    (visible, before_cursor.min(u16::MAX as usize) as u16)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, thread_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_thread(app, frame, thread_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let badge_color = match app.connectivity {
        Connectivity::Connected => Color::Green,
        Connectivity::Offline => Color::Red,
        Connectivity::Checking => Color::Yellow,
    };

    let title = Line::from(vec![
        Span::styled(" Spectra AI ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(" ● ", Style::default().fg(badge_color)),
        Span::styled(app.connectivity.label(), Style::default().fg(badge_color)),
        Span::raw("  "),
        Span::styled(app.api_url.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_thread(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let typing = app.is_typing();
    let mut lines: Vec<Line<'static>> = Vec::new();
    if app.session.messages().is_empty() && !typing {
        lines.push(Line::from(Span::styled(
            "Share your thoughts with Spectra...",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for msg in app.session.messages() {
        lines.extend(message_lines(msg));
    }
    if typing {
        lines.extend(typing_lines(app.animation_frame));
    }

    // Inner size minus borders
    let width = area.width.saturating_sub(2) as usize;
    let lines: Vec<Line<'static>> = lines
        .into_iter()
        .flat_map(|line| wrap_line(line, width))
        .collect();
    let total = lines.len().min(u16::MAX as usize) as u16;
    app.update_scroll_bounds(total, area.height.saturating_sub(2));

    let border_color = if app.input_mode == InputMode::Normal {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let title = if app.follow {
        " Conversation ".to_string()
    } else {
        format!(" Conversation [{}/{}] ", app.scroll, app.max_scroll)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let thread = Paragraph::new(Text::from(lines))
        .block(block)
        .scroll((app.scroll, 0));

    frame.render_widget(thread, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let typing = app.is_typing();
    let editing = app.input_mode == InputMode::Editing;

    let border_color = if typing {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::Gray
    };
    let title = if typing {
        " Waiting for Spectra... "
    } else {
        " Message (Enter to send) "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = input_view(&app.input, app.cursor, inner_width);

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(USER_COLOR))
        .block(block);
    frame.render_widget(input, area);

    if editing && !typing {
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: Vec<(&str, &str)> = match app.input_mode {
        InputMode::Editing => vec![
            (" Enter ", " send "),
            (" Esc ", " normal "),
            (" PgUp/PgDn ", " scroll "),
            (" Ctrl-C ", " quit "),
        ],
        InputMode::Normal => vec![
            (" i ", " type "),
            (" j/k ", " scroll "),
            (" g/G ", " top/bottom "),
            (" q ", " quit "),
        ],
    };

    let mut spans = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
    ];
    for (key, label) in hints {
        spans.push(Span::styled(key, key_style));
        spans.push(Span::styled(label, label_style));
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
