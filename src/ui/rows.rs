//! Row renderers, one per item kind. The list view only decides where a row
//! goes and how tall it is; what goes inside is dispatched here on the
//! payload.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::models::{Arrangement, ElementInfo, HeaderInfo, ItemPayload, ProgramItem, SongRef};
use crate::ui_state::{DetailTab, FilesView, ItemUiState};

use super::helpers::header_color;

/// How a row should be highlighted.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RowFlags {
    pub(crate) selected: bool,
    pub(crate) dragged: bool,
}

/// The arrangement in use: the stored choice if the song still has it,
/// otherwise the first one.
pub(crate) fn resolved_arrangement<'a>(
    song: &'a SongRef,
    state: &ItemUiState,
) -> Option<&'a Arrangement> {
    song.arrangement(&state.selected_arrangement)
        .or_else(|| song.arrangements.first())
}

pub(crate) fn resolved_key<'a>(arrangement: &'a Arrangement, state: &ItemUiState) -> Option<&'a str> {
    arrangement
        .keys
        .iter()
        .find(|key| **key == state.selected_key)
        .or_else(|| arrangement.keys.first())
        .map(String::as_str)
}

pub(crate) fn row_paragraph(
    item: &ProgramItem,
    state: &ItemUiState,
    flags: RowFlags,
    note_types: &[String],
) -> Paragraph<'static> {
    let mut lines = vec![summary_line(item, state, flags)];
    if state.expanded {
        lines.push(tabs_line(item, state));
        lines.extend(detail_lines(item, state, note_types));
    }

    let border_style = if flags.dragged {
        Style::default().fg(Color::Cyan)
    } else if flags.selected {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);

    Paragraph::new(lines).block(block).wrap(Wrap { trim: true })
}

fn summary_line(item: &ProgramItem, state: &ItemUiState, flags: RowFlags) -> Line<'static> {
    let marker = if flags.dragged {
        "⇅ "
    } else if state.expanded {
        "▾ "
    } else {
        "▸ "
    };
    let mut spans = vec![Span::raw(marker)];
    match item.payload() {
        ItemPayload::Song(song) => spans.extend(song_summary(song, state)),
        ItemPayload::Header(header) => spans.extend(header_summary(header)),
        ItemPayload::Element(element) => spans.extend(element_summary(element)),
    }
    if flags.selected && !flags.dragged {
        for span in &mut spans {
            span.style = span.style.add_modifier(Modifier::BOLD);
        }
    }
    Line::from(spans)
}

fn song_summary(song: &SongRef, state: &ItemUiState) -> Vec<Span<'static>> {
    let mut spans = vec![
        Span::styled("♪ ", Style::default().fg(Color::LightCyan)),
        Span::raw(song.display_title()),
    ];
    if let Some(arrangement) = resolved_arrangement(song, state) {
        let key = resolved_key(arrangement, state).unwrap_or("?");
        spans.push(Span::styled(
            format!("  [{} · {}]", arrangement.name, key),
            Style::default().fg(Color::Gray),
        ));
    }
    spans.push(Span::styled(
        format!("  {} min", song.length_minutes),
        Style::default().fg(Color::DarkGray),
    ));
    spans
}

fn header_summary(header: &HeaderInfo) -> Vec<Span<'static>> {
    vec![Span::styled(
        format!("── {} ──", header.title.to_uppercase()),
        Style::default()
            .fg(header_color(header.color))
            .add_modifier(Modifier::BOLD),
    )]
}

fn element_summary(element: &ElementInfo) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    if !element.time.is_empty() {
        spans.push(Span::styled(
            format!("{}  ", element.time),
            Style::default().fg(Color::Gray),
        ));
    }
    spans.push(Span::raw(element.title.clone()));
    if element.duration_minutes > 0 {
        spans.push(Span::styled(
            format!("  ({} min)", element.duration_minutes),
            Style::default().fg(Color::DarkGray),
        ));
    }
    spans
}

fn tabs_line(item: &ProgramItem, state: &ItemUiState) -> Line<'static> {
    let active = state.tab_for(item.kind());
    let mut spans = Vec::new();
    for tab in DetailTab::allowed_for(item.kind()) {
        let style = if *tab == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", tab.label()), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn detail_lines(item: &ProgramItem, state: &ItemUiState, note_types: &[String]) -> Vec<Line<'static>> {
    let muted = Style::default().fg(Color::Gray);
    match (state.tab_for(item.kind()), item.payload()) {
        (DetailTab::Notes, _) => notes_lines(state, note_types),
        (DetailTab::Info, ItemPayload::Song(song)) => {
            let mut lines = vec![Line::from(format!("By {}", song.author))];
            if song.link.trim().is_empty() {
                lines.push(Line::from(Span::styled("No link", muted)));
            } else {
                lines.push(Line::from(Span::styled(
                    song.link.clone(),
                    Style::default().fg(Color::Cyan),
                )));
            }
            lines
        }
        (DetailTab::Info, ItemPayload::Header(header)) => vec![Line::from(Span::styled(
            format!("Section color: {}", header.color.name()),
            muted,
        ))],
        (DetailTab::Info, ItemPayload::Element(element)) => {
            let description = if element.description.is_empty() {
                "No description".to_string()
            } else {
                element.description.clone()
            };
            vec![
                Line::from(description),
                Line::from(Span::styled(
                    format!(
                        "Starts {} · {} min",
                        if element.time.is_empty() {
                            "--:--"
                        } else {
                            element.time.as_str()
                        },
                        element.duration_minutes
                    ),
                    muted,
                )),
            ]
        }
        (DetailTab::Arrangement, ItemPayload::Song(song)) => arrangement_lines(song, state),
        (DetailTab::Files, ItemPayload::Song(song)) => files_lines(song, state.files_view),
        // `tab_for` only hands out song tabs for songs.
        _ => Vec::new(),
    }
}

fn arrangement_lines(song: &SongRef, state: &ItemUiState) -> Vec<Line<'static>> {
    let Some(current) = resolved_arrangement(song, state) else {
        return vec![Line::from("No arrangements")];
    };
    let key = resolved_key(current, state);

    let choice = |label: &str, chosen: bool| {
        if chosen {
            Span::styled(
                format!("[{label}] "),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw(format!(" {label}  "))
        }
    };

    let mut arrangements = vec![Span::raw("Arrangement: ")];
    arrangements.extend(
        song.arrangements
            .iter()
            .map(|arr| choice(&arr.name, arr.name == current.name)),
    );
    let mut keys = vec![Span::raw("Key: ")];
    keys.extend(
        current
            .keys
            .iter()
            .map(|k| choice(k, Some(k.as_str()) == key)),
    );
    vec![
        Line::from(arrangements),
        Line::from(keys),
        Line::from(Span::styled(
            "a: next arrangement  k: next key",
            Style::default().fg(Color::DarkGray),
        )),
    ]
}

fn files_lines(song: &SongRef, view: FilesView) -> Vec<Line<'static>> {
    let files: Vec<(String, String)> = song
        .arrangements
        .iter()
        .flat_map(|arr| {
            arr.keys
                .iter()
                .map(move |key| (format!("{} ({key}).pdf", arr.name), arr.name.clone()))
        })
        .collect();
    if files.is_empty() {
        return vec![Line::from("No files")];
    }

    match view {
        FilesView::Grid => vec![Line::from(
            files
                .iter()
                .map(|(name, _)| format!("▣ {name}"))
                .collect::<Vec<_>>()
                .join("   "),
        )],
        FilesView::Table => files
            .into_iter()
            .map(|(name, arrangement)| Line::from(format!("{name:<28} {arrangement}")))
            .collect(),
    }
}

fn notes_lines(state: &ItemUiState, note_types: &[String]) -> Vec<Line<'static>> {
    let mut types = vec![Span::raw("Type: ")];
    for note_type in note_types {
        let style = if *note_type == state.active_note_type {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        types.push(Span::styled(format!("{note_type} "), style));
    }

    let body = match state.notes_by_type.get(&state.active_note_type) {
        Some(text) if !text.is_empty() => Line::from(text.clone()),
        _ => Line::from(Span::styled(
            "(no notes)",
            Style::default().fg(Color::DarkGray),
        )),
    };

    let mut lines = vec![Line::from(types), body];
    if let Some(editing) = &state.adding_note_type {
        lines.push(Line::from(Span::styled(
            format!("editing {editing} note…"),
            Style::default().fg(Color::Cyan),
        )));
    }
    lines
}
