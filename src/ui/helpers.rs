use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Color;

use crate::drag::VerticalSpan;
use crate::models::HeaderColor;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Vertical extent of a laid-out row, in terminal lines.
pub(crate) fn vertical_span(area: Rect) -> VerticalSpan {
    VerticalSpan::new(f32::from(area.y), f32::from(area.height))
}

/// Terminal rows are whole cells; treat the pointer as sitting in the middle
/// of its cell so a midpoint that falls on a cell boundary is decided by which
/// side of it the cell lies on.
pub(crate) fn pointer_y(row: u16) -> f32 {
    f32::from(row) + 0.5
}

pub(crate) fn header_color(color: HeaderColor) -> Color {
    match color {
        HeaderColor::Gray => Color::Gray,
        HeaderColor::Blue => Color::LightBlue,
        HeaderColor::Green => Color::LightGreen,
        HeaderColor::Yellow => Color::Yellow,
        HeaderColor::Red => Color::LightRed,
        HeaderColor::Magenta => Color::LightMagenta,
    }
}

/// `1h 05m` for an hour or more, `45 min` otherwise.
pub(crate) fn format_minutes(minutes: u32) -> String {
    if minutes >= 60 {
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes} min")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_sits_mid_cell() {
        let span = vertical_span(Rect::new(0, 4, 10, 3));
        assert_eq!(span.midpoint(), 5.5);
        assert!(pointer_y(5) <= span.midpoint());
        assert!(pointer_y(6) > span.midpoint());
    }

    #[test]
    fn minutes_are_formatted_for_humans() {
        assert_eq!(format_minutes(45), "45 min");
        assert_eq!(format_minutes(65), "1h 05m");
    }
}
