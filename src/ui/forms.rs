use anyhow::{anyhow, Context, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{element, header, HeaderColor, ItemId, ItemPayload, ProgramItem};

/// Longest element the form accepts: one day.
const MAX_ELEMENT_MINUTES: u32 = 24 * 60;

/// Render `Name: value` with the same styling rules for every form.
fn field_line(field_name: &str, value: &str, is_active: bool, required: bool) -> Line<'static> {
    let display = match (value.is_empty(), required) {
        (true, true) => "<required>".to_string(),
        (true, false) => "<optional>".to_string(),
        (false, _) => value.to_string(),
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, style),
    ])
}

/// Internal representation of the "add header" form fields.
#[derive(Default, Clone)]
pub(crate) struct HeaderForm {
    pub(crate) title: String,
    pub(crate) color: String,
    pub(crate) active: HeaderField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum HeaderField {
    #[default]
    Title,
    Color,
}

impl HeaderForm {
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            HeaderField::Title => HeaderField::Color,
            HeaderField::Color => HeaderField::Title,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            HeaderField::Title => self.title.push(ch),
            HeaderField::Color => self.color.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            HeaderField::Title => self.title.pop(),
            HeaderField::Color => self.color.pop(),
        };
    }

    /// Validate the inputs. A blank color means gray.
    pub(crate) fn parse_inputs(&self) -> Result<ItemPayload> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(anyhow!("Header title is required."));
        }
        let color = if self.color.trim().is_empty() {
            HeaderColor::default()
        } else {
            HeaderColor::parse(&self.color).ok_or_else(|| {
                let names: Vec<&str> = HeaderColor::ALL.iter().map(|c| c.name()).collect();
                anyhow!("Unknown color. Try one of: {}.", names.join(", "))
            })?
        };
        Ok(header(title, color))
    }

    pub(crate) fn build_line(&self, field_name: &str, field: HeaderField) -> Line<'static> {
        let (value, required) = match field {
            HeaderField::Title => (&self.title, true),
            HeaderField::Color => (&self.color, false),
        };
        field_line(field_name, value, self.active == field, required)
    }

    pub(crate) fn value_len(&self, field: HeaderField) -> usize {
        match field {
            HeaderField::Title => self.title.chars().count(),
            HeaderField::Color => self.color.chars().count(),
        }
    }
}

/// Form state for a free-form program element.
#[derive(Default, Clone)]
pub(crate) struct ElementForm {
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) time: String,
    pub(crate) duration: String,
    pub(crate) active: ElementField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum ElementField {
    #[default]
    Title,
    Description,
    Time,
    Duration,
}

impl ElementField {
    pub(crate) const ALL: [ElementField; 4] = [
        ElementField::Title,
        ElementField::Description,
        ElementField::Time,
        ElementField::Duration,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            ElementField::Title => "Title",
            ElementField::Description => "Description",
            ElementField::Time => "Time",
            ElementField::Duration => "Minutes",
        }
    }
}

impl ElementForm {
    pub(crate) fn next_field(&mut self) {
        self.active = match self.active {
            ElementField::Title => ElementField::Description,
            ElementField::Description => ElementField::Time,
            ElementField::Time => ElementField::Duration,
            ElementField::Duration => ElementField::Title,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            ElementField::Title => ElementField::Duration,
            ElementField::Description => ElementField::Title,
            ElementField::Time => ElementField::Description,
            ElementField::Duration => ElementField::Time,
        };
    }

    fn value_mut(&mut self, field: ElementField) -> &mut String {
        match field {
            ElementField::Title => &mut self.title,
            ElementField::Description => &mut self.description,
            ElementField::Time => &mut self.time,
            ElementField::Duration => &mut self.duration,
        }
    }

    fn value(&self, field: ElementField) -> &str {
        match field {
            ElementField::Title => &self.title,
            ElementField::Description => &self.description,
            ElementField::Time => &self.time,
            ElementField::Duration => &self.duration,
        }
    }

    /// Append a character to the active field. Minutes only take digits.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let accepted = match self.active {
            ElementField::Duration => ch.is_ascii_digit(),
            _ => !ch.is_control(),
        };
        if accepted {
            let field = self.active;
            self.value_mut(field).push(ch);
        }
        accepted
    }

    pub(crate) fn backspace(&mut self) {
        let field = self.active;
        self.value_mut(field).pop();
    }

    pub(crate) fn parse_inputs(&self) -> Result<ItemPayload> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(anyhow!("Element title is required."));
        }
        let duration_raw = self.duration.trim();
        let duration = if duration_raw.is_empty() {
            0
        } else {
            duration_raw
                .parse::<u32>()
                .context("Minutes must be a whole number.")?
        };
        if duration > MAX_ELEMENT_MINUTES {
            return Err(anyhow!("Minutes must be at most {MAX_ELEMENT_MINUTES}."));
        }
        Ok(element(
            title,
            self.description.trim(),
            self.time.trim(),
            duration,
        ))
    }

    pub(crate) fn build_line(&self, field: ElementField) -> Line<'static> {
        let required = field == ElementField::Title;
        field_line(field.label(), self.value(field), self.active == field, required)
    }

    pub(crate) fn value_len(&self, field: ElementField) -> usize {
        self.value(field).chars().count()
    }
}

/// Editor for one note type of one item.
#[derive(Clone)]
pub(crate) struct NoteForm {
    pub(crate) id: ItemId,
    pub(crate) note_type: String,
    pub(crate) text: String,
}

impl NoteForm {
    pub(crate) fn new(id: ItemId, note_type: String, existing: Option<&String>) -> Self {
        Self {
            id,
            note_type,
            text: existing.cloned().unwrap_or_default(),
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.text.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.text.pop();
    }
}

#[derive(Clone)]
pub(crate) struct ConfirmItemDelete {
    pub(crate) id: ItemId,
    pub(crate) label: String,
}

impl ConfirmItemDelete {
    pub(crate) fn from(item: &ProgramItem) -> Self {
        Self {
            id: item.id(),
            label: item.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_form_requires_a_title() {
        let form = HeaderForm::default();
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn header_form_defaults_to_gray() {
        let mut form = HeaderForm::default();
        for ch in "Response".chars() {
            form.push_char(ch);
        }
        let payload = form.parse_inputs().expect("valid header");
        assert_eq!(payload, header("Response", HeaderColor::Gray));
    }

    #[test]
    fn header_form_rejects_unknown_colors() {
        let form = HeaderForm {
            title: "Word".into(),
            color: "teal".into(),
            ..HeaderForm::default()
        };
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn element_form_only_accepts_digits_for_minutes() {
        let mut form = ElementForm {
            active: ElementField::Duration,
            ..ElementForm::default()
        };
        assert!(!form.push_char('x'));
        assert!(form.push_char('7'));
        assert_eq!(form.duration, "7");
    }

    #[test]
    fn element_form_parses_all_fields() {
        let form = ElementForm {
            title: " Sermon ".into(),
            description: "Romans 8".into(),
            time: "10:20".into(),
            duration: "30".into(),
            ..ElementForm::default()
        };
        let payload = form.parse_inputs().expect("valid element");
        assert_eq!(payload, element("Sermon", "Romans 8", "10:20", 30));
    }

    #[test]
    fn element_form_rejects_durations_longer_than_a_day() {
        let mut form = ElementForm {
            title: "Vigil".into(),
            duration: "1440".into(),
            ..ElementForm::default()
        };
        assert!(form.parse_inputs().is_ok());

        form.duration = "1441".into();
        assert!(form.parse_inputs().is_err());
        form.duration = "4000000000".into();
        assert!(form.parse_inputs().is_err());
        form.duration = "99999999999".into();
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn element_form_fields_cycle_both_ways() {
        let mut form = ElementForm::default();
        form.previous_field();
        assert!(form.active == ElementField::Duration);
        form.next_field();
        assert!(form.active == ElementField::Title);
    }
}
