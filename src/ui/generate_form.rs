//! Generation brief form.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_textarea::TextArea;

use crate::generation::GenerationBrief;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormResult {
    Continue,
    Cancel,
    Submit(GenerationBrief),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Single,
    /// Enter inserts a newline
    Multi,
    /// Comma separated values
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldId {
    CompanyName,
    Industry,
    TargetAudience,
    BusinessDescription,
    Website,
    ContactEmail,
    PrimaryKeywords,
    SecondaryKeywords,
    CompetitorWebsites,
    ContentGoals,
    BrandVoice,
    AdditionalNotes,
}

struct Field {
    id: FieldId,
    label: &'static str,
    placeholder: &'static str,
    required: bool,
    kind: FieldKind,
    input: TextArea<'static>,
}

impl Field {
    fn new(id: FieldId, label: &'static str, placeholder: &'static str, kind: FieldKind) -> Self {
        Self {
            id,
            label,
            placeholder,
            required: false,
            kind,
            input: TextArea::default(),
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn text(&self) -> String {
        self.input.lines().join("\n")
    }

    fn height(&self) -> u16 {
        match self.kind {
            FieldKind::Multi => 5,
            _ => 3,
        }
    }
}

/// Fields shown in the left column; the rest go right
const LEFT_COLUMN: usize = 6;

pub struct GenerateForm {
    fields: Vec<Field>,
    focused: usize,
}

impl Default for GenerateForm {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerateForm {
    pub fn new() -> Self {
        use FieldId::*;
        use FieldKind::{List, Multi, Single};
        let fields = vec![
            Field::new(CompanyName, "Company Name", "Acme Coffee Roasters", Single).required(),
            Field::new(Industry, "Industry", "Food & Beverage", Single),
            Field::new(TargetAudience, "Target Audience", "Young professionals, 25-40", Single),
            Field::new(Website, "Website", "https://example.com", Single),
            Field::new(ContactEmail, "Contact Email", "marketing@example.com", Single),
            Field::new(
                BusinessDescription,
                "Business Description",
                "What you sell and who you sell it to",
                Multi,
            ),
            Field::new(
                PrimaryKeywords,
                "Primary Keywords",
                "cold brew, specialty coffee",
                List,
            )
            .required(),
            Field::new(SecondaryKeywords, "Secondary Keywords", "latte art, beans", List),
            Field::new(
                CompetitorWebsites,
                "Competitor Websites",
                "https://competitor.com",
                List,
            ),
            Field::new(ContentGoals, "Content Goals", "Grow organic traffic", Single),
            Field::new(BrandVoice, "Brand Voice", "professional", Single),
            Field::new(
                AdditionalNotes,
                "Additional Notes",
                "Anything else the plan should consider",
                Multi,
            ),
        ];
        Self { fields, focused: 0 }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn next_field(&mut self) {
        self.focused = (self.focused + 1) % self.fields.len();
    }

    fn prev_field(&mut self) {
        self.focused = (self.focused + self.fields.len() - 1) % self.fields.len();
    }

    /// Collect the current field values into a brief
    pub fn brief(&self) -> GenerationBrief {
        let mut brief = GenerationBrief::default();
        for field in &self.fields {
            let text = field.text();
            match field.id {
                FieldId::CompanyName => brief.company_name = text.trim().to_string(),
                FieldId::Industry => brief.industry = text.trim().to_string(),
                FieldId::TargetAudience => brief.target_audience = text.trim().to_string(),
                FieldId::BusinessDescription => brief.business_description = text,
                FieldId::Website => brief.website = text.trim().to_string(),
                FieldId::ContactEmail => brief.contact_email = text.trim().to_string(),
                FieldId::PrimaryKeywords => {
                    for kw in text.split(',') {
                        brief.add_primary_keyword(kw);
                    }
                }
                FieldId::SecondaryKeywords => {
                    for kw in text.split(',') {
                        brief.add_secondary_keyword(kw);
                    }
                }
                FieldId::CompetitorWebsites => {
                    for site in text.split(',') {
                        brief.add_competitor(site);
                    }
                }
                FieldId::ContentGoals => brief.content_goals = text.trim().to_string(),
                FieldId::BrandVoice => brief.brand_voice = text.trim().to_string(),
                FieldId::AdditionalNotes => brief.additional_notes = text,
            }
        }
        brief
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormResult {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return FormResult::Cancel,
            KeyCode::Char('s') if ctrl => return FormResult::Submit(self.brief()),
            KeyCode::Tab | KeyCode::Down => self.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.prev_field(),
            KeyCode::Enter if self.fields[self.focused].kind != FieldKind::Multi => {
                self.next_field()
            }
            _ => {
                self.fields[self.focused].input.input(key);
            }
        }
        FormResult::Continue
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(2),
            ])
            .split(area);

        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                "AI Content Generation",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Tell us about your business and we'll create a tailored content plan",
                Style::default().fg(Color::Gray),
            )),
        ]);
        frame.render_widget(header, chunks[0]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        let focused = self.focused;
        let (left, right) = self.fields.split_at_mut(LEFT_COLUMN);
        render_column(frame, columns[0], left, focused, 0);
        render_column(frame, columns[1], right, focused, LEFT_COLUMN);

        let footer = Paragraph::new(vec![
            Line::from(Span::styled(
                "This will analyze your competitors, research keywords, and generate a month of content.",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                "[Tab] next  [Shift+Tab] previous  [Ctrl+S] generate  [Esc] quit   * required",
                Style::default().fg(Color::Gray),
            )),
        ]);
        frame.render_widget(footer, chunks[2]);
    }
}

fn render_column(frame: &mut Frame, area: Rect, fields: &mut [Field], focused: usize, offset: usize) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|f| Constraint::Length(f.height()))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter_mut().enumerate() {
        let is_focused = offset + i == focused;
        let border_color = if is_focused { Color::Cyan } else { Color::Gray };
        let title = if field.required {
            format!("{} *", field.label)
        } else {
            field.label.to_string()
        };

        field.input.set_cursor_line_style(Style::default());
        field.input.set_cursor_style(if is_focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        });
        field.input.set_block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color)),
        );
        field.input.set_placeholder_text(field.placeholder);
        field
            .input
            .set_placeholder_style(Style::default().fg(Color::DarkGray));

        frame.render_widget(&field.input, rows[i]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(form: &mut GenerateForm, text: &str) {
        for c in text.chars() {
            form.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn focus(form: &mut GenerateForm, id: FieldId) {
        while form.fields[form.focused].id != id {
            form.handle_key(key(KeyCode::Tab));
        }
    }

    #[test]
    fn test_typed_values_become_brief() {
        let mut form = GenerateForm::new();
        type_text(&mut form, "  Acme  ");
        focus(&mut form, FieldId::PrimaryKeywords);
        type_text(&mut form, "cold brew, espresso,cold brew, ");
        focus(&mut form, FieldId::BrandVoice);
        type_text(&mut form, "playful");

        let brief = form.brief();
        assert_eq!(brief.company_name, "Acme");
        assert_eq!(brief.primary_keywords, vec!["cold brew", "espresso"]);
        assert_eq!(brief.brand_voice, "playful");
        assert!(brief.validate().is_ok());
    }

    #[test]
    fn test_enter_advances_except_in_multiline_fields() {
        let mut form = GenerateForm::new();
        assert_eq!(form.handle_key(key(KeyCode::Enter)), FormResult::Continue);
        assert_eq!(form.fields[form.focused].id, FieldId::Industry);

        focus(&mut form, FieldId::BusinessDescription);
        type_text(&mut form, "line one");
        form.handle_key(key(KeyCode::Enter));
        type_text(&mut form, "line two");
        assert_eq!(form.fields[form.focused].id, FieldId::BusinessDescription);
        assert_eq!(form.brief().business_description, "line one\nline two");
    }

    #[test]
    fn test_focus_wraps_both_ways() {
        let mut form = GenerateForm::new();
        form.handle_key(key(KeyCode::BackTab));
        assert_eq!(form.fields[form.focused].id, FieldId::AdditionalNotes);
        form.handle_key(key(KeyCode::Tab));
        assert_eq!(form.fields[form.focused].id, FieldId::CompanyName);
    }

    #[test]
    fn test_submit_and_cancel() {
        let mut form = GenerateForm::new();
        assert_eq!(form.handle_key(key(KeyCode::Esc)), FormResult::Cancel);

        let result = form.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        match result {
            FormResult::Submit(brief) => assert!(brief.validate().is_err()),
            other => panic!("expected submit, got {other:?}"),
        }
    }

    #[test]
    fn test_reset_clears_values() {
        let mut form = GenerateForm::new();
        type_text(&mut form, "Acme");
        form.handle_key(key(KeyCode::Tab));
        form.reset();
        assert_eq!(form.focused, 0);
        assert!(form.brief().company_name.is_empty());
    }
}
