//! Results page: the last run and recent history.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::generation::{GenerationRecord, RecordStatus};
use crate::steps::StepStatus;
use crate::store::Run;

fn status_style(status: RecordStatus) -> Style {
    match status {
        RecordStatus::Completed => Style::default().fg(Color::Green),
        RecordStatus::Failed => Style::default().fg(Color::Red),
        RecordStatus::Processing => Style::default().fg(Color::Blue),
        RecordStatus::Pending => Style::default().fg(Color::Gray),
    }
}

#[derive(Default)]
pub struct ResultsView {
    pub state: ListState,
}

impl ResultsView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let next = self.state.selected().map_or(0, |i| (i + 1).min(len - 1));
        self.state.select(Some(next));
    }

    pub fn select_prev(&mut self) {
        let prev = self.state.selected().map_or(0, |i| i.saturating_sub(1));
        self.state.select(Some(prev));
    }

    /// Draw the page. `finishing` is a run whose record has not landed yet.
    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        history: &[&GenerationRecord],
        finishing: Option<&Run>,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(8),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

        let summary = match (finishing, history.first()) {
            (Some(run), _) => finishing_lines(run),
            (None, Some(record)) => summary_lines(record),
            (None, None) => vec![Line::from(Span::styled(
                "No content plans generated yet",
                Style::default().fg(Color::Gray),
            ))],
        };
        frame.render_widget(
            Paragraph::new(summary).block(
                Block::default()
                    .title("Latest Content Plan")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            ),
            chunks[0],
        );

        let items: Vec<ListItem> = history
            .iter()
            .map(|r| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<10} ", r.status.label()), status_style(r.status)),
                    Span::raw(format!("{:<24} ", r.company)),
                    Span::styled(
                        r.finished_at.format("%Y-%m-%d %H:%M").to_string(),
                        Style::default().fg(Color::Gray),
                    ),
                    Span::styled(
                        format!("  {}%", r.progress),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!("History ({})", history.len()))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Gray)),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, chunks[1], &mut self.state);

        frame.render_widget(
            Paragraph::new(Span::styled(
                "[n] new plan  [j/k] scroll  [q] quit",
                Style::default().fg(Color::Gray),
            )),
            chunks[2],
        );
    }
}

fn finishing_lines(run: &Run) -> Vec<Line<'static>> {
    let done = run
        .steps
        .iter()
        .filter(|s| s.status == StepStatus::Completed)
        .count();
    vec![
        Line::from(Span::styled(
            "Finishing your content plan...",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "{}% complete  ·  {done}/{} steps",
            run.progress(),
            run.steps.len()
        )),
    ]
}

fn summary_lines(record: &GenerationRecord) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                record.company.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(record.status.label(), status_style(record.status)),
        ]),
        Line::from(format!(
            "Request {}  ·  {} plan  ·  {}% complete  ·  {}s",
            record.request_id,
            record.duration.label(),
            record.progress,
            record.elapsed_secs()
        )),
        Line::from(format!("Topics: {}", record.topics.join(", "))),
    ];
    if let Some(unit) = &record.failed_unit {
        lines.push(Line::from(Span::styled(
            format!("Failed at {unit}"),
            Style::default().fg(Color::Red),
        )));
    }
    if let Some(error) = &record.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RequestDefaults;
    use crate::generation::GenerationBrief;
    use crate::steps::content_plan_pipeline;
    use crate::store::Run;
    use ratatui::{backend::TestBackend, Terminal};
    use uuid::Uuid;

    fn record(error: Option<&str>) -> GenerationRecord {
        let mut brief = GenerationBrief {
            company_name: "Acme".into(),
            ..Default::default()
        };
        brief.add_primary_keyword("cold brew");
        brief.add_primary_keyword("espresso");
        let request = brief.to_request(&RequestDefaults::default()).unwrap();
        let run = Run {
            id: Uuid::new_v4(),
            steps: content_plan_pipeline(),
            active: false,
        };
        GenerationRecord::from_run(&request, &run, error.map(String::from))
    }

    #[test]
    fn test_summary_mentions_failure() {
        let text: Vec<String> = summary_lines(&record(Some("generation was cancelled")))
            .iter()
            .map(|l| l.to_string())
            .collect();
        assert!(text[0].contains("failed"));
        assert!(text[2].contains("cold brew, espresso"));
        assert!(text.iter().any(|l| l == "generation was cancelled"));
    }

    #[test]
    fn test_selection_clamps_to_history() {
        let mut view = ResultsView::new();
        view.select_next(2);
        view.select_next(2);
        view.select_next(2);
        assert_eq!(view.state.selected(), Some(1));
        view.select_prev();
        view.select_prev();
        assert_eq!(view.state.selected(), Some(0));
    }

    #[test]
    fn test_render_empty_history() {
        let mut view = ResultsView::new();
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| view.render(f, f.area(), &[], None)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("No content plans generated yet"));
        assert!(text.contains("History (0)"));
    }

    #[test]
    fn test_finishing_run_replaces_stale_summary() {
        let previous = record(Some("generation was cancelled"));
        let mut steps = content_plan_pipeline();
        let now = chrono::Utc::now();
        for step in &mut steps {
            step.begin(now).unwrap();
            for sub in &mut step.substeps {
                sub.begin().unwrap();
                sub.complete(now).unwrap();
            }
            step.complete(now).unwrap();
        }
        let run = Run {
            id: Uuid::new_v4(),
            steps,
            active: true,
        };

        let mut view = ResultsView::new();
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|f| view.render(f, f.area(), &[&previous], Some(&run)))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Finishing your content plan..."));
        assert!(text.contains("100% complete"));
        assert!(!text.contains("generation was cancelled"));
        assert!(text.contains("History (1)"));
    }
}
