//! Progress renderer for a generation run.
//!
//! [`ProgressView`] mirrors the store and draws the vertical stepper.
//! [`CompletionLatch`] watches the same store and sends the user to the
//! results page the first time a run has every step completed.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};
use uuid::Uuid;

use super::centered_rect;
use crate::navigation::{Navigator, Route};
use crate::steps::{Step, StepStatus, Substep};
use crate::store::{Run, RunStore, Subscription};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Navigates to the results page once per run, while the run is still active
pub struct CompletionLatch {
    navigator: Arc<dyn Navigator>,
    fired_for: Mutex<Option<Uuid>>,
}

impl CompletionLatch {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            navigator,
            fired_for: Mutex::new(None),
        }
    }

    /// Check one snapshot; returns true if it navigated
    pub fn observe(&self, run: &Run) -> bool {
        if !run.active || !run.all_completed() {
            return false;
        }
        {
            let mut fired = self
                .fired_for
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *fired == Some(run.id) {
                return false;
            }
            *fired = Some(run.id);
        }
        tracing::debug!(run_id = %run.id, "All steps completed, showing results");
        self.navigator.navigate(Route::Results);
        true
    }

    /// Observe every publish on `store` until the subscription is dropped
    pub fn attach(self: &Arc<Self>, store: &RunStore) -> Subscription {
        let latch = Arc::clone(self);
        store.subscribe(move |run| {
            latch.observe(run);
        })
    }
}

/// Read-only view of the current run
pub struct ProgressView {
    latest: Arc<Mutex<Arc<Run>>>,
    _subscription: Subscription,
    frame: usize,
}

impl ProgressView {
    pub fn new(store: &RunStore) -> Self {
        let latest = Arc::new(Mutex::new(store.current()));
        let sink = Arc::clone(&latest);
        let subscription = store.subscribe(move |run| {
            *sink.lock().unwrap_or_else(PoisonError::into_inner) = Arc::clone(run);
        });
        Self {
            latest,
            _subscription: subscription,
            frame: 0,
        }
    }

    pub fn snapshot(&self) -> Arc<Run> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Advance the spinner animation
    pub fn tick(&mut self) {
        self.frame = (self.frame + 1) % SPINNER.len();
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let run = self.snapshot();
        let area = centered_rect(80, 94, area);
        frame.render_widget(Clear, area);

        let outer = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = outer.inner(area);
        frame.render_widget(outer, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(4),
                Constraint::Length(2),
            ])
            .split(inner);

        self.render_header(frame, chunks[0], &run);

        let gauge_color = if run.has_error() {
            Color::Red
        } else if run.all_completed() {
            Color::Green
        } else {
            Color::Blue
        };
        frame.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(gauge_color))
                .percent(u16::from(run.progress())),
            chunks[1],
        );

        let (lines, focus) = step_lines(&run, SPINNER[self.frame]);
        let height = chunks[2].height as usize;
        let scroll = focus.saturating_sub(height / 3) as u16;
        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0)),
            chunks[2],
        );

        render_footer(frame, chunks[3], &run);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, run: &Run) {
        let title = if run.has_error() {
            Span::styled(
                "Content Generation Failed",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(
                format!("{} Generating Your Content Plan", SPINNER[self.frame]),
                Style::default().add_modifier(Modifier::BOLD),
            )
        };

        let header = Paragraph::new(vec![
            Line::from(title),
            Line::from(Span::styled(
                "Creating 30 days of optimized content across all platforms",
                Style::default().fg(Color::Gray),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(header, area);
    }
}

fn render_footer(frame: &mut Frame, area: Rect, run: &Run) {
    let hints = if run.active {
        "[c] cancel  [q] quit"
    } else {
        "[n] new plan  [r] results  [q] quit"
    };
    let footer = Paragraph::new(vec![
        Line::from(Span::styled(
            "◷ Estimated completion: 15-20 minutes   ↗ Generating 30+ pieces of content",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(hints, Style::default().fg(Color::Gray))),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(footer, area);
}

fn status_color(status: StepStatus) -> Color {
    match status {
        StepStatus::Pending => Color::DarkGray,
        StepStatus::InProgress => Color::Blue,
        StepStatus::Completed => Color::Green,
        StepStatus::Error => Color::Red,
    }
}

fn status_icon(status: StepStatus, spinner: &'static str) -> &'static str {
    match status {
        StepStatus::Pending => "◷",
        StepStatus::InProgress => spinner,
        StepStatus::Completed => "✓",
        StepStatus::Error => "!",
    }
}

fn clock(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}

/// Lines for every step, plus the index of the line to keep in view
fn step_lines(run: &Run, spinner: &'static str) -> (Vec<Line<'static>>, usize) {
    let mut lines = Vec::new();
    let mut focus = 0;

    for (index, step) in run.steps.iter().enumerate() {
        let is_last = index + 1 == run.steps.len();
        if step.status == StepStatus::InProgress || step.status == StepStatus::Error {
            focus = lines.len();
        }
        let guide = if is_last { "  " } else { "│ " };
        push_step(&mut lines, step, guide, spinner);
        if !is_last {
            lines.push(Line::from(Span::styled(
                guide,
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    (lines, focus)
}

fn push_step(lines: &mut Vec<Line<'static>>, step: &Step, guide: &'static str, spinner: &'static str) {
    let color = status_color(step.status);
    let guide_span = || Span::styled(guide, Style::default().fg(Color::DarkGray));

    let mut heading = vec![
        Span::styled(
            format!("{} ", status_icon(step.status, spinner)),
            Style::default().fg(color),
        ),
        Span::styled(
            step.icon
                .map(|icon| format!("{} ", icon.glyph()))
                .unwrap_or_default(),
            Style::default().fg(color),
        ),
        Span::styled(
            step.title.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
    ];
    match step.status {
        StepStatus::InProgress => heading.push(Span::styled(
            format!("  {}", step.status.label()),
            Style::default().fg(Color::Blue),
        )),
        StepStatus::Completed => {
            if let Some(at) = step.completed_at {
                heading.push(Span::styled(
                    format!("  {}", clock(at)),
                    Style::default().fg(Color::Gray),
                ));
            }
        }
        StepStatus::Pending => {
            if let Some(estimate) = &step.estimated_time {
                heading.push(Span::styled(
                    format!("  ~{estimate}"),
                    Style::default().fg(Color::Gray),
                ));
            }
        }
        StepStatus::Error => heading.push(Span::styled(
            format!("  {}", step.status.label()),
            Style::default().fg(Color::Red),
        )),
    }
    lines.push(Line::from(heading));

    lines.push(Line::from(vec![
        guide_span(),
        Span::styled(step.description.clone(), Style::default().fg(Color::Gray)),
    ]));

    if step.status == StepStatus::InProgress {
        if let Some(at) = step.started_at {
            lines.push(Line::from(vec![
                guide_span(),
                Span::styled(
                    format!("Started at {}", clock(at)),
                    Style::default().fg(Color::Blue),
                ),
            ]));
        }
    }

    for substep in &step.substeps {
        push_substep(lines, substep, guide, spinner, step.status);
    }
}

fn push_substep(
    lines: &mut Vec<Line<'static>>,
    substep: &Substep,
    guide: &'static str,
    spinner: &'static str,
    parent: StepStatus,
) {
    let color = status_color(substep.status);
    // Substeps of a step that has not started are dimmed
    let title_style = if parent == StepStatus::Pending {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(color)
    };

    let mut spans = vec![
        Span::styled(guide, Style::default().fg(Color::DarkGray)),
        Span::styled("  ", Style::default()),
        Span::styled(
            format!("{} ", status_icon(substep.status, spinner)),
            Style::default().fg(color),
        ),
        Span::styled(substep.title.clone(), title_style),
    ];
    match substep.status {
        StepStatus::Completed => {
            if let Some(at) = substep.completed_at {
                spans.push(Span::styled(
                    format!("  {}", clock(at)),
                    Style::default().fg(Color::Green),
                ));
            }
        }
        StepStatus::Pending => {
            if let Some(estimate) = &substep.estimated_time {
                spans.push(Span::styled(
                    format!("  ~{estimate}"),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
        StepStatus::InProgress => {
            spans.push(Span::styled("  •", Style::default().fg(Color::Blue)))
        }
        StepStatus::Error => {}
    }
    lines.push(Line::from(spans));

    if let Some(details) = &substep.details {
        lines.push(Line::from(vec![
            Span::styled(guide, Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("    {details}"),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::content_plan_pipeline;
    use ratatui::{backend::TestBackend, Terminal};

    #[derive(Default)]
    struct RecordingNavigator {
        routes: Mutex<Vec<Route>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, route: Route) {
            self.routes.lock().unwrap().push(route);
        }
    }

    fn two_steps() -> Vec<Step> {
        vec![
            Step::new("a", "Step A", "with substeps").with_substeps(vec![
                Substep::new("a1", "First").with_details("Looking things up"),
                Substep::new("a2", "Second"),
            ]),
            Step::new("b", "Step B", "atomic").with_estimate("1 min"),
        ]
    }

    fn run_with(steps: Vec<Step>, id: Uuid) -> Run {
        Run {
            id,
            steps,
            active: true,
        }
    }

    fn completed(mut steps: Vec<Step>) -> Vec<Step> {
        for step in &mut steps {
            step.begin(Utc::now()).unwrap();
            for sub in &mut step.substeps {
                sub.begin().unwrap();
                sub.complete(Utc::now()).unwrap();
            }
            step.complete(Utc::now()).unwrap();
        }
        steps
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_latch_fires_once_per_run() {
        let navigator = Arc::new(RecordingNavigator::default());
        let latch = CompletionLatch::new(navigator.clone());
        let id = Uuid::new_v4();

        assert!(!latch.observe(&run_with(two_steps(), id)));

        let mut done = run_with(completed(two_steps()), id);
        assert!(latch.observe(&done));
        done.active = false;
        assert!(!latch.observe(&done));

        assert_eq!(*navigator.routes.lock().unwrap(), vec![Route::Results]);

        assert!(latch.observe(&run_with(completed(two_steps()), Uuid::new_v4())));
        assert_eq!(navigator.routes.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_latch_ignores_empty_and_failed_runs() {
        let navigator = Arc::new(RecordingNavigator::default());
        let latch = CompletionLatch::new(navigator.clone());

        assert!(!latch.observe(&Run::empty()));

        let mut steps = two_steps();
        steps[0].begin(Utc::now()).unwrap();
        steps[0].fail().unwrap();
        assert!(!latch.observe(&run_with(steps, Uuid::new_v4())));
        assert!(navigator.routes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_latch_ignores_closed_runs() {
        let navigator = Arc::new(RecordingNavigator::default());
        let latch = CompletionLatch::new(navigator.clone());

        let closed = Run {
            active: false,
            ..run_with(completed(two_steps()), Uuid::new_v4())
        };
        assert!(!latch.observe(&closed));
        assert!(!latch.observe(&closed));
        assert!(navigator.routes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_attached_latch_follows_store() {
        let store = RunStore::new();
        let navigator = Arc::new(RecordingNavigator::default());
        let latch = Arc::new(CompletionLatch::new(navigator.clone()));
        let sub = latch.attach(&store);

        let id = Uuid::new_v4();
        store.publish(run_with(completed(two_steps()), id));
        store.publish(Run {
            active: false,
            ..run_with(completed(two_steps()), id)
        });
        assert_eq!(navigator.routes.lock().unwrap().len(), 1);

        drop(sub);
        store.publish(run_with(completed(two_steps()), Uuid::new_v4()));
        assert_eq!(navigator.routes.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_view_tracks_latest_snapshot_without_publishing() {
        let store = RunStore::new();
        let view = ProgressView::new(&store);
        assert!(view.snapshot().is_empty());

        let run = run_with(two_steps(), Uuid::new_v4());
        store.publish(run.clone());
        assert_eq!(*view.snapshot(), run);
        assert_eq!(store.publish_count(), 1);

        drop(view);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_guide_line_omitted_after_last_step() {
        let run = run_with(two_steps(), Uuid::new_v4());
        let (lines, _) = step_lines(&run, SPINNER[0]);
        let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();

        let b_heading = text.iter().position(|l| l.contains("Step B")).unwrap();
        assert!(text[..b_heading]
            .iter()
            .skip(1)
            .all(|l| l.starts_with("│ ")));
        assert!(text[b_heading + 1..].iter().all(|l| !l.starts_with("│")));
    }

    #[test]
    fn test_render_shows_status_details() {
        let store = RunStore::new();
        let view = ProgressView::new(&store);

        let mut steps = two_steps();
        steps[0].begin(Utc::now()).unwrap();
        steps[0].substeps[0].begin().unwrap();
        store.publish(run_with(steps, Uuid::new_v4()));

        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| view.render(f, f.area())).unwrap();
        let screen = screen_text(&terminal);

        assert!(screen.contains("Generating Your Content Plan"));
        assert!(screen.contains("Step A"));
        assert!(screen.contains("In Progress"));
        assert!(screen.contains("Started at"));
        assert!(screen.contains("Looking things up"));
        assert!(screen.contains("~1 min"));
        assert!(screen.contains("[c] cancel"));
    }

    #[test]
    fn test_render_full_template_fits() {
        let store = RunStore::new();
        let mut view = ProgressView::new(&store);
        store.publish(run_with(content_plan_pipeline(), Uuid::new_v4()));

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        view.tick();
        terminal.draw(|f| view.render(f, f.area())).unwrap();
        assert!(screen_text(&terminal).contains("Business Analysis & Research"));
    }
}
