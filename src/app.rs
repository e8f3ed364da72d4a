use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::generation::{
    GenerationBrief, GenerationError, GenerationRecord, GenerationRequest, Pacing,
    ProgressDriver, SimulatedExecutor, WorkExecutor,
};
use crate::navigation::{ChannelNavigator, Route};
use crate::notifications::{NotificationEvent, NotificationService, ToastQueue};
use crate::state::State;
use crate::store::{Run, RunStore, Subscription};
use crate::ui::toasts::render_toasts;
use crate::ui::{
    CompletionLatch, FormResult, GenerateForm, ProgressView, ResultsView, TerminalGuard,
};

/// A finished driver task, reported back to the event loop
struct RunOutcome {
    request: GenerationRequest,
    result: Result<GenerationRecord, GenerationError>,
}

pub struct App {
    config: Config,
    route: Route,
    store: RunStore,
    driver: Arc<ProgressDriver>,
    notifications: Arc<NotificationService>,
    toasts: ToastQueue,
    state: State,
    form: GenerateForm,
    progress: ProgressView,
    results: ResultsView,
    _latch: Subscription,
    nav_rx: mpsc::UnboundedReceiver<Route>,
    outcome_tx: mpsc::UnboundedSender<RunOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<RunOutcome>,
    cancel: Option<CancellationToken>,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let executor = Arc::new(SimulatedExecutor::from_config(&config.generation));
        Self::with_executor(config, executor)
    }

    pub fn with_executor(config: Config, executor: Arc<dyn WorkExecutor>) -> Result<Self> {
        let state = State::load(&config)?;
        let store = RunStore::new();
        let toasts = ToastQueue::new();
        let notifications = Arc::new(NotificationService::from_config(&config, toasts.clone()));

        let driver = Arc::new(ProgressDriver::new(
            store.clone(),
            executor,
            Arc::clone(&notifications),
            Pacing::from_config(&config.generation),
        ));

        let (navigator, nav_rx) = ChannelNavigator::new();
        let latch = Arc::new(CompletionLatch::new(Arc::new(navigator)));
        let latch_subscription = latch.attach(&store);
        let progress = ProgressView::new(&store);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        Ok(Self {
            config,
            route: Route::Generate,
            store,
            driver,
            notifications,
            toasts,
            state,
            form: GenerateForm::new(),
            progress,
            results: ResultsView::new(),
            _latch: latch_subscription,
            nav_rx,
            outcome_tx,
            outcome_rx,
            cancel: None,
            should_quit: false,
        })
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub async fn run(&mut self) -> Result<()> {
        let guard = TerminalGuard::enter()?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let tick_rate = Duration::from_millis(self.config.ui.refresh_rate_ms);

        while !self.should_quit {
            self.process_events();
            self.progress.tick();

            let history = self.state.recent(self.config.ui.history_limit);
            let finishing = self.finishing_run();
            let toasts = self.toasts.visible();
            terminal.draw(|f| {
                let area = f.area();
                match self.route {
                    Route::Generate => self.form.render(f, area),
                    Route::Progress => {
                        self.form.render(f, area);
                        self.progress.render(f, area);
                    }
                    Route::Results => {
                        self.results
                            .render(f, area, &history, finishing.as_deref())
                    }
                }
                render_toasts(f, area, &toasts);
            })?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
        }

        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        terminal.show_cursor()?;
        guard.release();
        Ok(())
    }

    /// The run still winding down after completion, before its record lands
    fn finishing_run(&self) -> Option<Arc<Run>> {
        self.driver
            .is_running()
            .then(|| self.progress.snapshot())
            .filter(|run| run.all_completed())
    }

    /// Apply navigation requests and finished runs
    pub fn process_events(&mut self) {
        while let Ok(route) = self.nav_rx.try_recv() {
            self.navigate(route);
        }
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.finish_run(outcome);
        }
    }

    fn navigate(&mut self, route: Route) {
        tracing::debug!(from = ?self.route, to = ?route, "Navigating");
        if route == Route::Results {
            self.results.state.select(Some(0));
        }
        self.route = route;
    }

    /// Validate the brief and start a run in the background
    pub fn start_generation(&mut self, brief: GenerationBrief) {
        if self.driver.is_running() {
            self.notifications.notify(NotificationEvent::GenerationBusy);
            return;
        }

        let request = match brief.to_request(&self.config.defaults) {
            Ok(request) => request,
            Err(e) => {
                tracing::info!(reason = %e, "Brief rejected");
                self.notifications
                    .notify(NotificationEvent::MissingInformation {
                        reason: e.to_string(),
                    });
                return;
            }
        };

        let cancel = CancellationToken::new();
        self.cancel = Some(cancel.clone());

        let driver = Arc::clone(&self.driver);
        let outcome_tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = driver.run_with_cancel(&request, cancel).await;
            let _ = outcome_tx.send(RunOutcome { request, result });
        });

        self.navigate(Route::Progress);
    }

    fn finish_run(&mut self, outcome: RunOutcome) {
        let record = match outcome.result {
            Ok(record) => record,
            Err(e) if !e.is_run_failure() => return,
            Err(e) => {
                let run = self.store.current();
                let record = GenerationRecord::from_run(&outcome.request, &run, Some(e.to_string()));
                // The brief is still in the form, ready to retry
                self.navigate(Route::Generate);
                record
            }
        };
        self.cancel = None;

        if let Err(e) = self.state.record(record) {
            tracing::warn!(error = %e, "Failed to save run history");
        }
    }

    fn cancel_run(&mut self) {
        if let Some(cancel) = &self.cancel {
            tracing::info!("Cancelling generation");
            cancel.cancel();
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.cancel_run();
            self.should_quit = true;
            return;
        }

        match self.route {
            Route::Generate => match self.form.handle_key(key) {
                FormResult::Continue => {}
                FormResult::Cancel => self.should_quit = true,
                FormResult::Submit(brief) => self.start_generation(brief),
            },
            Route::Progress => match key.code {
                KeyCode::Char('c') => self.cancel_run(),
                KeyCode::Char('q') => {
                    self.cancel_run();
                    self.should_quit = true;
                }
                KeyCode::Char('n') if !self.driver.is_running() => {
                    self.navigate(Route::Generate)
                }
                KeyCode::Char('r') if !self.driver.is_running() => {
                    self.navigate(Route::Results)
                }
                _ => {}
            },
            Route::Results => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                KeyCode::Char('n') if !self.driver.is_running() => {
                    self.form.reset();
                    self.navigate(Route::Generate);
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    let len = self.state.recent(self.config.ui.history_limit).len();
                    self.results.select_next(len);
                }
                KeyCode::Up | KeyCode::Char('k') => self.results.select_prev(),
                _ => {}
            },
        }
    }
}
