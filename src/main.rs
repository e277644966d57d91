mod ui;

use std::{
    error::Error,
    fs,
    io::{self, stdin},
    path::PathBuf,
    sync::mpsc::{self, Receiver},
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use keystride::{
    app_dirs::AppDirs,
    coach::{self, Recommendation},
    config::{Config, ConfigStore, FileConfigStore},
    logging,
    runtime::{CrosstermEventSource, FixedTicker, Runner, TrainerEvent},
    typing_policy::PositionStatuses,
    Curriculum, CurriculumEntry, DrillCategory, PositionStatus, SessionEngine, SessionEvent,
    SessionReport,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{info, warn};

/// sentence-by-sentence typing trainer with live wpm, accuracy and backspace tracking
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type each sentence of a curriculum exactly as shown. Speed, accuracy and backspace use are tracked live and summarized when the last sentence is done."
)]
pub struct Cli {
    /// drill bank to build a mixed five-sentence practice from (default: warm-up course)
    #[clap(short = 'c', long, value_enum)]
    category: Option<DrillCategory>,

    /// json file with a custom curriculum
    #[clap(short = 'f', long = "curriculum")]
    curriculum_file: Option<PathBuf>,

    /// practice a single custom sentence
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// live stats refresh interval in milliseconds
    #[clap(long, value_parser = clap::value_parser!(u64).range(1..))]
    refresh_ms: Option<u64>,

    /// write logs here instead of the default state directory
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Pick the curriculum source: prompt, then file, then category, then warm-up
    fn build_curriculum(
        &self,
        category: Option<DrillCategory>,
    ) -> Result<Curriculum, Box<dyn Error>> {
        if let Some(prompt) = &self.prompt {
            return Ok(Curriculum::new(vec![CurriculumEntry::new(1, prompt.as_str())?]));
        }
        if let Some(path) = &self.curriculum_file {
            let json = fs::read_to_string(path)?;
            return Ok(Curriculum::from_json(&json)?);
        }
        match category {
            Some(category) => Ok(Curriculum::mixed(category, &mut rand::thread_rng())?),
            None => Ok(Curriculum::warmup()?),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Typing,
    Results,
}

/// Presentation state around one engine
pub struct App {
    pub cli: Cli,
    pub category: Option<DrillCategory>,
    pub engine: SessionEngine,
    pub events: Receiver<SessionEvent>,
    pub state: AppState,
    pub input: String,
    pub statuses: Vec<PositionStatus>,
    pub guide: Option<String>,
    pub level: u32,
    pub live_wpm: u32,
    pub live_accuracy: u32,
    pub backspaces: u64,
    pub report: Option<SessionReport>,
    /// Next drills follow the coach unless the source was chosen up front
    pub coaching: bool,
    pub recommendation: Option<Recommendation>,
}

impl App {
    pub fn new(cli: Cli, category: Option<DrillCategory>) -> Result<Self, Box<dyn Error>> {
        let curriculum = cli.build_curriculum(category)?;
        let (engine, events) = Self::engine_for(curriculum);
        let coaching = cli.prompt.is_none() && cli.curriculum_file.is_none() && category.is_none();

        let mut app = Self {
            cli,
            category,
            engine,
            events,
            state: AppState::Typing,
            input: String::new(),
            statuses: Vec::new(),
            guide: None,
            level: 1,
            live_wpm: 0,
            live_accuracy: 100,
            backspaces: 0,
            report: None,
            coaching,
            recommendation: None,
        };
        app.restart()?;
        Ok(app)
    }

    fn engine_for(curriculum: Curriculum) -> (SessionEngine, Receiver<SessionEvent>) {
        let mut engine = SessionEngine::new(curriculum);
        let (tx, rx) = mpsc::channel();
        engine.add_listener(tx);
        (engine, rx)
    }

    /// Same curriculum, fresh session
    pub fn restart(&mut self) -> Result<(), Box<dyn Error>> {
        self.input.clear();
        self.live_wpm = 0;
        self.live_accuracy = 100;
        self.backspaces = 0;
        self.report = None;
        self.recommendation = None;
        self.state = AppState::Typing;
        self.engine.start()?;
        self.drain_events();
        Ok(())
    }

    /// New curriculum from the same source settings, or the coach's pick
    pub fn renew(&mut self) -> Result<(), Box<dyn Error>> {
        if let Some(rec) = self.recommendation.take() {
            info!(category = %rec.category, "following coach recommendation");
            self.category = Some(rec.category);
        }
        let curriculum = self.cli.build_curriculum(self.category)?;
        let (engine, events) = Self::engine_for(curriculum);
        self.engine = engine;
        self.events = events;
        self.restart()
    }

    pub fn type_char(&mut self, c: char) {
        if self.state != AppState::Typing {
            return;
        }
        self.input.push(c);
        self.apply_input();
    }

    pub fn backspace(&mut self) {
        if self.state != AppState::Typing {
            return;
        }
        self.engine.on_backspace();
        self.input.pop();
        self.apply_input();
    }

    pub fn refresh_stats(&mut self) {
        if self.engine.is_playing() {
            self.live_wpm = self.engine.compute_wpm();
            self.live_accuracy = self.engine.compute_accuracy();
        }
    }

    pub fn sentence_position(&self) -> (usize, usize) {
        (self.engine.current_index() + 1, self.engine.curriculum().len())
    }

    fn apply_input(&mut self) {
        self.statuses = self.engine.on_input(&self.input).collect();
        self.drain_events();
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                SessionEvent::SentenceLoaded {
                    level, text, guide, ..
                } => {
                    self.input.clear();
                    self.statuses = PositionStatuses::new(&text, "").collect();
                    self.guide = guide;
                    self.level = level;
                }
                SessionEvent::SentenceCompleted { .. } => self.refresh_stats(),
                SessionEvent::BackspacePressed { total_backspaces } => {
                    self.backspaces = total_backspaces;
                }
                SessionEvent::SessionFinished(report) => {
                    self.live_wpm = report.wpm;
                    self.live_accuracy = report.accuracy;
                    self.report = Some(report);
                    if self.coaching {
                        self.recommendation = Some(coach::recommend(
                            self.engine.sentence_log(),
                            &mut rand::thread_rng(),
                        ));
                    }
                    self.state = AppState::Results;
                }
            }
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(log_path) = cli.log_file.clone().or_else(AppDirs::log_path) {
        // the trainer runs fine without logs, but say why they are missing
        if let Err(err) = logging::init_file_logging(&log_path) {
            eprintln!("keystride: logging disabled ({}): {err}", log_path.display());
        }
    }

    let store = FileConfigStore::new();
    let config = store.load();
    let category = cli.category.or(config.category);
    let refresh_ms = cli.refresh_ms.unwrap_or(config.refresh_ms);

    if cli.category.is_some() {
        let updated = Config {
            category,
            ..config
        };
        if let Err(err) = store.save(&updated) {
            warn!(%err, path = %store.path().display(), "could not save config");
        }
    }

    let mut app = App::new(cli, category)?;
    info!(sentences = app.engine.curriculum().len(), "trainer ready");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, refresh_ms);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

#[derive(Debug)]
enum Action {
    Continue,
    Restart,
    New,
    Quit,
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    refresh_ms: u64,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::from_millis(refresh_ms));

    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        let action = match runner.step() {
            TrainerEvent::Refresh => {
                // live stats only matter while a sentence is on screen
                app.refresh_stats();
                Action::Continue
            }
            TrainerEvent::Resize => Action::Continue,
            TrainerEvent::Closed => {
                warn!("terminal input closed, exiting");
                Action::Quit
            }
            TrainerEvent::Key(key) => handle_key(app, key),
        };

        match action {
            Action::Continue => {}
            Action::Restart => app.restart()?,
            Action::New => app.renew()?,
            Action::Quit => break,
        }
        terminal.draw(|f| ui::draw(app, f))?;
    }

    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) -> Action {
    if key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
    {
        return Action::Quit;
    }

    match (app.state, key.code) {
        (AppState::Typing, KeyCode::Backspace) => app.backspace(),
        (AppState::Typing, KeyCode::Char(c)) => app.type_char(c),
        (AppState::Results, KeyCode::Char('r')) => return Action::Restart,
        (AppState::Results, KeyCode::Char('n')) => return Action::New,
        _ => {}
    }
    Action::Continue
}
