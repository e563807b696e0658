//! Interactive tabbed UI with one form per classifier

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
};
use std::io;
use tracing::error;

use fragma::config::AppConfig;
use fragma::{ModelContext, ModelKind};

/// Result shown in a form's output box
#[derive(Debug, Clone, PartialEq)]
enum Outcome {
    Prediction(String),
    Failure(String),
}

/// One single-input/single-output form
#[derive(Debug)]
struct Form {
    kind: ModelKind,
    input: String,
    output: Option<Outcome>,
}

impl Form {
    fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            input: String::new(),
            output: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    None,
    Submit,
    Quit,
}

pub struct App {
    title: String,
    forms: Vec<Form>,
    active: usize,
}

impl App {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            forms: ModelKind::ALL.iter().map(|&k| Form::new(k)).collect(),
            active: 0,
        }
    }

    fn active_form(&self) -> &Form {
        &self.forms[self.active]
    }

    fn active_form_mut(&mut self) -> &mut Form {
        &mut self.forms[self.active]
    }

    fn next_tab(&mut self) {
        self.active = (self.active + 1) % self.forms.len();
    }

    fn previous_tab(&mut self) {
        self.active = if self.active == 0 {
            self.forms.len() - 1
        } else {
            self.active - 1
        };
    }

    fn on_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return Action::Quit,
            KeyCode::Char('c') if ctrl => return Action::Quit,
            KeyCode::Char('u') if ctrl => self.active_form_mut().input.clear(),
            KeyCode::Tab | KeyCode::Right => self.next_tab(),
            KeyCode::BackTab | KeyCode::Left => self.previous_tab(),
            KeyCode::Enter => return Action::Submit,
            KeyCode::Backspace => {
                self.active_form_mut().input.pop();
            }
            KeyCode::Char(c) if !ctrl => self.active_form_mut().input.push(c),
            _ => {}
        }
        Action::None
    }

    /// Send the active form's input to its predictor and show the result.
    fn submit(&mut self, ctx: &ModelContext) {
        let form = self.active_form_mut();
        let outcome = match ctx.predict(form.kind, &form.input) {
            Ok(prediction) => Outcome::Prediction(prediction),
            Err(e) => {
                error!(model = %form.kind, "prediction failed: {e}");
                Outcome::Failure(format!("Error: {e}"))
            }
        };
        form.output = Some(outcome);
    }
}

pub fn run(config: &AppConfig) -> Result<()> {
    // Load before touching the terminal so startup errors print normally
    let ctx = ModelContext::load(config).context("Failed to load models")?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config.ui.title.clone());
    let res = run_app(&mut terminal, &mut app, &ctx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    ctx: &ModelContext,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                match app.on_key(key) {
                    Action::Quit => return Ok(()),
                    Action::Submit => app.submit(ctx),
                    Action::None => {}
                }
            }
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    let header = Paragraph::new(format!(" fragma | {}", app.title))
        .style(Style::default().fg(Color::Cyan).bold())
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let tabs = Tabs::new(ModelKind::ALL.iter().map(|k| k.tab_title()))
        .select(app.active)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().fg(Color::Cyan).bold());
    f.render_widget(tabs, chunks[1]);

    render_form(f, chunks[2], app.active_form());

    let help = " Enter:Submit  Tab/←/→:Switch tab  Ctrl-U:Clear  Esc:Quit";
    let footer = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, chunks[3]);
}

fn render_form(f: &mut Frame, area: Rect, form: &Form) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(3),
        ])
        .split(area);

    // Title and description
    let mut intro = vec![Line::from(Span::styled(
        form.kind.form_title(),
        Style::default().bold(),
    ))];
    if let Some(description) = form.kind.description() {
        intro.push(Line::from(Span::styled(
            description,
            Style::default().fg(Color::DarkGray),
        )));
    }
    let intro = Paragraph::new(intro)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(intro, chunks[0]);

    // Input box, scrolled so the end of the text stays visible
    let inner_width = chunks[1].width.saturating_sub(2) as usize;
    let visible = inner_width.saturating_sub(1);
    let char_count = form.input.chars().count();
    let shown: String = form
        .input
        .chars()
        .skip(char_count.saturating_sub(visible))
        .collect();
    let cursor_x = chunks[1].x + 1 + shown.chars().count() as u16;
    let input = Paragraph::new(shown).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", form.kind.input_label())),
    );
    f.render_widget(input, chunks[1]);
    f.set_cursor_position((cursor_x, chunks[1].y + 1));

    // Output box
    let output = match &form.output {
        Some(Outcome::Prediction(text)) => {
            Paragraph::new(text.as_str()).style(Style::default().fg(Color::Green).bold())
        }
        Some(Outcome::Failure(text)) => {
            Paragraph::new(text.as_str()).style(Style::default().fg(Color::Red))
        }
        None => Paragraph::new("").style(Style::default().fg(Color::DarkGray)),
    };
    let output = output
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", form.kind.output_label())),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(output, chunks[2]);
}
