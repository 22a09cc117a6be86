use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use quillmark_config::Config;
use quillmark_engine::editing::{BlockKind, InlineKind, Mark};
use quillmark_engine::io;
use quillmark_engine::render::{RenderBlock, Snapshot, TextSpan};
use quillmark_engine::session::Session;
use quillmark_engine::shortcuts::KeyInput;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use relative_path::RelativePathBuf;
use std::{env, io::stdout, path::PathBuf, process};

#[derive(PartialEq)]
enum Mode {
    Browse,
    Edit,
}

struct Editor {
    path: RelativePathBuf,
    session: Session,
}

struct App {
    documents_path: PathBuf,
    config: Config,
    documents: Vec<RelativePathBuf>,
    file_list_state: ListState,
    mode: Mode,
    editor: Option<Editor>,
    status: Option<String>,
}

impl App {
    fn new(documents_path: PathBuf, config: Config) -> Result<Self> {
        let mut app = Self {
            documents_path,
            config,
            documents: Vec::new(),
            file_list_state: ListState::default(),
            mode: Mode::Browse,
            editor: None,
            status: None,
        };

        app.refresh_documents()?;

        // Select first item if available
        if !app.documents.is_empty() {
            app.file_list_state.select(Some(0));
        }

        Ok(app)
    }

    fn refresh_documents(&mut self) -> Result<()> {
        let scanned = io::scan_documents(&self.documents_path)?;
        self.documents = scanned
            .iter()
            .filter(|path| self.config.matches(path))
            .filter_map(|path| {
                let relative = path.strip_prefix(&self.documents_path).ok()?;
                RelativePathBuf::from_path(relative).ok()
            })
            .collect();
        Ok(())
    }

    fn next_file(&mut self) {
        if self.documents.is_empty() {
            return;
        }
        let i = match self.file_list_state.selected() {
            Some(i) => (i + 1) % self.documents.len(),
            None => 0,
        };
        self.file_list_state.select(Some(i));
    }

    fn previous_file(&mut self) {
        if self.documents.is_empty() {
            return;
        }
        let i = match self.file_list_state.selected() {
            Some(i) => {
                if i == 0 {
                    self.documents.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.file_list_state.select(Some(i));
    }

    fn open_selected(&mut self) {
        let Some(index) = self.file_list_state.selected() else {
            return;
        };
        let Some(path) = self.documents.get(index).cloned() else {
            return;
        };

        match io::read_document(&path, &self.documents_path) {
            Ok(document) => match Session::from_document(document) {
                Ok(session) => {
                    self.editor = Some(Editor { path, session });
                    self.mode = Mode::Edit;
                    self.status = None;
                }
                Err(e) => {
                    self.status = Some(format!("Error opening document: {e}"));
                }
            },
            Err(e) => {
                self.status = Some(format!("Error reading document: {e}"));
            }
        }
    }

    fn save_current(&mut self) {
        if let Some(editor) = &mut self.editor {
            match io::write_document(
                &editor.path,
                &self.documents_path,
                editor.session.state().document(),
            ) {
                Ok(()) => {
                    editor.session.clear_modified();
                    self.status = Some(format!("Saved {}", editor.path));
                }
                Err(e) => {
                    self.status = Some(format!("Error saving document: {e}"));
                }
            }
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.code == KeyCode::Esc {
            self.mode = Mode::Browse;
            return Ok(());
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('s') {
                self.save_current();
            }
            return Ok(());
        }

        let Some(editor) = &mut self.editor else {
            return Ok(());
        };
        let committed = match key.code {
            KeyCode::Left => editor.session.move_left()?,
            KeyCode::Right => editor.session.move_right()?,
            KeyCode::Backspace => editor.session.handle_key(KeyInput::Backspace)?,
            KeyCode::Enter => editor.session.handle_key(KeyInput::Enter)?,
            KeyCode::Char(' ') => editor.session.handle_key(KeyInput::Space)?,
            KeyCode::Char(c) => editor.session.handle_key(KeyInput::Char(c))?,
            _ => false,
        };

        if committed {
            self.status = None;
            if self.config.autosave {
                self.save_current();
            }
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    // Determine documents path from CLI args or config file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let documents_path;
    let config;
    let from_config;

    if args.len() == 2 {
        // CLI argument provided - use it
        documents_path = PathBuf::from(&args[1]);
        config = Config::new(documents_path.clone());
        from_config = false;
    } else if args.len() == 1 {
        // No CLI argument - try config file
        match Config::load() {
            Ok(Some(loaded)) => {
                documents_path = loaded.documents_path.clone();
                config = loaded;
                from_config = true;
            }
            Ok(None) => {
                eprintln!("Error: No documents path provided and no config file found");
                eprintln!("Usage: {} <documents-folder-path>", args[0]);
                eprintln!("Or create a config file at {}", config_path.display());
                process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                eprintln!("Usage: {} <documents-folder-path>", args[0]);
                process::exit(1);
            }
        }
    } else {
        eprintln!("Usage: {} [documents-folder-path]", args[0]);
        process::exit(1);
    };

    // Validate documents directory using engine
    if let Err(e) = io::validate_documents_dir(&documents_path) {
        let source = if from_config {
            format!(" from config file '{}'", config_path.display())
        } else {
            String::new()
        };
        eprintln!(
            "Error: Documents path '{}'{} is invalid: {e}",
            documents_path.display(),
            source
        );
        process::exit(1);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app
    let mut app = App::new(documents_path, config)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match app.mode {
                Mode::Browse => match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Down | KeyCode::Char('j') => app.next_file(),
                    KeyCode::Up | KeyCode::Char('k') => app.previous_file(),
                    KeyCode::Enter => app.open_selected(),
                    _ => {}
                },
                Mode::Edit => app.handle_edit_key(key)?,
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(outer[0]);

    // Document list panel
    let file_items: Vec<ListItem> = app
        .documents
        .iter()
        .map(|path| {
            let display_text = format!("📄 {path}");
            ListItem::new(vec![Line::from(vec![Span::raw(display_text)])])
        })
        .collect();

    let files_list = List::new(file_items)
        .block(Block::default().borders(Borders::ALL).title("Documents"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(files_list, chunks[0], &mut app.file_list_state);

    // Editor panel
    let content_text = match &app.editor {
        Some(editor) => editor_lines(editor),
        None => vec![Line::from("Select a document and press Enter to edit")],
    };

    let editor_title = if app.mode == Mode::Edit {
        "Editor (Esc: back to list)"
    } else {
        "Editor"
    };
    let content = Paragraph::new(content_text)
        .block(Block::default().borders(Borders::ALL).title(editor_title))
        .wrap(ratatui::widgets::Wrap { trim: false });

    f.render_widget(content, chunks[1]);

    // Status line
    let status = Paragraph::new(status_line(app)).block(Block::default());
    f.render_widget(status, outer[1]);
}

fn status_line(app: &App) -> Line<'static> {
    if let Some(message) = &app.status {
        return Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        ));
    }

    match (&app.mode, &app.editor) {
        (Mode::Edit, Some(editor)) => {
            let kind = editor
                .session
                .state()
                .end_block()
                .map(|b| b.kind.as_str().to_string())
                .unwrap_or_default();
            let modified = if editor.session.is_modified() { "*" } else { "" };
            Line::from(vec![
                Span::raw(format!("{}{} | ", editor.path, modified)),
                Span::styled(kind, Style::default().fg(Color::Cyan)),
                Span::raw(format!(" | v{} | ", editor.session.version())),
                Span::raw("Ctrl-S: Save | Esc: Files"),
            ])
        }
        _ => Line::from(vec![
            Span::raw("q: Quit | "),
            Span::raw("↑/k: Previous | "),
            Span::raw("↓/j: Next | "),
            Span::raw("Enter: Open"),
        ]),
    }
}

fn editor_lines(editor: &Editor) -> Vec<Line<'static>> {
    let snapshot = Snapshot::capture(&editor.session);
    let caret_block = editor.session.state().end_block().map(|b| b.key);
    let caret_offset = editor.session.state().end_offset_in_block();

    let mut lines = Vec::new();
    for block in &snapshot.blocks {
        let caret = if Some(block.key) == caret_block {
            caret_offset
        } else {
            None
        };
        lines.push(block_line(block, caret));
        if block.kind != BlockKind::ListItem {
            lines.push(Line::default());
        }
    }
    lines
}

fn block_line(block: &RenderBlock, caret: Option<usize>) -> Line<'static> {
    let mut prefix = String::new();
    let mut list_depth = 0usize;
    for ancestor in &block.ancestors {
        match ancestor {
            BlockKind::BlockQuote => prefix.push_str("> "),
            BlockKind::BulletedList => list_depth += 1,
            _ => {}
        }
    }
    if list_depth > 1 {
        prefix.push_str(&"  ".repeat(list_depth - 1));
    }

    let base = match &block.kind {
        BlockKind::Heading { level } => {
            prefix.push_str(&"#".repeat(*level as usize));
            prefix.push(' ');
            Style::default().add_modifier(Modifier::BOLD)
        }
        BlockKind::ListItem => {
            prefix.push_str("• ");
            Style::default()
        }
        BlockKind::BlockQuote => {
            prefix.push_str("> ");
            Style::default()
        }
        _ => Style::default(),
    };

    let mut spans = Vec::new();
    if !prefix.is_empty() {
        spans.push(Span::styled(prefix, Style::default().fg(Color::DarkGray)));
    }
    spans.extend(content_spans(block, caret, base));
    Line::from(spans)
}

fn content_spans(block: &RenderBlock, caret: Option<usize>, base: Style) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut remaining = caret;

    for piece in &block.spans {
        let style = span_style(piece, base);
        let len = piece.text.chars().count();
        match remaining {
            Some(col) if col < len => {
                let before: String = piece.text.chars().take(col).collect();
                let at: String = piece.text.chars().skip(col).take(1).collect();
                let after: String = piece.text.chars().skip(col + 1).collect();
                if !before.is_empty() {
                    spans.push(Span::styled(before, style));
                }
                spans.push(Span::styled(at, style.add_modifier(Modifier::REVERSED)));
                if !after.is_empty() {
                    spans.push(Span::styled(after, style));
                }
                remaining = None;
            }
            Some(col) => {
                if !piece.text.is_empty() {
                    spans.push(Span::styled(piece.text.clone(), style));
                }
                remaining = Some(col - len);
            }
            None => {
                if !piece.text.is_empty() {
                    spans.push(Span::styled(piece.text.clone(), style));
                }
            }
        }
    }

    // Caret past the last character sits on a phantom cell
    if remaining.is_some() {
        spans.push(Span::styled(
            " ",
            Style::default().add_modifier(Modifier::REVERSED),
        ));
    }

    spans
}

fn span_style(piece: &TextSpan, base: Style) -> Style {
    let mut style = base;
    if piece.marks.contains(&Mark::Bold) {
        style = style.add_modifier(Modifier::BOLD);
    }
    if piece.marks.contains(&Mark::Italic) {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if piece.marks.contains(&Mark::Underline) {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if piece.marks.contains(&Mark::Strikethrough) {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    if piece.marks.contains(&Mark::Code) {
        style = style.fg(Color::Yellow);
    }
    if let Some(inline) = &piece.inline {
        style = match inline {
            InlineKind::Link => style.fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
            InlineKind::Other(_) => style.fg(Color::Magenta),
        };
    }
    style
}
