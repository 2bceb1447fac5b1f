// Main TUI application using ratatui
// Handles the terminal interface, user input, and display

use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame, Terminal,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::SearchError;
use crate::player::controller::PlaybackController;
use crate::player::queue::{QueueId, QueueStatus};
use crate::player::surface::{PlaybackSurface, SurfaceEvent};
use crate::youtube::search::{CatalogItem, SearchProvider};

const CONTROLS: &str =
    "[/]Search [Enter]Add/Play [Tab]Switch list [j/k]Navigate [p]Play [d]Remove [n]Skip [o]Open [c]Clear [q]Quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppMode {
    Normal,
    Searching,
}

// Which list j/k/Enter/o act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Results,
    Queue,
}

// A finished search, tagged with the search it answers so late replies
// from superseded searches can be dropped
struct SearchReply {
    generation: u64,
    query: String,
    result: Result<Vec<CatalogItem>, SearchError>,
}

pub struct KaraokeApp<S: PlaybackSurface> {
    controller: PlaybackController<S>,
    provider: Arc<dyn SearchProvider>,
    search_results: Vec<CatalogItem>,
    selected_result: usize,
    selected_queue_item: usize,
    search_query: String,
    mode: AppMode,
    focus: Focus,
    should_quit: bool,
    is_searching: bool,
    search_generation: u64,
    search_rx: mpsc::UnboundedReceiver<SearchReply>,
    search_tx: mpsc::UnboundedSender<SearchReply>,
    status_message: String,
}

impl<S: PlaybackSurface> KaraokeApp<S> {
    pub fn new(surface: S, provider: Arc<dyn SearchProvider>) -> Self {
        let (search_tx, search_rx) = mpsc::unbounded_channel();

        KaraokeApp {
            controller: PlaybackController::new(surface),
            provider,
            search_results: Vec::new(),
            selected_result: 0,
            selected_queue_item: 0,
            search_query: String::new(),
            mode: AppMode::Normal,
            focus: Focus::Results,
            should_quit: false,
            is_searching: false,
            search_generation: 0,
            search_rx,
            search_tx,
            status_message: String::new(),
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> anyhow::Result<()> {
        tracing::info!(provider = self.provider.name(), "karaoke session started");

        loop {
            terminal.draw(|f| self.draw_ui(f))?;

            // Check for search results
            while let Ok(reply) = self.search_rx.try_recv() {
                self.apply_search_reply(reply);
            }

            // Auto-advance when the player reports the song is over
            self.pump_playback();

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_input(key.code);
                    }
                }
            }

            if self.should_quit {
                break;
            }

            // Let spawned search tasks make progress on the runtime
            tokio::task::yield_now().await;
        }

        tracing::info!("karaoke session ended");
        Ok(())
    }

    // ==========================================
    // DRAWING
    // ==========================================

    fn draw_ui(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(5),
            ])
            .split(frame.size());

        self.draw_header(frame, chunks[0]);

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        self.draw_results(frame, main_chunks[0]);
        self.draw_queue(frame, main_chunks[1]);
        self.draw_now_playing(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let title = if self.mode == AppMode::Searching {
            format!("Search: {}_", self.search_query)
        } else if self.is_searching {
            "Searching... please wait".to_string()
        } else if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            CONTROLS.to_string()
        };

        let header = Paragraph::new(title)
            .block(Block::default().borders(Borders::ALL).title("Karaoke Night 🎤"));
        frame.render_widget(header, area);
    }

    fn draw_results(&self, frame: &mut Frame, area: Rect) {
        let highlight = self.focus == Focus::Results;
        let results: Vec<ListItem> = self
            .search_results
            .iter()
            .enumerate()
            .map(|(i, video)| {
                let content = format!("{} - {} [{}]", video.title, video.author_name, video.duration_label);
                let style = if highlight && i == self.selected_result {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(content).style(style)
            })
            .collect();

        let title = format!("Search Results ({})", self.search_results.len());
        let results_list = List::new(results).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(results_list, area);
    }

    fn draw_queue(&self, frame: &mut Frame, area: Rect) {
        let queue = self.controller.queue();
        let highlight = self.focus == Focus::Queue;

        let queue_items: Vec<ListItem> = if queue.is_empty() {
            vec![ListItem::new("Queue is empty - search and add songs to get started")
                .style(Style::default().fg(Color::DarkGray))]
        } else {
            queue
                .entries()
                .enumerate()
                .map(|(i, entry)| {
                    // Marked by queue id so a song queued twice only lights up once
                    let playing = queue.is_current(&entry.queue_id);
                    let marker = if playing { "▶" } else { " " };
                    let content = format!(
                        "{} {}. {} - {} [{}] {}",
                        marker,
                        i + 1,
                        entry.item.title,
                        entry.item.author_name,
                        entry.item.duration_label,
                        entry.queued_at.format("%H:%M"),
                    );
                    let style = if highlight && i == self.selected_queue_item {
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                    } else if playing {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default()
                    };
                    ListItem::new(content).style(style)
                })
                .collect()
        };

        let title = format!("Queue ({})", queue.len());
        let queue_list = List::new(queue_items).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(queue_list, area);
    }

    fn draw_now_playing(&self, frame: &mut Frame, area: Rect) {
        let queue = self.controller.queue();
        let info = match queue.current() {
            Some(entry) => {
                // Current but not loaded means the player gave up on it
                let state = if self.controller.surface().loaded() == Some(&entry.queue_id) {
                    "Now Playing"
                } else {
                    "Stopped"
                };
                format!(
                    "{}: {} - {} [{}]\n{}\nUp next: {} song(s)",
                    state,
                    entry.item.title,
                    entry.item.author_name,
                    entry.item.duration_label,
                    entry.item.watch_url(),
                    queue.len().saturating_sub(1),
                )
            }
            None => "No video playing\nSearch and add songs to the queue to get started".to_string(),
        };

        let title = match queue.status() {
            QueueStatus::Playing => "Player",
            QueueStatus::Idle => "Player (idle)",
            QueueStatus::Empty => "Player (empty)",
        };
        let widget = Paragraph::new(info).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(widget, area);
    }

    // ==========================================
    // INPUT
    // ==========================================

    fn handle_input(&mut self, key: KeyCode) {
        match self.mode {
            AppMode::Searching => match key {
                KeyCode::Char(c) => self.search_query.push(c),
                KeyCode::Backspace => {
                    self.search_query.pop();
                }
                KeyCode::Enter => {
                    let query = std::mem::take(&mut self.search_query);
                    self.mode = AppMode::Normal;
                    self.perform_search(&query);
                }
                KeyCode::Esc => {
                    self.mode = AppMode::Normal;
                    self.search_query.clear();
                }
                _ => {}
            },
            AppMode::Normal => {
                // Clear status message on any key press
                self.status_message.clear();

                match key {
                    KeyCode::Char('q') => self.should_quit = true,
                    KeyCode::Char('/') => self.mode = AppMode::Searching,
                    KeyCode::Tab => self.toggle_focus(),
                    KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
                    KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
                    KeyCode::Enter => match self.focus {
                        Focus::Results => self.add_selected_to_queue(),
                        Focus::Queue => self.play_selected(),
                    },
                    KeyCode::Char('p') => self.play_selected(),
                    KeyCode::Char('d') | KeyCode::Delete => self.remove_selected(),
                    KeyCode::Char('n') => self.skip_current(),
                    KeyCode::Char('o') => self.open_selected(),
                    KeyCode::Char('c') => self.clear_search(),
                    _ => {}
                }
            }
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Results => Focus::Queue,
            Focus::Queue => Focus::Results,
        };
    }

    fn move_selection(&mut self, delta: isize) {
        let (selected, len) = match self.focus {
            Focus::Results => (&mut self.selected_result, self.search_results.len()),
            Focus::Queue => (&mut self.selected_queue_item, self.controller.queue().len()),
        };
        if len == 0 {
            return;
        }
        // Wraps around at both ends
        *selected = (*selected as isize + delta).rem_euclid(len as isize) as usize;
    }

    // ==========================================
    // SEARCH
    // ==========================================

    fn perform_search(&mut self, query: &str) {
        if query.trim().is_empty() {
            return;
        }

        // Any reply still in flight is now stale
        self.search_generation += 1;
        self.is_searching = true;

        let generation = self.search_generation;
        let provider = Arc::clone(&self.provider);
        let query = query.trim().to_string();
        let tx = self.search_tx.clone();

        tokio::spawn(async move {
            let result = provider.search(&query).await;
            let _ = tx.send(SearchReply {
                generation,
                query,
                result,
            });
        });
    }

    fn apply_search_reply(&mut self, reply: SearchReply) {
        if reply.generation != self.search_generation {
            tracing::debug!(query = %reply.query, "dropping reply from superseded search");
            return;
        }

        self.is_searching = false;
        match reply.result {
            Ok(results) => {
                self.status_message = if results.is_empty() {
                    format!("No results for '{}'", reply.query)
                } else {
                    format!("Found {} results", results.len())
                };
                self.search_results = results;
                self.selected_result = 0;
                self.focus = Focus::Results;
            }
            Err(e) => {
                tracing::warn!(query = %reply.query, error = %e, "search failed");
                self.status_message = format!("Search unavailable: {}", e);
            }
        }
    }

    fn clear_search(&mut self) {
        self.search_generation += 1;
        self.is_searching = false;
        self.search_results.clear();
        self.selected_result = 0;
        self.search_query.clear();
    }

    // ==========================================
    // QUEUE ACTIONS
    // ==========================================

    fn selected_queue_id(&self) -> Option<QueueId> {
        self.controller
            .queue()
            .entries()
            .nth(self.selected_queue_item)
            .map(|entry| entry.queue_id.clone())
    }

    fn add_selected_to_queue(&mut self) {
        let Some(video) = self.search_results.get(self.selected_result).cloned() else {
            return;
        };

        let title = video.title.clone();
        match self.controller.enqueue(video) {
            Ok(_) => {
                self.status_message = format!("Added '{}' to queue! ({} total)", title, self.controller.queue().len());
            }
            Err(e) => self.report_playback_error(e),
        }
    }

    fn play_selected(&mut self) {
        let Some(queue_id) = self.selected_queue_id() else {
            return;
        };
        match self.controller.select(&queue_id) {
            Ok(true) => self.status_message = "Playing selected song".to_string(),
            Ok(false) => {}
            Err(e) => self.report_playback_error(e),
        }
    }

    fn remove_selected(&mut self) {
        let Some(queue_id) = self.selected_queue_id() else {
            return;
        };
        match self.controller.remove(&queue_id) {
            Ok(Some(entry)) => self.status_message = format!("Removed '{}'", entry.item.title),
            Ok(None) => {}
            Err(e) => self.report_playback_error(e),
        }
        self.clamp_queue_selection();
    }

    fn skip_current(&mut self) {
        if self.controller.queue().current().is_none() {
            self.status_message = "Queue is empty!".to_string();
            return;
        }
        if let Err(e) = self.controller.skip() {
            self.report_playback_error(e);
        }
        self.clamp_queue_selection();
    }

    fn open_selected(&mut self) {
        let url = match self.focus {
            Focus::Results => self.search_results.get(self.selected_result).map(CatalogItem::watch_url),
            Focus::Queue => self
                .controller
                .queue()
                .entries()
                .nth(self.selected_queue_item)
                .map(|entry| entry.item.watch_url()),
        };

        if let Some(url) = url {
            if let Err(e) = open::that(&url) {
                tracing::warn!(%url, error = %e, "could not open browser");
                self.status_message = format!("Failed to open browser: {}. Visit: {}", e, url);
            }
        }
    }

    fn pump_playback(&mut self) {
        match self.controller.pump() {
            Ok(failures) => {
                for failure in failures {
                    if let SurfaceEvent::Failed { reason, .. } = failure {
                        self.status_message = format!("Playback failed: {} (press n to skip)", reason);
                    }
                }
            }
            Err(e) => self.report_playback_error(e),
        }
        self.clamp_queue_selection();
    }

    fn report_playback_error(&mut self, e: crate::error::PlaybackError) {
        tracing::error!(error = %e, "playback error");
        self.status_message = format!("Error: {}", e);
    }

    fn clamp_queue_selection(&mut self) {
        let len = self.controller.queue().len();
        if self.selected_queue_item >= len {
            self.selected_queue_item = len.saturating_sub(1);
        }
    }
}
