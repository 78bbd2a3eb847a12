use anyhow::Result;
use ratatui::layout::Rect;
use spectra_core::{ApiClient, Config, Connectivity, Session};
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub api_url: String,

    // Compose box
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Conversation
    pub session: Session<ApiClient>,
    pub connectivity: Connectivity,
    pub status_task: Option<JoinHandle<Connectivity>>,

    // Thread view
    pub scroll: u16,
    pub max_scroll: u16,
    pub follow: bool, // keep the newest message in view
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let client = ApiClient::new(&config.api_url, config.timeout())?;
        Ok(Self::with_session(Session::with_greeting(
            client,
            &config.greeting,
        )))
    }

    pub fn with_session(session: Session<ApiClient>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            api_url: session.backend().base_url().to_string(),

            input: String::new(),
            cursor: 0,

            session,
            connectivity: Connectivity::Checking,
            status_task: None,

            scroll: 0,
            max_scroll: 0,
            follow: true,
            chat_area: None,

            animation_frame: 0,
        }
    }

    /// Kick off the one-shot status probe behind the connectivity badge.
    pub fn start_status_probe(&mut self) {
        self.status_task = Some(self.session.spawn_status_probe());
    }

    /// Collect background results that have finished. Never blocks.
    pub async fn poll_tasks(&mut self) {
        if matches!(&self.status_task, Some(task) if task.is_finished()) {
            if let Some(task) = self.status_task.take() {
                self.connectivity = task.await.unwrap_or(Connectivity::Offline);
                info!(connectivity = self.connectivity.label(), "status check finished");
            }
        }

        if self.session.poll().await.is_some() {
            self.follow = true;
        }
    }

    pub fn is_typing(&self) -> bool {
        self.session.is_pending()
    }

    /// Send the compose box. The input is only cleared when the session
    /// accepted it.
    pub fn submit(&mut self) -> bool {
        if !self.session.submit(&self.input) {
            return false;
        }
        self.input.clear();
        self.cursor = 0;
        self.follow = true;
        true
    }

    // Compose box editing. Ignored while a reply is pending.
    pub fn insert_char(&mut self, c: char) {
        if self.is_typing() {
            return;
        }
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.is_typing() || self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.remove(byte_pos);
    }

    pub fn delete_char(&mut self) {
        if self.is_typing() {
            return;
        }
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_typing() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Thread scrolling
    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll);
        self.follow = self.scroll >= self.max_scroll;
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
        self.follow = self.max_scroll == 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll;
        self.follow = true;
    }

    pub fn page_size(&self) -> u16 {
        self.chat_area
            .map(|area| area.height.saturating_sub(2) / 2)
            .unwrap_or(10)
            .max(1)
    }

    /// Called during render once the thread's height is known.
    pub fn update_scroll_bounds(&mut self, total_lines: u16, visible_lines: u16) {
        self.max_scroll = total_lines.saturating_sub(visible_lines);
        if self.follow || self.scroll > self.max_scroll {
            self.scroll = self.max_scroll;
        }
    }
}
