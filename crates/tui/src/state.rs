use std::time::{Duration, Instant};

use chrono::NaiveDate;

/// Delay between the last keystroke and the search request.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(350);

/// Cursor and scroll offset over a list of known length.
#[derive(Debug, Clone, Default)]
pub struct ListCursor {
    pub cursor: usize,
    pub offset: usize,
    pub len: usize,
    pub height: usize,
}

impl ListCursor {
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        self.clamp();
    }

    pub fn reset(&mut self, len: usize) {
        self.cursor = 0;
        self.offset = 0;
        self.set_len(len);
    }

    pub fn move_by(&mut self, delta: isize) {
        if self.len == 0 {
            return;
        }
        let max = self.len as isize - 1;
        self.cursor = (self.cursor as isize + delta).clamp(0, max) as usize;
        self.ensure_visible();
    }

    pub fn move_to(&mut self, index: usize) {
        if self.len == 0 {
            return;
        }
        self.cursor = index.min(self.len - 1);
        self.ensure_visible();
    }

    pub fn move_to_end(&mut self) {
        self.move_to(self.len.saturating_sub(1));
    }

    pub fn page(&mut self, direction: isize) {
        let step = self.height.max(1) as isize;
        self.move_by(step * direction.signum());
    }

    pub fn selected(&self) -> Option<usize> {
        (self.cursor < self.len).then_some(self.cursor)
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height.max(1);
        self.ensure_visible();
    }

    fn clamp(&mut self) {
        if self.len == 0 {
            self.cursor = 0;
            self.offset = 0;
            return;
        }
        self.cursor = self.cursor.min(self.len - 1);
        self.ensure_visible();
    }

    fn ensure_visible(&mut self) {
        let height = self.height.max(1);
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }
    }
}

/// Type-ahead query with debounced dispatch.
#[derive(Debug, Default)]
pub struct SearchBox {
    query: String,
    dispatched: Option<String>,
    last_edit: Option<Instant>,
    generation: u64,
}

impl SearchBox {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn push(&mut self, ch: char, now: Instant) {
        self.query.push(ch);
        self.last_edit = Some(now);
    }

    pub fn pop(&mut self, now: Instant) {
        if self.query.pop().is_some() {
            self.last_edit = Some(now);
        }
    }

    pub fn clear(&mut self, now: Instant) {
        if !self.query.is_empty() {
            self.query.clear();
            self.last_edit = Some(now);
        }
    }

    /// Query to send, once typing has paused and the text has changed.
    ///
    /// Each returned query carries a new generation; responses tagged with
    /// an older one are stale.
    pub fn poll(&mut self, now: Instant) -> Option<(u64, String)> {
        let edited = self.last_edit?;
        if now.duration_since(edited) < SEARCH_DEBOUNCE {
            return None;
        }
        self.last_edit = None;

        let query = self.query.trim().to_string();
        if self.dispatched.as_deref() == Some(query.as_str()) {
            return None;
        }
        self.dispatched = Some(query.clone());
        self.generation += 1;
        Some((self.generation, query))
    }

    /// Dispatch the current query immediately, e.g. on Enter or paging.
    pub fn force(&mut self) -> (u64, String) {
        let query = self.query.trim().to_string();
        self.last_edit = None;
        self.dispatched = Some(query.clone());
        self.generation += 1;
        (self.generation, query)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }
}

/// Release date rendered as `31 March 1999`, or the raw text when unparsable.
pub fn format_release_date(raw: Option<&str>) -> String {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(|date| date.format("%d %B %Y").to_string())
            .unwrap_or_else(|_| value.to_string()),
        None => "—".to_string(),
    }
}
