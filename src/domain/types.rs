use time::OffsetDateTime;

/// Title used for a new session when the user did not type one.
pub const DEFAULT_SESSION_TITLE: &str = "general";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub directory: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub is_interactive: bool,
    pub last_user_message_preview: Option<String>,
}

impl SessionSummary {
    /// Sessions that were never touched after creation carry nothing worth resuming.
    pub fn has_activity(&self) -> bool {
        self.updated_at != self.created_at
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PickerResult {
    Existing { session_id: String },
    New { title: String },
}

impl PickerResult {
    pub fn new_session(title: &str) -> Self {
        let title = if title.is_empty() {
            DEFAULT_SESSION_TITLE
        } else {
            title
        };
        Self::New {
            title: title.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyEvent {
    Up,
    Down,
    Enter,
    Backspace,
    Escape,
    Interrupt,
    CreateNew,
    Char(char),
}

/// Lower-cases the title and turns whitespace and underscores into hyphens, so
/// `API Server`, `api_server` and `api-server` all compare equal.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|ch| {
            if ch.is_whitespace() || ch == '_' {
                '-'
            } else {
                ch
            }
        })
        .collect()
}

pub fn unix_ms_to_datetime(ms: i64) -> OffsetDateTime {
    let nanos = i128::from(ms).saturating_mul(1_000_000);
    OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}
