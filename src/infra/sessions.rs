use crate::domain::{SessionSummary, normalize_title};
use crate::infra::{RemoteMessage, ServiceError, SessionService};
use tracing::debug;

pub const SESSION_LIST_LIMIT: usize = 100;
pub const TITLE_LOOKUP_LIMIT: usize = 1000;
pub const PREVIEW_SESSION_LIMIT: usize = 20;
pub const PREVIEW_MESSAGE_LIMIT: usize = 10;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TitleLookup {
    pub session: SessionSummary,
    pub match_count: usize,
}

/// Sessions worth offering in the picker for `directory`, most recently
/// updated first. The first [`PREVIEW_SESSION_LIMIT`] carry a preview of the
/// last user message when one could be fetched.
pub fn list_candidate_sessions<S>(
    service: &S,
    directory: &str,
) -> Result<Vec<SessionSummary>, ServiceError>
where
    S: SessionService + Sync + ?Sized,
{
    let mut sessions: Vec<SessionSummary> = service
        .list(directory, SESSION_LIST_LIMIT)?
        .into_iter()
        .map(SessionSummary::from)
        .filter(|session| {
            session.directory == directory && session.is_interactive && session.has_activity()
        })
        .collect();
    sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    debug!(count = sessions.len(), directory, "candidate sessions");

    attach_previews(service, directory, &mut sessions);
    Ok(sessions)
}

fn attach_previews<S>(service: &S, directory: &str, sessions: &mut [SessionSummary])
where
    S: SessionService + Sync + ?Sized,
{
    let cutoff = sessions.len().min(PREVIEW_SESSION_LIMIT);
    std::thread::scope(|scope| {
        for session in &mut sessions[..cutoff] {
            scope.spawn(move || {
                session.last_user_message_preview = fetch_preview(service, &session.id, directory);
            });
        }
    });
}

/// Best effort: every failure is reported as "no preview".
pub fn fetch_preview<S>(service: &S, session_id: &str, directory: &str) -> Option<String>
where
    S: SessionService + ?Sized,
{
    match service.messages(session_id, directory, PREVIEW_MESSAGE_LIMIT) {
        Ok(messages) => last_user_text(&messages),
        Err(error) => {
            debug!(session_id, %error, "preview unavailable");
            None
        }
    }
}

/// Text of the newest user message that has any, scanning from the end.
pub fn last_user_text(messages: &[RemoteMessage]) -> Option<String> {
    messages
        .iter()
        .rev()
        .filter(|message| message.is_from_user())
        .find_map(|message| message.first_text().map(str::to_string))
}

/// Most recently updated interactive session in `directory` whose normalized
/// title equals the normalized `title`.
pub fn find_session_by_title<S>(
    service: &S,
    title: &str,
    directory: &str,
) -> Result<Option<TitleLookup>, ServiceError>
where
    S: SessionService + ?Sized,
{
    let wanted = normalize_title(title);
    let mut matches: Vec<SessionSummary> = service
        .list(directory, TITLE_LOOKUP_LIMIT)?
        .into_iter()
        .map(SessionSummary::from)
        .filter(|session| {
            session.directory == directory
                && session.is_interactive
                && normalize_title(&session.title) == wanted
        })
        .collect();
    matches.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let match_count = matches.len();
    Ok(matches
        .into_iter()
        .next()
        .map(|session| TitleLookup {
            session,
            match_count,
        }))
}
