use crate::domain::SessionSummary;

const START_BONUS: u32 = 10;
const SEPARATOR_BONUS: u32 = 5;

pub fn matches(query: &str, title: &str) -> bool {
    let query = lower_chars(query);
    let mut next = 0usize;
    for ch in title.to_lowercase().chars() {
        if next == query.len() {
            break;
        }
        if ch == query[next] {
            next += 1;
        }
    }
    next == query.len()
}

/// Ranking score for a title that matches `query`, 0 when it does not. The
/// title is walked once, greedily taking the first occurrence of each query
/// character, so a later alignment that would score higher is never tried.
pub fn score(query: &str, title: &str) -> u32 {
    let query = lower_chars(query);
    let title = lower_chars(title);

    let mut total = 0u32;
    let mut next = 0usize;
    let mut run = 0u32;

    for (idx, &ch) in title.iter().enumerate() {
        if next == query.len() {
            break;
        }
        if ch != query[next] {
            run = 0;
            continue;
        }

        next += 1;
        run += 1;
        total += run * 2;
        if idx == 0 {
            total += START_BONUS;
        } else if is_separator(title[idx - 1]) {
            total += SEPARATOR_BONUS;
        }
    }

    if next == query.len() { total } else { 0 }
}

/// Keeps sessions whose title matches `query`, best score first. Equal scores
/// keep their incoming order; an empty query returns the list untouched.
pub fn filter_and_rank<'a>(sessions: &'a [SessionSummary], query: &str) -> Vec<&'a SessionSummary> {
    if query.is_empty() {
        return sessions.iter().collect();
    }

    let mut ranked: Vec<(u32, &SessionSummary)> = sessions
        .iter()
        .filter(|session| matches(query, &session.title))
        .map(|session| (score(query, &session.title), session))
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked.into_iter().map(|(_, session)| session).collect()
}

fn lower_chars(text: &str) -> Vec<char> {
    text.to_lowercase().chars().collect()
}

fn is_separator(ch: char) -> bool {
    ch.is_whitespace() || ch == '-' || ch == '_'
}
