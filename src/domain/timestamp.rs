use time::macros::format_description;
use time::{Duration, OffsetDateTime};

const MILLIS_PER_DAY: i128 = 86_400_000;

/// Current time in the local offset. Falls back to UTC when the offset cannot
/// be determined (for example when other threads are alive on Unix).
pub fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Short relative form used in the session list: `14:05`, `yesterday`,
/// `3d ago`, `Oct 8`. `now` decides both the day count and the display offset.
pub fn format_timestamp(at: OffsetDateTime, now: OffsetDateTime) -> String {
    let local = at.to_offset(now.offset());
    match elapsed_days(at, now) {
        days if days <= 0 => local
            .format(format_description!("[hour repr:24]:[minute]"))
            .unwrap_or_default(),
        1 => "yesterday".to_string(),
        days @ 2..=6 => format!("{days}d ago"),
        _ => local
            .format(format_description!("[month repr:short] [day padding:none]"))
            .unwrap_or_default(),
    }
}

fn elapsed_days(at: OffsetDateTime, now: OffsetDateTime) -> i128 {
    let elapsed: Duration = now - at;
    elapsed.whole_milliseconds().div_euclid(MILLIS_PER_DAY)
}
