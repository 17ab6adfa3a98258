//! Time utilities: timezone-aware deadline entry and display.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

/// Parse a deadline typed by a user in an IANA tz like "America/Chicago",
/// returning UTC.
///
/// Accepts "2026-02-20 23:59", a bare date "2026-02-20" (end of day), or a
/// full RFC 3339 timestamp (the tz is then ignored).
pub fn parse_local_deadline_to_utc(local: &str, tz: &str) -> Result<DateTime<Utc>> {
    let local = local.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(local) {
        return Ok(dt.with_timezone(&Utc));
    }

    let tz = parse_timezone(tz)?;

    let ndt = match NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M") {
        Ok(ndt) => ndt,
        Err(e) => NaiveDate::parse_from_str(local, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(23, 59, 0))
            .ok_or_else(|| anyhow::anyhow!("invalid local datetime '{local}': {e}"))?,
    };

    let local_dt = tz
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| anyhow::anyhow!("ambiguous or invalid local time (DST?): {local} {tz}"))?;

    Ok(local_dt.with_timezone(&Utc))
}

/// Format a UTC time in `tz` as "2026-02-20 23:59".
pub fn format_local(dt: DateTime<Utc>, tz: Tz) -> String {
    dt.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string()
}
