use crate::config::TimeWindowSettings;
use crate::error::TimeWindowError;
use crate::types::TimeWindow;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

/// How far `end` may sit past "now" before the window is rejected.
const CLOCK_SKEW_TOLERANCE_HOURS: i64 = 1;

/// Windows wider than this draw an advisory warning.
const WIDE_WINDOW_DAYS: i64 = 90;

/// Parse an ISO-8601 timestamp into a UTC instant.
///
/// Accepted shapes: full RFC 3339 (with offset or `Z`), a naive
/// datetime (assumed UTC), or a bare date (midnight UTC).
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, TimeWindowError> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc());
    }

    Err(TimeWindowError::Parse {
        input: input.to_string(),
    })
}

/// Resolve the run's time window.
///
/// Priority order: explicit arguments, then persisted config values,
/// then the computed default `[now - default_days, now)`.
pub fn resolve(
    start_arg: Option<&str>,
    end_arg: Option<&str>,
    settings: &TimeWindowSettings,
) -> Result<TimeWindow, TimeWindowError> {
    resolve_at(start_arg, end_arg, settings, Utc::now())
}

pub fn resolve_at(
    start_arg: Option<&str>,
    end_arg: Option<&str>,
    settings: &TimeWindowSettings,
    now: DateTime<Utc>,
) -> Result<TimeWindow, TimeWindowError> {
    let span = Duration::days(settings.default_days);

    let start = match start_arg.or(settings.start.as_deref()) {
        Some(text) => Some(parse_timestamp(text)?),
        None => None,
    };
    let end = match end_arg.or(settings.end.as_deref()) {
        Some(text) => Some(parse_timestamp(text)?),
        None => None,
    };

    let (start, end) = match (start, end) {
        (Some(start), Some(end)) => (start, end),
        // Only the end is known: look back one span from it.
        (None, Some(end)) => (end - span, end),
        // Only the start is known: look forward, clamped to now.
        (Some(start), None) => (start, (start + span).min(now)),
        (None, None) => (now - span, now),
    };

    let window = TimeWindow { start, end };
    validate_at(&window, now)?;
    Ok(window)
}

fn validate_at(window: &TimeWindow, now: DateTime<Utc>) -> Result<(), TimeWindowError> {
    if window.start >= window.end {
        return Err(TimeWindowError::StartNotBeforeEnd {
            start: window.start.to_rfc3339(),
            end: window.end.to_rfc3339(),
        });
    }

    if window.end > now + Duration::hours(CLOCK_SKEW_TOLERANCE_HOURS) {
        return Err(TimeWindowError::EndInFuture {
            end: window.end.to_rfc3339(),
        });
    }

    let window_days = (window.end - window.start).num_days();
    if window_days > WIDE_WINDOW_DAYS {
        warn!("Large time window ({window_days} days). This may take a while.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn settings() -> TimeWindowSettings {
        TimeWindowSettings {
            start: None,
            end: None,
            default_days: 7,
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn parses_rfc3339_with_zulu_suffix() {
        let dt = parse_timestamp("2025-01-01T00:00:00Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_explicit_offset_and_normalizes_to_utc() {
        let dt = parse_timestamp("2025-01-01T02:00:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_naive_datetime_as_utc() {
        let dt = parse_timestamp("2025-01-01T06:30:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 1, 6, 30, 0).unwrap());
    }

    #[test]
    fn parses_bare_date_as_midnight_utc() {
        let dt = parse_timestamp("2025-01-01").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn unparseable_input_names_the_offender() {
        let err = parse_timestamp("next tuesday").unwrap_err();
        match err {
            TimeWindowError::Parse { input } => assert_eq!(input, "next tuesday"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn no_inputs_yields_default_span_ending_now() {
        let now = fixed_now();
        let window = resolve_at(None, None, &settings(), now).unwrap();
        assert_eq!(window.end, now);
        assert_eq!(window.end - window.start, Duration::days(7));
        assert!(window.start < window.end);
    }

    #[test]
    fn explicit_args_win_over_config() {
        let config = TimeWindowSettings {
            start: Some("2025-03-01".to_string()),
            end: Some("2025-03-08".to_string()),
            default_days: 7,
        };
        let window =
            resolve_at(Some("2025-05-01"), Some("2025-05-02"), &config, fixed_now()).unwrap();
        assert_eq!(
            window.start,
            Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            window.end,
            Utc.with_ymd_and_hms(2025, 5, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn config_values_apply_when_args_are_absent() {
        let config = TimeWindowSettings {
            start: Some("2025-03-01".to_string()),
            end: Some("2025-03-08T06:00:00".to_string()),
            default_days: 7,
        };
        let window = resolve_at(None, None, &config, fixed_now()).unwrap();
        assert_eq!(
            window.start,
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            window.end,
            Utc.with_ymd_and_hms(2025, 3, 8, 6, 0, 0).unwrap()
        );
    }

    #[test]
    fn end_only_derives_start_one_span_back() {
        let window = resolve_at(None, Some("2025-06-10"), &settings(), fixed_now()).unwrap();
        assert_eq!(
            window.start,
            Utc.with_ymd_and_hms(2025, 6, 3, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn start_only_derives_end_clamped_to_now() {
        let now = fixed_now();
        // A start less than one span ago: derived end clamps to now.
        let window = resolve_at(Some("2025-06-12"), None, &settings(), now).unwrap();
        assert_eq!(window.end, now);

        // A start more than one span ago: full span applies.
        let window = resolve_at(Some("2025-05-01"), None, &settings(), now).unwrap();
        assert_eq!(
            window.end,
            Utc.with_ymd_and_hms(2025, 5, 8, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        let result = resolve_at(
            Some("2025-06-10"),
            Some("2025-06-01"),
            &settings(),
            fixed_now(),
        );
        assert!(matches!(
            result,
            Err(TimeWindowError::StartNotBeforeEnd { .. })
        ));
    }

    #[test]
    fn far_future_end_is_rejected() {
        let result = resolve_at(
            Some("2025-06-01"),
            Some("2025-07-01"),
            &settings(),
            fixed_now(),
        );
        assert!(matches!(result, Err(TimeWindowError::EndInFuture { .. })));
    }

    #[test]
    fn end_within_clock_skew_tolerance_is_accepted() {
        let now = fixed_now();
        let slightly_ahead = now + Duration::minutes(30);
        let window = resolve_at(
            Some("2025-06-14T00:00:00Z"),
            Some(&slightly_ahead.to_rfc3339()),
            &settings(),
            now,
        )
        .unwrap();
        assert_eq!(window.end, slightly_ahead);
    }

    #[test]
    fn wide_window_is_accepted() {
        let window = resolve_at(
            Some("2024-06-01"),
            Some("2025-06-01"),
            &settings(),
            fixed_now(),
        )
        .unwrap();
        assert!((window.end - window.start).num_days() > 90);
    }
}
