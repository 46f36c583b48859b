//! Symbolic and explicit report time windows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A report time window: one of the closed set of presets, or an explicit
/// date pair. Presets are persisted symbolically and re-resolved against
/// "today" at fetch time, so re-running a report on a later day samples a
/// shifted window; reconciled rows are snapshot-frozen once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeRange {
    Preset(PresetRange),
    Custom {
        #[serde(rename = "startDate")]
        start_date: String,
        #[serde(rename = "endDate")]
        end_date: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetRange {
    Last7Days,
    Last28Days,
    Last3Months,
}

impl PresetRange {
    /// Window length in days. "3 months" is a fixed 90-day offset, not
    /// calendar-month arithmetic; the approximation is load-bearing for
    /// output stability.
    fn days_back(self) -> i64 {
        match self {
            PresetRange::Last7Days => 7,
            PresetRange::Last28Days => 28,
            PresetRange::Last3Months => 90,
        }
    }

    fn key(self) -> &'static str {
        match self {
            PresetRange::Last7Days => "last7days",
            PresetRange::Last28Days => "last28days",
            PresetRange::Last3Months => "last3months",
        }
    }
}

/// A concrete window produced by [`TimeRange::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

fn parse_iso_date(raw: &str) -> Result<NaiveDate, CoreError> {
    // The wire contract is strict YYYY-MM-DD; chrono alone would also accept
    // unpadded components.
    let strict = raw.len() == 10 && raw.as_bytes()[4] == b'-' && raw.as_bytes()[7] == b'-';
    if !strict {
        return Err(CoreError::InvalidRangeFormat(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| CoreError::InvalidRangeFormat(raw.to_string()))
}

impl TimeRange {
    /// Resolve to a concrete window relative to `today`.
    ///
    /// Presets end at `today` and start a fixed number of days earlier.
    /// Explicit ranges pass through after format and ordering validation.
    pub fn resolve(&self, today: NaiveDate) -> Result<ResolvedRange, CoreError> {
        match self {
            TimeRange::Preset(preset) => Ok(ResolvedRange {
                start_date: today - chrono::Duration::days(preset.days_back()),
                end_date: today,
            }),
            TimeRange::Custom {
                start_date,
                end_date,
            } => {
                let start = parse_iso_date(start_date)?;
                let end = parse_iso_date(end_date)?;
                if end < start {
                    return Err(CoreError::InvalidRangeFormat(format!(
                        "{start_date}..{end_date}"
                    )));
                }
                Ok(ResolvedRange {
                    start_date: start,
                    end_date: end,
                })
            }
        }
    }

    /// Stable identifier used in reconciled-row metric keys and duplicate
    /// checks: the preset tag as-is, `custom_{start}_{end}` for explicit
    /// ranges.
    pub fn range_key(&self) -> String {
        match self {
            TimeRange::Preset(preset) => preset.key().to_string(),
            TimeRange::Custom {
                start_date,
                end_date,
            } => format!("custom_{start_date}_{end_date}"),
        }
    }

    /// Compact label for column headers, e.g. `Clicks (L7D)`.
    pub fn short_label(&self) -> &'static str {
        match self {
            TimeRange::Preset(PresetRange::Last7Days) => "L7D",
            TimeRange::Preset(PresetRange::Last28Days) => "L28D",
            TimeRange::Preset(PresetRange::Last3Months) => "L3M",
            TimeRange::Custom { .. } => "Custom",
        }
    }

    /// Human-readable label for tooltips and report listings.
    pub fn long_label(&self) -> String {
        match self {
            TimeRange::Preset(PresetRange::Last7Days) => "Last 7 Days".to_string(),
            TimeRange::Preset(PresetRange::Last28Days) => "Last 28 Days".to_string(),
            TimeRange::Preset(PresetRange::Last3Months) => "Last 3 Months".to_string(),
            TimeRange::Custom {
                start_date,
                end_date,
            } => format!("{start_date} to {end_date}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    #[test]
    fn presets_resolve_to_fixed_day_offsets() {
        let today = day(2026, 8, 29);
        for (preset, back) in [
            (PresetRange::Last7Days, 7),
            (PresetRange::Last28Days, 28),
            (PresetRange::Last3Months, 90),
        ] {
            let resolved = TimeRange::Preset(preset).resolve(today).expect("resolve");
            assert_eq!(resolved.end_date, today);
            assert_eq!(resolved.start_date, today - chrono::Duration::days(back));
        }
    }

    #[test]
    fn three_months_is_ninety_days_not_calendar_months() {
        // Calendar-month subtraction from 2026-05-31 would land on
        // 2026-02-28; the fixed offset must not.
        let today = day(2026, 5, 31);
        let resolved = TimeRange::Preset(PresetRange::Last3Months)
            .resolve(today)
            .expect("resolve");
        assert_eq!(resolved.start_date, day(2026, 3, 2));
    }

    #[test]
    fn custom_range_passes_through_validated() {
        let range = TimeRange::Custom {
            start_date: "2024-01-01".to_string(),
            end_date: "2024-01-31".to_string(),
        };
        let resolved = range.resolve(day(2026, 8, 29)).expect("resolve");
        assert_eq!(resolved.start_date, day(2024, 1, 1));
        assert_eq!(resolved.end_date, day(2024, 1, 31));
    }

    #[test]
    fn custom_range_rejects_malformed_dates() {
        for (start, end) in [
            ("2024-1-01", "2024-01-31"),
            ("2024-01-01", "31/01/2024"),
            ("not-a-date", "2024-01-31"),
        ] {
            let range = TimeRange::Custom {
                start_date: start.to_string(),
                end_date: end.to_string(),
            };
            let err = range.resolve(day(2026, 8, 29)).expect_err("should fail");
            assert!(matches!(err, CoreError::InvalidRangeFormat(_)));
        }
    }

    #[test]
    fn custom_range_rejects_inverted_dates() {
        let range = TimeRange::Custom {
            start_date: "2024-02-10".to_string(),
            end_date: "2024-02-01".to_string(),
        };
        assert!(matches!(
            range.resolve(day(2026, 8, 29)),
            Err(CoreError::InvalidRangeFormat(_))
        ));
    }

    #[test]
    fn range_keys_are_stable() {
        assert_eq!(
            TimeRange::Preset(PresetRange::Last7Days).range_key(),
            "last7days"
        );
        let custom = TimeRange::Custom {
            start_date: "2024-01-01".to_string(),
            end_date: "2024-01-31".to_string(),
        };
        assert_eq!(custom.range_key(), "custom_2024-01-01_2024-01-31");
    }

    #[test]
    fn labels_for_presets_and_custom() {
        let preset = TimeRange::Preset(PresetRange::Last3Months);
        assert_eq!(preset.short_label(), "L3M");
        assert_eq!(preset.long_label(), "Last 3 Months");

        let custom = TimeRange::Custom {
            start_date: "2024-01-01".to_string(),
            end_date: "2024-01-31".to_string(),
        };
        assert_eq!(custom.short_label(), "Custom");
        assert_eq!(custom.long_label(), "2024-01-01 to 2024-01-31");
    }

    #[test]
    fn serde_round_trips_both_shapes() {
        let preset: TimeRange = serde_json::from_str("\"last28days\"").expect("preset");
        assert_eq!(preset, TimeRange::Preset(PresetRange::Last28Days));

        let custom: TimeRange =
            serde_json::from_str(r#"{"startDate":"2024-01-01","endDate":"2024-01-31"}"#)
                .expect("custom");
        assert_eq!(
            serde_json::to_value(&custom).expect("json"),
            serde_json::json!({"startDate": "2024-01-01", "endDate": "2024-01-31"})
        );
    }
}
