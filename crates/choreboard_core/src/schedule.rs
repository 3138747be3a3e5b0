//! crates/choreboard_core/src/schedule.rs
//!
//! The schedule predicate: given a template's frequency rule and a calendar
//! date, decides whether an instance of that chore should exist on that date.
//! Pure and deterministic; all I/O lives behind the ports.

use chrono::{Datelike, NaiveDate};

use crate::domain::{FrequencyRule, TaskTemplate};

/// The outcome of asking whether a template generates on a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub generate: bool,
    /// For conditional schedules, the `HH:MM` time after which the instance
    /// becomes actionable. Copied onto the instance at creation.
    pub available_after: Option<String>,
}

impl Decision {
    fn yes() -> Self {
        Decision {
            generate: true,
            available_after: None,
        }
    }

    fn no() -> Self {
        Decision {
            generate: false,
            available_after: None,
        }
    }
}

/// Decides whether `template` should have an instance on `date`.
///
/// Templates without a parsed rule never generate (fail closed). The
/// every-other-day parity is anchored to a fixed epoch so any date can be
/// classified without reference to history, and repeated calls for the same
/// date always agree.
pub fn should_generate(template: &TaskTemplate, date: NaiveDate) -> Decision {
    let Some(rule) = &template.rule else {
        return Decision::no();
    };

    match rule {
        FrequencyRule::Daily => Decision::yes(),
        FrequencyRule::EveryOtherDay => {
            let days_since_epoch = (date - every_other_day_epoch()).num_days();
            // rem_euclid keeps the parity stable for dates before the epoch.
            if days_since_epoch.rem_euclid(2) == 0 {
                Decision::yes()
            } else {
                Decision::no()
            }
        }
        FrequencyRule::Weekly { weekday } => {
            if date.weekday() == *weekday {
                Decision::yes()
            } else {
                Decision::no()
            }
        }
        FrequencyRule::MonthlyByWeek { week_of_month } => {
            if week_of_month_bucket(date.day()) == *week_of_month {
                Decision::yes()
            } else {
                Decision::no()
            }
        }
        FrequencyRule::MonthlyByDay { day_of_month } => {
            if date.day() == *day_of_month {
                Decision::yes()
            } else {
                Decision::no()
            }
        }
        FrequencyRule::Semiannual { months } => {
            if months.contains(&date.month()) {
                Decision::yes()
            } else {
                Decision::no()
            }
        }
        FrequencyRule::Conditional {
            weekday,
            available_after,
        } => {
            if date.weekday() == *weekday {
                Decision {
                    generate: true,
                    available_after: available_after.clone(),
                }
            } else {
                Decision::no()
            }
        }
    }
}

/// 2020-01-01, the fixed anchor for the every-other-day parity.
fn every_other_day_epoch() -> NaiveDate {
    // Known-valid literal.
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

/// Fixed-width day buckets: 1-7 -> 1, 8-14 -> 2, 15-21 -> 3, 22-end -> 4.
/// Deliberately ignores the month's length and starting weekday.
fn week_of_month_bucket(day: u32) -> u32 {
    ((day - 1) / 7 + 1).min(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use uuid::Uuid;

    fn template(rule: Option<FrequencyRule>) -> TaskTemplate {
        TaskTemplate {
            id: Uuid::new_v4(),
            title: "dishes".to_string(),
            rule,
            assigned_to: Uuid::new_v4(),
            points_base: 1,
            active: true,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn daily_generates_every_date() {
        let t = template(Some(FrequencyRule::Daily));
        for d in [
            date(2020, 1, 1),
            date(2024, 2, 29),
            date(2025, 7, 4),
            date(2031, 12, 31),
        ] {
            assert!(should_generate(&t, d).generate);
        }
    }

    #[test]
    fn every_other_day_alternates_from_fixed_epoch() {
        let t = template(Some(FrequencyRule::EveryOtherDay));
        assert!(should_generate(&t, date(2020, 1, 1)).generate);
        assert!(!should_generate(&t, date(2020, 1, 2)).generate);
        assert!(should_generate(&t, date(2020, 1, 3)).generate);

        // Any two consecutive dates disagree.
        let mut d = date(2025, 3, 1);
        for _ in 0..60 {
            let next = d.succ_opt().unwrap();
            assert_ne!(
                should_generate(&t, d).generate,
                should_generate(&t, next).generate
            );
            d = next;
        }
    }

    #[test]
    fn every_other_day_is_stable_before_the_epoch() {
        let t = template(Some(FrequencyRule::EveryOtherDay));
        assert!(!should_generate(&t, date(2019, 12, 31)).generate);
        assert!(should_generate(&t, date(2019, 12, 30)).generate);
    }

    #[test]
    fn weekly_matches_day_of_week_only() {
        let t = template(Some(FrequencyRule::Weekly {
            weekday: Weekday::Thu,
        }));
        // 2025-01-02 is a Thursday.
        assert!(should_generate(&t, date(2025, 1, 2)).generate);
        assert!(!should_generate(&t, date(2025, 1, 3)).generate);
    }

    #[test]
    fn monthly_week_buckets_are_fixed_width() {
        let t = template(Some(FrequencyRule::MonthlyByWeek { week_of_month: 1 }));
        assert!(should_generate(&t, date(2025, 6, 3)).generate);
        assert!(!should_generate(&t, date(2025, 6, 10)).generate);

        // Days 22 and beyond all land in week 4, even the 29th-31st.
        let t4 = template(Some(FrequencyRule::MonthlyByWeek { week_of_month: 4 }));
        for day in [22, 28, 29, 30, 31] {
            assert!(should_generate(&t4, date(2025, 1, day)).generate);
        }
        assert!(!should_generate(&t4, date(2025, 1, 21)).generate);
    }

    #[test]
    fn monthly_by_day_matches_exact_day() {
        let t = template(Some(FrequencyRule::MonthlyByDay { day_of_month: 15 }));
        assert!(should_generate(&t, date(2025, 4, 15)).generate);
        assert!(!should_generate(&t, date(2025, 4, 16)).generate);
    }

    #[test]
    fn semiannual_matches_listed_months() {
        let t = template(Some(FrequencyRule::Semiannual { months: [1, 7] }));
        assert!(should_generate(&t, date(2025, 1, 20)).generate);
        assert!(should_generate(&t, date(2025, 7, 1)).generate);
        assert!(!should_generate(&t, date(2025, 2, 20)).generate);
    }

    #[test]
    fn conditional_matches_weekday_and_carries_time() {
        let t = template(Some(FrequencyRule::Conditional {
            weekday: Weekday::Thu,
            available_after: Some("16:00".to_string()),
        }));
        let thursday = should_generate(&t, date(2025, 1, 2));
        assert!(thursday.generate);
        assert_eq!(thursday.available_after.as_deref(), Some("16:00"));

        let friday = should_generate(&t, date(2025, 1, 3));
        assert!(!friday.generate);
        assert_eq!(friday.available_after, None);
    }

    #[test]
    fn template_without_a_rule_never_generates() {
        let t = template(None);
        assert!(!should_generate(&t, date(2025, 1, 1)).generate);
    }
}
