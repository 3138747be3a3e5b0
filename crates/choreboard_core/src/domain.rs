//! crates/choreboard_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use uuid::Uuid;

/// The role of a household member. Parents manage templates, approve work
/// logs, and record chore outcomes; children are assignees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    Parent,
    Child,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Parent => "parent",
            MemberRole::Child => "child",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "parent" => Some(MemberRole::Parent),
            "child" => Some(MemberRole::Child),
            _ => None,
        }
    }
}

// Represents a household member - used throughout app
#[derive(Debug, Clone)]
pub struct Member {
    pub id: Uuid,
    pub display_name: String,
    pub role: MemberRole,
    pub email: Option<String>, // Only parents carry login credentials
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct MemberCredentials {
    pub member_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub member_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// The identity attached to instances for display: who a chore belongs to.
#[derive(Debug, Clone)]
pub struct MemberRef {
    pub id: Uuid,
    pub display_name: String,
}

/// How often a recurring chore generates instances.
///
/// Each variant carries only the fields its rule needs, so a template with
/// the wrong field for its frequency kind is unrepresentable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrequencyRule {
    Daily,
    EveryOtherDay,
    Weekly { weekday: Weekday },
    /// Fixed 7-day buckets: days 1-7 are week 1, 8-14 week 2, 15-21 week 3,
    /// 22 through month end week 4. Not a calendar-aware "first Monday" rule.
    MonthlyByWeek { week_of_month: u32 },
    MonthlyByDay { day_of_month: u32 },
    Semiannual { months: [u32; 2] },
    /// Like `Weekly`, but the instance only becomes actionable after a
    /// wall-clock time. The `HH:MM` string is carried through uninterpreted.
    Conditional {
        weekday: Weekday,
        available_after: Option<String>,
    },
}

impl FrequencyRule {
    /// Builds a rule from the raw columns a template row stores.
    ///
    /// Returns `None` for unknown frequency types, missing required fields,
    /// or an unparseable semiannual month list. A template without a rule
    /// never generates instances; misconfiguration must suppress a chore,
    /// not abort materialization for every other template that day.
    pub fn from_parts(
        frequency_type: &str,
        day_of_week: Option<i32>,
        week_of_month: Option<i32>,
        day_of_month: Option<i32>,
        semiannual_months: Option<&str>,
        conditional_after_time: Option<&str>,
    ) -> Option<Self> {
        match frequency_type {
            "DAILY" => Some(FrequencyRule::Daily),
            "EVERY_OTHER_DAY" => Some(FrequencyRule::EveryOtherDay),
            "WEEKLY" => {
                let weekday = weekday_from_sunday_index(day_of_week?)?;
                Some(FrequencyRule::Weekly { weekday })
            }
            "MONTHLY" => {
                // weekOfMonth takes precedence when both columns are set.
                if let Some(week) = week_of_month {
                    if (1..=4).contains(&week) {
                        return Some(FrequencyRule::MonthlyByWeek {
                            week_of_month: week as u32,
                        });
                    }
                    return None;
                }
                let day = day_of_month?;
                if (1..=31).contains(&day) {
                    Some(FrequencyRule::MonthlyByDay {
                        day_of_month: day as u32,
                    })
                } else {
                    None
                }
            }
            "SEMIANNUAL" => {
                let months = parse_semiannual_months(semiannual_months?)?;
                Some(FrequencyRule::Semiannual { months })
            }
            "CONDITIONAL_SCHEDULE" => {
                let weekday = weekday_from_sunday_index(day_of_week?)?;
                Some(FrequencyRule::Conditional {
                    weekday,
                    available_after: conditional_after_time.map(str::to_string),
                })
            }
            _ => None,
        }
    }
}

/// Maps the stored 0-6 day index (0 = Sunday) onto a `chrono::Weekday`.
fn weekday_from_sunday_index(index: i32) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// Parses the stored semiannual month list, e.g. `"[1,7]"` or `"1,7"`.
/// Exactly two months, each 1-12, or the rule is rejected.
fn parse_semiannual_months(raw: &str) -> Option<[u32; 2]> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let mut months = trimmed.split(',').map(|part| part.trim().parse::<u32>());
    let first = months.next()?.ok()?;
    let second = months.next()?.ok()?;
    if months.next().is_some() {
        return None;
    }
    if (1..=12).contains(&first) && (1..=12).contains(&second) {
        Some([first, second])
    } else {
        None
    }
}

/// Represents one recurring chore definition.
#[derive(Debug, Clone)]
pub struct TaskTemplate {
    pub id: Uuid,
    pub title: String,
    /// `None` means the stored rule columns did not parse; the template is
    /// kept visible for editing but never generates.
    pub rule: Option<FrequencyRule>,
    pub assigned_to: Uuid,
    pub points_base: i32,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceStatus {
    Pending,
    Done,
    Missed,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Pending => "PENDING",
            InstanceStatus::Done => "DONE",
            InstanceStatus::Missed => "MISSED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(InstanceStatus::Pending),
            "DONE" => Some(InstanceStatus::Done),
            "MISSED" => Some(InstanceStatus::Missed),
            _ => None,
        }
    }
}

/// Represents one concrete, dated occurrence of a template.
#[derive(Debug, Clone)]
pub struct TaskInstance {
    pub id: Uuid,
    pub template_id: Uuid,
    pub task_date: NaiveDate,
    pub assigned_to: Uuid,
    pub status: InstanceStatus,
    pub done_without_reminder: bool,
    pub complaint_logged: bool,
    pub is_extra: bool,
    pub available_after: Option<String>,
}

/// An instance joined with its template's base points and the assignee's
/// display identity, as returned by the summary query.
#[derive(Debug, Clone)]
pub struct WeekInstance {
    pub instance: TaskInstance,
    /// `None` when the template row no longer exists; scoring falls back
    /// to the default base of 1.
    pub points_base: Option<i32>,
    pub member: MemberRef,
}

/// The weekly qualitative score tier shown to parents and children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Green,
    Yellow,
    Red,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Green => "green",
            Classification::Yellow => "yellow",
            Classification::Red => "red",
        }
    }
}

/// One member's row in the weekly breakdown. Built fresh per request,
/// never persisted.
#[derive(Debug, Clone)]
pub struct WeeklySummaryRow {
    pub member: MemberRef,
    pub total_points: i32,
    pub classification: Classification,
    pub instances: Vec<WeekInstance>,
    pub missed: Vec<WeekInstance>,
}

/// Represents a paid household project children log hours against.
#[derive(Debug, Clone)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub hourly_rate: f64,
    pub created_by: Uuid,
}

/// Represents hours a member worked on a project. Only approved logs
/// count toward earnings.
#[derive(Debug, Clone)]
pub struct WorkLog {
    pub id: Uuid,
    pub project_id: Uuid,
    pub member_id: Uuid,
    pub hours: f64,
    pub note: Option<String>,
    pub approved: bool,
    pub logged_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekly_rule_requires_day_of_week() {
        assert_eq!(
            FrequencyRule::from_parts("WEEKLY", None, None, None, None, None),
            None
        );
        assert_eq!(
            FrequencyRule::from_parts("WEEKLY", Some(4), None, None, None, None),
            Some(FrequencyRule::Weekly {
                weekday: Weekday::Thu
            })
        );
    }

    #[test]
    fn monthly_prefers_week_of_month() {
        let rule = FrequencyRule::from_parts("MONTHLY", None, Some(2), Some(15), None, None);
        assert_eq!(rule, Some(FrequencyRule::MonthlyByWeek { week_of_month: 2 }));

        let rule = FrequencyRule::from_parts("MONTHLY", None, None, Some(15), None, None);
        assert_eq!(rule, Some(FrequencyRule::MonthlyByDay { day_of_month: 15 }));

        assert_eq!(
            FrequencyRule::from_parts("MONTHLY", None, None, None, None, None),
            None
        );
    }

    #[test]
    fn semiannual_months_parse_both_shapes() {
        let expected = Some(FrequencyRule::Semiannual { months: [1, 7] });
        assert_eq!(
            FrequencyRule::from_parts("SEMIANNUAL", None, None, None, Some("[1,7]"), None),
            expected
        );
        assert_eq!(
            FrequencyRule::from_parts("SEMIANNUAL", None, None, None, Some("1, 7"), None),
            expected
        );
    }

    #[test]
    fn semiannual_rejects_garbage() {
        for raw in ["", "[1]", "[1,2,3]", "[0,7]", "[1,13]", "jan,jul"] {
            assert_eq!(
                FrequencyRule::from_parts("SEMIANNUAL", None, None, None, Some(raw), None),
                None,
                "accepted {raw:?}"
            );
        }
        assert_eq!(
            FrequencyRule::from_parts("SEMIANNUAL", None, None, None, None, None),
            None
        );
    }

    #[test]
    fn unknown_frequency_type_yields_no_rule() {
        assert_eq!(
            FrequencyRule::from_parts("FORTNIGHTLY", Some(1), None, None, None, None),
            None
        );
    }

    #[test]
    fn conditional_carries_time_through() {
        let rule = FrequencyRule::from_parts(
            "CONDITIONAL_SCHEDULE",
            Some(4),
            None,
            None,
            None,
            Some("15:30"),
        );
        assert_eq!(
            rule,
            Some(FrequencyRule::Conditional {
                weekday: Weekday::Thu,
                available_after: Some("15:30".to_string()),
            })
        );
        assert_eq!(
            FrequencyRule::from_parts(
                "CONDITIONAL_SCHEDULE",
                None,
                None,
                None,
                None,
                Some("15:30")
            ),
            None
        );
    }
}
