//! crates/choreboard_core/src/scoring.rs
//!
//! Converts recorded chore outcomes into point deltas and folds a week of
//! instances into per-member totals and classification bands.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::domain::{Classification, InstanceStatus, WeekInstance, WeeklySummaryRow};

/// The point delta one instance contributes to its assignee's week.
///
/// A completed chore earns the template's base points, plus one when it was
/// done without a reminder, minus one when a complaint was logged. A missed
/// chore costs 2 points, 3 with a complaint. Anything still pending counts
/// for nothing unless it was a voluntary extra, which earns a flat 2.
pub fn points_for_instance(inst: &WeekInstance) -> i32 {
    let instance = &inst.instance;
    match instance.status {
        InstanceStatus::Done => {
            // Default base of 1 when the template row is gone.
            let mut points = inst.points_base.unwrap_or(1);
            if instance.done_without_reminder {
                points += 1;
            }
            if instance.complaint_logged {
                points -= 1;
            }
            points
        }
        InstanceStatus::Missed => {
            if instance.complaint_logged {
                -3
            } else {
                -2
            }
        }
        InstanceStatus::Pending => {
            if instance.is_extra {
                2
            } else {
                0
            }
        }
    }
}

/// Classifies a weekly point total into the band shown in the UI.
/// Boundaries are inclusive on the lower edge: 40 is green, 25 is yellow,
/// 24 is red.
pub fn classify_week(total_points: i32) -> Classification {
    if total_points >= 40 {
        Classification::Green
    } else if total_points >= 25 {
        Classification::Yellow
    } else {
        Classification::Red
    }
}

/// The inclusive 7-day span starting at `week_start`. The start date is
/// treated as that week's Monday by convention; this is not enforced.
pub fn week_range(week_start: NaiveDate) -> (NaiveDate, NaiveDate) {
    (week_start, week_start + Duration::days(6))
}

/// Groups a week's instances by assignee, sums their points, classifies the
/// total, and keeps the missed subset for display. Rows come back sorted by
/// display name so the output is stable.
pub fn summarize_week(instances: Vec<WeekInstance>) -> Vec<WeeklySummaryRow> {
    let mut by_member: HashMap<Uuid, WeeklySummaryRow> = HashMap::new();

    for inst in instances {
        let points = points_for_instance(&inst);
        let row = by_member
            .entry(inst.member.id)
            .or_insert_with(|| WeeklySummaryRow {
                member: inst.member.clone(),
                total_points: 0,
                classification: Classification::Red,
                instances: Vec::new(),
                missed: Vec::new(),
            });
        row.total_points += points;
        if inst.instance.status == InstanceStatus::Missed {
            row.missed.push(inst.clone());
        }
        row.instances.push(inst);
    }

    let mut rows: Vec<WeeklySummaryRow> = by_member
        .into_values()
        .map(|mut row| {
            row.classification = classify_week(row.total_points);
            row
        })
        .collect();
    rows.sort_by(|a, b| a.member.display_name.cmp(&b.member.display_name));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MemberRef, TaskInstance};

    fn instance(status: InstanceStatus) -> TaskInstance {
        TaskInstance {
            id: Uuid::new_v4(),
            template_id: Uuid::new_v4(),
            task_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            assigned_to: Uuid::new_v4(),
            status,
            done_without_reminder: false,
            complaint_logged: false,
            is_extra: false,
            available_after: None,
        }
    }

    fn week_instance(status: InstanceStatus, member: &MemberRef) -> WeekInstance {
        let mut inst = instance(status);
        inst.assigned_to = member.id;
        WeekInstance {
            instance: inst,
            points_base: Some(1),
            member: member.clone(),
        }
    }

    fn member(name: &str) -> MemberRef {
        MemberRef {
            id: Uuid::new_v4(),
            display_name: name.to_string(),
        }
    }

    #[test]
    fn done_scores_base_and_modifiers() {
        let m = member("Ada");
        let mut done = week_instance(InstanceStatus::Done, &m);
        assert_eq!(points_for_instance(&done), 1);

        done.instance.done_without_reminder = true;
        assert_eq!(points_for_instance(&done), 2);

        done.instance.done_without_reminder = false;
        done.instance.complaint_logged = true;
        assert_eq!(points_for_instance(&done), 0);

        done.instance.complaint_logged = false;
        done.points_base = Some(3);
        assert_eq!(points_for_instance(&done), 3);

        // Template row gone: fall back to base 1.
        done.points_base = None;
        assert_eq!(points_for_instance(&done), 1);
    }

    #[test]
    fn missed_scores_minus_two_or_three() {
        let m = member("Ada");
        let mut missed = week_instance(InstanceStatus::Missed, &m);
        assert_eq!(points_for_instance(&missed), -2);

        missed.instance.complaint_logged = true;
        assert_eq!(points_for_instance(&missed), -3);
    }

    #[test]
    fn pending_scores_zero_unless_extra() {
        let m = member("Ada");
        let mut pending = week_instance(InstanceStatus::Pending, &m);
        assert_eq!(points_for_instance(&pending), 0);

        pending.instance.is_extra = true;
        assert_eq!(points_for_instance(&pending), 2);
    }

    #[test]
    fn classification_boundaries_are_exact() {
        assert_eq!(classify_week(50), Classification::Green);
        assert_eq!(classify_week(40), Classification::Green);
        assert_eq!(classify_week(39), Classification::Yellow);
        assert_eq!(classify_week(25), Classification::Yellow);
        assert_eq!(classify_week(24), Classification::Red);
        assert_eq!(classify_week(0), Classification::Red);
        assert_eq!(classify_week(-3), Classification::Red);
    }

    #[test]
    fn week_range_spans_seven_days_inclusive() {
        let start = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let (from, to) = week_range(start);
        assert_eq!(from, start);
        assert_eq!(to, NaiveDate::from_ymd_opt(2025, 6, 8).unwrap());
    }

    #[test]
    fn summary_groups_by_member_and_keeps_missed() {
        let ada = member("Ada");
        let ben = member("Ben");

        let mut done_clean = week_instance(InstanceStatus::Done, &ada);
        done_clean.instance.done_without_reminder = true; // 2 points
        let missed = week_instance(InstanceStatus::Missed, &ada); // -2
        let ben_done = week_instance(InstanceStatus::Done, &ben); // 1

        let rows = summarize_week(vec![done_clean, missed.clone(), ben_done]);
        assert_eq!(rows.len(), 2);

        let ada_row = &rows[0];
        assert_eq!(ada_row.member.display_name, "Ada");
        assert_eq!(ada_row.total_points, 0);
        assert_eq!(ada_row.classification, Classification::Red);
        assert_eq!(ada_row.instances.len(), 2);
        assert_eq!(ada_row.missed.len(), 1);
        assert_eq!(ada_row.missed[0].instance.id, missed.instance.id);

        let ben_row = &rows[1];
        assert_eq!(ben_row.total_points, 1);
        assert_eq!(ben_row.missed.len(), 0);
    }
}
