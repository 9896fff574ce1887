//! Expansion of working-hours windows into candidate slots

use chrono::Weekday;

use super::clock::TimeOfDay;
use crate::models::working_hours::WorkingHoursRule;

/// Hard-coded opening hours used when nothing is configured
const WEEKDAY_OPEN: (u16, u16) = (8, 0);
const WEEKDAY_CLOSE: (u16, u16) = (18, 0);
const SATURDAY_CLOSE: (u16, u16) = (16, 0);
const TEMPLATE_INTERVAL: u16 = 30;

/// Slots from `start` stepping by `interval_minutes`, end exclusive
pub fn expand_window(start: TimeOfDay, end: TimeOfDay, interval_minutes: u16) -> Vec<TimeOfDay> {
    let mut slots = Vec::new();
    if interval_minutes == 0 {
        return slots;
    }

    let mut current = Some(start);
    while let Some(t) = current {
        if t >= end {
            break;
        }
        slots.push(t);
        current = t.checked_add(interval_minutes);
    }
    slots
}

/// Expand every rule, then merge into one ascending list
pub fn expand_rules<'a, I>(rules: I) -> Vec<TimeOfDay>
where
    I: IntoIterator<Item = &'a WorkingHoursRule>,
{
    let mut slots: Vec<TimeOfDay> = rules
        .into_iter()
        .flat_map(|rule| {
            let interval = u16::try_from(rule.interval_minutes).unwrap_or(0);
            if interval == 0 {
                tracing::warn!(rule_id = %rule.id, interval = rule.interval_minutes, "Ignoring working-hours rule with invalid interval");
            }
            expand_window(rule.start_time, rule.end_time, interval)
        })
        .collect();
    slots.sort_unstable();
    slots.dedup();
    slots
}

/// Default template: closed on Sunday, 08:00-15:30 on Saturday, 08:00-17:30 otherwise
pub fn fallback_template(weekday: Weekday) -> Vec<TimeOfDay> {
    let close = match weekday {
        Weekday::Sun => return Vec::new(),
        Weekday::Sat => SATURDAY_CLOSE,
        _ => WEEKDAY_CLOSE,
    };
    match (
        TimeOfDay::from_hm(WEEKDAY_OPEN.0, WEEKDAY_OPEN.1),
        TimeOfDay::from_hm(close.0, close.1),
    ) {
        (Some(open), Some(close)) => expand_window(open, close, TEMPLATE_INTERVAL),
        _ => Vec::new(),
    }
}
