//! Derived analytics over workout sessions.
//!
//! Pure, synchronous, stateless functions computed from (sessions,
//! categories) snapshots. The evaluation date is an explicit argument so
//! every result is deterministic under test. Calendar windows use date-only
//! comparisons: `week_start(today) <= date <= today` for the week and
//! `month_start(today) <= date <= today` for the month.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use repflow_domain::constants::{
    HIGH_COMPLETION_RATE, HIGH_RATE_MIN_SESSIONS, INACTIVITY_WARNING_DAYS, LOW_COMPLETION_RATE,
    LOW_RATE_MIN_SESSIONS, NEGLECTED_CATEGORY_DISPLAY_CAP, REPETITION_WINDOW,
};
use repflow_domain::types::stats::{
    CategoryTally, CompletionStats, PeriodTally, Suggestion, SuggestionKind,
};
use repflow_domain::utils::time::{month_start, week_start};
use repflow_domain::{Category, WorkoutSession};

/// Weekly and monthly completion tallies plus the all-time completed count.
#[must_use]
pub fn completion_stats(sessions: &[WorkoutSession], today: NaiveDate) -> CompletionStats {
    CompletionStats {
        week: tally_window(sessions, week_start(today), today),
        month: tally_window(sessions, month_start(today), today),
        total_completed: sessions.iter().filter(|s| s.completed).count(),
    }
}

fn tally_window(sessions: &[WorkoutSession], from: NaiveDate, to: NaiveDate) -> PeriodTally {
    let mut tally = PeriodTally::default();
    for session in sessions.iter().filter(|s| s.date >= from && s.date <= to) {
        tally.total += 1;
        if session.completed {
            tally.completed += 1;
        }
    }
    tally
}

/// Occurrence counters per referenced category, across all sessions.
#[must_use]
pub fn category_breakdown(sessions: &[WorkoutSession]) -> HashMap<String, CategoryTally> {
    let mut breakdown: HashMap<String, CategoryTally> = HashMap::new();
    for session in sessions {
        for category_id in &session.category_ids {
            let tally = breakdown.entry(category_id.clone()).or_default();
            tally.total += 1;
            if session.completed {
                tally.completed += 1;
            }
        }
    }
    breakdown
}

/// Consecutive calendar days ending today (inclusive) with at least one
/// completed session. Zero when today itself has no completed session.
#[must_use]
pub fn current_streak(sessions: &[WorkoutSession], today: NaiveDate) -> u32 {
    let completed_days: HashSet<NaiveDate> =
        sessions.iter().filter(|s| s.completed).map(|s| s.date).collect();

    let mut streak = 0;
    let mut day = today;
    while completed_days.contains(&day) {
        streak += 1;
        let Some(previous) = day.pred_opt() else {
            break;
        };
        day = previous;
    }
    streak
}

/// Fixed-order sequence of independent heuristic checks, each contributing
/// at most one suggestion. All checks may fire at once.
#[must_use]
pub fn smart_suggestions(
    sessions: &[WorkoutSession],
    categories: &[Category],
    today: NaiveDate,
) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    let start = week_start(today);
    let this_week: Vec<&WorkoutSession> =
        sessions.iter().filter(|s| s.date >= start && s.date <= today).collect();
    let completed_this_week: Vec<&WorkoutSession> =
        this_week.iter().copied().filter(|s| s.completed).collect();

    // 1. Categories with no completed session this week.
    let trained: HashSet<&str> = completed_this_week
        .iter()
        .flat_map(|s| s.category_ids.iter().map(String::as_str))
        .collect();
    let neglected: Vec<&Category> =
        categories.iter().filter(|c| !trained.contains(c.id.as_str())).collect();
    if !neglected.is_empty() {
        let names = neglected
            .iter()
            .take(NEGLECTED_CATEGORY_DISPLAY_CAP)
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        suggestions.push(Suggestion {
            kind: SuggestionKind::Info,
            icon: "📋".to_string(),
            message: format!("You haven't trained {names} this week yet 💪"),
        });
    }

    // 2. Time since the most recent completed session.
    let last_completed = sessions
        .iter()
        .filter(|s| s.completed && s.date <= today)
        .max_by_key(|s| (s.date, s.time));
    if let Some(last) = last_completed {
        let days_since = (today - last.date).num_days();
        if days_since >= INACTIVITY_WARNING_DAYS {
            suggestions.push(Suggestion {
                kind: SuggestionKind::Warning,
                icon: "⚠️".to_string(),
                message: format!(
                    "It's been {days_since} days since your last workout! Time to get back on track 🔥"
                ),
            });
        } else if days_since == 0 {
            suggestions.push(Suggestion {
                kind: SuggestionKind::Success,
                icon: "✅".to_string(),
                message: "Great! You trained today. Keep the momentum going! 🎯".to_string(),
            });
        }
    }

    // 3. Weekly completion rate, only once the week has enough sessions.
    let weekly =
        PeriodTally { completed: completed_this_week.len(), total: this_week.len() };
    let rate = weekly.completion_rate();
    if rate >= HIGH_COMPLETION_RATE && this_week.len() >= HIGH_RATE_MIN_SESSIONS {
        suggestions.push(Suggestion {
            kind: SuggestionKind::Success,
            icon: "🔥".to_string(),
            message: format!("{rate}% completion rate this week! You're crushing it! 🏆"),
        });
    } else if rate < LOW_COMPLETION_RATE && this_week.len() >= LOW_RATE_MIN_SESSIONS {
        suggestions.push(Suggestion {
            kind: SuggestionKind::Warning,
            icon: "📊".to_string(),
            message: format!("Only {rate}% completion rate. Let's improve that! 💪"),
        });
    }

    // 4. Same category set three completed sessions in a row.
    if completed_this_week.len() >= REPETITION_WINDOW {
        let recent = &completed_this_week[completed_this_week.len() - REPETITION_WINDOW..];
        let set_of = |session: &WorkoutSession| {
            let mut ids = session.category_ids.clone();
            ids.sort();
            ids
        };
        if recent.windows(2).all(|pair| set_of(pair[0]) == set_of(pair[1])) {
            suggestions.push(Suggestion {
                kind: SuggestionKind::Info,
                icon: "💡".to_string(),
                message: "You've done the same workout 3 times in a row. Try mixing it up! 🔄"
                    .to_string(),
            });
        }
    }

    // 5. Sessions still planned for today.
    let upcoming_today = sessions.iter().filter(|s| s.date == today && !s.completed).count();
    if upcoming_today > 0 {
        let plural = if upcoming_today > 1 { "s" } else { "" };
        suggestions.push(Suggestion {
            kind: SuggestionKind::Motivation,
            icon: "🎯".to_string(),
            message: format!(
                "You have {upcoming_today} session{plural} planned for today! Let's do this! 💪"
            ),
        });
    }

    suggestions
}

/// One-line summary of this week's sessions, with the top one or two
/// categories by completed count appended as the main focus.
#[must_use]
pub fn weekly_summary(
    sessions: &[WorkoutSession],
    categories: &[Category],
    today: NaiveDate,
) -> String {
    let start = week_start(today);
    let this_week: Vec<&WorkoutSession> =
        sessions.iter().filter(|s| s.date >= start && s.date <= today).collect();

    let total = this_week.len();
    if total == 0 {
        return "No sessions planned this week. Time to create a schedule! 📅".to_string();
    }
    let completed = this_week.iter().filter(|s| s.completed).count();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for session in this_week.iter().filter(|s| s.completed) {
        for category_id in &session.category_ids {
            *counts.entry(category_id.as_str()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let top_names: Vec<&str> = ranked
        .iter()
        .take(2)
        .filter_map(|(id, _)| categories.iter().find(|c| c.id == *id).map(|c| c.name.as_str()))
        .collect();

    let focus = if top_names.is_empty() {
        String::new()
    } else {
        format!(" Main focus: {}.", top_names.join(" & "))
    };

    let rate = PeriodTally { completed, total }.completion_rate();
    format!("This week: {completed}/{total} sessions completed ({rate}%).{focus}")
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, Utc};

    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn session(id: &str, date: NaiveDate, time: NaiveTime, cats: &[&str], completed: bool) -> WorkoutSession {
        WorkoutSession {
            id: id.to_string(),
            date,
            time,
            category_ids: cats.iter().map(|c| (*c).to_string()).collect(),
            notes: None,
            completed,
            created_at: Utc::now(),
        }
    }

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            order: Some(0),
            created_at: Utc::now(),
        }
    }

    // 2025-06-05 is a Thursday; its week starts Monday 2025-06-02.
    const TODAY: (i32, u32, u32) = (2025, 6, 5);

    fn today() -> NaiveDate {
        day(TODAY.0, TODAY.1, TODAY.2)
    }

    #[test]
    fn test_completion_stats_windows() {
        let sessions = vec![
            session("s1", day(2025, 6, 2), at(9, 0), &["legs"], true),
            session("s2", day(2025, 6, 4), at(9, 0), &["back"], false),
            // Previous week, still this month
            session("s3", day(2025, 5, 30), at(9, 0), &["legs"], true),
            // Previous month
            session("s4", day(2025, 4, 20), at(9, 0), &["legs"], true),
        ];

        let stats = completion_stats(&sessions, today());
        assert_eq!(stats.week, PeriodTally { completed: 1, total: 2 });
        // s3 falls in May, outside the June window
        assert_eq!(stats.month, PeriodTally { completed: 1, total: 2 });
        assert_eq!(stats.total_completed, 3);
    }

    #[test]
    fn test_category_breakdown_counts_all_sessions() {
        let sessions = vec![
            session("s1", day(2025, 6, 2), at(9, 0), &["legs", "back"], true),
            session("s2", day(2025, 6, 3), at(9, 0), &["legs"], false),
            session("s3", day(2025, 1, 1), at(9, 0), &["legs"], true),
        ];

        let breakdown = category_breakdown(&sessions);
        assert_eq!(breakdown["legs"], CategoryTally { total: 3, completed: 2 });
        assert_eq!(breakdown["back"], CategoryTally { total: 1, completed: 1 });
        assert_eq!(breakdown["legs"].percent(), 67);
    }

    #[test]
    fn test_streak_counts_consecutive_days() {
        let sessions = vec![
            session("s1", today(), at(9, 0), &["legs"], true),
            session("s2", day(2025, 6, 4), at(9, 0), &["back"], true),
            session("s3", day(2025, 6, 3), at(9, 0), &["legs"], true),
            // Gap on 6/2; this older one does not extend the streak
            session("s4", day(2025, 6, 1), at(9, 0), &["legs"], true),
        ];
        assert_eq!(current_streak(&sessions, today()), 3);
    }

    #[test]
    fn test_streak_zero_when_today_incomplete() {
        let sessions = vec![
            // Completed two days ago only, nothing today or yesterday
            session("s1", day(2025, 6, 3), at(9, 0), &["legs"], true),
            session("s2", today(), at(9, 0), &["legs"], false),
        ];
        assert_eq!(current_streak(&sessions, today()), 0);
    }

    #[test]
    fn test_suggests_neglected_categories_capped_at_two() {
        let categories =
            vec![category("legs", "Legs"), category("back", "Back"), category("core", "Core")];
        let sessions = vec![session("s1", today(), at(9, 0), &["core"], true)];

        let suggestions = smart_suggestions(&sessions, &categories, today());
        let neglected = &suggestions[0];
        assert_eq!(neglected.kind, SuggestionKind::Info);
        assert_eq!(neglected.message, "You haven't trained Legs, Back this week yet 💪");
    }

    #[test]
    fn test_suggests_inactivity_warning_after_four_days() {
        let categories = vec![category("legs", "Legs")];
        let sessions = vec![session("s1", day(2025, 6, 1), at(9, 0), &["legs"], true)];

        let suggestions = smart_suggestions(&sessions, &categories, today());
        assert!(suggestions.iter().any(|s| {
            s.kind == SuggestionKind::Warning
                && s.message
                    == "It's been 4 days since your last workout! Time to get back on track 🔥"
        }));
    }

    #[test]
    fn test_suggests_momentum_when_trained_today() {
        let categories = vec![category("legs", "Legs")];
        let sessions = vec![session("s1", today(), at(9, 0), &["legs"], true)];

        let suggestions = smart_suggestions(&sessions, &categories, today());
        assert!(suggestions
            .iter()
            .any(|s| s.message == "Great! You trained today. Keep the momentum going! 🎯"));
    }

    #[test]
    fn test_suggests_high_completion_rate() {
        let categories = vec![category("legs", "Legs")];
        let sessions = vec![
            session("s1", day(2025, 6, 2), at(9, 0), &["legs"], true),
            session("s2", day(2025, 6, 3), at(9, 0), &["legs"], true),
            session("s3", day(2025, 6, 4), at(10, 0), &["legs"], true),
        ];

        let suggestions = smart_suggestions(&sessions, &categories, today());
        assert!(suggestions
            .iter()
            .any(|s| s.message == "100% completion rate this week! You're crushing it! 🏆"));
    }

    #[test]
    fn test_suggests_low_completion_rate() {
        let categories = vec![category("legs", "Legs")];
        let sessions = vec![
            session("s1", day(2025, 6, 2), at(9, 0), &["legs"], true),
            session("s2", day(2025, 6, 3), at(9, 0), &["legs"], false),
            session("s3", day(2025, 6, 4), at(10, 0), &["legs"], false),
        ];

        let suggestions = smart_suggestions(&sessions, &categories, today());
        assert!(suggestions
            .iter()
            .any(|s| s.message == "Only 33% completion rate. Let's improve that! 💪"));
    }

    #[test]
    fn test_no_rate_suggestion_below_session_minimums() {
        let categories = vec![category("legs", "Legs")];
        // One incomplete session: 0% rate, but below the two-session minimum
        let sessions = vec![session("s1", day(2025, 6, 2), at(9, 0), &["legs"], false)];

        let suggestions = smart_suggestions(&sessions, &categories, today());
        assert!(!suggestions.iter().any(|s| s.message.contains("completion rate")));
    }

    #[test]
    fn test_suggests_repetition_on_identical_category_sets() {
        let categories = vec![category("legs", "Legs"), category("back", "Back")];
        // Order within the set must not matter
        let sessions = vec![
            session("s1", day(2025, 6, 2), at(9, 0), &["legs", "back"], true),
            session("s2", day(2025, 6, 3), at(9, 0), &["back", "legs"], true),
            session("s3", day(2025, 6, 4), at(9, 0), &["legs", "back"], true),
        ];

        let suggestions = smart_suggestions(&sessions, &categories, today());
        assert!(suggestions.iter().any(|s| {
            s.message == "You've done the same workout 3 times in a row. Try mixing it up! 🔄"
        }));
    }

    #[test]
    fn test_suggests_sessions_planned_today() {
        let categories = vec![category("legs", "Legs")];
        let sessions = vec![
            session("s1", today(), at(9, 0), &["legs"], false),
            session("s2", today(), at(18, 0), &["legs"], false),
        ];

        let suggestions = smart_suggestions(&sessions, &categories, today());
        assert!(suggestions.iter().any(|s| {
            s.kind == SuggestionKind::Motivation
                && s.message == "You have 2 sessions planned for today! Let's do this! 💪"
        }));
    }

    #[test]
    fn test_suggestions_follow_fixed_check_order() {
        let categories = vec![category("legs", "Legs"), category("back", "Back")];
        // Back is neglected, legs trained today, one session still planned.
        let sessions = vec![
            session("s1", today(), at(9, 0), &["legs"], true),
            session("s2", today(), at(18, 0), &["legs"], false),
        ];

        let suggestions = smart_suggestions(&sessions, &categories, today());
        let kinds: Vec<SuggestionKind> = suggestions.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SuggestionKind::Info, SuggestionKind::Success, SuggestionKind::Motivation]
        );
    }

    #[test]
    fn test_weekly_summary_empty_week() {
        let summary = weekly_summary(&[], &[], today());
        assert_eq!(summary, "No sessions planned this week. Time to create a schedule! 📅");
    }

    #[test]
    fn test_weekly_summary_counts_and_rate() {
        let categories = vec![category("legs", "Legs"), category("back", "Back")];
        let sessions = vec![
            session("s1", day(2025, 6, 2), at(9, 0), &["legs"], true),
            session("s2", day(2025, 6, 3), at(9, 0), &["legs", "back"], true),
            session("s3", day(2025, 6, 4), at(9, 0), &["back"], false),
            session("s4", today(), at(9, 0), &["back"], false),
        ];

        let summary = weekly_summary(&sessions, &categories, today());
        assert!(summary.contains("2/4"));
        assert!(summary.contains("50%"));
        assert!(summary.contains("Main focus: Legs & Back."));
    }

    #[test]
    fn test_weekly_summary_without_completed_sessions_has_no_focus() {
        let categories = vec![category("legs", "Legs")];
        let sessions = vec![session("s1", today(), at(9, 0), &["legs"], false)];

        let summary = weekly_summary(&sessions, &categories, today());
        assert_eq!(summary, "This week: 0/1 sessions completed (0%).");
    }
}
