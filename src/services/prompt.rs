// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Prompt rendering for plan generation.
//!
//! Pure functions only: the same request always renders the same text.

use crate::models::{ActivityRecord, GenerationRequest};
use crate::time_utils::format_short_date;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

/// Instruction sent as the system message with every generation call.
pub const SYSTEM_PROMPT: &str = "You are an expert fitness coach specializing in endurance sports. Create personalized training plans based on the athlete's goals, race targets, and recent activity history.";

/// Race type the onboarding form uses for "no race".
pub const NO_RACE_SENTINEL: &str = "Not training for a race";

/// Sentence substituted for the activity block when there is no history.
pub const NO_HISTORY_SENTENCE: &str =
    "They don't have any recent activities tracked (no activity history available).";

const DEFAULT_FITNESS_LEVEL: &str = "intermediate";
const DEFAULT_GOAL: &str = "improve fitness";
const DEFAULT_TITLE_GOAL: &str = "Fitness";

/// Treat absent and blank values the same.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// One activity line: date, type, distance in km, whole minutes.
fn render_activity(activity: &ActivityRecord) -> String {
    format!(
        "- {}: {}, {:.2}km, {} minutes",
        format_short_date(activity.date),
        activity.activity_type,
        activity.distance_meters / 1000.0,
        activity.duration_seconds / 60
    )
}

/// Render the user message for a generation request.
pub fn render_prompt(request: &GenerationRequest) -> String {
    let fitness_level =
        non_blank(request.fitness_level.as_deref()).unwrap_or(DEFAULT_FITNESS_LEVEL);
    let goal = non_blank(request.goal.as_deref()).unwrap_or(DEFAULT_GOAL);

    let mut prompt = format!(
        "Create a personalized workout plan for a {} athlete with the following goal: {}.\n",
        fitness_level, goal
    );

    if let Some(race) = non_blank(request.race_type.as_deref()).filter(|r| *r != NO_RACE_SENTINEL)
    {
        let _ = writeln!(prompt, "They are training for a {}.", race);
    }

    prompt.push('\n');
    if request.activity_summary.is_empty() {
        prompt.push_str(NO_HISTORY_SENTENCE);
        prompt.push('\n');
    } else {
        prompt.push_str("Here are their recent activities:\n");
        for activity in request.activity_summary.iter() {
            prompt.push_str(&render_activity(activity));
            prompt.push('\n');
        }
    }

    prompt.push_str(
        "\nCreate a 4-week training plan with 4-5 workouts per week. For each workout, include:\n\
         1. Date\n\
         2. Type of workout (e.g., Running, Cycling, Swimming, Strength, Recovery)\n\
         3. Duration in minutes\n\
         4. Brief description of the workout\n\
         5. Training purpose/goal of this specific workout\n\
         \n\
         Format the response as a JSON object with a single key \"workouts\" whose value is an array of workout objects with these properties:\n\
         - date (YYYY-MM-DD)\n\
         - type (string)\n\
         - duration (integer number of minutes)\n\
         - notes (string with description and purpose)\n",
    );

    prompt
}

/// Server-assigned plan title, e.g. `Marathon Plan (10/19/2026)`.
pub fn plan_title(goal: Option<&str>, now: DateTime<Utc>) -> String {
    format!(
        "{} Plan ({})",
        non_blank(goal).unwrap_or(DEFAULT_TITLE_GOAL),
        format_short_date(now)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivitySummary;
    use chrono::TimeZone;

    fn activity(day: u32, kind: &str, meters: f64, seconds: u64) -> ActivityRecord {
        ActivityRecord {
            user_id: "u1".to_string(),
            activity_type: kind.to_string(),
            distance_meters: meters,
            duration_seconds: seconds,
            date: Utc.with_ymd_and_hms(2026, 10, day, 7, 0, 0).unwrap(),
            source: "strava".to_string(),
        }
    }

    fn request(race: Option<&str>, activities: Vec<ActivityRecord>) -> GenerationRequest {
        GenerationRequest {
            goal: Some("run a sub-4 marathon".to_string()),
            race_type: race.map(str::to_string),
            fitness_level: Some("advanced".to_string()),
            activity_summary: ActivitySummary::new(activities),
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let build = || {
            request(
                Some("Marathon"),
                vec![activity(12, "Run", 10_000.0, 3000), activity(14, "Ride", 40_250.0, 5400)],
            )
        };
        assert_eq!(render_prompt(&build()), render_prompt(&build()));
    }

    #[test]
    fn test_activity_lines() {
        let prompt = render_prompt(&request(
            None,
            vec![activity(12, "Run", 10_004.0, 3059), activity(14, "Ride", 40_250.0, 5400)],
        ));

        assert!(prompt.contains("Here are their recent activities:\n- 10/14/2026: Ride, 40.25km, 90 minutes\n- 10/12/2026: Run, 10.00km, 50 minutes\n"));
        assert!(!prompt.contains(NO_HISTORY_SENTENCE));
    }

    #[test]
    fn test_empty_history() {
        let prompt = render_prompt(&request(None, vec![]));
        assert!(prompt.contains(NO_HISTORY_SENTENCE));
        assert!(!prompt.contains("Here are their recent activities"));
        assert!(!prompt.lines().any(|l| l.starts_with("- ") && l.contains("km")));
    }

    #[test]
    fn test_race_sentence() {
        let with_race = render_prompt(&request(Some("Half Marathon"), vec![]));
        assert!(with_race.contains("They are training for a Half Marathon."));

        let sentinel = render_prompt(&request(Some(NO_RACE_SENTINEL), vec![]));
        assert!(!sentinel.contains("They are training for"));

        let absent = render_prompt(&request(None, vec![]));
        assert!(!absent.contains("They are training for"));
    }

    #[test]
    fn test_defaults() {
        let prompt = render_prompt(&GenerationRequest::default());
        assert!(prompt.starts_with(
            "Create a personalized workout plan for a intermediate athlete with the following goal: improve fitness."
        ));
    }

    #[test]
    fn test_output_shape_is_specified() {
        let prompt = render_prompt(&GenerationRequest::default());
        assert!(prompt.contains("4-week training plan with 4-5 workouts per week"));
        assert!(prompt.contains("date (YYYY-MM-DD)"));
        assert!(prompt.contains("duration (integer number of minutes)"));
        assert!(prompt.contains("\"workouts\""));
    }

    #[test]
    fn test_plan_title() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        assert_eq!(plan_title(Some("Marathon"), now), "Marathon Plan (10/19/2026)");
        assert_eq!(plan_title(None, now), "Fitness Plan (10/19/2026)");
        assert_eq!(plan_title(Some("  "), now), "Fitness Plan (10/19/2026)");
    }
}
