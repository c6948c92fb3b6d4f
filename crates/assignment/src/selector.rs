//! Candidate scoring and the two-pass selection rule.

use alert_core::{Alert, Availability, Skill};
use team_directory::TeamMemberSnapshot;

/// Penalty per open alert already on the member's plate.
const WORKLOAD_PENALTY: i64 = 10;
/// Bonus for a rolling average response under the cutoff.
const FAST_RESPONSE_BONUS: i64 = 20;
const FAST_RESPONSE_CUTOFF_SECONDS: f64 = 60.0;
/// Bonus for a rolling target hit rate above the cutoff.
const HIT_RATE_BONUS: i64 = 15;
const HIT_RATE_CUTOFF: f64 = 0.9;
/// Bonus when the member brings any of the required skills.
const SKILL_BONUS: i64 = 10;

/// What an alert needs from whoever takes it.
#[derive(Debug, Clone, Default)]
pub struct AssignmentNeeds {
    pub territory: Option<String>,
    pub required_skills: Vec<Skill>,
}

impl AssignmentNeeds {
    pub fn for_alert(alert: &Alert) -> Self {
        AssignmentNeeds {
            territory: alert.territory.clone(),
            required_skills: alert.required_skills.clone(),
        }
    }
}

/// Scores one member against the required skills. Never negative.
pub fn score(member: &TeamMemberSnapshot, required_skills: &[Skill]) -> i64 {
    let mut score = -(WORKLOAD_PENALTY * i64::from(member.current_workload));
    if member.rolling_avg_response_seconds < FAST_RESPONSE_CUTOFF_SECONDS {
        score += FAST_RESPONSE_BONUS;
    }
    if member.rolling_target_hit_rate > HIT_RATE_CUTOFF {
        score += HIT_RATE_BONUS;
    }
    if member.has_any_skill(required_skills) {
        score += SKILL_BONUS;
    }
    score.max(0)
}

/// Picks the best candidate for the alert, or `None` when nobody fits.
///
/// The first pass keeps members who are not unavailable, cover the
/// alert's territory, and share a required skill. If that empties out,
/// the on-call bench is drafted once, regardless of skills. Ties break
/// toward the lexicographically smallest member id, so the result does
/// not depend on candidate order.
pub fn select<'a>(
    candidates: &'a [TeamMemberSnapshot],
    needs: &AssignmentNeeds,
) -> Option<&'a TeamMemberSnapshot> {
    let fits = |member: &TeamMemberSnapshot| {
        member.availability != Availability::Unavailable
            && needs
                .territory
                .as_deref()
                .map_or(true, |t| member.covers_territory(t))
            && (needs.required_skills.is_empty() || member.has_any_skill(&needs.required_skills))
    };

    let mut pool: Vec<&TeamMemberSnapshot> = candidates.iter().filter(|m| fits(m)).collect();
    if pool.is_empty() {
        pool = candidates
            .iter()
            .filter(|m| m.availability == Availability::OnCall)
            .collect();
    }

    pool.into_iter().max_by(|a, b| {
        score(a, &needs.required_skills)
            .cmp(&score(b, &needs.required_skills))
            .then_with(|| b.id.cmp(&a.id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn member(id: &str) -> TeamMemberSnapshot {
        TeamMemberSnapshot {
            id: id.to_string(),
            name: id.to_uppercase(),
            role: alert_core::Role::Rep,
            skills: vec![Skill::Residential],
            territories: Vec::new(),
            availability: Availability::Available,
            current_workload: 0,
            rolling_avg_response_seconds: 90.0,
            rolling_target_hit_rate: 0.5,
        }
    }

    #[test]
    fn score_rewards_fast_reliable_members() {
        let mut m = member("m-1");
        assert_eq!(score(&m, &[]), 0);

        m.rolling_avg_response_seconds = 45.0;
        assert_eq!(score(&m, &[]), 20);

        m.rolling_target_hit_rate = 0.95;
        assert_eq!(score(&m, &[]), 35);

        assert_eq!(score(&m, &[Skill::Residential]), 45);
    }

    #[test]
    fn score_floors_at_zero() {
        let mut m = member("m-1");
        m.current_workload = 5;
        assert_eq!(score(&m, &[]), 0);
    }

    #[test]
    fn boundary_values_earn_no_bonus() {
        let mut m = member("m-1");
        m.rolling_avg_response_seconds = 60.0;
        m.rolling_target_hit_rate = 0.9;
        assert_eq!(score(&m, &[]), 0);
    }

    #[test]
    fn busiest_member_loses() {
        let mut idle = member("idle");
        idle.rolling_avg_response_seconds = 30.0;
        let mut busy = member("busy");
        busy.rolling_avg_response_seconds = 30.0;
        busy.current_workload = 2;

        let candidates = [busy, idle];
        let picked = select(&candidates, &AssignmentNeeds::default()).unwrap();
        assert_eq!(picked.id, "idle");
    }

    #[test]
    fn unavailable_members_never_picked() {
        let mut off = member("off");
        off.availability = Availability::Unavailable;
        off.rolling_avg_response_seconds = 10.0;
        off.rolling_target_hit_rate = 1.0;
        let plain = member("plain");

        let candidates = [off, plain];
        let picked = select(&candidates, &AssignmentNeeds::default()).unwrap();
        assert_eq!(picked.id, "plain");
    }

    #[test]
    fn territory_mismatch_filters_out() {
        let mut north = member("north");
        north.territories = vec!["north".to_string()];
        let mut south = member("south");
        south.territories = vec!["south".to_string()];

        let needs = AssignmentNeeds {
            territory: Some("south".to_string()),
            required_skills: Vec::new(),
        };
        let candidates = [north, south];
        let picked = select(&candidates, &needs).unwrap();
        assert_eq!(picked.id, "south");
    }

    #[test]
    fn on_call_bench_drafted_when_no_skill_match() {
        // Nobody holds the required skill; the available member is skipped
        // and the on-call member is drafted anyway.
        let skilled_elsewhere = member("avail");
        let mut bench = member("bench");
        bench.availability = Availability::OnCall;

        let needs = AssignmentNeeds {
            territory: None,
            required_skills: vec![Skill::Insurance],
        };
        let candidates = [skilled_elsewhere, bench];
        let picked = select(&candidates, &needs).unwrap();
        assert_eq!(picked.id, "bench");
    }

    #[test]
    fn fallback_finds_nobody_without_on_call() {
        let plain = member("avail");
        let needs = AssignmentNeeds {
            territory: None,
            required_skills: vec![Skill::Insurance],
        };
        assert!(select(&[plain], &needs).is_none());
    }

    #[test]
    fn ties_break_to_smallest_id() {
        let a = member("alpha");
        let b = member("beta");
        let candidates = [b, a];
        let picked = select(&candidates, &AssignmentNeeds::default()).unwrap();
        assert_eq!(picked.id, "alpha");
    }

    #[test]
    fn empty_candidate_list_yields_none() {
        assert!(select(&[], &AssignmentNeeds::default()).is_none());
    }

    fn candidate_pool() -> impl Strategy<Value = Vec<TeamMemberSnapshot>> {
        let one = (
            0u32..6,
            0.0f64..200.0,
            0.0f64..1.0,
            prop::sample::select(vec![
                Availability::Available,
                Availability::OnCall,
                Availability::Unavailable,
            ]),
            prop::sample::subsequence(
                vec![
                    Skill::Residential,
                    Skill::Commercial,
                    Skill::Metal,
                    Skill::Flat,
                    Skill::Insurance,
                ],
                0..=3,
            ),
        );
        prop::collection::vec(one, 0..12).prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(
                    |(index, (workload, avg, hit, availability, skills))| TeamMemberSnapshot {
                        id: format!("m-{index:02}"),
                        name: format!("member {index}"),
                        role: alert_core::Role::Rep,
                        skills,
                        territories: Vec::new(),
                        availability,
                        current_workload: workload,
                        rolling_avg_response_seconds: avg,
                        rolling_target_hit_rate: hit,
                    },
                )
                .collect()
        })
    }

    proptest! {
        #[test]
        fn selection_ignores_candidate_order(
            (pool, shuffled) in candidate_pool()
                .prop_flat_map(|pool| {
                    let shuffled = Just(pool.clone()).prop_shuffle();
                    (Just(pool), shuffled)
                })
        ) {
            let needs = AssignmentNeeds {
                territory: None,
                required_skills: vec![Skill::Metal],
            };
            let first = select(&pool, &needs).map(|m| m.id.clone());
            let second = select(&shuffled, &needs).map(|m| m.id.clone());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn unavailable_never_selected(pool in candidate_pool()) {
            let needs = AssignmentNeeds::default();
            if let Some(picked) = select(&pool, &needs) {
                prop_assert_ne!(picked.availability, Availability::Unavailable);
            }
        }

        #[test]
        fn scores_are_never_negative(pool in candidate_pool()) {
            for member in &pool {
                prop_assert!(score(member, &[Skill::Flat]) >= 0);
            }
        }
    }
}
