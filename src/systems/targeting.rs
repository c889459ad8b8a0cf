//! Nearest-enemy target selection.

use crate::components::Faction;
use glam::Vec2;

/// What the targeting search needs to know about a tank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetCandidate {
    pub position: Vec2,
    pub faction: Faction,
    pub active: bool,
}

/// Index of the active enemy closest to `origin`.
///
/// Linear scan minimizing squared distance. Ties keep the lowest index.
/// Returns None when no enemy is active.
pub fn nearest_enemy(
    candidates: &[TargetCandidate],
    origin: Vec2,
    faction: Faction,
) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        if !candidate.active || candidate.faction == faction {
            continue;
        }
        let dist_sq = candidate.position.distance_squared(origin);
        if best.map_or(true, |(_, best_sq)| dist_sq < best_sq) {
            best = Some((index, dist_sq));
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn candidate(x: f32, y: f32, faction: Faction, active: bool) -> TargetCandidate {
        TargetCandidate {
            position: Vec2::new(x, y),
            faction,
            active,
        }
    }

    #[test]
    fn test_picks_closest_enemy() {
        let tanks = vec![
            candidate(0.0, 0.0, Faction::Blue, true),
            candidate(30.0, 0.0, Faction::Red, true),
            candidate(20.0, 0.0, Faction::Red, true),
            candidate(5.0, 0.0, Faction::Blue, true),
        ];
        assert_eq!(nearest_enemy(&tanks, Vec2::ZERO, Faction::Blue), Some(2));
    }

    #[test]
    fn test_skips_inactive_enemies() {
        let tanks = vec![
            candidate(1.0, 0.0, Faction::Red, false),
            candidate(50.0, 0.0, Faction::Red, true),
        ];
        assert_eq!(nearest_enemy(&tanks, Vec2::ZERO, Faction::Blue), Some(1));
    }

    #[test]
    fn test_no_active_enemy_is_none() {
        let tanks = vec![
            candidate(1.0, 0.0, Faction::Blue, true),
            candidate(2.0, 0.0, Faction::Red, false),
        ];
        assert_eq!(nearest_enemy(&tanks, Vec2::ZERO, Faction::Blue), None);
        assert_eq!(nearest_enemy(&[], Vec2::ZERO, Faction::Red), None);
    }

    #[test]
    fn test_tie_keeps_lowest_index() {
        let tanks = vec![
            candidate(0.0, 0.0, Faction::Blue, true),
            candidate(0.0, 10.0, Faction::Red, true),
            candidate(10.0, 0.0, Faction::Red, true),
            candidate(-10.0, 0.0, Faction::Red, true),
        ];
        assert_eq!(nearest_enemy(&tanks, Vec2::ZERO, Faction::Blue), Some(1));
    }

    proptest! {
        #[test]
        fn prop_targeting_is_deterministic_and_minimal(
            raw in proptest::collection::vec(
                (-500i32..500, -500i32..500, any::<bool>(), any::<bool>()),
                0..40,
            ),
        ) {
            let tanks: Vec<_> = raw
                .iter()
                .map(|&(x, y, red, active)| {
                    let faction = if red { Faction::Red } else { Faction::Blue };
                    candidate(x as f32, y as f32, faction, active)
                })
                .collect();
            let origin = Vec2::new(3.0, -7.0);

            let first = nearest_enemy(&tanks, origin, Faction::Blue);
            prop_assert_eq!(first, nearest_enemy(&tanks, origin, Faction::Blue));

            match first {
                Some(index) => {
                    let best = tanks[index].position.distance_squared(origin);
                    for (i, t) in tanks.iter().enumerate() {
                        if t.active && t.faction == Faction::Red {
                            let d = t.position.distance_squared(origin);
                            prop_assert!(d >= best);
                            if i < index {
                                prop_assert!(d > best);
                            }
                        }
                    }
                }
                None => prop_assert!(tanks.iter().all(|t| !t.active || t.faction == Faction::Blue)),
            }
        }
    }
}
