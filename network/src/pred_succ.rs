// © 2023-2024 ETH Zurich
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// any later version.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use std::collections::HashMap;

use model::base_types::RestaurantId;

use crate::untimed_arc::UntimedArc;
use crate::UntimedArcIx;

/// Predecessor/successor lists for every untimed arc (`spec.md` §4.F). Entry
/// arcs (`orders` empty) never have predecessors; exit arcs (`to_restaurant`
/// `None`) never have successors.
#[derive(Debug, Clone, Default)]
pub struct PredSuccIndex {
    predecessors: Vec<Vec<UntimedArcIx>>,
    successors: Vec<Vec<UntimedArcIx>>,
}

impl PredSuccIndex {
    pub fn predecessors_of(&self, arc: UntimedArcIx) -> &[UntimedArcIx] {
        &self.predecessors[arc]
    }

    pub fn successors_of(&self, arc: UntimedArcIx) -> &[UntimedArcIx] {
        &self.successors[arc]
    }
}

fn disjoint(a: &UntimedArc, b: &UntimedArc) -> bool {
    a.order_set().is_disjoint(&b.order_set())
}

/// Builds the predecessor/successor index over `arcs` (`spec.md` §4.F). Used
/// both for the full untimed-arc set (preprocessing) and, restricted to an
/// incumbent's active arcs, inside the illegal-path callback (§4.K.2).
pub fn build_pred_succ_index(arcs: &[UntimedArc]) -> PredSuccIndex {
    let mut by_from_restaurant: HashMap<(usize, RestaurantId), Vec<UntimedArcIx>> = HashMap::new();
    let mut by_to_restaurant: HashMap<(usize, RestaurantId), Vec<UntimedArcIx>> = HashMap::new();

    for (idx, arc) in arcs.iter().enumerate() {
        if let Some(r) = arc.from_restaurant {
            by_from_restaurant.entry((arc.group, r)).or_default().push(idx);
        }
        if let Some(r) = arc.to_restaurant {
            by_to_restaurant.entry((arc.group, r)).or_default().push(idx);
        }
    }

    let mut predecessors = vec![Vec::new(); arcs.len()];
    let mut successors = vec![Vec::new(); arcs.len()];

    for (idx, arc) in arcs.iter().enumerate() {
        let r1 = match arc.from_restaurant {
            Some(r) => r,
            None => continue, // entry arc: no predecessors
        };
        if let Some(candidates) = by_to_restaurant.get(&(arc.group, r1)) {
            for &cand_idx in candidates {
                if cand_idx == idx {
                    continue;
                }
                let candidate = &arcs[cand_idx];
                let chains = candidate.earliest_leave + candidate.travel <= arc.latest_leave;
                if chains && disjoint(arc, candidate) {
                    predecessors[idx].push(cand_idx);
                }
            }
        }
    }

    for (idx, arc) in arcs.iter().enumerate() {
        let r2 = match arc.to_restaurant {
            Some(r) => r,
            None => continue, // exit arc: no successors
        };
        if let Some(candidates) = by_from_restaurant.get(&(arc.group, r2)) {
            for &cand_idx in candidates {
                if cand_idx == idx {
                    continue;
                }
                let candidate = &arcs[cand_idx];
                let chains = arc.earliest_leave + arc.travel <= candidate.latest_leave;
                if chains && disjoint(arc, candidate) {
                    successors[idx].push(cand_idx);
                }
            }
        }
    }

    PredSuccIndex {
        predecessors,
        successors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::base_types::{Minutes, OrderId};

    fn arc(
        from: Option<&str>,
        to: Option<&str>,
        orders: &[&str],
        earliest: f64,
        latest: f64,
        travel: f64,
    ) -> UntimedArc {
        UntimedArc {
            group: 0,
            courier: None,
            orders: orders.iter().map(|o| OrderId::from(o)).collect(),
            from_restaurant: from.map(RestaurantId::from),
            to_restaurant: to.map(RestaurantId::from),
            earliest_leave: Minutes(earliest),
            latest_leave: Minutes(latest),
            travel: Minutes(travel),
        }
    }

    #[test]
    fn chains_when_disjoint_and_time_feasible() {
        let arcs = vec![
            arc(Some("r1"), Some("r2"), &["o1"], 0.0, 10.0, 5.0),
            arc(Some("r2"), Some("r1"), &["o2"], 0.0, 20.0, 5.0),
        ];
        let idx = build_pred_succ_index(&arcs);
        assert_eq!(idx.successors_of(0), &[1]);
        assert_eq!(idx.predecessors_of(1), &[0]);
        assert!(idx.predecessors_of(0).is_empty());
        assert!(idx.successors_of(1).is_empty() || idx.successors_of(1) == [0]);
    }

    #[test]
    fn overlapping_order_sets_never_chain() {
        let arcs = vec![
            arc(Some("r1"), Some("r2"), &["o1"], 0.0, 10.0, 5.0),
            arc(Some("r2"), Some("r1"), &["o1"], 0.0, 20.0, 5.0),
        ];
        let idx = build_pred_succ_index(&arcs);
        assert!(idx.successors_of(0).is_empty());
    }

    #[test]
    fn entry_arcs_have_no_predecessors_exit_arcs_no_successors() {
        let arcs = vec![
            arc(None, Some("r1"), &[], 0.0, 10.0, 5.0),
            arc(Some("r1"), None, &["o1"], 0.0, 20.0, 5.0),
        ];
        let idx = build_pred_succ_index(&arcs);
        assert!(idx.predecessors_of(0).is_empty());
        assert!(idx.successors_of(1).is_empty());
    }
}
