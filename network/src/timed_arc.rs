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

use model::base_types::{CourierId, Minutes, OrderId};
use model::diagnostics::{Diagnostic, Diagnostics};

use crate::node::{NodeIx, Nodes};
use crate::untimed_arc::UntimedArc;
use crate::UntimedArcIx;

/// `((g,c), r1,t1, S, r2,t2)` (`spec.md` §3 "Timed arc"). `untimed_arc` is
/// `None` for waiting arcs (`r1 = r2 ∧ S = ∅`).
#[derive(Debug, Clone)]
pub struct TimedArc {
    pub group: usize,
    /// Set only for arcs derived from an entry untimed arc.
    pub courier: Option<CourierId>,
    pub untimed_arc: Option<UntimedArcIx>,
    pub orders: Vec<OrderId>,
    pub from: NodeIx,
    pub to: NodeIx,
}

impl TimedArc {
    pub fn is_waiting(&self) -> bool {
        self.untimed_arc.is_none()
    }
}

/// Largest node time at `place` that is `<= bound`, falling back to the
/// earliest node at `place` if none is (`spec.md` §4.H, both the entry- and
/// exit-arc mapping rules).
fn floor_node(times: &[(Minutes, NodeIx)], bound: Minutes) -> Option<NodeIx> {
    times
        .iter()
        .rev()
        .find(|(t, _)| *t <= bound)
        .or_else(|| times.first())
        .map(|(_, ix)| *ix)
}

/// Maps every untimed arc onto timed arcs anchored to node pairs, with
/// dominance, then adds waiting arcs between consecutive nodes at the same
/// place (`spec.md` §4.H).
pub fn generate_timed_arcs(
    untimed_arcs: &[UntimedArc],
    nodes: &Nodes,
    diagnostics: &mut Diagnostics,
) -> Vec<TimedArc> {
    let mut timed = Vec::new();

    for (arc_ix, arc) in untimed_arcs.iter().enumerate() {
        if arc.is_entry() {
            let to_times = nodes.times_at(arc.group, arc.to_restaurant);
            if to_times.is_empty() {
                continue;
            }
            let Some(to) = floor_node(to_times, arc.earliest_leave + arc.travel) else {
                continue;
            };
            let from = nodes.home_start(arc.group);
            timed.push(TimedArc {
                group: arc.group,
                courier: arc.courier,
                untimed_arc: Some(arc_ix),
                orders: Vec::new(),
                from,
                to,
            });
            continue;
        }

        if arc.is_exit() {
            let from_times = nodes.times_at(arc.group, arc.from_restaurant);
            if from_times.is_empty() {
                continue;
            }
            let Some(from) = floor_node(from_times, arc.latest_leave) else {
                continue;
            };
            let to = nodes.home_end(arc.group);
            timed.push(TimedArc {
                group: arc.group,
                courier: None,
                untimed_arc: Some(arc_ix),
                orders: arc.orders.clone(),
                from,
                to,
            });
            continue;
        }

        // Main arc: one timed arc per departure node time in
        // [largest node <= earliestLeave, latestLeave], kept only at the
        // latest t1 per resulting arrival node (dominance).
        let from_times = nodes.times_at(arc.group, arc.from_restaurant);
        let to_times = nodes.times_at(arc.group, arc.to_restaurant);
        if from_times.is_empty() || to_times.is_empty() {
            continue;
        }

        let start_pos = from_times
            .iter()
            .rposition(|(t, _)| *t <= arc.earliest_leave)
            .unwrap_or(0);

        let mut best_by_t2: HashMap<NodeIx, (Minutes, NodeIx)> = HashMap::new();
        for &(t1, from_ix) in &from_times[start_pos..] {
            if t1 > arc.latest_leave {
                break;
            }
            let arrival = t1.max(arc.earliest_leave) + arc.travel;
            let Some(to_ix) = floor_node(to_times, arrival) else {
                continue;
            };
            let to_time = to_times
                .iter()
                .find(|(_, ix)| *ix == to_ix)
                .map(|(t, _)| *t)
                .unwrap();
            if to_time < t1 {
                diagnostics.push(Diagnostic::BackwardsTimedArc {
                    arc: format!("{:?}->{:?}", arc.from_restaurant, arc.to_restaurant),
                    t1: t1.0 as i64,
                    t2: to_time.0 as i64,
                });
                continue;
            }
            best_by_t2
                .entry(to_ix)
                .and_modify(|(best_t1, best_from)| {
                    if t1 > *best_t1 {
                        *best_t1 = t1;
                        *best_from = from_ix;
                    }
                })
                .or_insert((t1, from_ix));
        }

        for (to_ix, (_, from_ix)) in best_by_t2 {
            timed.push(TimedArc {
                group: arc.group,
                courier: None,
                untimed_arc: Some(arc_ix),
                orders: arc.orders.clone(),
                from: from_ix,
                to: to_ix,
            });
        }
    }

    add_waiting_arcs(nodes, &mut timed);
    timed
}

fn add_waiting_arcs(nodes: &Nodes, timed: &mut Vec<TimedArc>) {
    use itertools::Itertools;

    let mut places: Vec<_> = nodes.places().copied().collect();
    places.sort_by_key(|k| (k.group, k.restaurant.map(|r| r.to_string())));

    for place in places {
        let mut times: Vec<(Minutes, NodeIx)> = nodes.times_at(place.group, place.restaurant).to_vec();
        times.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        for ((_, from), (_, to)) in times.iter().tuple_windows() {
            timed.push(TimedArc {
                group: place.group,
                courier: None,
                untimed_arc: None,
                orders: Vec::new(),
                from: *from,
                to: *to,
            });
        }
    }
}
