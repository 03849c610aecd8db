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

use std::collections::{BTreeSet, HashMap};

use model::base_types::{Minutes, RestaurantId};
use model::config::Options;
use model::courier_group::CourierGroup;
use model::instance::Instance;

use crate::untimed_arc::UntimedArc;

pub type NodeIx = usize;

/// `(group, restaurant, time)` (`spec.md` §3 "Node"). `restaurant = None`
/// marks a home node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub group: usize,
    pub restaurant: Option<RestaurantId>,
}

#[derive(Debug, Clone, Copy)]
pub struct Node {
    pub group: usize,
    pub restaurant: Option<RestaurantId>,
    pub time: Minutes,
}

/// Millisecond-granularity key so node times (`f64` minutes) can live in a
/// `HashMap`; all times here derive from sums of instance data plus integer
/// multiples of `node_time_interval`, so this never loses information that
/// matters. Mirrors `courier_group::bucket`.
fn time_key(t: Minutes) -> i64 {
    (t.0 * 1000.0).round() as i64
}

/// The discretised time-expanded node set, plus a lookup from `(group,
/// restaurant, time)` to its index (`spec.md` §4.G).
#[derive(Debug, Clone, Default)]
pub struct Nodes {
    pub nodes: Vec<Node>,
    by_key: HashMap<(usize, Option<RestaurantId>, i64), NodeIx>,
    times_by_place: HashMap<NodeKey, Vec<(Minutes, NodeIx)>>,
}

impl Nodes {
    fn insert(&mut self, group: usize, restaurant: Option<RestaurantId>, time: Minutes) -> NodeIx {
        let key = (group, restaurant, time_key(time));
        if let Some(&ix) = self.by_key.get(&key) {
            return ix;
        }
        let ix = self.nodes.len();
        self.nodes.push(Node {
            group,
            restaurant,
            time,
        });
        self.by_key.insert(key, ix);
        self.times_by_place
            .entry(NodeKey { group, restaurant })
            .or_default()
            .push((time, ix));
        ix
    }

    pub fn get(&self, group: usize, restaurant: Option<RestaurantId>, time: Minutes) -> Option<NodeIx> {
        self.by_key.get(&(group, restaurant, time_key(time))).copied()
    }

    /// Node times at `(group, restaurant)`, sorted ascending.
    pub fn times_at(&self, group: usize, restaurant: Option<RestaurantId>) -> &[(Minutes, NodeIx)] {
        static EMPTY: Vec<(Minutes, NodeIx)> = Vec::new();
        self.times_by_place
            .get(&NodeKey { group, restaurant })
            .map(|v| v.as_slice())
            .unwrap_or(&EMPTY)
    }

    /// All `(group, restaurant)` places that carry at least one node.
    pub fn places(&self) -> impl Iterator<Item = &NodeKey> {
        self.times_by_place.keys()
    }

    /// The home node at time zero for `group` (`spec.md` §3 "Special home
    /// nodes").
    pub fn home_start(&self, group: usize) -> NodeIx {
        self.times_at(group, None)
            .iter()
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap())
            .map(|(_, ix)| *ix)
            .expect("home-start node always exists for every group")
    }

    /// The home node at `globalOffTime` for `group`.
    pub fn home_end(&self, group: usize) -> NodeIx {
        self.times_at(group, None)
            .iter()
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap())
            .map(|(_, ix)| *ix)
            .expect("home-end node always exists for every group")
    }
}

fn floor_to_multiple(t: Minutes, step: f64) -> Minutes {
    Minutes((t.0 / step).floor() * step)
}

/// Places `(group, restaurant)` appear as an endpoint of `arcs`, restaurants
/// only (home is handled separately).
fn restaurant_endpoints(groups: &[CourierGroup], arcs: &[UntimedArc]) -> BTreeSet<(usize, RestaurantId)> {
    let mut set = BTreeSet::new();
    for arc in arcs {
        if let Some(r) = arc.from_restaurant {
            set.insert((arc.group, r));
        }
        if let Some(r) = arc.to_restaurant {
            set.insert((arc.group, r));
        }
    }
    let _ = groups;
    set
}

/// Generates the time-expanded node set (`spec.md` §4.G).
pub fn generate_nodes(
    instance: &Instance,
    groups: &[CourierGroup],
    global_off_time: Minutes,
    arcs: &[UntimedArc],
    options: &Options,
) -> Nodes {
    let mut nodes = Nodes::default();
    let step = options.node_time_interval as f64;

    // Home nodes for every group (always present, regardless of whether the
    // group has any arcs: an idle group still needs a start/end anchor).
    for (group_idx, _group) in groups.iter().enumerate() {
        nodes.insert(group_idx, None, Minutes::ZERO);
        nodes.insert(group_idx, None, global_off_time);
    }

    for (group_idx, restaurant) in restaurant_endpoints(groups, arcs) {
        let group = &groups[group_idx];

        let incoming_arrivals: Vec<Minutes> = arcs
            .iter()
            .filter(|a| a.group == group_idx && a.to_restaurant == Some(restaurant))
            .map(|a| a.earliest_leave + a.travel)
            .collect();
        let Some(earliest_candidate) = incoming_arrivals
            .iter()
            .copied()
            .fold(None, |acc: Option<Minutes>, v| Some(acc.map_or(v, |a| a.min(v))))
        else {
            continue; // no incoming arc ever reaches this place: nothing of interest
        };

        let eligible: Vec<_> = instance
            .orders_at(restaurant)
            .filter(|o| o.ready_time <= group.off && o.latest_leave >= earliest_candidate)
            .collect();

        // max(earliest arrival over incoming arcs, earliest ready-time among eligible orders)
        let first_interest = if eligible.is_empty() {
            earliest_candidate
        } else {
            earliest_candidate.max(eligible.iter().map(|o| o.ready_time).fold(Minutes(f64::MAX), Minutes::min))
        };

        let last_interest = if eligible.is_empty() {
            group.off
        } else {
            group
                .off
                .min(eligible.iter().map(|o| o.latest_leave).fold(Minutes(f64::MIN), Minutes::max))
        };

        if last_interest < first_interest {
            continue;
        }

        let first_node_time = if options.global_node_intervals {
            floor_to_multiple(first_interest, step)
        } else {
            first_interest
        };

        let mut t = first_node_time;
        while t <= last_interest {
            nodes.insert(group_idx, Some(restaurant), t);
            t = t + Minutes(step);
        }
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::base_types::{Coord, CourierId, OrderId};
    use model::config::GroupingMode;
    use model::courier_group::group_couriers;
    use model::instance::{Courier, RawOrder, Restaurant, ScalarParams};

    fn setup() -> (Instance, Vec<CourierGroup>, Minutes) {
        let params = ScalarParams {
            travel_speed: 100.0,
            pickup_service_time: Minutes(2.0),
            dropoff_service_time: Minutes(2.0),
            target_click_to_door: Minutes(0.0),
            max_click_to_door: Minutes(120.0),
            pay_per_delivery: 4.0,
            min_pay_per_hour: 15.0,
        };
        let couriers = vec![Courier {
            id: CourierId::from("c1"),
            home: Coord::new(0.0, 0.0),
            on: Minutes(0.0),
            off: Minutes(200.0),
        }];
        let (groups, global_off) = group_couriers(&couriers, GroupingMode::ByOffTime);
        let restaurants = vec![Restaurant {
            id: RestaurantId::from("r1"),
            location: Coord::new(0.0, 0.0),
        }];
        let raw = vec![RawOrder {
            id: OrderId::from("o1"),
            dropoff: Coord::new(50.0, 0.0),
            placement_time: Minutes(0.0),
            restaurant: RestaurantId::from("r1"),
        }];
        let instance = Instance::new(couriers, restaurants, raw, params, global_off);
        (instance, groups, global_off)
    }

    #[test]
    fn home_nodes_always_present() {
        let (instance, groups, global_off) = setup();
        let options = Options::default();
        let nodes = generate_nodes(&instance, &groups, global_off, &[], &options);
        assert!(nodes.get(0, None, Minutes::ZERO).is_some());
        assert!(nodes.get(0, None, global_off).is_some());
    }

    #[test]
    fn restaurant_nodes_appear_within_interest_window() {
        let (instance, groups, global_off) = setup();
        let options = Options::default();
        let r1 = RestaurantId::from("r1");
        let arcs = vec![UntimedArc {
            group: 0,
            courier: Some(CourierId::from("c1")),
            orders: Vec::new(),
            from_restaurant: None,
            to_restaurant: Some(r1),
            earliest_leave: Minutes(0.0),
            latest_leave: Minutes(40.0),
            travel: Minutes(1.0),
        }];
        let nodes = generate_nodes(&instance, &groups, global_off, &arcs, &options);
        assert!(!nodes.times_at(0, Some(r1)).is_empty());
        for (t, _) in nodes.times_at(0, Some(r1)) {
            assert!(*t <= groups[0].off);
        }
    }
}
