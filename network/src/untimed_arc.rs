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

use std::collections::BTreeSet;

use model::base_types::{CourierId, Minutes, OrderId, RestaurantId};
use model::courier_group::CourierGroup;
use model::diagnostics::{Diagnostic, Diagnostics};
use model::instance::Instance;

use crate::pairing::SequencePair;

/// `((g,c), S, r')` (`spec.md` §3 "Untimed arc"). `from_restaurant = None`
/// marks an entry arc (the courier starts from home); `to_restaurant = None`
/// marks an exit arc (the courier returns home after `orders`).
#[derive(Debug, Clone)]
pub struct UntimedArc {
    pub group: usize,
    /// Only set for entry arcs: which specific courier this arc belongs to.
    pub courier: Option<CourierId>,
    pub orders: Vec<OrderId>,
    pub from_restaurant: Option<RestaurantId>,
    pub to_restaurant: Option<RestaurantId>,
    pub earliest_leave: Minutes,
    pub latest_leave: Minutes,
    pub travel: Minutes,
}

impl UntimedArc {
    pub fn order_set(&self) -> BTreeSet<OrderId> {
        self.orders.iter().copied().collect()
    }

    pub fn is_entry(&self) -> bool {
        self.from_restaurant.is_none()
    }

    pub fn is_exit(&self) -> bool {
        self.to_restaurant.is_none()
    }
}

/// The earliest an arriving courier in `group` could get to `restaurant`,
/// leaving home no earlier than their own shift start (`spec.md` §4.E: "home
/// → R(S) commute").
fn best_arrival(instance: &Instance, group: &CourierGroup, restaurant: RestaurantId) -> Minutes {
    let loc = instance.restaurant(restaurant).location;
    group
        .members
        .iter()
        .map(|&id| {
            let courier = instance.courier(id);
            courier.on + instance.params.home_to_restaurant(courier.home.dist(&loc))
        })
        .fold(Minutes(f64::MAX), Minutes::min)
}

/// Main arcs `((g,0), S, r')` (`spec.md` §4.E).
pub fn build_main_arcs(
    instance: &Instance,
    pairs: &[SequencePair],
    groups: &[CourierGroup],
    diagnostics: &mut Diagnostics,
) -> Vec<UntimedArc> {
    let mut arcs = Vec::new();

    for pair in pairs {
        let restaurant = pair.sequence.restaurant;
        for (group_idx, group) in groups.iter().enumerate() {
            // (1)
            if group.off < pair.earliest_leave + pair.travel {
                continue;
            }
            let arrival = best_arrival(instance, group, restaurant);
            // (2)
            if arrival > pair.latest_leave.min(group.off) {
                continue;
            }
            let departure = arrival.max(pair.earliest_leave);
            let arrival_at_next = departure + pair.travel;
            // (3)
            if arrival_at_next > group.off {
                continue;
            }
            // (4)
            let used: BTreeSet<OrderId> = pair.sequence.order_set();
            let best_order_latest_leave = instance
                .orders_at(pair.next_restaurant)
                .filter(|o| !used.contains(&o.id))
                .filter(|o| o.ready_time <= group.off && o.latest_leave >= arrival_at_next)
                .map(|o| o.latest_leave)
                .fold(None, |acc: Option<Minutes>, l| {
                    Some(acc.map_or(l, |a| a.max(l)))
                });
            let Some(best_order_latest_leave) = best_order_latest_leave else {
                continue;
            };

            let window_start = departure;
            let window_end = pair
                .latest_leave
                .min(best_order_latest_leave - pair.travel)
                .min(group.off - pair.travel);

            if window_end < window_start {
                diagnostics.push(Diagnostic::CrossedUntimedArcWindow {
                    arc: format!("main[{restaurant}->{}]", pair.next_restaurant),
                    earliest: window_start.0 as i64,
                    latest: window_end.0 as i64,
                });
                continue;
            }

            arcs.push(UntimedArc {
                group: group_idx,
                courier: None,
                orders: pair.sequence.orders.clone(),
                from_restaurant: Some(restaurant),
                to_restaurant: Some(pair.next_restaurant),
                earliest_leave: window_start,
                latest_leave: window_end,
                travel: pair.travel,
            });
        }
    }

    arcs
}

/// Exit arcs `((g,0), S, 0)` (`spec.md` §4.E).
pub fn build_exit_arcs(
    instance: &Instance,
    sequences: &[crate::sequence::Sequence],
    groups: &[CourierGroup],
) -> Vec<UntimedArc> {
    let mut arcs = Vec::new();
    for seq in sequences {
        for (group_idx, group) in groups.iter().enumerate() {
            let arrival = best_arrival(instance, group, seq.restaurant);
            if arrival > seq.latest_leave.min(group.off) {
                continue;
            }
            let window_start = seq.earliest_leave.max(arrival);
            let window_end = seq.latest_leave.min(group.off);
            if window_end < window_start {
                continue;
            }
            arcs.push(UntimedArc {
                group: group_idx,
                courier: None,
                orders: seq.orders.clone(),
                from_restaurant: Some(seq.restaurant),
                to_restaurant: None,
                earliest_leave: window_start,
                latest_leave: window_end,
                travel: seq.travel,
            });
        }
    }
    arcs
}

/// Entry arcs `((g,c), (), r')` (`spec.md` §4.E), one per courier and
/// restaurant.
pub fn build_entry_arcs(
    instance: &Instance,
    restaurants: &[RestaurantId],
    groups: &[CourierGroup],
) -> Vec<UntimedArc> {
    let mut arcs = Vec::new();
    let group_of_courier = |courier: CourierId| -> usize {
        groups
            .iter()
            .position(|g| g.members.contains(&courier))
            .expect("every courier belongs to exactly one group")
    };

    for courier in &instance.couriers {
        let group_idx = group_of_courier(courier.id);
        let group = &groups[group_idx];
        for &restaurant in restaurants {
            let loc = instance.restaurant(restaurant).location;
            let commute = instance.params.home_to_restaurant(courier.home.dist(&loc));
            let arrival = courier.on + commute;
            if arrival > group.off {
                continue;
            }
            let servable_latest_leaves: Vec<Minutes> = instance
                .orders_at(restaurant)
                .filter(|o| o.ready_time <= group.off && o.latest_leave >= arrival)
                .map(|o| o.latest_leave)
                .collect();
            let Some(&best) = servable_latest_leaves
                .iter()
                .max_by(|a, b| a.partial_cmp(b).unwrap())
            else {
                continue;
            };

            arcs.push(UntimedArc {
                group: group_idx,
                courier: Some(courier.id),
                orders: Vec::new(),
                from_restaurant: None,
                to_restaurant: Some(restaurant),
                earliest_leave: courier.on,
                latest_leave: best.min(group.off),
                travel: commute,
            });
        }
    }
    arcs
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::base_types::Coord;
    use model::config::GroupingMode;
    use model::courier_group::group_couriers;
    use model::instance::{Courier, RawOrder, Restaurant, ScalarParams};

    fn instance_with_one_courier() -> (Instance, Vec<CourierGroup>) {
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
        (instance, groups)
    }

    #[test]
    fn exit_arc_emitted_when_group_reaches_restaurant_in_time() {
        let (instance, groups) = instance_with_one_courier();
        let mut diagnostics = Diagnostics::new();
        let seqs = crate::sequence::enumerate_sequences(
            &instance,
            RestaurantId::from("r1"),
            false,
            Minutes(200.0),
            &mut diagnostics,
        );
        let arcs = build_exit_arcs(&instance, &seqs, &groups);
        assert!(!arcs.is_empty());
        assert!(arcs.iter().all(|a| a.earliest_leave <= a.latest_leave));
    }

    #[test]
    fn entry_arc_emitted_for_reachable_restaurant() {
        let (instance, groups) = instance_with_one_courier();
        let restaurants = vec![RestaurantId::from("r1")];
        let arcs = build_entry_arcs(&instance, &restaurants, &groups);
        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].courier, Some(CourierId::from("c1")));
        assert!(arcs[0].earliest_leave <= arcs[0].latest_leave);
    }
}
