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

use model::base_types::{Minutes, OrderId, RestaurantId};
use model::diagnostics::{Diagnostic, Diagnostics};
use model::instance::Instance;

/// An ordered tuple of orders delivered consecutively from one restaurant
/// without returning to a restaurant between drops (`spec.md` §3 "Sequence").
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub restaurant: RestaurantId,
    pub orders: Vec<OrderId>,
    pub earliest_leave: Minutes,
    pub latest_leave: Minutes,
    pub travel: Minutes,
}

impl Sequence {
    pub fn order_set(&self) -> BTreeSet<OrderId> {
        self.orders.iter().copied().collect()
    }

    pub fn last_order(&self) -> OrderId {
        *self.orders.last().expect("sequence is never empty")
    }
}

type BucketKey = (BTreeSet<OrderId>, OrderId);

/// `a` dominates `b` per `spec.md` §4.C: same order set and last order, `a`'s
/// window is at least as permissive and its travel no worse, strictly better
/// in at least one.
fn dominates(a: &Sequence, b: &Sequence) -> bool {
    a.latest_leave >= b.latest_leave
        && a.travel <= b.travel
        && (a.latest_leave > b.latest_leave || a.travel < b.travel)
}

/// Inserts `candidate` into its dominance bucket, discarding it if some
/// existing member dominates it, and discarding any existing members it
/// dominates.
fn insert_with_dominance(bucket: &mut Vec<Sequence>, candidate: Sequence) {
    if bucket.iter().any(|existing| dominates(existing, &candidate)) {
        return;
    }
    bucket.retain(|existing| !dominates(&candidate, existing));
    bucket.push(candidate);
}

/// Enumerates and dominates all order-delivery sequences at `restaurant`
/// (`spec.md` §4.C).
pub fn enumerate_sequences(
    instance: &Instance,
    restaurant: RestaurantId,
    limit_to_singletons: bool,
    global_off_time: Minutes,
    diagnostics: &mut Diagnostics,
) -> Vec<Sequence> {
    let params = instance.params;

    let seeds: Vec<Sequence> = instance
        .orders_at(restaurant)
        .map(|order| Sequence {
            restaurant,
            orders: vec![order.id],
            earliest_leave: order.ready_time,
            latest_leave: order.latest_leave,
            travel: order.single_travel_time,
        })
        .collect();

    let mut all = seeds.clone();
    let mut current_gen = seeds;

    if !limit_to_singletons {
        loop {
            let mut next_gen_buckets: HashMap<BucketKey, Vec<Sequence>> = HashMap::new();

            for seq in &current_gen {
                let already_in = seq.order_set();
                for order in instance.orders_at(restaurant) {
                    if already_in.contains(&order.id) {
                        continue;
                    }
                    let last_order = instance
                        .order(seq.last_order())
                        .expect("sequence orders must exist in the instance");
                    let dist = last_order.dropoff.dist(&order.dropoff);
                    let segment = params.order_to_order(dist);

                    let earliest_leave = seq.earliest_leave.max(order.ready_time);
                    let travel = seq.travel + segment;
                    let latest_leave = seq.latest_leave.min(order.max_arrival - travel);

                    if latest_leave < earliest_leave {
                        continue;
                    }

                    let mut orders = seq.orders.clone();
                    orders.push(order.id);
                    let candidate = Sequence {
                        restaurant,
                        orders,
                        earliest_leave,
                        latest_leave,
                        travel,
                    };
                    let key = (candidate.order_set(), candidate.last_order());
                    insert_with_dominance(next_gen_buckets.entry(key).or_default(), candidate);
                }
            }

            let next_gen: Vec<Sequence> = next_gen_buckets.into_values().flatten().collect();
            if next_gen.is_empty() {
                break;
            }
            all.extend(next_gen.clone());
            current_gen = next_gen;
        }
    }

    #[cfg(debug_assertions)]
    verify_sequences(instance, &all, global_off_time, diagnostics);
    #[cfg(not(debug_assertions))]
    let _ = diagnostics;

    all
}

/// Re-derives each sequence's attributes from scratch and checks the five
/// criteria named in `spec.md` §4.C's verification pass. `latest` must be
/// capped by `global_off_time` the same way the singleton seed's
/// `order.latest_leave` is (`model::instance::Instance::new`), or sequences
/// whose uncapped `maxArrival - travel` exceeds `global_off_time` would be
/// flagged as inconsistent even though they were built correctly.
#[cfg(debug_assertions)]
fn verify_sequences(instance: &Instance, sequences: &[Sequence], global_off_time: Minutes, diagnostics: &mut Diagnostics) {
    for seq in sequences {
        let mut earliest = Minutes(f64::MIN);
        let mut latest = global_off_time;
        let mut travel = Minutes::ZERO;
        let mut prev: Option<&model::instance::Order> = None;

        for &order_id in &seq.orders {
            let order = match instance.order(order_id) {
                Some(o) => o,
                None => {
                    diagnostics.push(Diagnostic::InconsistentSequence {
                        restaurant: seq.restaurant.to_string(),
                        orders: seq.orders.iter().map(|o| o.to_string()).collect(),
                        detail: format!("order {order_id} not found in instance"),
                    });
                    return;
                }
            };
            earliest = earliest.max(order.ready_time);
            travel = match prev {
                None => order.single_travel_time,
                Some(p) => {
                    travel + instance.params.order_to_order(p.dropoff.dist(&order.dropoff))
                }
            };
            latest = latest.min(order.max_arrival - travel);
            prev = Some(order);
        }

        let mut ok = true;
        let mut detail = String::new();
        if latest < earliest {
            ok = false;
            detail.push_str("invalid window; ");
        }
        if earliest != seq.earliest_leave {
            ok = false;
            detail.push_str("earliestLeave mismatch; ");
        }
        if prev.map(|o| o.restaurant) != Some(seq.restaurant) {
            ok = false;
            detail.push_str("last order not at origin restaurant; ");
        }
        if latest != seq.latest_leave {
            ok = false;
            detail.push_str("latestLeave mismatch; ");
        }
        if travel != seq.travel {
            ok = false;
            detail.push_str("travel mismatch; ");
        }

        if !ok {
            diagnostics.push(Diagnostic::InconsistentSequence {
                restaurant: seq.restaurant.to_string(),
                orders: seq.orders.iter().map(|o| o.to_string()).collect(),
                detail,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::base_types::{Coord, RestaurantId};
    use model::instance::{RawOrder, Restaurant, ScalarParams};

    fn small_instance() -> Instance {
        let params = ScalarParams {
            travel_speed: 100.0,
            pickup_service_time: Minutes(2.0),
            dropoff_service_time: Minutes(2.0),
            target_click_to_door: Minutes(0.0),
            max_click_to_door: Minutes(60.0),
            pay_per_delivery: 4.0,
            min_pay_per_hour: 15.0,
        };
        let restaurants = vec![Restaurant {
            id: RestaurantId::from("r1"),
            location: Coord::new(0.0, 0.0),
        }];
        let raw = vec![
            RawOrder {
                id: OrderId::from("o1"),
                dropoff: Coord::new(100.0, 0.0),
                placement_time: Minutes(0.0),
                restaurant: RestaurantId::from("r1"),
            },
            RawOrder {
                id: OrderId::from("o2"),
                dropoff: Coord::new(100.0, 100.0),
                placement_time: Minutes(0.0),
                restaurant: RestaurantId::from("r1"),
            },
        ];
        Instance::new(vec![], restaurants, raw, params, Minutes(1000.0))
    }

    #[test]
    fn singletons_always_present() {
        let instance = small_instance();
        let mut diagnostics = Diagnostics::new();
        let seqs = enumerate_sequences(&instance, RestaurantId::from("r1"), false, Minutes(1000.0), &mut diagnostics);
        assert!(diagnostics.is_empty());
        let singles: Vec<_> = seqs.iter().filter(|s| s.orders.len() == 1).collect();
        assert_eq!(singles.len(), 2);
    }

    #[test]
    fn bundles_of_two_appear_when_feasible() {
        let instance = small_instance();
        let mut diagnostics = Diagnostics::new();
        let seqs = enumerate_sequences(&instance, RestaurantId::from("r1"), false, Minutes(1000.0), &mut diagnostics);
        assert!(seqs.iter().any(|s| s.orders.len() == 2));
    }

    #[test]
    fn limit_to_singletons_blocks_bundles() {
        let instance = small_instance();
        let mut diagnostics = Diagnostics::new();
        let seqs = enumerate_sequences(&instance, RestaurantId::from("r1"), true, Minutes(1000.0), &mut diagnostics);
        assert!(seqs.iter().all(|s| s.orders.len() == 1));
    }

    #[test]
    fn dominance_keeps_no_pair_where_one_beats_the_other() {
        let instance = small_instance();
        let mut diagnostics = Diagnostics::new();
        let seqs = enumerate_sequences(&instance, RestaurantId::from("r1"), false, Minutes(1000.0), &mut diagnostics);
        for bucket_key in seqs.iter().map(|s| (s.order_set(), s.last_order())) {
            let bucket: Vec<&Sequence> = seqs
                .iter()
                .filter(|s| (s.order_set(), s.last_order()) == bucket_key)
                .collect();
            for i in 0..bucket.len() {
                for j in 0..bucket.len() {
                    if i != j {
                        assert!(!dominates(bucket[i], bucket[j]) || !dominates(bucket[j], bucket[i]));
                    }
                }
            }
        }
    }
}
