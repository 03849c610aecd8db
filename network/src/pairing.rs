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
use model::instance::Instance;

use crate::sequence::Sequence;

/// `(S, r')` (`spec.md` §3): a sequence extended with the restaurant it is
/// eligible to continue towards.
#[derive(Debug, Clone)]
pub struct SequencePair {
    pub sequence: Sequence,
    pub next_restaurant: RestaurantId,
    pub earliest_leave: Minutes,
    pub latest_leave: Minutes,
    pub travel: Minutes,
}

fn dominates(a: &SequencePair, b: &SequencePair) -> bool {
    a.latest_leave >= b.latest_leave
        && a.travel <= b.travel
        && (a.latest_leave > b.latest_leave || a.travel < b.travel)
}

fn insert_with_dominance(bucket: &mut Vec<SequencePair>, candidate: SequencePair) {
    if bucket.iter().any(|existing| dominates(existing, &candidate)) {
        return;
    }
    bucket.retain(|existing| !dominates(&candidate, existing));
    bucket.push(candidate);
}

/// Extends every sequence at every reachable next restaurant (`spec.md`
/// §4.D). `restaurants` is the full restaurant list; eligibility only needs
/// one witness order at `r'`, per the "early-break" note in `spec.md` §4.D
/// and the open question in `spec.md` §9 (this is an eligibility gate, not
/// enumeration).
pub fn enumerate_pairs(
    instance: &Instance,
    sequences: &[Sequence],
    restaurants: &[RestaurantId],
) -> Vec<SequencePair> {
    type BucketKey = (BTreeSet<OrderId>, RestaurantId);
    let mut buckets: HashMap<BucketKey, Vec<SequencePair>> = HashMap::new();

    for seq in sequences {
        let last_order = instance
            .order(seq.last_order())
            .expect("sequence orders must exist in the instance");

        for &next_restaurant in restaurants {
            if next_restaurant == seq.restaurant {
                continue;
            }
            let next_loc = instance.restaurant(next_restaurant).location;
            let segment = instance.params.order_to_restaurant(last_order.dropoff.dist(&next_loc));
            let travel = seq.travel + segment;
            let arrival = seq.earliest_leave + travel;

            let eligible = instance
                .orders_at(next_restaurant)
                .any(|o| o.latest_leave > arrival);
            if !eligible {
                continue;
            }

            let candidate = SequencePair {
                sequence: seq.clone(),
                next_restaurant,
                earliest_leave: seq.earliest_leave,
                latest_leave: seq.latest_leave,
                travel,
            };
            let key = (seq.order_set(), next_restaurant);
            insert_with_dominance(buckets.entry(key).or_default(), candidate);
        }
    }

    buckets.into_values().flatten().collect()
}
