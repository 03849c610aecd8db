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

//! Seeded restaurant subsampling (`spec.md` §6 `orderProportion`/`seed`): drop
//! whole restaurants, in an order chosen by a seeded shuffle, until at most
//! `order_proportion` of the original orders remain. Runs single-threaded,
//! before the parallel sequence-enumeration stage, so the dropped set stays
//! reproducible for a given seed.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::SplitMix64;

use model::base_types::{Minutes, RestaurantId};
use model::instance::{Instance, RawOrder};

/// Returns `instance` unchanged when `order_proportion >= 1.0`; otherwise
/// returns a new instance with the orders belonging to the dropped
/// restaurants removed.
pub fn subsample(instance: &Instance, order_proportion: f64, seed: u64, global_off_time: Minutes) -> Instance {
    if order_proportion >= 1.0 {
        return instance.clone();
    }

    let total = instance.orders.len();
    let target = (order_proportion * total as f64).ceil() as usize;

    let mut shuffled: Vec<RestaurantId> = instance.restaurants.iter().map(|r| r.id).collect();
    let mut rng = SplitMix64::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let mut kept: HashSet<RestaurantId> = shuffled.iter().copied().collect();
    let mut remaining = total;
    for r in shuffled {
        if remaining <= target {
            break;
        }
        remaining -= instance.orders_at(r).count();
        kept.remove(&r);
    }

    let restaurants = instance.restaurants.iter().filter(|r| kept.contains(&r.id)).cloned().collect();
    let raw_orders: Vec<RawOrder> = instance
        .orders
        .iter()
        .filter(|o| kept.contains(&o.restaurant))
        .map(|o| RawOrder {
            id: o.id,
            dropoff: o.dropoff,
            placement_time: o.placement_time,
            restaurant: o.restaurant,
        })
        .collect();

    Instance::new(instance.couriers.clone(), restaurants, raw_orders, instance.params, global_off_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::base_types::{Coord, OrderId};
    use model::instance::{Restaurant, ScalarParams};

    fn params() -> ScalarParams {
        ScalarParams {
            travel_speed: 100.0,
            pickup_service_time: Minutes(2.0),
            dropoff_service_time: Minutes(2.0),
            target_click_to_door: Minutes(0.0),
            max_click_to_door: Minutes(120.0),
            pay_per_delivery: 4.0,
            min_pay_per_hour: 15.0,
        }
    }

    fn four_restaurant_instance() -> Instance {
        let restaurants: Vec<Restaurant> = (1..=4)
            .map(|i| Restaurant {
                id: RestaurantId::from(format!("r{i}").as_str()),
                location: Coord::new(0.0, 0.0),
            })
            .collect();
        let raw: Vec<RawOrder> = (1..=4)
            .map(|i| RawOrder {
                id: OrderId::from(format!("o{i}").as_str()),
                dropoff: Coord::new(50.0, 0.0),
                placement_time: Minutes(0.0),
                restaurant: RestaurantId::from(format!("r{i}").as_str()),
            })
            .collect();
        Instance::new(vec![], restaurants, raw, params(), Minutes(200.0))
    }

    #[test]
    fn proportion_one_changes_nothing() {
        let instance = four_restaurant_instance();
        let out = subsample(&instance, 1.0, 7, Minutes(200.0));
        assert_eq!(out.orders.len(), instance.orders.len());
        assert_eq!(out.restaurants.len(), instance.restaurants.len());
    }

    #[test]
    fn half_proportion_keeps_at_most_the_ceiling() {
        let instance = four_restaurant_instance();
        let out = subsample(&instance, 0.5, 1, Minutes(200.0));
        assert!(out.orders.len() <= 2);
        assert!(!out.orders.is_empty());
    }

    #[test]
    fn same_seed_drops_the_same_restaurants() {
        let instance = four_restaurant_instance();
        let a = subsample(&instance, 0.5, 42, Minutes(200.0));
        let b = subsample(&instance, 0.5, 42, Minutes(200.0));
        let ids_a: Vec<RestaurantId> = a.restaurants.iter().map(|r| r.id).collect();
        let ids_b: Vec<RestaurantId> = b.restaurants.iter().map(|r| r.id).collect();
        assert_eq!(ids_a, ids_b);
    }
}
