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

use crate::base_types::{Coord, CourierId, Minutes, OrderId, RestaurantId};

/// `couriers.txt` row, augmented with nothing: a courier's attributes are
/// already complete as given.
#[derive(Debug, Clone)]
pub struct Courier {
    pub id: CourierId,
    pub home: Coord,
    pub on: Minutes,
    pub off: Minutes,
}

/// `restaurants.txt` row.
#[derive(Debug, Clone)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub location: Coord,
}

/// `orders.txt` row, augmented during preprocessing (`spec.md` §4.A) with the
/// four derived fields every later stage relies on.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub dropoff: Coord,
    pub placement_time: Minutes,
    pub restaurant: RestaurantId,

    /// `placementTime` plus the (instance-wide) target click-to-door offset.
    pub ready_time: Minutes,
    /// `ceil(dist(restaurant, dropoff)/speed) + (pickupSvc + dropoffSvc)/2`.
    pub single_travel_time: Minutes,
    /// `placementTime + maxClickToDoor`.
    pub max_arrival: Minutes,
    /// `min(maxArrival - singleTravelTime, globalOffTime)`. Depends on the
    /// global off-time and is therefore only known once courier grouping
    /// (§4.B) has run; filled in by [`Instance::new`].
    pub latest_leave: Minutes,
}

/// The scalar parameters from `instance_parameters.txt`'s second line.
#[derive(Debug, Clone, Copy)]
pub struct ScalarParams {
    /// Metres per minute.
    pub travel_speed: f64,
    pub pickup_service_time: Minutes,
    pub dropoff_service_time: Minutes,
    pub target_click_to_door: Minutes,
    pub max_click_to_door: Minutes,
    /// Dollars per delivered order.
    pub pay_per_delivery: f64,
    /// Dollars per hour, minimum wage floor.
    pub min_pay_per_hour: f64,
}

impl ScalarParams {
    /// `ceil(dist/speed)`, the pure travel component shared by every leg in
    /// `spec.md` §3's travel-time convention.
    pub fn travel(&self, dist: f64) -> Minutes {
        Minutes((dist / self.travel_speed).ceil())
    }

    /// Home → first restaurant.
    pub fn home_to_restaurant(&self, dist: f64) -> Minutes {
        self.travel(dist) + Minutes(self.pickup_service_time.0 / 2.0)
    }

    /// Restaurant → first order's drop-off within a sequence.
    pub fn restaurant_to_first_order(&self, dist: f64) -> Minutes {
        self.travel(dist) + Minutes((self.pickup_service_time.0 + self.dropoff_service_time.0) / 2.0)
    }

    /// Order → next order.
    pub fn order_to_order(&self, dist: f64) -> Minutes {
        self.travel(dist) + self.dropoff_service_time
    }

    /// Last order → next restaurant.
    pub fn order_to_restaurant(&self, dist: f64) -> Minutes {
        self.travel(dist) + Minutes((self.dropoff_service_time.0 + self.pickup_service_time.0) / 2.0)
    }
}

/// All objects created once in preprocessing and immutable thereafter
/// (`spec.md` §3 "Ownership and lifecycle").
#[derive(Debug, Clone)]
pub struct Instance {
    pub couriers: Vec<Courier>,
    pub orders: Vec<Order>,
    pub restaurants: Vec<Restaurant>,
    pub params: ScalarParams,

    restaurant_by_id: HashMap<RestaurantId, usize>,
    orders_by_restaurant: HashMap<RestaurantId, Vec<usize>>,
    courier_by_id: HashMap<CourierId, usize>,
}

impl Instance {
    /// Builds the instance, augmenting every order with its derived fields
    /// (`spec.md` §4.A). `global_off_time` is the maximum off-time across all
    /// courier groups (`spec.md` §4.B) and caps every order's `latest_leave`,
    /// per the open question in `spec.md` §9 ("specified behaviour, not a
    /// bug").
    pub fn new(
        couriers: Vec<Courier>,
        restaurants: Vec<Restaurant>,
        mut raw_orders: Vec<RawOrder>,
        params: ScalarParams,
        global_off_time: Minutes,
    ) -> Instance {
        let restaurant_by_id: HashMap<RestaurantId, usize> = restaurants
            .iter()
            .enumerate()
            .map(|(idx, r)| (r.id, idx))
            .collect();

        let orders: Vec<Order> = raw_orders
            .drain(..)
            .map(|raw| {
                let restaurant = &restaurants[restaurant_by_id[&raw.restaurant]];
                let dist = restaurant.location.dist(&raw.dropoff);
                let single_travel_time = params.restaurant_to_first_order(dist);
                let ready_time = raw.placement_time + params.target_click_to_door;
                let max_arrival = raw.placement_time + params.max_click_to_door;
                let latest_leave = (max_arrival - single_travel_time).min(global_off_time);
                Order {
                    id: raw.id,
                    dropoff: raw.dropoff,
                    placement_time: raw.placement_time,
                    restaurant: raw.restaurant,
                    ready_time,
                    single_travel_time,
                    max_arrival,
                    latest_leave,
                }
            })
            .collect();

        let mut orders_by_restaurant: HashMap<RestaurantId, Vec<usize>> = HashMap::new();
        for (idx, order) in orders.iter().enumerate() {
            orders_by_restaurant.entry(order.restaurant).or_default().push(idx);
        }

        let courier_by_id: HashMap<CourierId, usize> = couriers
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.id, idx))
            .collect();

        Instance {
            couriers,
            orders,
            restaurants,
            params,
            restaurant_by_id,
            orders_by_restaurant,
            courier_by_id,
        }
    }

    pub fn restaurant(&self, id: RestaurantId) -> &Restaurant {
        &self.restaurants[self.restaurant_by_id[&id]]
    }

    pub fn courier(&self, id: CourierId) -> &Courier {
        &self.couriers[self.courier_by_id[&id]]
    }

    pub fn orders_at(&self, restaurant: RestaurantId) -> impl Iterator<Item = &Order> {
        self.orders_by_restaurant
            .get(&restaurant)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.orders[idx])
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }
}

/// The un-augmented order row as read from `orders.txt`, before `latest_leave`
/// can be computed (it needs the global off-time).
#[derive(Debug, Clone)]
pub struct RawOrder {
    pub id: OrderId,
    pub dropoff: Coord,
    pub placement_time: Minutes,
    pub restaurant: RestaurantId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ScalarParams {
        ScalarParams {
            travel_speed: 75.0,
            pickup_service_time: Minutes(2.0),
            dropoff_service_time: Minutes(2.0),
            target_click_to_door: Minutes(5.0),
            max_click_to_door: Minutes(40.0),
            pay_per_delivery: 4.0,
            min_pay_per_hour: 15.0,
        }
    }

    #[test]
    fn derives_order_fields() {
        let p = params();
        let restaurants = vec![Restaurant {
            id: RestaurantId::from("r1"),
            location: Coord::new(0.0, 0.0),
        }];
        let raw = vec![RawOrder {
            id: OrderId::from("o1"),
            dropoff: Coord::new(150.0, 0.0),
            placement_time: Minutes(0.0),
            restaurant: RestaurantId::from("r1"),
        }];
        let instance = Instance::new(vec![], restaurants, raw, p, Minutes(1000.0));
        let order = &instance.orders[0];
        // dist 150, speed 75 => travel 2min; + (pickup+dropoff)/2 = 2 => single_travel_time 4
        assert_eq!(order.single_travel_time, Minutes(4.0));
        assert_eq!(order.ready_time, Minutes(5.0));
        assert_eq!(order.max_arrival, Minutes(40.0));
        assert_eq!(order.latest_leave, Minutes(36.0));
    }

    #[test]
    fn global_off_time_caps_latest_leave() {
        let p = params();
        let restaurants = vec![Restaurant {
            id: RestaurantId::from("r1"),
            location: Coord::new(0.0, 0.0),
        }];
        let raw = vec![RawOrder {
            id: OrderId::from("o1"),
            dropoff: Coord::new(0.0, 0.0),
            placement_time: Minutes(0.0),
            restaurant: RestaurantId::from("r1"),
        }];
        let instance = Instance::new(vec![], restaurants, raw, p, Minutes(10.0));
        assert_eq!(instance.orders[0].latest_leave, Minutes(10.0));
    }
}
