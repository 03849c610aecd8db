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

//! Reads the textual instance files (`spec.md` §6). This is the external
//! collaborator `spec.md` §1 explicitly places out of the core's scope.

use std::path::Path;

use model::base_types::{Coord, CourierId, Minutes, OrderId, RestaurantId};
use model::instance::{Courier, RawOrder, Restaurant, ScalarParams};

/// Strips any leading non-digit prefix from an instance id (`spec.md` §6:
/// "IDs may include letter prefixes to strip").
fn strip_prefix(raw: &str) -> &str {
    raw.trim_start_matches(|c: char| !c.is_ascii_digit())
}

fn reader(path: &Path) -> csv::Reader<std::fs::File> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

pub fn read_couriers(dir: &Path) -> Vec<Courier> {
    let mut out = Vec::new();
    let mut rdr = reader(&dir.join("couriers.txt"));
    for record in rdr.records() {
        let record = record.expect("malformed row in couriers.txt");
        out.push(Courier {
            id: CourierId::from(strip_prefix(&record[0])),
            home: Coord::new(
                record[1].parse().expect("courier x"),
                record[2].parse().expect("courier y"),
            ),
            on: Minutes(record[3].parse().expect("courier onTime")),
            off: Minutes(record[4].parse().expect("courier offTime")),
        });
    }
    out
}

pub fn read_restaurants(dir: &Path) -> Vec<Restaurant> {
    let mut out = Vec::new();
    let mut rdr = reader(&dir.join("restaurants.txt"));
    for record in rdr.records() {
        let record = record.expect("malformed row in restaurants.txt");
        out.push(Restaurant {
            id: RestaurantId::from(strip_prefix(&record[0])),
            location: Coord::new(
                record[1].parse().expect("restaurant x"),
                record[2].parse().expect("restaurant y"),
            ),
        });
    }
    out
}

pub fn read_orders(dir: &Path) -> Vec<RawOrder> {
    let mut out = Vec::new();
    let mut rdr = reader(&dir.join("orders.txt"));
    for record in rdr.records() {
        let record = record.expect("malformed row in orders.txt");
        out.push(RawOrder {
            id: OrderId::from(strip_prefix(&record[0])),
            dropoff: Coord::new(
                record[1].parse().expect("order x"),
                record[2].parse().expect("order y"),
            ),
            placement_time: Minutes(record[3].parse().expect("order placementTime")),
            restaurant: RestaurantId::from(strip_prefix(&record[4])),
        });
    }
    out
}

pub fn read_scalar_params(dir: &Path) -> ScalarParams {
    let contents = std::fs::read_to_string(dir.join("instance_parameters.txt"))
        .expect("cannot read instance_parameters.txt");
    let mut lines = contents.lines();
    lines.next().expect("instance_parameters.txt missing header line");
    let values_line = lines.next().expect("instance_parameters.txt missing value line");
    let values: Vec<f64> = values_line
        .split('\t')
        .map(|v| v.trim().parse().expect("instance parameter is not a number"))
        .collect();

    ScalarParams {
        travel_speed: values[0],
        pickup_service_time: Minutes(values[1]),
        dropoff_service_time: Minutes(values[2]),
        target_click_to_door: Minutes(values[3]),
        max_click_to_door: Minutes(values[4]),
        pay_per_delivery: values[5],
        min_pay_per_hour: values[6],
    }
}
