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

//! Thin runnable wrapper around `model`/`network`/`solver` (`spec.md` §6).
//! Not part of the core: this crate only exists so the workspace produces a
//! program, and nothing under `network`/`solver` depends on it.

mod instance_io;
mod report;

use std::path::Path;

use model::config::Options;
use model::courier_group::group_couriers;
use model::diagnostics::Diagnostics;
use model::instance::Instance;

fn main() {
    let instance_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "instances/default".to_string());
    let options_path = std::env::args().nth(2);

    let options = match options_path {
        Some(path) => {
            let contents = std::fs::read_to_string(&path).expect("cannot read options file");
            serde_json::from_str(&contents).expect("malformed options JSON")
        }
        None => Options::default(),
    };

    let dir = Path::new(&instance_dir);
    let couriers = instance_io::read_couriers(dir);
    let restaurants = instance_io::read_restaurants(dir);
    let raw_orders = instance_io::read_orders(dir);
    let params = instance_io::read_scalar_params(dir);

    let (_, global_off_time) = group_couriers(&couriers, options.grouping);
    let instance = Instance::new(couriers, restaurants, raw_orders, params, global_off_time);

    let mut diagnostics = Diagnostics::new();
    let (instance, network) = network::build_network(&instance, &options, &mut diagnostics);
    let outcome = solver::solve(&instance, &network, &options, &mut diagnostics);

    println!("{}", report::render(&network, &outcome));

    if !diagnostics.is_empty() {
        eprintln!("{} diagnostic(s) raised during the run", diagnostics.entries().len());
    }
}
