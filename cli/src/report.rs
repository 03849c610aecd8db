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

//! Renders a [`DriverOutcome`] as the `0 -> S1 -> r1 -> ... -> 0` per-courier
//! journey text plus the objective value (`spec.md` §6 Output).

use model::base_types::CourierId;
use network::{Network, UntimedArcIx};
use solver::DriverOutcome;
use std::collections::HashMap;
use std::fmt::Write as _;

fn journey_line(network: &Network, chain: &[UntimedArcIx]) -> String {
    // Each arc contributes the orders it delivers, then the restaurant it
    // arrives at (entry/exit arcs just contribute one side of that).
    let mut out = String::from("0");
    for &ix in chain {
        let arc = &network.untimed_arcs[ix];
        for order in &arc.orders {
            let _ = write!(out, " -> {order}");
        }
        if let Some(r) = arc.to_restaurant {
            let _ = write!(out, " -> {r}");
        }
    }
    out.push_str(" -> 0");
    out
}

fn render_journeys(network: &Network, journeys: &HashMap<CourierId, Vec<UntimedArcIx>>) -> String {
    let mut couriers: Vec<&CourierId> = journeys.keys().collect();
    couriers.sort();
    let mut out = String::new();
    for courier in couriers {
        let _ = writeln!(out, "{courier}: {}", journey_line(network, &journeys[courier]));
    }
    out
}

pub fn render(network: &Network, outcome: &DriverOutcome) -> String {
    match outcome {
        DriverOutcome::Optimal { objective, journeys } => {
            let mut out = String::new();
            if let Some(obj) = objective {
                let _ = writeln!(out, "objective: {obj:.2}");
            }
            out.push_str(&render_journeys(network, journeys));
            out
        }
        DriverOutcome::IterationLimitReached { objective, journeys } => {
            let mut out = String::from("warning: iteration cap reached before the callback stabilised\n");
            if let Some(obj) = objective {
                let _ = writeln!(out, "objective: {obj:.2}");
            }
            out.push_str(&render_journeys(network, journeys));
            out
        }
        DriverOutcome::Infeasible => "infeasible: no assignment covers every order\n".to_string(),
    }
}
