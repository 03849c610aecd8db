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

//! The MIP formulation (`spec.md` §4.I): flow variables, order-cover,
//! shift-start, payment constraints, objective.

use std::collections::HashMap;

use good_lp::{constraint, variable, Expression, ProblemVariables, Solution as GoodLpSolution, SolverModel, Variable};

use model::base_types::CourierId;
use model::config::Options;
use model::instance::Instance;
use network::{Network, TimedArcIx, UntimedArcIx};

use crate::cuts::Cut;

/// The values of every decision variable at a resolve (`good_lp`'s `Variable`
/// handles die with the `ProblemVariables` they came from, so nothing
/// upstream of `solve` ever sees them — only the numbers).
pub struct FormulationSolution {
    /// `x_a` values, one per timed arc.
    pub arc_values: Vec<f64>,
    /// `y_c` values, one per courier.
    pub courier_start_values: HashMap<CourierId, f64>,
    /// The objective value (`None` when `consider_objective` is off).
    pub objective: Option<f64>,
}

/// `arcsByUntimed`: which timed arcs realise a given untimed arc. Built once
/// and reused by every resolve (`spec.md` §3 "Ownership and lifecycle": the
/// index is immutable once preprocessing has run).
pub fn arcs_by_untimed(network: &Network) -> Vec<Vec<TimedArcIx>> {
    let mut out = vec![Vec::new(); network.untimed_arcs.len()];
    for (ix, arc) in network.timed_arcs.iter().enumerate() {
        if let Some(u) = arc.untimed_arc {
            out[u].push(ix);
        }
    }
    out
}

fn arcs_by_node(network: &Network) -> (Vec<Vec<TimedArcIx>>, Vec<Vec<TimedArcIx>>) {
    let n = network.nodes.nodes.len();
    let mut incoming = vec![Vec::new(); n];
    let mut outgoing = vec![Vec::new(); n];
    for (ix, arc) in network.timed_arcs.iter().enumerate() {
        outgoing[arc.from].push(ix);
        incoming[arc.to].push(ix);
    }
    (incoming, outgoing)
}

pub(crate) fn activation(ix: UntimedArcIx, arcs_by_untimed: &[Vec<TimedArcIx>], arc_vars: &[Variable]) -> Expression {
    arcs_by_untimed[ix]
        .iter()
        .fold(Expression::from(0.0), |acc, &t| acc + arc_vars[t])
}

fn sum_vars(vars: impl Iterator<Item = Variable>) -> Expression {
    vars.fold(Expression::from(0.0), |acc, v| acc + v)
}

/// Builds and solves the MIP with `cuts` added on top of the base
/// constraints (`spec.md` §4.I plus whichever lazy cuts §4.J/§4.K have
/// accumulated so far). `good_lp`'s API has no notion of incremental
/// re-solve, so each call rebuilds the problem from scratch: the variable
/// vectors are deterministic (same order every time), so this is equivalent
/// to, just slower than, adding constraints to a solver instance kept warm.
pub fn solve(
    instance: &Instance,
    network: &Network,
    options: &Options,
    cuts: &[Cut],
) -> Result<FormulationSolution, good_lp::ResolutionError> {
    let mut vars = ProblemVariables::new();

    let arc: Vec<Variable> = network
        .timed_arcs
        .iter()
        .map(|a| {
            if a.is_waiting() {
                vars.add(variable().min(0.0))
            } else {
                vars.add(variable().integer().min(0.0))
            }
        })
        .collect();

    let courier_starts: HashMap<CourierId, Variable> = instance
        .couriers
        .iter()
        .map(|c| (c.id, vars.add(variable().binary())))
        .collect();

    let group_pay: Vec<Variable> = network.groups.iter().map(|_| vars.add(variable().min(0.0))).collect();

    let objective: Expression = if options.consider_objective {
        sum_vars(group_pay.iter().copied())
    } else {
        Expression::from(0.0)
    };

    let mut problem = vars.minimise(objective).using(good_lp::default_solver);

    let untimed_activations = arcs_by_untimed(network);
    let (incoming, outgoing) = arcs_by_node(network);
    let min_pay_per_minute = instance.params.min_pay_per_hour / 60.0;

    // Pay-per-delivery and pay-per-time floors, one pair per group (§4.I).
    for (g_ix, group) in network.groups.iter().enumerate() {
        let delivery_component: Expression = network
            .untimed_arcs
            .iter()
            .enumerate()
            .filter(|(_, a)| a.group == g_ix && !a.orders.is_empty())
            .fold(Expression::from(0.0), |acc, (u_ix, a)| {
                acc + activation(u_ix, &untimed_activations, &arc) * a.orders.len() as f64
            });

        let no_start_component: Expression = group.members.iter().fold(Expression::from(0.0), |acc, &cid| {
            let courier = instance.courier(cid);
            let shift_len = (courier.off - courier.on).0;
            acc + (Expression::from(1.0) - courier_starts[&cid]) * shift_len
        });

        problem = problem.with(constraint!(
            group_pay[g_ix]
                >= delivery_component * instance.params.pay_per_delivery + no_start_component * min_pay_per_minute
        ));

        let shift_total: f64 = group
            .members
            .iter()
            .map(|&cid| (instance.courier(cid).off - instance.courier(cid).on).0)
            .sum();
        problem = problem.with(constraint!(group_pay[g_ix] >= shift_total * min_pay_per_minute));
    }

    // Flow conservation at every non-home node (§4.I).
    for (node_ix, node) in network.nodes.nodes.iter().enumerate() {
        if node.restaurant.is_none() {
            continue;
        }
        let in_expr = sum_vars(incoming[node_ix].iter().map(|&t| arc[t]));
        let out_expr = sum_vars(outgoing[node_ix].iter().map(|&t| arc[t]));
        problem = problem.with(constraint!(in_expr == out_expr));
    }

    // Entry linkage: a courier's entry-arc usage equals whether it starts.
    for courier in &instance.couriers {
        let entry_sum = sum_vars(
            network
                .timed_arcs
                .iter()
                .enumerate()
                .filter(|(_, a)| a.courier == Some(courier.id))
                .map(|(t, _)| arc[t]),
        );
        problem = problem.with(constraint!(entry_sum == courier_starts[&courier.id]));
    }

    // Order coverage: every order delivered by exactly one timed arc.
    for order in &instance.orders {
        let cover_sum = sum_vars(
            network
                .timed_arcs
                .iter()
                .enumerate()
                .filter(|(_, a)| a.orders.contains(&order.id))
                .map(|(t, _)| arc[t]),
        );
        problem = problem.with(constraint!(cover_sum == 1.0));
    }

    for cut in cuts {
        problem = problem.with(cut.to_constraint(&untimed_activations, &arc));
    }

    let solution = problem.solve()?;
    let arc_values: Vec<f64> = arc.iter().map(|v| solution.value(*v)).collect();
    let courier_start_values: HashMap<CourierId, f64> = courier_starts
        .iter()
        .map(|(&cid, &v)| (cid, solution.value(v)))
        .collect();
    let objective = if options.consider_objective {
        Some(group_pay.iter().map(|&p| solution.value(p)).sum())
    } else {
        None
    };

    Ok(FormulationSolution {
        arc_values,
        courier_start_values,
        objective,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::base_types::{Coord, CourierId, Minutes, OrderId, RestaurantId};
    use model::diagnostics::Diagnostics;
    use model::instance::{Courier, RawOrder, Restaurant, ScalarParams};

    fn one_courier_one_order() -> (Instance, Network) {
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
        let instance = Instance::new(couriers, restaurants, raw, params, Minutes(200.0));
        let mut diagnostics = Diagnostics::new();
        let (instance, network) = network::build_network(&instance, &Options::default(), &mut diagnostics);
        (instance, network)
    }

    #[test]
    fn solves_a_trivial_instance_and_covers_the_order() {
        let (instance, network) = one_courier_one_order();
        let solved = solve(&instance, &network, &Options::default(), &[]).expect("feasible");

        let untimed_activations = arcs_by_untimed(&network);
        let order_arc = network
            .untimed_arcs
            .iter()
            .position(|a| a.orders.contains(&OrderId::from("o1")))
            .expect("an untimed arc delivers o1");
        let delivered = untimed_activations[order_arc]
            .iter()
            .map(|&t| solved.arc_values[t])
            .sum::<f64>();
        assert!(delivered > 0.5, "the only order must be delivered");
        assert_eq!(solved.courier_start_values.len(), 1);
    }

    #[test]
    fn without_the_objective_any_feasible_assignment_is_returned() {
        let (instance, network) = one_courier_one_order();
        let options = Options {
            consider_objective: false,
            ..Options::default()
        };
        let solved = solve(&instance, &network, &options, &[]).expect("feasible");
        assert!(solved.objective.is_none());
    }
}
