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

//! The illegal-path callback's auxiliary MIP ("Illegal Path Determination",
//! `spec.md` §4.K.4) plus the deletion-filter IIS extraction (§4.K.5).

use std::collections::HashSet;

use good_lp::{constraint, variable, Expression, ProblemVariables, SolverModel, Variable};

use model::base_types::CourierId;
use model::instance::Instance;
use network::{pred_succ::build_pred_succ_index, UntimedArc, UntimedArcIx};

/// The constraint families the IIS deletion filter can drop one at a time
/// (`spec.md` §4.K.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    LeaveAfterEarlyTime,
    LeaveBeforeLateTime,
    EnoughTimeForBothArcs,
    PredecessorArcsUsedOnce,
    SuccessorArcsUsedOnce,
}

/// A tagged family instance: `EnoughTimeForBothArcs` is per edge (identified
/// by the local index of its source arc and the position in its successor
/// list); every other family is per local arc index.
pub type FamilyInstance = (Family, usize, usize);

fn build_and_solve(
    instance: &Instance,
    local_arcs: &[UntimedArc],
    used_couriers: &[CourierId],
    disabled: &HashSet<FamilyInstance>,
) -> bool {
    let local_pred_succ = build_pred_succ_index(local_arcs);
    let mut vars = ProblemVariables::new();

    let t: Vec<Variable> = local_arcs.iter().map(|_| vars.add(variable().min(0.0))).collect();

    // X_{i,j}: edge i -> j is used, only over (local) predecessor/successor pairs.
    let mut x: Vec<Vec<Option<Variable>>> = vec![vec![None; local_arcs.len()]; local_arcs.len()];
    for (i, _) in local_arcs.iter().enumerate() {
        for &j in local_pred_succ.successors_of(i) {
            x[i][j] = Some(vars.add(variable().binary()));
        }
    }

    // Y_{c,a}: courier c (by position in `used_couriers`) executes arc a.
    let y: Vec<Vec<Variable>> = used_couriers
        .iter()
        .map(|_| local_arcs.iter().map(|_| vars.add(variable().binary())).collect())
        .collect();

    let z: Vec<Variable> = used_couriers.iter().map(|_| vars.add(variable().min(0.0))).collect();

    let objective = z.iter().fold(Expression::from(0.0), |acc, &v| acc + v);
    let mut problem = vars.minimise(objective).using(good_lp::default_solver);

    // (a)/(b) earliestLeave(a) <= T_a <= latestLeave(a)
    for (ix, arc) in local_arcs.iter().enumerate() {
        if !disabled.contains(&(Family::LeaveAfterEarlyTime, ix, 0)) {
            problem = problem.with(constraint!(t[ix] >= arc.earliest_leave.0));
        }
        if !disabled.contains(&(Family::LeaveBeforeLateTime, ix, 0)) {
            problem = problem.with(constraint!(t[ix] <= arc.latest_leave.0));
        }
    }

    // big-M chaining: T_i + travel(i) <= T_j + M_ij * (1 - X_ij)
    for (i, arc_i) in local_arcs.iter().enumerate() {
        for (pos, &j) in local_pred_succ.successors_of(i).iter().enumerate() {
            if disabled.contains(&(Family::EnoughTimeForBothArcs, i, pos)) {
                continue;
            }
            let arc_j = &local_arcs[j];
            let big_m = (arc_i.latest_leave + arc_i.travel - arc_j.earliest_leave).0.max(0.0);
            let xij = x[i][j].expect("edge exists because j is in successors_of(i)");
            problem = problem.with(constraint!(
                t[i] + arc_i.travel.0 <= t[j] + big_m * (Expression::from(1.0) - xij)
            ));
        }
    }

    // each arc with predecessors uses exactly one of them
    for (j, arc_j) in local_arcs.iter().enumerate() {
        if arc_j.orders.is_empty() {
            continue; // entry arc: no predecessors required
        }
        if disabled.contains(&(Family::PredecessorArcsUsedOnce, j, 0)) {
            continue;
        }
        let predecessors = local_pred_succ.predecessors_of(j);
        let sum = predecessors
            .iter()
            .fold(Expression::from(0.0), |acc, &i| acc + x[i][j].unwrap());
        problem = problem.with(constraint!(sum == 1.0));
    }

    // each arc with successors uses exactly one of them
    for (i, arc_i) in local_arcs.iter().enumerate() {
        if arc_i.to_restaurant.is_none() {
            continue; // exit arc: no successors required
        }
        if disabled.contains(&(Family::SuccessorArcsUsedOnce, i, 0)) {
            continue;
        }
        let successors = local_pred_succ.successors_of(i);
        let sum = successors
            .iter()
            .fold(Expression::from(0.0), |acc, &j| acc + x[i][j].unwrap());
        problem = problem.with(constraint!(sum == 1.0));
    }

    // courier propagation: X_ij + Y_ci - 1 <= Y_cj
    for (i, _) in local_arcs.iter().enumerate() {
        for &j in local_pred_succ.successors_of(i) {
            let xij = x[i][j].unwrap();
            for c in 0..used_couriers.len() {
                problem = problem.with(constraint!(xij + y[c][i] - 1.0 <= y[c][j]));
            }
        }
    }

    // each main arc assigned to exactly one courier
    for (ix, arc) in local_arcs.iter().enumerate() {
        if arc.from_restaurant.is_none() || arc.to_restaurant.is_none() {
            continue;
        }
        let sum = (0..used_couriers.len()).fold(Expression::from(0.0), |acc, c| acc + y[c][ix]);
        problem = problem.with(constraint!(sum == 1.0));
    }

    // each courier drives exactly one of their entry arcs
    for (c, &cid) in used_couriers.iter().enumerate() {
        let sum = local_arcs
            .iter()
            .enumerate()
            .filter(|(_, a)| a.courier == Some(cid))
            .fold(Expression::from(0.0), |acc, (ix, _)| acc + y[c][ix]);
        problem = problem.with(constraint!(sum == 1.0));
    }

    // pay floors for Z_c, one constraint per courier (`spec.md` §9 open question resolution)
    for (c, &cid) in used_couriers.iter().enumerate() {
        let courier = instance.courier(cid);
        let shift_len = (courier.off - courier.on).0;
        let delivery_sum = local_arcs.iter().enumerate().fold(Expression::from(0.0), |acc, (ix, a)| {
            acc + y[c][ix] * a.orders.len() as f64
        });
        problem = problem.with(constraint!(
            z[c] >= delivery_sum * instance.params.pay_per_delivery
        ));
        problem = problem.with(constraint!(z[c] >= shift_len * (instance.params.min_pay_per_hour / 60.0)));
    }

    problem.solve().is_ok()
}

/// All `(family, arc_ix, edge_pos)` instances that could plausibly be part of
/// an IIS: the candidate set the deletion filter walks over.
fn candidate_instances(local_arcs: &[UntimedArc]) -> Vec<FamilyInstance> {
    let local_pred_succ = build_pred_succ_index(local_arcs);
    let mut out = Vec::new();
    for (ix, arc) in local_arcs.iter().enumerate() {
        out.push((Family::LeaveAfterEarlyTime, ix, 0));
        out.push((Family::LeaveBeforeLateTime, ix, 0));
        if !arc.orders.is_empty() {
            out.push((Family::PredecessorArcsUsedOnce, ix, 0));
        }
        if arc.to_restaurant.is_some() {
            out.push((Family::SuccessorArcsUsedOnce, ix, 0));
        }
        for pos in 0..local_pred_succ.successors_of(ix).len() {
            out.push((Family::EnoughTimeForBothArcs, ix, pos));
        }
    }
    out
}

/// Runs the IPD MIP on `local_arcs` (the active untimed arcs of one courier
/// group, indices local to this slice). `None` means IPD was feasible — the
/// incumbent is legal after all, so the callback should accept it and rely
/// on future incumbents (`spec.md` §7 "IPD unexpectedly feasible"). `Some`
/// carries the local indices making up the deletion-filter IIS.
pub fn find_iis(instance: &Instance, local_arcs: &[UntimedArc], used_couriers: &[CourierId]) -> Option<Vec<UntimedArcIx>> {
    let empty = HashSet::new();
    if build_and_solve(instance, local_arcs, used_couriers, &empty) {
        return None;
    }

    let mut disabled: HashSet<FamilyInstance> = HashSet::new();
    let mut iis_arcs: HashSet<UntimedArcIx> = HashSet::new();

    for instance_key in candidate_instances(local_arcs) {
        disabled.insert(instance_key);
        if build_and_solve(instance, local_arcs, used_couriers, &disabled) {
            // Removing this constraint restored feasibility: it was load-bearing.
            iis_arcs.insert(instance_key.1);
            disabled.remove(&instance_key);
        }
        // else: still infeasible without it, keep it disabled and move on.
    }

    Some(iis_arcs.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::base_types::{Coord, Minutes, OrderId, RestaurantId};
    use model::instance::{Courier, ScalarParams};

    fn arc(
        courier: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
        orders: &[&str],
        earliest: f64,
        latest: f64,
        travel: f64,
    ) -> UntimedArc {
        UntimedArc {
            group: 0,
            courier: courier.map(CourierId::from),
            orders: orders.iter().map(|o| OrderId::from(o)).collect(),
            from_restaurant: from.map(RestaurantId::from),
            to_restaurant: to.map(RestaurantId::from),
            earliest_leave: Minutes(earliest),
            latest_leave: Minutes(latest),
            travel: Minutes(travel),
        }
    }

    fn test_instance() -> Instance {
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
        Instance::new(couriers, vec![], vec![], params, Minutes(200.0))
    }

    #[test]
    fn a_clean_entry_main_exit_chain_is_feasible() {
        let instance = test_instance();
        let local_arcs = vec![
            arc(Some("c1"), None, Some("r1"), &[], 0.0, 10.0, 2.0),
            arc(None, Some("r1"), Some("r2"), &["o1"], 5.0, 15.0, 3.0),
            arc(None, Some("r2"), None, &[], 10.0, 40.0, 2.0),
        ];
        let used_couriers = vec![CourierId::from("c1")];
        assert!(find_iis(&instance, &local_arcs, &used_couriers).is_none());
    }

    #[test]
    fn an_order_arc_with_no_courier_ever_assigned_is_infeasible() {
        let instance = test_instance();
        // A main arc with orders but no courier can ever be assigned to it:
        // `used_couriers` is empty, so the "each main arc assigned to exactly
        // one courier" constraint (sum over zero couriers == 1) can never
        // hold, regardless of which candidate family is disabled.
        let local_arcs = vec![arc(None, Some("r1"), Some("r2"), &["o1"], 0.0, 10.0, 5.0)];
        let iis = find_iis(&instance, &local_arcs, &[]);
        assert!(iis.is_some());
    }
}
