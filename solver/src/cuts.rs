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

//! The lazy-cut sink (`spec.md` §4.J valid inequalities and §4.K illegal-path
//! cuts). Write-only from the outside (`spec.md` §5): the driver appends,
//! nothing ever removes a cut once added.

use good_lp::{constraint, Constraint, Expression, Variable};

use network::{TimedArcIx, UntimedArcIx};

use crate::formulation::activation;

/// One lazy constraint, in the vocabulary of untimed arcs. Translated to a
/// concrete `good_lp::Constraint` only when the MIP is (re)built, since the
/// underlying `Variable` handles are rebuilt on every resolve
/// (`formulation::solve`).
#[derive(Debug, Clone)]
pub enum Cut {
    /// §4.J: `∑_t x_t ≤ ∑ over feasible predecessors`.
    PredecessorVi {
        arc: UntimedArcIx,
        predecessors: Vec<UntimedArcIx>,
    },
    /// §4.J: symmetric, over feasible successors.
    SuccessorVi {
        arc: UntimedArcIx,
        successors: Vec<UntimedArcIx>,
    },
    /// §4.K.3: an active arc with no successor/predecessor in the
    /// restricted active-arc chain graph forces a global equality.
    GlobalChainEquality { arc: UntimedArcIx, others: Vec<UntimedArcIx> },
    /// §4.K.7: illegal-path elimination, one per side (predecessor /
    /// successor alternates).
    IllegalPath {
        invalid: Vec<UntimedArcIx>,
        alternates: Vec<UntimedArcIx>,
    },
}

impl Cut {
    pub fn to_constraint(&self, arcs_by_untimed: &[Vec<TimedArcIx>], arc_vars: &[Variable]) -> Constraint {
        let act = |ix: UntimedArcIx| activation(ix, arcs_by_untimed, arc_vars);
        let sum = |ixs: &[UntimedArcIx]| -> Expression {
            ixs.iter().fold(Expression::from(0.0), |acc, &ix| acc + act(ix))
        };

        match self {
            Cut::PredecessorVi { arc, predecessors } => {
                let lhs = act(*arc);
                let rhs = sum(predecessors);
                constraint!(lhs <= rhs)
            }
            Cut::SuccessorVi { arc, successors } => {
                let lhs = act(*arc);
                let rhs = sum(successors);
                constraint!(lhs <= rhs)
            }
            Cut::GlobalChainEquality { arc, others } => {
                let lhs = act(*arc);
                let rhs = sum(others);
                constraint!(lhs == rhs)
            }
            Cut::IllegalPath { invalid, alternates } => {
                let lhs = sum(invalid);
                let rhs = Expression::from((invalid.len() as f64) - 1.0) + sum(alternates);
                constraint!(lhs <= rhs)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use good_lp::{variable, ProblemVariables, Solution, SolverModel};

    #[test]
    fn illegal_path_constraint_forbids_both_invalid_arcs_at_once() {
        let mut vars = ProblemVariables::new();
        let a = vars.add(variable().binary());
        let b = vars.add(variable().binary());
        let arcs_by_untimed = vec![vec![0], vec![1]];
        let arc_vars = vec![a, b];

        let cut = Cut::IllegalPath {
            invalid: vec![0, 1],
            alternates: vec![],
        };
        let constraint = cut.to_constraint(&arcs_by_untimed, &arc_vars);

        let solution = vars
            .maximise(a + b)
            .using(good_lp::default_solver)
            .with(constraint)
            .solve()
            .expect("feasible");
        assert!(solution.value(a) + solution.value(b) <= 1.5);
    }

    #[test]
    fn predecessor_vi_forbids_the_arc_without_an_active_predecessor() {
        let mut vars = ProblemVariables::new();
        let a = vars.add(variable().binary());
        let p = vars.add(variable().binary());
        let arcs_by_untimed = vec![vec![0], vec![1]];
        let arc_vars = vec![a, p];

        let cut = Cut::PredecessorVi {
            arc: 0,
            predecessors: vec![1],
        };
        let constraint = cut.to_constraint(&arcs_by_untimed, &arc_vars);

        // Force the predecessor off; the arc must then be forced off too.
        let solution = vars
            .maximise(a)
            .using(good_lp::default_solver)
            .with(constraint)
            .with(good_lp::constraint!(p == 0.0))
            .solve()
            .expect("feasible");
        assert!(solution.value(a) < 0.5);
    }
}
