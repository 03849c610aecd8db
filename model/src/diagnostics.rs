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

use thiserror::Error;

/// The error kinds named in `spec.md` §7. None of these are thrown: they are
/// pushed onto a [`Diagnostics`] sink and the computation continues, per the
/// "log and continue" design.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Diagnostic {
    #[error("sequence {orders:?} at restaurant {restaurant}: {detail}")]
    InconsistentSequence { restaurant: String, orders: Vec<String>, detail: String },

    #[error("untimed arc {arc} has an empty window: earliestLeave {earliest} > latestLeave {latest}")]
    CrossedUntimedArcWindow { arc: String, earliest: i64, latest: i64 },

    #[error("timed arc {arc} runs backwards in time: departs {t1} arrives {t2}")]
    BackwardsTimedArc { arc: String, t1: i64, t2: i64 },

    #[error("active arc {arc} has no {side} in an incumbent, which should be impossible")]
    ImpossibleMissingChain { arc: String, side: &'static str },

    #[error("duplicate untimed arc {arc} activated by more than one timed arc in an integer solution")]
    DuplicateUntimedArcInSolution { arc: String },

    #[error("order {order} has no timed arc that can deliver it")]
    UnreachableOrder { order: String },

    #[error("courier {courier} has no entry arc")]
    CourierWithoutEntryArc { courier: String },
}

/// A growth-only collection of diagnostics raised during preprocessing or
/// solving. Never causes an early return; callers decide what to do with the
/// contents once the pipeline has run to completion.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        eprintln!("[mdrp] {diagnostic}");
        self.entries.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_without_aborting() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::UnreachableOrder {
            order: "o1".to_string(),
        });
        diagnostics.push(Diagnostic::CourierWithoutEntryArc {
            courier: "c1".to_string(),
        });
        assert_eq!(diagnostics.entries().len(), 2);
    }
}
