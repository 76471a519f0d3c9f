//! # Ring Topology
//!
//! N forks around a table, N philosophers between them. Philosopher `i`
//! sits between fork `i` (left) and fork `(i + 1) mod N` (right).
//!
//! ```text
//!              fork 0
//!        P4 ─────────── P0
//!   fork 4 │             │ fork 1
//!        P3               P1
//!          └─ fork 3 ─ P2 ┘ fork 2
//! ```
//!
//! ## Acquisition order
//!
//! If every philosopher takes left then right, the wait-for graph is one
//! cycle through all forks: everybody can hold their left fork and wait on
//! their right one forever. Reversing the order for the last seat breaks
//! that cycle. Timeouts on each attempt remain the actual guarantee; the
//! reversal only removes the symmetric cycle.
//!
//! With a single philosopher both "forks" are the same fork. It is taken
//! once and serves both hands.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::fork::Fork;

/// How forks are ordered for acquisition around the ring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionOrder {
    /// Left then right, except the last seat which takes right then left.
    #[default]
    ReverseLast,
    /// Left then right for everybody. Contains a wait cycle; kept for
    /// contrast in stress runs.
    Uniform,
}

/// Which forks an agent reaches for, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ForkAssignment {
    /// The agent this assignment belongs to.
    pub agent: usize,
    /// Ring position of the fork taken first.
    pub primary: usize,
    /// Ring position of the fork taken second.
    pub secondary: usize,
}

impl ForkAssignment {
    /// Computes the assignment of `agent` in a ring of `agents` seats.
    #[must_use]
    pub const fn for_seat(agent: usize, agents: usize, order: AcquisitionOrder) -> Self {
        let left = agent;
        let right = (agent + 1) % agents;
        let reversed =
            matches!(order, AcquisitionOrder::ReverseLast) && agents > 1 && agent == agents - 1;

        if reversed {
            Self { agent, primary: right, secondary: left }
        } else {
            Self { agent, primary: left, secondary: right }
        }
    }

    /// True in the single-seat ring, where both hands share one fork.
    #[inline]
    #[must_use]
    pub const fn single_fork(&self) -> bool {
        self.primary == self.secondary
    }
}

/// The table: forks plus every seat's assignment.
#[derive(Debug)]
pub struct Ring {
    forks: Arc<[Fork]>,
    assignments: Vec<ForkAssignment>,
    order: AcquisitionOrder,
}

impl Ring {
    /// Lays out `agents` forks and seats.
    ///
    /// # Panics
    ///
    /// Panics if `agents` is zero. Configs are validated before a ring is built.
    #[must_use]
    pub fn new(agents: usize, order: AcquisitionOrder) -> Self {
        assert!(agents > 0, "a ring needs at least one seat");

        let forks: Arc<[Fork]> = (0..agents).map(Fork::new).collect();
        let assignments = (0..agents)
            .map(|agent| ForkAssignment::for_seat(agent, agents, order))
            .collect();

        Self { forks, assignments, order }
    }

    /// Number of seats (and forks).
    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Always false; a ring has at least one seat.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Acquisition order this ring was laid out with.
    #[must_use]
    pub const fn order(&self) -> AcquisitionOrder {
        self.order
    }

    /// Shared handle to the forks.
    #[must_use]
    pub fn forks(&self) -> &Arc<[Fork]> {
        &self.forks
    }

    /// Every seat's assignment, in identity order.
    #[must_use]
    pub fn assignments(&self) -> &[ForkAssignment] {
        &self.assignments
    }

    /// Assignment of one seat.
    #[must_use]
    pub fn assignment(&self, agent: usize) -> Option<ForkAssignment> {
        self.assignments.get(agent).copied()
    }

    /// True if every fork can be taken by a fresh probe.
    #[must_use]
    pub fn all_forks_free(&self) -> bool {
        self.forks.iter().all(Fork::is_free)
    }

    /// Returns true if the primary → secondary wait-for graph has a cycle,
    /// i.e. every agent on it could hold its primary and block on its
    /// secondary at the same time.
    #[must_use]
    pub fn has_wait_cycle(&self) -> bool {
        let n = self.forks.len();
        let mut edges = vec![Vec::new(); n];
        for assignment in self.assignments.iter().filter(|a| !a.single_fork()) {
            edges[assignment.primary].push(assignment.secondary);
        }

        // 0 = unvisited, 1 = on stack, 2 = done
        let mut state = vec![0u8; n];
        (0..n).any(|start| state[start] == 0 && Self::visit(start, &edges, &mut state))
    }

    fn visit(node: usize, edges: &[Vec<usize>], state: &mut [u8]) -> bool {
        state[node] = 1;
        for &next in &edges[node] {
            let seen = state[next];
            if seen == 1 || (seen == 0 && Self::visit(next, edges, state)) {
                return true;
            }
        }
        state[node] = 2;
        false
    }
}
