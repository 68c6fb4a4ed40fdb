//! Elite set of evaluated programs.

use crate::ast::AlgorithmProgram;
use crate::eval::Fitness;
use crate::random::GaaRng;
use rand::Rng;

/// An evaluated program.
#[derive(Debug, Clone)]
pub struct Member {
    pub program: AlgorithmProgram,
    pub fitness: Fitness,
    /// Insertion order; breaks fitness ties.
    pub order: u64,
}

/// A bounded set of the best programs seen, best first.
///
/// Members are ordered by `(fitness, insertion order)`; when full, the last
/// member is evicted, so ties never reorder earlier entries. Structurally
/// identical programs are stored once.
#[derive(Debug, Clone)]
pub struct Population {
    capacity: usize,
    members: Vec<Member>,
    next_order: u64,
}

impl Population {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            members: Vec::with_capacity(capacity.max(1) + 1),
            next_order: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn best(&self) -> Option<&Member> {
        self.members.first()
    }

    /// Offers a program. Returns `true` if it is a member afterwards.
    pub fn offer(&mut self, program: &AlgorithmProgram, fitness: Fitness) -> bool {
        if self.members.iter().any(|m| m.program.arena() == program.arena()) {
            return true;
        }
        let order = self.next_order;
        self.next_order += 1;
        let pos = self
            .members
            .partition_point(|m| (m.fitness, m.order) <= (fitness, order));
        if pos >= self.capacity {
            return false;
        }
        self.members.insert(
            pos,
            Member {
                program: program.clone(),
                fitness,
                order,
            },
        );
        self.members.truncate(self.capacity);
        true
    }

    /// A uniformly chosen member.
    pub fn random(&self, rng: &mut GaaRng) -> Option<&Member> {
        if self.members.is_empty() {
            None
        } else {
            Some(&self.members[rng.random_range(0..self.members.len())])
        }
    }

    pub fn into_members(self) -> Vec<Member> {
        self.members
    }
}
