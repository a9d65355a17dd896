//! Host-owned variable arena with trail-based backtracking.

use super::variables::{BoundLiteral, IntVar, VarId};
use crate::propagation::{DomainEvent, DomainStore, EmptyDomain, Explanation};
use tracing::trace;

/// A lower-bound tightening applied by a propagator, with its reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Propagation {
    pub var: VarId,
    pub from: i64,
    pub to: i64,
    pub reason: Vec<BoundLiteral>,
}

#[derive(Debug, Clone, Copy)]
struct TrailEntry {
    var: VarId,
    min: i64,
    max: i64,
}

#[derive(Debug, Clone, Copy)]
struct Level {
    trail_len: usize,
    log_len: usize,
}

/// Arena of integer variables addressed by [`VarId`] handles.
///
/// Every bound change is trailed, so [`backtrack`](Self::backtrack) restores
/// the domains of the previous decision level. Tightenings made through
/// [`DomainStore::set_lower_bound`] are logged with their reasons; bound
/// changes are also queued as [`DomainEvent`]s for the fixpoint engine.
///
/// # Examples
///
/// ```
/// use u_robustcp::cp::DomainArena;
///
/// let mut arena = DomainArena::new();
/// let x = arena.new_var("x", 0, 10);
///
/// arena.push_level();
/// arena.set_upper_bound(x, 4).unwrap();
/// assert_eq!(arena.upper_bound(x), 4);
///
/// arena.backtrack();
/// assert_eq!(arena.upper_bound(x), 10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DomainArena {
    vars: Vec<IntVar>,
    trail: Vec<TrailEntry>,
    levels: Vec<Level>,
    log: Vec<Propagation>,
    events: Vec<(VarId, DomainEvent)>,
}

impl DomainArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable and returns its handle.
    pub fn add(&mut self, var: IntVar) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(var);
        id
    }

    /// Convenience: add a variable with domain `[min, max]`.
    pub fn new_var(&mut self, name: impl Into<String>, min: i64, max: i64) -> VarId {
        self.add(IntVar::new(name, min, max))
    }

    pub fn var(&self, id: VarId) -> &IntVar {
        &self.vars[id.0]
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn lower_bound(&self, id: VarId) -> i64 {
        self.vars[id.0].min
    }

    pub fn upper_bound(&self, id: VarId) -> i64 {
        self.vars[id.0].max
    }

    /// Whether `literal` holds under the current domains.
    pub fn holds(&self, literal: &BoundLiteral) -> bool {
        let var = self.var(literal.var());
        literal.holds(var.min, var.max)
    }

    /// Lowers the upper bound of `id`, as a search decision would.
    pub fn set_upper_bound(&mut self, id: VarId, value: i64) -> Result<(), EmptyDomain> {
        let var = &self.vars[id.0];
        if value >= var.max {
            return Ok(());
        }
        if value < var.min {
            return Err(EmptyDomain);
        }
        self.save(id);
        self.vars[id.0].max = value;
        self.events.push((id, DomainEvent::UpperBound));
        Ok(())
    }

    /// Opens a new decision level.
    pub fn push_level(&mut self) {
        self.levels.push(Level {
            trail_len: self.trail.len(),
            log_len: self.log.len(),
        });
    }

    /// Current decision level; 0 at the root.
    pub fn level(&self) -> usize {
        self.levels.len()
    }

    /// Undoes every change made since the last [`push_level`](Self::push_level).
    ///
    /// Returns `false` at the root, where there is nothing to undo.
    pub fn backtrack(&mut self) -> bool {
        let Some(level) = self.levels.pop() else {
            return false;
        };
        while self.trail.len() > level.trail_len {
            if let Some(entry) = self.trail.pop() {
                let var = &mut self.vars[entry.var.0];
                var.min = entry.min;
                var.max = entry.max;
            }
        }
        self.log.truncate(level.log_len);
        self.events.clear();
        true
    }

    /// Tightenings applied since the root, oldest first.
    pub fn propagations(&self) -> &[Propagation] {
        &self.log
    }

    /// Drains the pending domain events.
    pub fn take_events(&mut self) -> Vec<(VarId, DomainEvent)> {
        std::mem::take(&mut self.events)
    }

    fn save(&mut self, id: VarId) {
        let var = &self.vars[id.0];
        self.trail.push(TrailEntry {
            var: id,
            min: var.min,
            max: var.max,
        });
    }
}

impl DomainStore for DomainArena {
    type Var = VarId;
    type Literal = BoundLiteral;

    fn lower_bound(&self, var: VarId) -> i64 {
        DomainArena::lower_bound(self, var)
    }

    fn upper_bound(&self, var: VarId) -> i64 {
        DomainArena::upper_bound(self, var)
    }

    fn lower_bound_literal(&self, var: VarId) -> BoundLiteral {
        BoundLiteral::at_least(var, self.vars[var.0].min)
    }

    fn upper_bound_literal(&self, var: VarId) -> BoundLiteral {
        BoundLiteral::at_most(var, self.vars[var.0].max)
    }

    fn at_most_literal(&self, var: VarId, value: i64) -> BoundLiteral {
        BoundLiteral::at_most(var, value)
    }

    fn set_lower_bound(
        &mut self,
        var: VarId,
        value: i64,
        reason: Explanation<BoundLiteral>,
    ) -> Result<(), EmptyDomain> {
        let current = &self.vars[var.0];
        if value <= current.min {
            return Ok(());
        }
        if value > current.max {
            return Err(EmptyDomain);
        }
        let from = current.min;
        trace!(var = %var, from, to = value, "lower bound raised");

        self.save(var);
        self.vars[var.0].min = value;
        self.log.push(Propagation {
            var,
            from,
            to: value,
            reason: reason.into_literals(),
        });
        self.events.push((var, DomainEvent::LowerBound));
        Ok(())
    }
}
