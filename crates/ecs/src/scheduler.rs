//! Phased system scheduler. Every system declares a fixed phase plus an
//! `after` list (must run after these names) and a `before` list (must run
//! before these names); within a phase, both constraints feed one
//! topological sort (Kahn's algorithm), ties broken by registration order.
//! A dependency cycle does not panic: the unresolved remainder of that
//! phase falls back to alphabetic order and a warning is logged. The
//! `Init` phase runs only on a scheduler's first `run()` call; every phase
//! after it runs on every call.

use crate::error::SystemRegistrationError;
use crate::world::World;
use std::collections::{HashSet, VecDeque};

/// The five fixed scheduler phases, always run in this order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Init,
    PreUpdate,
    Update,
    PostUpdate,
    LateUpdate,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Init,
        Phase::PreUpdate,
        Phase::Update,
        Phase::PostUpdate,
        Phase::LateUpdate,
    ];

    fn name(self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::PreUpdate => "preUpdate",
            Phase::Update => "update",
            Phase::PostUpdate => "postUpdate",
            Phase::LateUpdate => "lateUpdate",
        }
    }
}

pub type SystemFn = Box<dyn FnMut(&mut World) + Send>;

struct SystemEntry {
    name: String,
    phase: Phase,
    after: Vec<String>,
    before: Vec<String>,
    order: usize,
    func: SystemFn,
}

/// Registers systems per phase and runs them in dependency order.
#[derive(Default)]
pub struct Scheduler {
    systems: Vec<SystemEntry>,
    ran_init: bool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a system with only `after` constraints. Equivalent to
    /// `add_system_with_before(name, phase, after, &[], func)`.
    pub fn add_system(
        &mut self,
        name: impl Into<String>,
        phase: Phase,
        after: &[&str],
        func: SystemFn,
    ) -> Result<(), SystemRegistrationError> {
        self.add_system_with_before(name, phase, after, &[], func)
    }

    /// Register a system declaring both `after` (must run after these
    /// names) and `before` (must run before these names) constraints.
    pub fn add_system_with_before(
        &mut self,
        name: impl Into<String>,
        phase: Phase,
        after: &[&str],
        before: &[&str],
        func: SystemFn,
    ) -> Result<(), SystemRegistrationError> {
        let name = name.into();
        if self.systems.iter().any(|s| s.name == name) {
            return Err(SystemRegistrationError::DuplicateName { name });
        }
        let order = self.systems.len();
        self.systems.push(SystemEntry {
            name,
            phase,
            after: after.iter().map(|d| d.to_string()).collect(),
            before: before.iter().map(|d| d.to_string()).collect(),
            order,
            func,
        });
        Ok(())
    }

    fn validate_deps(&self) -> Result<(), SystemRegistrationError> {
        for system in &self.systems {
            for dep in system.after.iter().chain(system.before.iter()) {
                if !self.systems.iter().any(|s| &s.name == dep) {
                    return Err(SystemRegistrationError::UnknownDependency {
                        name: system.name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Topologically order one phase's systems, honoring only dependencies
    /// that are themselves in the same phase (cross-phase dependencies are
    /// already satisfied by the fixed phase sequence). Falls back to
    /// alphabetic order for whatever remains once a cycle is detected.
    fn order_phase(&self, phase: Phase) -> Vec<usize> {
        let indices: Vec<usize> = self
            .systems
            .iter()
            .enumerate()
            .filter(|(_, s)| s.phase == phase)
            .map(|(i, _)| i)
            .collect();

        let mut indegree = vec![0usize; indices.len()];
        let local_of: std::collections::HashMap<usize, usize> =
            indices.iter().enumerate().map(|(local, &global)| (global, local)).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); indices.len()];

        for (local, &global) in indices.iter().enumerate() {
            for dep in &self.systems[global].after {
                if let Some(dep_global) = self.systems.iter().position(|s| &s.name == dep) {
                    if let Some(&dep_local) = local_of.get(&dep_global) {
                        dependents[dep_local].push(local);
                        indegree[local] += 1;
                    }
                }
            }
            for dep in &self.systems[global].before {
                if let Some(dep_global) = self.systems.iter().position(|s| &s.name == dep) {
                    if let Some(&dep_local) = local_of.get(&dep_global) {
                        dependents[local].push(dep_local);
                        indegree[dep_local] += 1;
                    }
                }
            }
        }

        let mut ready: VecDeque<usize> = (0..indices.len())
            .filter(|&local| indegree[local] == 0)
            .collect();
        // Insertion-order tie-break: pop the lowest registration order among
        // currently-ready systems each step.
        let order_of = |local: usize| self.systems[indices[local]].order;

        let mut result = Vec::with_capacity(indices.len());
        let mut resolved: HashSet<usize> = HashSet::new();

        loop {
            if ready.is_empty() {
                break;
            }
            let mut ready_vec: Vec<usize> = ready.drain(..).collect();
            ready_vec.sort_by_key(|&local| order_of(local));
            for local in ready_vec {
                result.push(indices[local]);
                resolved.insert(local);
                for &dependent in &dependents[local] {
                    indegree[dependent] -= 1;
                    if indegree[dependent] == 0 {
                        ready.push_back(dependent);
                    }
                }
            }
        }

        if result.len() < indices.len() {
            let mut remaining: Vec<usize> = (0..indices.len())
                .filter(|local| !resolved.contains(local))
                .map(|local| indices[local])
                .collect();
            tracing::warn!(
                phase = phase.name(),
                remaining = remaining.len(),
                "dependency cycle detected in scheduler phase; falling back to alphabetic order for the unresolved remainder"
            );
            remaining.sort_by(|&a, &b| self.systems[a].name.cmp(&self.systems[b].name));
            result.extend(remaining);
        }

        result
    }

    /// Run every system, phase by phase, in dependency order. `Phase::Init`
    /// only executes the first time this is called; every later call skips
    /// it and runs the remaining phases.
    pub fn run(&mut self, world: &mut World) -> Result<(), SystemRegistrationError> {
        self.validate_deps()?;
        for phase in Phase::ALL {
            if phase == Phase::Init && self.ran_init {
                continue;
            }
            let order = self.order_phase(phase);
            for index in order {
                (self.systems[index].func)(world);
            }
            if phase == Phase::Init {
                self.ran_init = true;
            }
        }
        Ok(())
    }
}
