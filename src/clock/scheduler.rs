//! Phase-ordered action scheduling within a single tick.

use serde::{Deserialize, Serialize};

use crate::cpu::component::ComponentId;

/// The ordered phases of one tick.
///
/// Everything registered in an earlier phase runs before anything in a later
/// one, which is what lets a value driven onto the bus in `Write` be captured
/// in `Read` of the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    /// Control logic computes and distributes the control word.
    Decode,
    /// Components with an asserted output flag drive the bus.
    Write,
    /// Address capture and counter increment.
    Latch,
    /// Components with an asserted input flag capture the bus.
    Read,
}

impl Phase {
    /// All phases, highest priority first.
    pub const ALL: [Phase; 4] = [Phase::Decode, Phase::Write, Phase::Latch, Phase::Read];

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

/// Per-phase buckets of registered components plus the halt latch.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    buckets: [Vec<ComponentId>; 4],
    halted: bool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component for each of the given phases. Within a phase,
    /// components run in registration order.
    pub fn register(&mut self, id: ComponentId, phases: &[Phase]) {
        for phase in phases {
            self.buckets[phase.index()].push(id);
        }
    }

    /// Components registered for `phase`.
    pub fn bucket(&self, phase: Phase) -> &[ComponentId] {
        &self.buckets[phase.index()]
    }

    /// Full run order of one tick.
    pub fn order(&self) -> impl Iterator<Item = (Phase, ComponentId)> + '_ {
        Phase::ALL
            .into_iter()
            .flat_map(move |phase| self.bucket(phase).iter().map(move |&id| (phase, id)))
    }

    /// Latch the halt flag. There is no way back.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        assert!(Phase::Decode < Phase::Write);
        assert!(Phase::Write < Phase::Latch);
        assert!(Phase::Latch < Phase::Read);
    }

    #[test]
    fn test_order_is_by_phase_then_registration() {
        let mut scheduler = Scheduler::new();
        scheduler.register(ComponentId::RegA, &[Phase::Write, Phase::Read]);
        scheduler.register(ComponentId::Counter, &[Phase::Write, Phase::Latch, Phase::Read]);
        scheduler.register(ComponentId::Control, &[Phase::Decode]);

        let order: Vec<_> = scheduler.order().collect();
        assert_eq!(
            order,
            vec![
                (Phase::Decode, ComponentId::Control),
                (Phase::Write, ComponentId::RegA),
                (Phase::Write, ComponentId::Counter),
                (Phase::Latch, ComponentId::Counter),
                (Phase::Read, ComponentId::RegA),
                (Phase::Read, ComponentId::Counter),
            ]
        );
    }

    #[test]
    fn test_halt_is_sticky() {
        let mut scheduler = Scheduler::new();
        assert!(!scheduler.is_halted());
        scheduler.halt();
        scheduler.halt();
        assert!(scheduler.is_halted());
    }
}
