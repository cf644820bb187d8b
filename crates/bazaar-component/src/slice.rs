//! The per-component view of one step's actions.

use indexmap::IndexMap;
use smallvec::SmallVec;

use bazaar_core::AgentKey;

/// One agent's choice within one subspace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubAction {
    /// Index submitted by the agent: `0` is the no-op, `1..=n` an action.
    pub requested: usize,
    /// Whether the cached mask allowed it. A no-op is always legal.
    pub legal: bool,
}

impl SubAction {
    /// The no-op.
    pub const NOOP: SubAction = SubAction {
        requested: 0,
        legal: true,
    };
}

/// Actions for one component: per agent, one [`SubAction`] per subspace
/// the component declared for that agent's class.
///
/// Components read through [`get`](Self::get), which hides masked-out
/// selections so they behave exactly like the no-op.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionSlice {
    entries: IndexMap<AgentKey, SmallVec<[SubAction; 4]>>,
}

impl ActionSlice {
    /// An empty slice.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `agent`'s sub-actions, replacing any previous entry.
    pub fn insert(&mut self, agent: AgentKey, actions: impl IntoIterator<Item = SubAction>) {
        self.entries.insert(agent, actions.into_iter().collect());
    }

    /// The legal, non-no-op action `agent` chose in `subspace`, 1-based.
    pub fn get(&self, agent: AgentKey, subspace: usize) -> Option<usize> {
        self.raw(agent, subspace)
            .filter(|a| a.legal && a.requested > 0)
            .map(|a| a.requested)
    }

    /// The submitted sub-action regardless of legality.
    pub fn raw(&self, agent: AgentKey, subspace: usize) -> Option<SubAction> {
        self.entries.get(&agent)?.get(subspace).copied()
    }

    /// Agents with an entry, in insertion order.
    pub fn agents(&self) -> impl Iterator<Item = AgentKey> + '_ {
        self.entries.keys().copied()
    }

    /// Number of agents with an entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no agent has an entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count of selections that were dropped by the mask.
    pub fn masked_count(&self) -> usize {
        self.entries
            .values()
            .flat_map(|v| v.iter())
            .filter(|a| !a.legal)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_selection_reads_as_noop() {
        let mut slice = ActionSlice::new();
        slice.insert(
            AgentKey::agent(0),
            [
                SubAction {
                    requested: 3,
                    legal: false,
                },
                SubAction {
                    requested: 2,
                    legal: true,
                },
            ],
        );
        slice.insert(AgentKey::agent(1), [SubAction::NOOP, SubAction::NOOP]);

        assert_eq!(slice.get(AgentKey::agent(0), 0), None);
        assert_eq!(slice.get(AgentKey::agent(0), 1), Some(2));
        assert_eq!(slice.get(AgentKey::agent(1), 0), None);
        assert_eq!(slice.get(AgentKey::Planner, 0), None);
        assert_eq!(slice.raw(AgentKey::agent(0), 0).map(|a| a.requested), Some(3));
        assert_eq!(slice.masked_count(), 1);
        assert_eq!(slice.len(), 2);
    }
}
