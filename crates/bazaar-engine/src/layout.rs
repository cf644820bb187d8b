//! The combined action space of every component, per agent class.
//!
//! Each component contributes named subspaces. Concatenated in component
//! order they form one layout per class:
//!
//! - **single mode**: one integer, `0` the global no-op, then every
//!   subspace's actions back to back
//! - **multi mode**: one integer per subspace, each `0..=n` with `0` the
//!   subspace's own no-op
//!
//! Masks use the same order without the no-op slots; a slot's `offset`
//! is where its actions start in that flat mask.

use std::collections::HashSet;
use std::ops::Range;

use bazaar_component::{AgentClass, Component, SubAction};
use bazaar_core::{Action, ActionMode, AgentKey, ConfigError, StepError};
use bazaar_obs::MaskSegment;

/// One subspace's place in a class layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubspaceSlot {
    /// Index of the owning component.
    pub component: usize,
    /// Subspace name.
    pub name: String,
    /// Number of non-no-op actions.
    pub n: usize,
    /// Start of this subspace in the flat mask.
    pub offset: usize,
}

/// Layout for one agent class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassLayout {
    mode: ActionMode,
    slots: Vec<SubspaceSlot>,
    // Slot range owned by each component, indexed by component.
    by_component: Vec<Range<usize>>,
    total: usize,
}

impl ClassLayout {
    fn build(
        components: &[Box<dyn Component>],
        class: AgentClass,
        mode: ActionMode,
    ) -> Result<Self, ConfigError> {
        let mut slots = Vec::new();
        let mut by_component = Vec::with_capacity(components.len());
        let mut names = HashSet::new();
        let mut offset = 0;
        for (ci, component) in components.iter().enumerate() {
            let start = slots.len();
            for sub in component.action_subspaces(class) {
                if !names.insert(sub.name.clone()) {
                    return Err(ConfigError::ComponentConfig {
                        component: component.name().to_string(),
                        reason: format!("action subspace '{}' declared twice", sub.name),
                    });
                }
                slots.push(SubspaceSlot {
                    component: ci,
                    name: sub.name,
                    n: sub.n,
                    offset,
                });
                offset += sub.n;
            }
            by_component.push(start..slots.len());
        }
        Ok(Self {
            mode,
            slots,
            by_component,
            total: offset,
        })
    }

    /// Encoding mode.
    pub fn mode(&self) -> ActionMode {
        self.mode
    }

    /// Every subspace, in encoding order.
    pub fn slots(&self) -> &[SubspaceSlot] {
        &self.slots
    }

    /// Number of actions excluding no-ops; the length of a full mask.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Size of the single-mode space, including the global no-op.
    pub fn single_size(&self) -> usize {
        self.total + 1
    }

    /// Per-subspace sizes for multi mode, each including its no-op.
    pub fn multi_sizes(&self) -> Vec<usize> {
        self.slots.iter().map(|s| s.n + 1).collect()
    }

    /// Indices into [`slots`](Self::slots) owned by component `ci`.
    pub fn slot_range(&self, ci: usize) -> Range<usize> {
        self.by_component.get(ci).cloned().unwrap_or(0..0)
    }

    /// The subspaces owned by component `ci`.
    pub fn component_slots(&self, ci: usize) -> &[SubspaceSlot] {
        &self.slots[self.slot_range(ci)]
    }

    /// The part of a full mask owned by component `ci`.
    pub fn component_mask_range(&self, ci: usize) -> Range<usize> {
        match self.component_slots(ci) {
            [] => 0..0,
            s => s[0].offset..s[s.len() - 1].offset + s[s.len() - 1].n,
        }
    }

    /// The no-op action for this class.
    pub fn noop(&self) -> Action {
        Action::noop(self.mode, self.slots.len())
    }

    /// Split `action` into one choice per subspace (`0` is the no-op).
    ///
    /// # Errors
    ///
    /// Wrong variant for the mode, wrong multi-action length, or an
    /// index outside its space.
    pub fn decode(&self, agent: AgentKey, action: &Action) -> Result<Vec<usize>, StepError> {
        let mut choices = vec![0; self.slots.len()];
        match (self.mode, action) {
            (ActionMode::Single, Action::Single(a)) => {
                let a = *a;
                if a >= self.single_size() {
                    return Err(StepError::ActionOutOfRange {
                        agent,
                        value: a,
                        size: self.single_size(),
                    });
                }
                if a > 0 {
                    let flat = a - 1;
                    // `a` is in range, so some slot holds it.
                    if let Some((i, slot)) = self
                        .slots
                        .iter()
                        .enumerate()
                        .find(|(_, s)| flat >= s.offset && flat < s.offset + s.n)
                    {
                        choices[i] = flat - slot.offset + 1;
                    }
                }
            }
            (ActionMode::Multi, Action::Multi(v)) => {
                if v.len() != self.slots.len() {
                    return Err(StepError::ActionArity {
                        agent,
                        expected: self.slots.len(),
                        got: v.len(),
                    });
                }
                for (i, (&a, slot)) in v.iter().zip(&self.slots).enumerate() {
                    if a > slot.n {
                        return Err(StepError::ActionOutOfRange {
                            agent,
                            value: a,
                            size: slot.n + 1,
                        });
                    }
                    choices[i] = a;
                }
            }
            (mode, _) => {
                return Err(StepError::ActionModeMismatch {
                    agent,
                    expected: mode.as_str(),
                })
            }
        }
        Ok(choices)
    }

    /// Pair each decoded choice with its legality under `mask`.
    ///
    /// A no-op is always legal; anything else needs a positive mask
    /// entry. A short mask reads as illegal.
    pub fn gate(&self, choices: &[usize], mask: &[f32]) -> Vec<SubAction> {
        choices
            .iter()
            .zip(&self.slots)
            .map(|(&requested, slot)| SubAction {
                requested,
                legal: requested == 0
                    || mask
                        .get(slot.offset + requested - 1)
                        .is_some_and(|&m| m > 0.0),
            })
            .collect()
    }

    /// Split a full mask into named per-subspace segments.
    pub fn segments<'a>(&'a self, mask: &'a [f32]) -> Vec<MaskSegment<'a>> {
        self.slots
            .iter()
            .map(|s| MaskSegment {
                name: &s.name,
                mask: mask.get(s.offset..s.offset + s.n).unwrap_or(&[]),
            })
            .collect()
    }
}

/// Action layouts for mobile agents and, if present, the planner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionLayout {
    /// Mobile-agent layout.
    pub mobile: ClassLayout,
    /// Planner layout; `None` when the scenario has no planner.
    pub planner: Option<ClassLayout>,
}

impl ActionLayout {
    /// Collect every component's subspaces.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoActions`] if mobile agents would have nothing to
    /// do, [`ConfigError::ActionModeArity`] if components declare planner
    /// actions but there is no planner, and
    /// [`ConfigError::ComponentConfig`] for a repeated subspace name.
    pub fn build(
        components: &[Box<dyn Component>],
        has_planner: bool,
        mobile_mode: ActionMode,
        planner_mode: ActionMode,
    ) -> Result<Self, ConfigError> {
        let mobile = ClassLayout::build(components, AgentClass::Mobile, mobile_mode)?;
        if mobile.total() == 0 {
            return Err(ConfigError::NoActions);
        }
        let planner = ClassLayout::build(components, AgentClass::Planner, planner_mode)?;
        if !has_planner && !planner.slots.is_empty() {
            let owners: Vec<&str> = planner
                .slots
                .iter()
                .map(|s| components[s.component].name())
                .collect();
            return Err(ConfigError::ActionModeArity {
                class: AgentClass::Planner.as_str().to_string(),
                reason: format!(
                    "components {owners:?} declare planner actions but the scenario has no planner"
                ),
            });
        }
        Ok(Self {
            mobile,
            planner: has_planner.then_some(planner),
        })
    }

    /// Layout for the class `key` belongs to.
    pub fn for_key(&self, key: AgentKey) -> Option<&ClassLayout> {
        match AgentClass::of(key) {
            AgentClass::Mobile => Some(&self.mobile),
            AgentClass::Planner => self.planner.as_ref(),
        }
    }
}
