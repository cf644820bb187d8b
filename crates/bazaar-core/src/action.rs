//! Action submission vocabulary.

use serde::{Deserialize, Serialize};

/// How an agent class encodes its action each step.
///
/// Fixed per class when the environment is constructed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionMode {
    /// One integer over the concatenation of all subspaces, with index 0
    /// as the global no-op.
    #[default]
    Single,
    /// One integer per subspace, each with its own leading no-op.
    Multi,
}

impl ActionMode {
    /// `"single"` or `"multi"`.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionMode::Single => "single",
            ActionMode::Multi => "multi",
        }
    }
}

impl From<bool> for ActionMode {
    /// `true` selects [`ActionMode::Multi`].
    fn from(multi: bool) -> Self {
        if multi {
            ActionMode::Multi
        } else {
            ActionMode::Single
        }
    }
}

/// One agent's submitted action for a step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Action {
    /// Index into the flat single-mode space.
    Single(usize),
    /// One index per subspace, in layout order.
    Multi(Vec<usize>),
}

impl Action {
    /// The action that does nothing in `mode` with `n_subspaces` subspaces.
    pub fn noop(mode: ActionMode, n_subspaces: usize) -> Self {
        match mode {
            ActionMode::Single => Action::Single(0),
            ActionMode::Multi => Action::Multi(vec![0; n_subspaces]),
        }
    }
}
