//! Observation value types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use bazaar_core::{AgentKey, ComponentError};

/// One observation entry.
///
/// # Examples
///
/// ```
/// use bazaar_obs::ObsValue;
///
/// let map = ObsValue::tensor(&[2, 3], vec![0.0; 6]).unwrap();
/// assert_eq!(map.len(), 6);
/// assert_eq!(map.rank(), 2);
/// assert!(ObsValue::tensor(&[2, 3], vec![0.0; 5]).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObsValue {
    /// A single number.
    Scalar(f32),
    /// A rank-1 vector.
    Vector(Vec<f32>),
    /// A dense row-major tensor.
    Tensor {
        /// Dimension sizes, outermost first.
        shape: SmallVec<[usize; 4]>,
        /// Row-major values; `data.len()` equals the product of `shape`.
        data: Vec<f32>,
    },
    /// Named sub-entries, in insertion order.
    Nested(IndexMap<String, ObsValue>),
}

impl ObsValue {
    /// Build a tensor, checking that `data` fills `shape` exactly.
    pub fn tensor(shape: &[usize], data: Vec<f32>) -> Result<Self, ComponentError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ComponentError::InvariantViolation {
                reason: format!(
                    "tensor shape {shape:?} needs {expected} values, got {}",
                    data.len()
                ),
            });
        }
        Ok(ObsValue::Tensor {
            shape: SmallVec::from_slice(shape),
            data,
        })
    }

    /// Number of dimensions: 0 for scalars, 1 for vectors. Nested maps
    /// report 1 since they flatten to a vector.
    pub fn rank(&self) -> usize {
        match self {
            ObsValue::Scalar(_) => 0,
            ObsValue::Vector(_) | ObsValue::Nested(_) => 1,
            ObsValue::Tensor { shape, .. } => shape.len(),
        }
    }

    /// Total number of scalars held, recursively.
    pub fn len(&self) -> usize {
        match self {
            ObsValue::Scalar(_) => 1,
            ObsValue::Vector(v) => v.len(),
            ObsValue::Tensor { data, .. } => data.len(),
            ObsValue::Nested(m) => m.values().map(ObsValue::len).sum(),
        }
    }

    /// Whether no scalars are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append every scalar to `out` in row-major, insertion order.
    pub fn extend_flat(&self, out: &mut Vec<f32>) {
        match self {
            ObsValue::Scalar(x) => out.push(*x),
            ObsValue::Vector(v) => out.extend_from_slice(v),
            ObsValue::Tensor { data, .. } => out.extend_from_slice(data),
            ObsValue::Nested(m) => {
                for v in m.values() {
                    v.extend_flat(out);
                }
            }
        }
    }

    /// All scalars as one vector.
    pub fn to_flat(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.len());
        self.extend_flat(&mut out);
        out
    }

    /// The value if this is a scalar.
    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            ObsValue::Scalar(x) => Some(*x),
            _ => None,
        }
    }
}

impl From<f32> for ObsValue {
    fn from(x: f32) -> Self {
        ObsValue::Scalar(x)
    }
}

impl From<Vec<f32>> for ObsValue {
    fn from(v: Vec<f32>) -> Self {
        ObsValue::Vector(v)
    }
}

/// One agent's observation: namespaced key to value.
pub type AgentObs = IndexMap<String, ObsValue>;

/// Observations for every acting key.
pub type Observation = IndexMap<AgentKey, AgentObs>;
