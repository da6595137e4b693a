//! Opaque model-session abstraction.
//!
//! The tensor-execution runtime is an external collaborator: the host hands
//! the core one session per loaded model, and the core drives it by name —
//! named input tensors in, named output tensors out. Recurrent state is
//! threaded through successive calls by the `past_*` / `present_*` naming
//! convention.

use std::collections::HashMap;

use crate::error::{TtsError, TtsResult};

/// Tensor element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    /// 32-bit floating point.
    F32,
    /// 64-bit signed integer.
    I64,
}

/// One dimension of a declared tensor shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    /// Statically known extent.
    Fixed(usize),
    /// Unknown until runtime; resolves to zero length when zero-initializing.
    Dynamic,
}

impl Dim {
    /// Extent used when materializing an empty tensor for this dimension.
    pub fn zero_init_extent(&self) -> usize {
        match self {
            Dim::Fixed(n) => *n,
            Dim::Dynamic => 0,
        }
    }
}

/// Declared shape and type of a session input or output.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorSpec {
    /// Tensor name as declared by the model.
    pub name: String,
    /// Element type.
    pub dtype: DType,
    /// Shape with possibly-dynamic dimensions.
    pub shape: Vec<Dim>,
}

impl TensorSpec {
    /// Create a spec from parts.
    pub fn new(name: impl Into<String>, dtype: DType, shape: Vec<Dim>) -> Self {
        Self {
            name: name.into(),
            dtype,
            shape,
        }
    }
}

/// A concrete tensor value passed to or returned from a session.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorValue {
    /// 32-bit float tensor.
    F32 { shape: Vec<usize>, data: Vec<f32> },
    /// 64-bit integer tensor.
    I64 { shape: Vec<usize>, data: Vec<i64> },
}

impl TensorValue {
    /// Float tensor constructor; panics in debug builds if the element count
    /// does not match the shape.
    pub fn f32(shape: Vec<usize>, data: Vec<f32>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        Self::F32 { shape, data }
    }

    /// Integer tensor constructor.
    pub fn i64(shape: Vec<usize>, data: Vec<i64>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        Self::I64 { shape, data }
    }

    /// Scalar float as a 1-element tensor.
    pub fn scalar_f32(value: f32) -> Self {
        Self::F32 {
            shape: vec![1],
            data: vec![value],
        }
    }

    /// Scalar integer as a 1-element tensor.
    pub fn scalar_i64(value: i64) -> Self {
        Self::I64 {
            shape: vec![1],
            data: vec![value],
        }
    }

    /// The tensor's shape.
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::F32 { shape, .. } | Self::I64 { shape, .. } => shape,
        }
    }

    /// Element type of this value.
    pub fn dtype(&self) -> DType {
        match self {
            Self::F32 { .. } => DType::F32,
            Self::I64 { .. } => DType::I64,
        }
    }

    /// Borrow float data, or error if this is not a float tensor.
    pub fn as_f32(&self) -> TtsResult<&[f32]> {
        match self {
            Self::F32 { data, .. } => Ok(data),
            Self::I64 { .. } => Err(TtsError::output("expected f32 tensor, got i64")),
        }
    }

    /// Borrow integer data, or error if this is not an integer tensor.
    pub fn as_i64(&self) -> TtsResult<&[i64]> {
        match self {
            Self::I64 { data, .. } => Ok(data),
            Self::F32 { .. } => Err(TtsError::output("expected i64 tensor, got f32")),
        }
    }

    /// An empty/zeroed tensor matching a declared spec, with dynamic
    /// dimensions resolved to zero length.
    pub fn zeros_for(spec: &TensorSpec) -> Self {
        let shape: Vec<usize> = spec.shape.iter().map(Dim::zero_init_extent).collect();
        let len = shape.iter().product();
        match spec.dtype {
            DType::F32 => Self::F32 {
                shape,
                data: vec![0.0; len],
            },
            DType::I64 => Self::I64 {
                shape,
                data: vec![0; len],
            },
        }
    }
}

/// A loaded model reachable by named tensors.
///
/// `run` is synchronous and CPU-bound; callers are expected to keep it off
/// any interactive path. Implementations live outside this workspace (the
/// host wraps its inference runtime); tests use synthetic sessions.
pub trait ModelSession: Send {
    /// Execute the model on the given named inputs.
    fn run(
        &mut self,
        inputs: &[(&str, TensorValue)],
    ) -> TtsResult<HashMap<String, TensorValue>>;

    /// Declared input tensors.
    fn inputs(&self) -> &[TensorSpec];

    /// Declared output tensors.
    fn outputs(&self) -> &[TensorSpec];
}

/// Prefix of recurrent-state inputs.
pub const STATE_INPUT_PREFIX: &str = "past_";

/// Prefix of recurrent-state outputs.
pub const STATE_OUTPUT_PREFIX: &str = "present_";

/// Recurrent state threaded through successive calls to one model within a
/// single utterance.
///
/// Exactly one `StateMap` is live per in-flight utterance per model; it is
/// dropped at utterance end (success, error, or cancellation) and never
/// reused across utterances or voices.
#[derive(Debug, Clone, Default)]
pub struct StateMap {
    entries: HashMap<String, TensorValue>,
}

impl StateMap {
    /// Zero-initialize state from a session's declared `past_*` inputs.
    /// Dynamic dimensions resolve to zero length — an empty cache.
    pub fn init_for(session: &dyn ModelSession) -> Self {
        let entries = session
            .inputs()
            .iter()
            .filter(|spec| spec.name.starts_with(STATE_INPUT_PREFIX))
            .map(|spec| (spec.name.clone(), TensorValue::zeros_for(spec)))
            .collect();
        Self { entries }
    }

    /// Append the current state tensors to an input list.
    pub fn extend_inputs<'a>(&'a self, inputs: &mut Vec<(&'a str, TensorValue)>) {
        for (name, value) in &self.entries {
            inputs.push((name.as_str(), value.clone()));
        }
    }

    /// Replace state in place from a call's `present_*` outputs.
    ///
    /// Every state entry must have a matching output; a missing one means the
    /// model does not follow the naming convention and the call is rejected.
    pub fn update_from(&mut self, outputs: &HashMap<String, TensorValue>) -> TtsResult<()> {
        for (name, value) in self.entries.iter_mut() {
            let out_name = format!(
                "{}{}",
                STATE_OUTPUT_PREFIX,
                &name[STATE_INPUT_PREFIX.len()..]
            );
            let updated = outputs
                .get(&out_name)
                .ok_or_else(|| TtsError::output(format!("missing state output {out_name}")))?;
            *value = updated.clone();
        }
        Ok(())
    }

    /// Number of state tensors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the model declared no recurrent state.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoSession {
        inputs: Vec<TensorSpec>,
        outputs: Vec<TensorSpec>,
    }

    impl ModelSession for EchoSession {
        fn run(
            &mut self,
            inputs: &[(&str, TensorValue)],
        ) -> TtsResult<HashMap<String, TensorValue>> {
            let mut out = HashMap::new();
            for (name, value) in inputs {
                if let Some(key) = name.strip_prefix(STATE_INPUT_PREFIX) {
                    out.insert(format!("{STATE_OUTPUT_PREFIX}{key}"), value.clone());
                }
            }
            Ok(out)
        }

        fn inputs(&self) -> &[TensorSpec] {
            &self.inputs
        }

        fn outputs(&self) -> &[TensorSpec] {
            &self.outputs
        }
    }

    #[test]
    fn test_zeros_for_dynamic_dims() {
        let spec = TensorSpec::new(
            "past_cache",
            DType::F32,
            vec![Dim::Fixed(1), Dim::Dynamic, Dim::Fixed(8)],
        );
        let value = TensorValue::zeros_for(&spec);
        assert_eq!(value.shape(), &[1, 0, 8]);
        assert!(value.as_f32().unwrap().is_empty());
    }

    #[test]
    fn test_state_map_round_trip() {
        let mut session = EchoSession {
            inputs: vec![
                TensorSpec::new("latent", DType::F32, vec![Dim::Fixed(1), Dim::Fixed(4)]),
                TensorSpec::new(
                    "past_cache",
                    DType::F32,
                    vec![Dim::Fixed(1), Dim::Dynamic, Dim::Fixed(2)],
                ),
            ],
            outputs: vec![],
        };

        let mut state = StateMap::init_for(&session);
        assert_eq!(state.len(), 1);

        let mut inputs: Vec<(&str, TensorValue)> =
            vec![("latent", TensorValue::f32(vec![1, 4], vec![0.0; 4]))];
        state.extend_inputs(&mut inputs);
        assert_eq!(inputs.len(), 2);

        let outputs = session.run(&inputs).unwrap();
        state.update_from(&outputs).unwrap();
    }

    #[test]
    fn test_state_update_missing_output() {
        let session = EchoSession {
            inputs: vec![TensorSpec::new(
                "past_cache",
                DType::F32,
                vec![Dim::Dynamic],
            )],
            outputs: vec![],
        };
        let mut state = StateMap::init_for(&session);
        let err = state.update_from(&HashMap::new()).unwrap_err();
        assert!(matches!(err, TtsError::ModelOutput(_)));
    }

    #[test]
    fn test_tensor_value_accessors() {
        let t = TensorValue::scalar_f32(1.5);
        assert_eq!(t.as_f32().unwrap(), &[1.5]);
        assert!(t.as_i64().is_err());
        assert_eq!(t.dtype(), DType::F32);
    }
}
