//! Resolution of captured variables for Kotlin code fragment evaluation.
//!
//! A code fragment compiled against a suspended frame refers to locals,
//! receivers, local functions and fields of the surrounding code. The Kotlin
//! compiler moves many of those into synthetic locals, closure fields, `Ref`
//! holders and coroutine continuations. [`VariableFinder`] walks those
//! encodings and hands back the runtime value for each fragment parameter.

pub mod abi;
pub mod bindings;
pub mod context;
pub mod convert;
mod coroutine;
mod entity;
pub mod error;
pub mod finder;
pub mod frame;
pub mod kind;
pub mod labels;
pub mod parameter;

pub use bindings::{bind_parameters, write_back_ref_wrappers};
pub use context::ExecutionContext;
pub use convert::{Boxing, CoercedValue, EvaluatorValueConverter, ValueConverter};
pub use coroutine::{CONTINUATION_TYPE, SUSPEND_LAMBDA_CLASSES};
pub use error::{EvalError, EvalResult};
pub use finder::{FinderPolicy, RefWrapper, ResolvedValue, VariableFinder};
pub use frame::{CoroutineFrame, DescriptorSource, FrameFlavor, FrameProxy, ValueDescriptor};
pub use kind::VariableKind;
pub use labels::DebugLabels;
pub use parameter::{CodeFragmentParameter, ParameterKind};
