//! Modelo de datos del grafo (Raw, tipos, referencias, steps, workflow).

pub mod bound;
pub mod parameter;
pub mod raw;
pub mod reference;
pub mod step;
pub mod types;
pub mod workflow;

pub use bound::Bound;
pub use parameter::Parameter;
pub use raw::{Raw, RawValue};
pub use reference::{FieldPath, FieldSegment, Reference};
pub use step::{NestedStep, Step, WorkflowStep};
pub use types::{RecordType, ValueType};
pub use workflow::Workflow;
