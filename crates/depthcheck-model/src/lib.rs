//! Depthcheck Model - Model-based command sequence generation
//!
//! This crate describes a system under test as a state machine of typed
//! commands and enumerates every sequence of command calls up to a depth.
//! Arguments whose type has no strategy are bound to the results of earlier
//! calls, so sequences can thread handles such as a freshly created queue
//! through later operations.
//!
//! # Core Concepts
//!
//! - [`Command`]: A typed operation with precondition, postcondition and
//!   next-state hooks
//! - [`Model`]: Initial state plus commands, registered as `Commands<Name>`
//! - [`Partial`]: One bound call; [`Arg`] is a literal or a reference
//! - [`CommandSequence`]: Ordered calls replayable against the model
//!
//! # Validation
//!
//! - [`replay`]: precondition → execute → postcondition → next state
//! - [`validate_preconditions_only`]: the precondition chain alone, for
//!   implication filters

mod builder;
mod command;
mod error;
mod model;
mod partial;
mod sequence;
mod validator;

pub use builder::{build_command_sequences, CommandSequences};
pub use command::{Command, CommandRef};
pub use error::{ModelError, ModelResult};
pub use model::{Model, ModelStrategy};
pub use partial::{Arg, Partial};
pub use sequence::{sequence_of, typed_sequence, CommandSequence, Replayable, SequenceHandle};
pub use validator::{
    register_precondition_filter, replay, validate_preconditions_only, Hook, Rejection, Replay,
    ReplayReport, ReplayVerdict, StepRecord,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::builder::build_command_sequences;
    pub use crate::command::{Command, CommandRef};
    pub use crate::error::{ModelError, ModelResult};
    pub use crate::model::Model;
    pub use crate::partial::{Arg, Partial};
    pub use crate::sequence::{sequence_of, typed_sequence, CommandSequence, Replayable};
    pub use crate::validator::{ReplayReport, ReplayVerdict};
}
