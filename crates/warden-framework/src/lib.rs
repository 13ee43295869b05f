//! # Warden Framework
//!
//! Command admission and error escalation for the Warden bot.
//!
//! - [`PrefixResolver`]: per-community prefixes with a process-lifetime cache
//! - [`AdmissionGate`] and [`Lifecycle`]: the global pre-command predicate
//! - [`InvocationContext`]: per-invocation config memoization and safe replies
//! - [`ErrorPipeline`]: error rendering, chunking and delivery to the operator
//! - [`Dispatcher`]: wires the above together for every inbound message

pub mod command;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod operator;
pub mod prefix;
pub mod report;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use command::{BoxedCommand, Command, CommandRegistry, FnCommand, command_fn, shell_split};
pub use context::InvocationContext;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{ContextError, ContextResult, RegistryError};
pub use gate::{Admission, AdmissionGate, Denial, Lifecycle, Phase};
pub use operator::{MAX_CHUNK_CHARS, Operator, OwnerMessage};
pub use prefix::{PrefixResolver, PrefixSet, mention_prefixes};
pub use report::{
    ErrorKind, ErrorOrigin, ErrorPipeline, ErrorReport, chunk_error_text, render_error,
    user_notice,
};
