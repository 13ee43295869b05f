//! Startup lifecycle and the global admission gate.
//!
//! The process moves through three phases, strictly forward:
//!
//! ```text
//! Connecting ──(platform ready)──► Initializing ──(init load done)──► Running
//! ```
//!
//! [`AdmissionGate`] is evaluated once per resolved command before its body
//! runs. Nothing is admitted until [`Phase::Running`] is reached.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::{debug, info};

use warden_core::{CommunityId, UserId};

use crate::context::InvocationContext;
use crate::operator::Operator;

// =============================================================================
// Lifecycle
// =============================================================================

/// Startup phase of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Phase {
    /// Waiting for the platform connection to become ready.
    Connecting = 0,
    /// Connected; the one-time initialization load is still running.
    Initializing = 1,
    /// Fully started.
    Running = 2,
}

impl Phase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Connecting,
            1 => Self::Initializing,
            _ => Self::Running,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Initializing => "initializing",
            Self::Running => "running",
        };
        f.write_str(name)
    }
}

/// The process-wide startup lifecycle.
///
/// Both transitions are one-way latches: the phase only ever moves forward,
/// so a late or repeated transition can never reopen the gate's startup
/// checks.
#[derive(Debug)]
pub struct Lifecycle {
    phase: AtomicU8,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// Creates a lifecycle in [`Phase::Connecting`].
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(Phase::Connecting as u8),
        }
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Records that the platform connection is ready.
    ///
    /// Returns `true` if this call moved the phase forward.
    pub fn mark_ready(&self) -> bool {
        self.advance(Phase::Initializing)
    }

    /// Records that the one-time initialization load has finished.
    ///
    /// Returns `true` if this call moved the phase forward.
    pub fn finish_init_load(&self) -> bool {
        self.advance(Phase::Running)
    }

    /// Whether the platform connection has become ready at least once.
    pub fn is_ready(&self) -> bool {
        self.phase() >= Phase::Initializing
    }

    /// Whether the one-time initialization load is still pending.
    pub fn is_init_load(&self) -> bool {
        self.phase() < Phase::Running
    }

    fn advance(&self, to: Phase) -> bool {
        let previous = Phase::from_u8(self.phase.fetch_max(to as u8, Ordering::AcqRel));
        let advanced = previous < to;
        if advanced {
            info!(from = %previous, to = %to, "Lifecycle advanced");
        }
        advanced
    }
}

// =============================================================================
// AdmissionGate
// =============================================================================

/// Why a command was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// The platform connection is not ready yet.
    NotReady,
    /// The one-time initialization load is still running.
    InitialLoad,
    /// Commands are not executed in direct messages.
    DirectMessage,
    /// The community is restricted and the command is not allow-listed.
    RestrictedCommunity,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NotReady => "not ready",
            Self::InitialLoad => "initial load in progress",
            Self::DirectMessage => "direct message",
            Self::RestrictedCommunity => "restricted community",
        };
        f.write_str(reason)
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied(Denial),
}

impl Admission {
    /// Returns `true` if the command may run.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// The global predicate evaluated before any command body runs.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    lifecycle: Arc<Lifecycle>,
    operator: Arc<Operator>,
    restricted: Option<CommunityId>,
    allow_list: BTreeSet<String>,
}

impl AdmissionGate {
    /// Creates a gate reading the shared lifecycle and operator identity.
    pub fn new(lifecycle: Arc<Lifecycle>, operator: Arc<Operator>) -> Self {
        Self {
            lifecycle,
            operator,
            restricted: None,
            allow_list: BTreeSet::new(),
        }
    }

    /// Designates a restricted (staging) community.
    pub fn restricted_community(mut self, community: Option<CommunityId>) -> Self {
        self.restricted = community;
        self
    }

    /// Sets the commands that stay available in the restricted community.
    pub fn allow_list<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_list = commands.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the shared lifecycle.
    pub fn lifecycle(&self) -> &Arc<Lifecycle> {
        &self.lifecycle
    }

    /// Evaluates the gate for a command named `command` invoked by `author`
    /// from `community` (`None` for direct messages).
    pub fn evaluate(
        &self,
        community: Option<CommunityId>,
        author: UserId,
        command: &str,
    ) -> Admission {
        match self.lifecycle.phase() {
            Phase::Connecting => return Admission::Denied(Denial::NotReady),
            Phase::Initializing => return Admission::Denied(Denial::InitialLoad),
            Phase::Running => {}
        }

        let Some(community) = community else {
            return Admission::Denied(Denial::DirectMessage);
        };

        if self.operator.is(author) {
            return Admission::Allowed;
        }

        if self.restricted == Some(community) && !self.allow_list.contains(command) {
            debug!(community = %community, command, "Command blocked in restricted community");
            return Admission::Denied(Denial::RestrictedCommunity);
        }

        Admission::Allowed
    }

    /// Evaluates the gate for an invocation.
    pub fn check(&self, ctx: &InvocationContext) -> Admission {
        self.evaluate(ctx.community(), ctx.author(), ctx.command())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::User;

    const OPERATOR: UserId = UserId(1);
    const MEMBER: UserId = UserId(2);
    const STAGING: CommunityId = CommunityId(100);
    const PUBLIC: CommunityId = CommunityId(200);

    fn gate() -> AdmissionGate {
        let operator = Operator::new();
        operator.set(User::new(1, "astrea"));
        AdmissionGate::new(Arc::new(Lifecycle::new()), Arc::new(operator))
            .restricted_community(Some(STAGING))
            .allow_list(["help", "ping"])
    }

    fn run(gate: &AdmissionGate) {
        gate.lifecycle().mark_ready();
        gate.lifecycle().finish_init_load();
    }

    #[test]
    fn test_lifecycle_only_moves_forward() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.phase(), Phase::Connecting);
        assert!(!lifecycle.is_ready());
        assert!(lifecycle.is_init_load());

        assert!(lifecycle.finish_init_load());
        assert_eq!(lifecycle.phase(), Phase::Running);

        // A late ready event must not reopen the init-load phase.
        assert!(!lifecycle.mark_ready());
        assert_eq!(lifecycle.phase(), Phase::Running);
        assert!(lifecycle.is_ready());
        assert!(!lifecycle.is_init_load());
    }

    #[test]
    fn test_rejects_before_ready() {
        let gate = gate();
        for author in [OPERATOR, MEMBER] {
            assert_eq!(
                gate.evaluate(Some(PUBLIC), author, "ping"),
                Admission::Denied(Denial::NotReady)
            );
        }
    }

    #[test]
    fn test_rejects_everyone_during_init_load() {
        let gate = gate();
        gate.lifecycle().mark_ready();

        for author in [OPERATOR, MEMBER] {
            for community in [Some(PUBLIC), Some(STAGING), None] {
                assert_eq!(
                    gate.evaluate(community, author, "help"),
                    Admission::Denied(Denial::InitialLoad)
                );
            }
        }
    }

    #[test]
    fn test_rejects_direct_messages() {
        let gate = gate();
        run(&gate);
        assert_eq!(
            gate.evaluate(None, OPERATOR, "ping"),
            Admission::Denied(Denial::DirectMessage)
        );
    }

    #[test]
    fn test_operator_overrides_restriction() {
        let gate = gate();
        run(&gate);
        assert!(gate.evaluate(Some(STAGING), OPERATOR, "config").is_allowed());
    }

    #[test]
    fn test_restricted_community() {
        let gate = gate();
        run(&gate);

        assert_eq!(
            gate.evaluate(Some(STAGING), MEMBER, "config"),
            Admission::Denied(Denial::RestrictedCommunity)
        );
        assert!(gate.evaluate(Some(STAGING), MEMBER, "help").is_allowed());
        assert!(gate.evaluate(Some(STAGING), MEMBER, "ping").is_allowed());
        assert!(gate.evaluate(Some(PUBLIC), MEMBER, "config").is_allowed());
    }

    #[test]
    fn test_unresolved_operator_is_not_privileged() {
        let gate = AdmissionGate::new(Arc::new(Lifecycle::new()), Arc::new(Operator::new()))
            .restricted_community(Some(STAGING));
        run(&gate);
        assert!(!gate.evaluate(Some(STAGING), OPERATOR, "config").is_allowed());
    }
}
