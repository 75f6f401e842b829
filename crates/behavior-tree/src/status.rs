//! Status returned by behavior nodes.

/// The result of processing a behavior node for one tick.
///
/// # Real-time Semantics
///
/// Actions in a real-time game span many frames, so a node can report that
/// it is still in progress:
/// - Conditions evaluate immediately (e.g., "Is the player in melee range?")
/// - Actions may take many ticks (e.g., "Play the punch animation and wait")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    /// The current activation finished successfully.
    ///
    /// For conditions: The condition was met.
    /// For actions: The action ran to completion.
    Success,

    /// The current activation finished unsuccessfully.
    ///
    /// For conditions: The condition was not met.
    /// For actions: The action could not be carried out (e.g., missing body).
    Failure,

    /// The node has more work to do.
    ///
    /// The caller must process this node again on a later tick, and the node
    /// resumes exactly where it left off instead of re-entering from the top.
    Running,
}

impl Status {
    /// Returns `true` if this status is `Success`.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    /// Returns `true` if this status is `Failure`.
    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Failure)
    }

    /// Returns `true` if this status is `Running`.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, Status::Running)
    }

    /// Returns `true` if the activation that produced this status is over.
    #[inline]
    pub fn is_terminal(self) -> bool {
        !self.is_running()
    }

    /// Inverts a terminal status: Success becomes Failure and vice versa.
    ///
    /// `Running` is passed through unchanged.
    #[inline]
    pub fn invert(self) -> Self {
        match self {
            Status::Success => Status::Failure,
            Status::Failure => Status::Success,
            Status::Running => Status::Running,
        }
    }

    /// Converts a boolean predicate result into a terminal status.
    #[inline]
    pub fn from_bool(value: bool) -> Self {
        if value {
            Status::Success
        } else {
            Status::Failure
        }
    }
}
