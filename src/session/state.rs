use crate::error::{Operation, SessionError};

/// Lifecycle of a session: `Loading -> Ready`, `Ready -> Saving -> Ready`,
/// `Ready -> Deleting -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Loading,
    Ready,
    Saving,
    Deleting,
    Closed,
}

impl SessionPhase {
    /// The operation currently holding the session, if any.
    pub fn in_flight(self) -> Option<Operation> {
        match self {
            SessionPhase::Loading => Some(Operation::Load),
            SessionPhase::Saving => Some(Operation::Save),
            SessionPhase::Deleting => Some(Operation::Delete),
            SessionPhase::Ready | SessionPhase::Closed => None,
        }
    }

    pub fn is_closed(self) -> bool {
        self == SessionPhase::Closed
    }

    /// Reject a new save or delete unless the session is idle.
    pub(crate) fn ensure_ready(self) -> Result<(), SessionError> {
        match self {
            SessionPhase::Ready => Ok(()),
            SessionPhase::Closed => Err(SessionError::Closed),
            busy => Err(SessionError::OperationInProgress(
                busy.in_flight().unwrap_or(Operation::Load),
            )),
        }
    }

    /// Loading is allowed on a fresh session and on an idle one.
    pub(crate) fn ensure_loadable(self, first_load: bool) -> Result<(), SessionError> {
        match self {
            SessionPhase::Loading if first_load => Ok(()),
            SessionPhase::Ready => Ok(()),
            SessionPhase::Closed => Err(SessionError::Closed),
            busy => Err(SessionError::OperationInProgress(
                busy.in_flight().unwrap_or(Operation::Load),
            )),
        }
    }
}
