//! High-level join states and the transition table

/// Network membership state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JoinState {
    /// Not started, or back to the beginning after leaving
    InitWaiting,
    /// Looking for and associating with a parent
    Joining,
    /// Restoring a previous membership without scanning
    InitRestoring,
    /// Associated with a parent
    Joined,
    /// Previous membership restored and confirmed
    Rejoined,
    /// Parent lost, recovery in progress
    Orphan,
    /// Parent refused the association
    AccessDenied,
}

impl JoinState {
    /// Device is a member of a network (possibly still confirming it)
    pub fn is_member(self) -> bool {
        matches!(
            self,
            JoinState::Joined | JoinState::Rejoined | JoinState::InitRestoring
        )
    }
}

/// Fine-grained step of the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SubState {
    /// Nothing scheduled
    Idle,
    /// Active scan in progress (non-beacon network)
    ScanActive,
    /// Passive scan in progress (beacon network)
    ScanPassive,
    /// Parent selected, synchronising / associating
    SyncReq,
    /// Orphan scan in progress
    ScanOrphan,
    /// Waiting before the next scan
    ScanBackoff,
    /// Association refused
    AccessDenied,
}

/// Cause of a high-level state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    /// Application started joining
    Join,
    /// Application started rejoining a stored network
    Rejoin,
    /// Association confirm reported success
    AssociationSucceeded,
    /// Association confirm reported a terminal refusal
    AssociationDenied,
    /// First exchange with the restored parent succeeded
    RejoinConfirmed,
    /// Too many failed exchanges or beacons lost
    LinkLost,
    /// Orphan recovery found the parent again
    Realigned,
    /// Membership ended (locally or by the coordinator)
    Disassociated,
    /// Application reset the controller
    Reset,
}

/// Apply `trigger` in state `from`; `previous` is the state before `from`
///
/// Returns `None` if the pair is not in the table.
pub fn transition(from: JoinState, trigger: Trigger, previous: JoinState) -> Option<JoinState> {
    use JoinState::*;

    let to = match (from, trigger) {
        (InitWaiting | AccessDenied, Trigger::Join) => Joining,
        (InitWaiting, Trigger::Rejoin) => InitRestoring,
        (Joining, Trigger::AssociationSucceeded) => Joined,
        (Joining, Trigger::AssociationDenied) => AccessDenied,
        (InitRestoring, Trigger::RejoinConfirmed) => Rejoined,
        (Joined | Rejoined | InitRestoring, Trigger::LinkLost) => Orphan,
        (Orphan, Trigger::Realigned) => {
            if previous == Joined {
                Joined
            } else {
                Rejoined
            }
        }
        (InitWaiting, Trigger::Disassociated) => return None,
        (_, Trigger::Disassociated) => InitWaiting,
        (_, Trigger::Reset) => InitWaiting,
        _ => return None,
    };
    Some(to)
}
