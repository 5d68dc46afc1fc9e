//! Lobby state machine.
//!
//! Pure transitions over the `Lobby` aggregate: no I/O, no clocks beyond
//! timestamps. Each transition validates its guards against the current
//! document, mutates it in place, and returns the events it produced. A
//! rejected transition leaves the document untouched.
//!
//! ```text
//! waiting --start (host, >=2, all ready)--> matching
//! matching --last swipe--> voting (ballot = intersection of likes)
//! voting --last vote, unique max--> completed
//! voting --last vote, tie--> voting[tied] --revote (host)--> voting
//! any --reset (host)--> waiting
//! ```

pub mod ledger;
pub mod lifecycle;
pub mod registry;
pub mod tally;

pub use ledger::{SwipeProgress, compute_ballot};
pub use lifecycle::StartCheck;
pub use tally::Tally;

use super::errors::LobbyError;
use super::events::LobbyEvent;
use super::models::{Lobby, LobbyStatus, Participant};
use crate::common::UserId;

pub type Transition = Result<Vec<LobbyEvent>, LobbyError>;

/// What happens to host rights when the host leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostPolicy {
    /// Host identity never moves; a lobby whose host left cannot be advanced.
    #[default]
    Fixed,
    /// The earliest-joined remaining participant becomes host.
    OldestRemaining,
}

pub(crate) fn require_participant(lobby: &Lobby, user_id: UserId) -> Result<&Participant, LobbyError> {
    lobby
        .participant(user_id)
        .ok_or_else(|| LobbyError::Unauthorized("You are not a participant in this lobby".to_string()))
}

pub(crate) fn require_host(lobby: &Lobby, user_id: UserId, action: &str) -> Result<(), LobbyError> {
    if lobby.is_host(user_id) && lobby.is_participant(user_id) {
        Ok(())
    } else {
        Err(LobbyError::host_only(action))
    }
}

/// Fire whichever completion transition the current document satisfies.
///
/// Evaluated after every swipe, vote and departure so progress never
/// depends on a timer.
pub fn settle(lobby: &mut Lobby) -> Vec<LobbyEvent> {
    match lobby.status {
        LobbyStatus::Matching if ledger::all_done(lobby) => vec![ledger::advance_to_voting(lobby)],
        LobbyStatus::Voting if !lobby.is_tied() && tally::all_voted(lobby) => {
            tally::resolve(lobby).into_iter().collect()
        }
        _ => Vec::new(),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_settle_is_noop_in_waiting() {
        let (mut lobby, _) = waiting_lobby(1);
        assert!(settle(&mut lobby).is_empty());
        assert_eq!(lobby.status, LobbyStatus::Waiting);
    }

    #[test]
    fn test_non_participant_is_not_host_even_with_matching_id() {
        let (mut lobby, users) = waiting_lobby(1);
        lobby.participants.retain(|p| p.user_id != users[0]);

        assert!(matches!(
            require_host(&lobby, users[0], "reset the lobby"),
            Err(LobbyError::Unauthorized(_))
        ));
    }
}
