//! Voting phase actions.

use super::commit::{load, mutate};
use crate::common::{LobbyId, UserId};
use crate::domains::lobby::data::VotingData;
use crate::domains::lobby::errors::LobbyError;
use crate::domains::lobby::machines::{require_participant, tally};
use crate::domains::lobby::models::Lobby;
use crate::kernel::ServerDeps;

pub async fn voting(
    lobby_id: LobbyId,
    user_id: UserId,
    deps: &ServerDeps,
) -> Result<VotingData, LobbyError> {
    let lobby = load(lobby_id, deps).await?.lobby;
    require_participant(&lobby, user_id)?;
    Ok(VotingData::for_caller(&lobby, user_id))
}

/// Cast or change a vote. The last vote resolves the round; completion
/// records the Visit before this returns.
pub async fn vote(
    lobby_id: LobbyId,
    user_id: UserId,
    restaurant_id: &str,
    deps: &ServerDeps,
) -> Result<Lobby, LobbyError> {
    let committed = mutate(
        lobby_id,
        "vote",
        |lobby| tally::vote(lobby, user_id, restaurant_id),
        deps,
    )
    .await?;

    Ok(committed.lobby)
}

pub async fn revote(
    lobby_id: LobbyId,
    user_id: UserId,
    tied_only: bool,
    deps: &ServerDeps,
) -> Result<Lobby, LobbyError> {
    let committed = mutate(
        lobby_id,
        "revote",
        |lobby| tally::revote(lobby, user_id, tied_only),
        deps,
    )
    .await?;

    Ok(committed.lobby)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::lobby::actions::{
        create_lobby, get_lobby, join_lobby, start_matching, submit_vibe, swipe,
    };
    use crate::domains::lobby::machines::fixtures::any_vibe;
    use crate::domains::lobby::models::{LobbyStatus, SwipeDirection};
    use crate::kernel::{BaseVisitStore, MockCandidateSupplier, TestDependencies};

    /// Two-person lobby in voting with both "1" and "2" on the ballot.
    async fn voting_lobby(test: &TestDependencies) -> (LobbyId, UserId, UserId) {
        let deps = test.server_deps();
        let host = UserId::new();
        let guest = UserId::new();
        let lobby = create_lobby(host, "Ana".to_string(), &deps).await.unwrap();
        join_lobby(&lobby.code, guest, "Bo".to_string(), &deps).await.unwrap();
        for user in [host, guest] {
            submit_vibe(lobby.id, user, any_vibe(), &deps).await.unwrap();
        }
        start_matching(lobby.id, host, &deps).await.unwrap();
        for user in [host, guest] {
            for id in ["1", "2"] {
                swipe(lobby.id, user, id, SwipeDirection::Right, &deps).await.unwrap();
            }
        }
        (lobby.id, host, guest)
    }

    fn two_candidates() -> TestDependencies {
        TestDependencies::new().with_candidates(MockCandidateSupplier::numbered(2))
    }

    #[tokio::test]
    async fn test_unique_winner_completes_and_records_visit() {
        let test = two_candidates();
        let deps = test.server_deps();
        let (lobby_id, host, guest) = voting_lobby(&test).await;

        vote(lobby_id, host, "2", &deps).await.unwrap();
        let done = vote(lobby_id, guest, "2", &deps).await.unwrap();

        assert_eq!(done.status, LobbyStatus::Completed);
        assert_eq!(done.winning_restaurant.as_deref(), Some("2"));

        let visits = test.visit_store.all();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].restaurant.id, "2");
        assert_eq!(visits[0].participant_ids.len(), 2);

        let history = test.visit_store.list_for_user(guest).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_visit_write_still_completes_round() {
        let test = two_candidates();
        let deps = test.server_deps();
        let (lobby_id, host, guest) = voting_lobby(&test).await;
        test.visit_store.fail_next(1);

        vote(lobby_id, host, "1", &deps).await.unwrap();
        let done = vote(lobby_id, guest, "1", &deps).await.unwrap();

        assert_eq!(done.status, LobbyStatus::Completed);
        assert!(test.visit_store.all().is_empty());

        let stored = get_lobby(lobby_id, &deps).await.unwrap();
        assert_eq!(stored.status, LobbyStatus::Completed);
        assert_eq!(stored.winning_restaurant.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_tie_then_revote_on_tied_set() {
        let test = two_candidates();
        let deps = test.server_deps();
        let (lobby_id, host, guest) = voting_lobby(&test).await;

        vote(lobby_id, host, "1", &deps).await.unwrap();
        vote(lobby_id, guest, "2", &deps).await.unwrap();

        let data = voting(lobby_id, guest, &deps).await.unwrap();
        assert!(data.is_tie);
        assert_eq!(data.tied_restaurants, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(data.status, LobbyStatus::Voting);

        let blocked = revote(lobby_id, guest, true, &deps).await;
        assert!(matches!(blocked, Err(LobbyError::Unauthorized(_))));

        let reopened = revote(lobby_id, host, true, &deps).await.unwrap();
        assert_eq!(reopened.ballot, vec!["1".to_string(), "2".to_string()]);
        assert!(reopened.votes.is_empty());
        assert!(test.visit_store.all().is_empty());
    }

    #[tokio::test]
    async fn test_revote_outside_tie_is_precondition_failed() {
        let test = two_candidates();
        let deps = test.server_deps();
        let (lobby_id, host, _) = voting_lobby(&test).await;

        let result = revote(lobby_id, host, false, &deps).await;
        assert!(matches!(result, Err(LobbyError::PreconditionFailed(_))));
    }

    #[tokio::test]
    async fn test_lost_swap_is_retried() {
        let test = two_candidates();
        let deps = test.server_deps();
        let (lobby_id, host, _) = voting_lobby(&test).await;

        test.lobby_store.interfere(1);
        vote(lobby_id, host, "1", &deps).await.unwrap();

        assert_eq!(test.lobby_store.swap_conflicts(), 1);
        let data = voting(lobby_id, host, &deps).await.unwrap();
        assert_eq!(data.my_vote.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_persistent_contention_surfaces_conflict() {
        let test = two_candidates();
        let deps = test.server_deps();
        let (lobby_id, host, _) = voting_lobby(&test).await;

        test.lobby_store.interfere(10);
        let result = vote(lobby_id, host, "1", &deps).await;

        assert!(matches!(result, Err(LobbyError::Conflict(_))));
        let data = voting(lobby_id, host, &deps).await.unwrap();
        assert!(data.my_vote.is_none());
    }

    #[tokio::test]
    async fn test_racing_final_votes_record_one_visit() {
        let test = two_candidates();
        let (lobby_id, host, guest) = voting_lobby(&test).await;
        vote(lobby_id, host, "1", &test.server_deps()).await.unwrap();

        // Separate deps means separate lock tables: only the store's version
        // check stands between the two writers.
        let a = test.server_deps();
        let b = test.server_deps();
        let (first, second) = tokio::join!(
            tokio::spawn(async move { vote(lobby_id, guest, "1", &a).await }),
            tokio::spawn(async move { vote(lobby_id, guest, "1", &b).await }),
        );
        let outcomes = [first.unwrap(), second.unwrap()];

        let completed = outcomes
            .iter()
            .filter(|r| matches!(r, Ok(l) if l.status == LobbyStatus::Completed))
            .count();
        let closed = outcomes
            .iter()
            .filter(|r| matches!(r, Err(LobbyError::InvalidState(_))))
            .count();
        assert_eq!((completed, closed), (1, 1));
        assert_eq!(test.visit_store.all().len(), 1);
    }
}
