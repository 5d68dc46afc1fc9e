use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Restaurant, RestaurantId, VibeCheck};
use crate::common::{LobbyId, UserId};

/// Lobby lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LobbyStatus {
    Waiting,
    Matching,
    Voting,
    Completed,
}

impl std::fmt::Display for LobbyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LobbyStatus::Waiting => write!(f, "waiting"),
            LobbyStatus::Matching => write!(f, "matching"),
            LobbyStatus::Voting => write!(f, "voting"),
            LobbyStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for LobbyStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "waiting" => Ok(LobbyStatus::Waiting),
            "matching" => Ok(LobbyStatus::Matching),
            "voting" => Ok(LobbyStatus::Voting),
            "completed" => Ok(LobbyStatus::Completed),
            _ => Err(anyhow::anyhow!("Invalid lobby status: {}", s)),
        }
    }
}

/// A member of a lobby. Readiness is derived from vibe check submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: UserId,
    pub name: String,
    pub is_host: bool,
    pub is_ready: bool,
    pub vibe: Option<VibeCheck>,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(user_id: UserId, name: String, is_host: bool) -> Self {
        Self {
            user_id,
            name,
            is_host,
            is_ready: false,
            vibe: None,
            joined_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Left,
    Right,
}

/// One like/pass decision, scoped to the lobby's current round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swipe {
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    pub direction: SwipeDirection,
    pub swiped_at: DateTime<Utc>,
}

/// A participant's current ballot choice. At most one per participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    pub voted_at: DateTime<Utc>,
}

/// The lobby aggregate. Persisted as a single document; every mutation
/// replaces it wholesale under a version check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lobby {
    pub id: LobbyId,
    pub code: String,
    pub host_id: UserId,
    pub participants: Vec<Participant>,
    pub status: LobbyStatus,
    /// Incremented on every reset; swipes, votes and visits belong to one round.
    pub round: i32,
    /// Candidate snapshot taken when matching starts.
    pub restaurants: Vec<Restaurant>,
    pub swipes: Vec<Swipe>,
    /// Current ballot. Replaced on revote.
    pub ballot: Vec<RestaurantId>,
    /// Ballot as first computed from the swipe intersection.
    pub full_ballot: Vec<RestaurantId>,
    pub votes: Vec<Vote>,
    /// `Some` while the lobby sits in the tied voting sub-state.
    pub tied_restaurants: Option<Vec<RestaurantId>>,
    pub winning_restaurant: Option<RestaurantId>,
    pub revote_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lobby {
    /// A fresh lobby with its creator as the only (host) participant.
    pub fn new(code: String, host_id: UserId, host_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: LobbyId::new(),
            code,
            host_id,
            participants: vec![Participant::new(host_id, host_name, true)],
            status: LobbyStatus::Waiting,
            round: 1,
            restaurants: Vec::new(),
            swipes: Vec::new(),
            ballot: Vec::new(),
            full_ballot: Vec::new(),
            votes: Vec::new(),
            tied_restaurants: None,
            winning_restaurant: None,
            revote_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn participant(&self, user_id: UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    pub fn participant_mut(&mut self, user_id: UserId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.user_id == user_id)
    }

    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.participant(user_id).is_some()
    }

    pub fn is_host(&self, user_id: UserId) -> bool {
        self.host_id == user_id
    }

    /// Active lobbies hold their join code; completed or abandoned ones release it.
    pub fn is_active(&self) -> bool {
        self.status != LobbyStatus::Completed && !self.participants.is_empty()
    }

    pub fn is_tied(&self) -> bool {
        self.tied_restaurants.is_some()
    }

    pub fn ready_count(&self) -> usize {
        self.participants.iter().filter(|p| p.is_ready).count()
    }

    pub fn all_ready(&self) -> bool {
        !self.participants.is_empty() && self.participants.iter().all(|p| p.is_ready)
    }

    pub fn restaurant(&self, restaurant_id: &str) -> Option<&Restaurant> {
        self.restaurants.iter().find(|r| r.id == restaurant_id)
    }

    pub fn vote_of(&self, user_id: UserId) -> Option<&Vote> {
        self.votes.iter().find(|v| v.user_id == user_id)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_lobby_has_single_host() {
        let host = UserId::new();
        let lobby = Lobby::new("123456".to_string(), host, "Ana".to_string());

        assert_eq!(lobby.status, LobbyStatus::Waiting);
        assert_eq!(lobby.participants.len(), 1);
        assert!(lobby.participants[0].is_host);
        assert!(!lobby.participants[0].is_ready);
        assert!(lobby.is_host(host));
        assert!(lobby.is_active());
    }

    #[test]
    fn test_status_roundtrips_through_strings() {
        for status in [
            LobbyStatus::Waiting,
            LobbyStatus::Matching,
            LobbyStatus::Voting,
            LobbyStatus::Completed,
        ] {
            assert_eq!(status.to_string().parse::<LobbyStatus>().unwrap(), status);
        }
        assert!("closed".parse::<LobbyStatus>().is_err());
    }

    #[test]
    fn test_completed_and_empty_lobbies_are_inactive() {
        let host = UserId::new();
        let mut lobby = Lobby::new("000001".to_string(), host, "Ana".to_string());

        lobby.status = LobbyStatus::Completed;
        assert!(!lobby.is_active());

        lobby.status = LobbyStatus::Waiting;
        lobby.participants.clear();
        assert!(!lobby.is_active());
    }
}
