//! The upvote toggle.
//!
//! Per `(voter, solution)` pair the state machine is `NoVote ⇄ Voted`,
//! starting at `NoVote`, with no terminal state. The transition itself is a
//! single conditional write in the [`VoteStore`]; this module owns the
//! preconditions and the tolerance for a lost uniqueness race.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  identity::Identity,
  record::Solution,
  store::VoteStore,
};

/// The state a toggle left the pair in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteState {
  Voted,
  Unvoted,
}

impl VoteState {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Voted => "voted",
      Self::Unvoted => "unvoted",
    }
  }
}

/// Flip `identity`'s vote on `solution`.
///
/// Fails with [`Error::Forbidden`] if `identity` authored the solution; this
/// is checked before vote storage is touched. A uniqueness conflict surfaced
/// by the store means a concurrent toggle by the same voter inserted first;
/// if the vote is now present that is reported as [`VoteState::Voted`].
pub async fn toggle<V: VoteStore>(
  store: &V,
  solution: &Solution,
  identity: &Identity,
) -> Result<VoteState> {
  let voter = identity.principal().ok_or(Error::Unauthenticated)?;

  if voter.user_id == solution.owner_id {
    return Err(Error::forbidden("you cannot vote on your own solution"));
  }

  let outcome: Result<VoteState> = store
    .toggle_vote(voter.user_id, solution.solution_id)
    .await
    .map_err(Into::into);

  match outcome {
    Err(Error::Conflict(reason)) => {
      let present = store
        .find_vote(voter.user_id, solution.solution_id)
        .await
        .map_err(Into::<Error>::into)?;
      match present {
        Some(_) => Ok(VoteState::Voted),
        None => Err(Error::Conflict(reason)),
      }
    }
    other => other,
  }
}

#[cfg(test)]
mod tests {
  use std::{
    collections::HashMap,
    sync::{
      Mutex,
      atomic::{AtomicBool, Ordering},
    },
  };

  use chrono::Utc;
  use uuid::Uuid;

  use super::*;
  use crate::{identity::Principal, record::Vote};

  /// In-memory vote slots. With `conflict_once` set, the next toggle inserts
  /// the vote and then reports a uniqueness conflict, as a backend would when
  /// a concurrent insert wins. With `phantom_conflict` set, the next toggle
  /// reports the conflict but leaves no vote behind.
  #[derive(Default)]
  struct MemoryVotes {
    votes:            Mutex<HashMap<(Uuid, Uuid), Vote>>,
    conflict_once:    AtomicBool,
    phantom_conflict: AtomicBool,
  }

  impl MemoryVotes {
    fn count(&self) -> usize { self.votes.lock().unwrap().len() }
  }

  impl VoteStore for MemoryVotes {
    type Error = Error;

    async fn find_vote(&self, voter_id: Uuid, solution_id: Uuid) -> Result<Option<Vote>> {
      Ok(self.votes.lock().unwrap().get(&(voter_id, solution_id)).cloned())
    }

    async fn toggle_vote(&self, voter_id: Uuid, solution_id: Uuid) -> Result<VoteState> {
      let mut votes = self.votes.lock().unwrap();
      let key = (voter_id, solution_id);
      if self.phantom_conflict.swap(false, Ordering::SeqCst) {
        return Err(Error::Conflict("votes.voter_id, votes.solution_id".into()));
      }
      if self.conflict_once.swap(false, Ordering::SeqCst) {
        votes.insert(key, Vote { voter_id, solution_id, created_at: Utc::now() });
        return Err(Error::Conflict("votes.voter_id, votes.solution_id".into()));
      }
      if votes.remove(&key).is_some() {
        Ok(VoteState::Unvoted)
      } else {
        votes.insert(key, Vote { voter_id, solution_id, created_at: Utc::now() });
        Ok(VoteState::Voted)
      }
    }
  }

  fn identity() -> Identity {
    Identity::Authenticated(Principal {
      user_id:  Uuid::new_v4(),
      username: "voter".into(),
      is_admin: false,
    })
  }

  fn solution_by(owner: &Identity) -> Solution {
    Solution {
      solution_id: Uuid::new_v4(),
      post_id:     Uuid::new_v4(),
      owner_id:    owner.user_id().unwrap(),
      description: "bump the dependency".into(),
      upvotes:     0,
      created_at:  Utc::now(),
      updated_at:  Utc::now(),
    }
  }

  #[tokio::test]
  async fn toggling_alternates_with_period_two() {
    let store = MemoryVotes::default();
    let solution = solution_by(&identity());
    let voter = identity();

    let expected = [VoteState::Voted, VoteState::Unvoted, VoteState::Voted, VoteState::Unvoted];
    for (i, want) in expected.into_iter().enumerate() {
      let got = toggle(&store, &solution, &voter).await.unwrap();
      assert_eq!(got, want, "toggle #{i}");
      let count = if want == VoteState::Voted { 1 } else { 0 };
      assert_eq!(store.count(), count, "toggle #{i}");
    }
  }

  #[tokio::test]
  async fn self_vote_is_forbidden_and_leaves_no_vote() {
    let store = MemoryVotes::default();
    let author = identity();
    let solution = solution_by(&author);

    for _ in 0..3 {
      let err = toggle(&store, &solution, &author).await.unwrap_err();
      assert!(matches!(err, Error::Forbidden(_)));
    }
    assert_eq!(store.count(), 0);
  }

  #[tokio::test]
  async fn anonymous_cannot_toggle() {
    let store = MemoryVotes::default();
    let solution = solution_by(&identity());
    let err = toggle(&store, &solution, &Identity::Anonymous).await.unwrap_err();
    assert!(matches!(err, Error::Unauthenticated));
  }

  #[tokio::test]
  async fn lost_insert_race_reports_voted() {
    let store = MemoryVotes::default();
    store.conflict_once.store(true, Ordering::SeqCst);
    let solution = solution_by(&identity());
    let voter = identity();

    let state = toggle(&store, &solution, &voter).await.unwrap();
    assert_eq!(state, VoteState::Voted);
    assert_eq!(store.count(), 1);

    let state = toggle(&store, &solution, &voter).await.unwrap();
    assert_eq!(state, VoteState::Unvoted);
    assert_eq!(store.count(), 0);
  }

  #[tokio::test]
  async fn conflict_without_a_vote_is_surfaced() {
    let store = MemoryVotes::default();
    store.phantom_conflict.store(true, Ordering::SeqCst);
    let solution = solution_by(&identity());
    let voter = identity();

    let err = toggle(&store, &solution, &voter).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    assert_eq!(store.count(), 0);

    // The next toggle goes through normally.
    assert_eq!(toggle(&store, &solution, &voter).await.unwrap(), VoteState::Voted);
  }

  #[tokio::test]
  async fn voters_are_independent() {
    let store = MemoryVotes::default();
    let solution = solution_by(&identity());
    let (a, b) = (identity(), identity());

    assert_eq!(toggle(&store, &solution, &a).await.unwrap(), VoteState::Voted);
    assert_eq!(toggle(&store, &solution, &b).await.unwrap(), VoteState::Voted);
    assert_eq!(store.count(), 2);
    assert_eq!(toggle(&store, &solution, &a).await.unwrap(), VoteState::Unvoted);
    assert_eq!(store.count(), 1);
  }
}
