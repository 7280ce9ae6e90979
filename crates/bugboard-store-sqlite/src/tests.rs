//! Integration tests for `SqliteStore` against an in-memory database.

use bugboard_core::{
  identity::{Identity, Principal},
  record::{
    CommentPatch, NewComment, NewPost, NewSolution, NewTag, NewUser, PostPatch,
    Solution, TagPatch, User,
  },
  store::{BoardStore, VoteStore},
  vote::{self, VoteState},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, username: &str) -> User {
  s.create_user(NewUser {
    username:      username.into(),
    email:         format!("{username}@example.com"),
    password_hash: "$argon2id$placeholder".into(),
    is_admin:      false,
  })
  .await
  .unwrap()
}

fn identity_of(user: &User) -> Identity {
  Identity::Authenticated(Principal {
    user_id:  user.user_id,
    username: user.username.clone(),
    is_admin: user.is_admin,
  })
}

async fn solution(s: &SqliteStore, author: &User) -> Solution {
  let post = s
    .create_post(author.user_id, NewPost {
      title:       "crash on save".into(),
      description: "saving an empty draft panics".into(),
    })
    .await
    .unwrap();
  s.create_solution(author.user_id, NewSolution {
    post_id:     post.post_id,
    description: "guard the empty case".into(),
  })
  .await
  .unwrap()
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_find_user() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let found = s.find_user("alice".into()).await.unwrap().unwrap();
  assert_eq!(found.user_id, alice.user_id);
  assert_eq!(found.password_hash, "$argon2id$placeholder");
  assert!(!found.is_admin);

  let by_id = s.get_user(alice.user_id).await.unwrap().unwrap();
  assert_eq!(by_id.username, "alice");

  assert!(s.find_user("bob".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_is_conflict() {
  let s = store().await;
  user(&s, "alice").await;

  let err = s
    .create_user(NewUser {
      username:      "alice".into(),
      email:         "other@example.com".into(),
      password_hash: "x".into(),
      is_admin:      false,
    })
    .await
    .unwrap_err();
  assert!(matches!(bugboard_core::Error::from(err), bugboard_core::Error::Conflict(_)));
}

#[tokio::test]
async fn tokens_resolve_until_revoked() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  s.insert_token(alice.user_id, "digest-1".into()).await.unwrap();
  s.insert_token(alice.user_id, "digest-2".into()).await.unwrap();

  let principal = s.identity_for_token("digest-1".into()).await.unwrap().unwrap();
  assert_eq!(principal.user_id, alice.user_id);
  assert_eq!(principal.username, "alice");
  assert!(s.identity_for_token("unknown".into()).await.unwrap().is_none());

  s.delete_tokens(alice.user_id).await.unwrap();
  assert!(s.identity_for_token("digest-1".into()).await.unwrap().is_none());
  assert!(s.identity_for_token("digest-2".into()).await.unwrap().is_none());
}

// ─── Posts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_post_stamps_owner() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let post = s
    .create_post(alice.user_id, NewPost {
      title:       "t".into(),
      description: "d".into(),
    })
    .await
    .unwrap();
  assert_eq!(post.owner_id, alice.user_id);

  let fetched = s.get_post(post.post_id).await.unwrap().unwrap();
  assert_eq!(fetched.owner_id, alice.user_id);
  assert_eq!(fetched.title, "t");
  assert!(fetched.tags.is_empty());
}

#[tokio::test]
async fn update_post_applies_patch_and_keeps_owner() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let post = s
    .create_post(alice.user_id, NewPost {
      title:       "old title".into(),
      description: "old body".into(),
    })
    .await
    .unwrap();

  let updated = s
    .update_post(post.post_id, PostPatch {
      title: Some("new title".into()),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.title, "new title");
  assert_eq!(updated.description, "old body");
  assert_eq!(updated.owner_id, alice.user_id);
  assert!(updated.updated_at >= post.updated_at);
}

#[tokio::test]
async fn update_and_delete_missing_post() {
  let s = store().await;
  let missing = Uuid::new_v4();
  assert!(s.update_post(missing, PostPatch::default()).await.unwrap().is_none());
  assert!(!s.delete_post(missing).await.unwrap());
}

#[tokio::test]
async fn post_tags_attach_and_detach() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let post = s
    .create_post(alice.user_id, NewPost { title: "t".into(), description: "d".into() })
    .await
    .unwrap();
  let tag = s.create_tag(NewTag { name: "UI Glitch".into() }).await.unwrap();

  s.add_post_tag(post.post_id, tag.tag_id).await.unwrap();
  // Attaching twice is a no-op.
  s.add_post_tag(post.post_id, tag.tag_id).await.unwrap();

  let fetched = s.get_post(post.post_id).await.unwrap().unwrap();
  assert_eq!(fetched.tags, vec![tag.clone()]);

  let listed = s.list_posts().await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].tags.len(), 1);

  s.remove_post_tag(post.post_id, tag.tag_id).await.unwrap();
  s.remove_post_tag(post.post_id, tag.tag_id).await.unwrap();
  let fetched = s.get_post(post.post_id).await.unwrap().unwrap();
  assert!(fetched.tags.is_empty());
}

#[tokio::test]
async fn attaching_unknown_tag_is_not_found() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let post = s
    .create_post(alice.user_id, NewPost { title: "t".into(), description: "d".into() })
    .await
    .unwrap();

  let err = s.add_post_tag(post.post_id, Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(bugboard_core::Error::from(err), bugboard_core::Error::NotFound(_)));
}

#[tokio::test]
async fn deleting_post_cascades() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let sol = solution(&s, &alice).await;
  let comment = s
    .create_comment(bob.user_id, NewComment {
      solution_id: sol.solution_id,
      description: "works for me".into(),
    })
    .await
    .unwrap();
  s.toggle_vote(bob.user_id, sol.solution_id).await.unwrap();

  assert!(s.delete_post(sol.post_id).await.unwrap());

  assert!(s.get_solution(sol.solution_id).await.unwrap().is_none());
  assert!(s.get_comment(comment.comment_id).await.unwrap().is_none());
  assert!(s.find_vote(bob.user_id, sol.solution_id).await.unwrap().is_none());
}

// ─── Solutions & comments ────────────────────────────────────────────────────

#[tokio::test]
async fn solution_for_unknown_post_is_not_found() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let err = s
    .create_solution(alice.user_id, NewSolution {
      post_id:     Uuid::new_v4(),
      description: "d".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(bugboard_core::Error::from(err), bugboard_core::Error::NotFound(_)));
}

#[tokio::test]
async fn post_solutions_are_scoped_to_post() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let first = solution(&s, &alice).await;
  solution(&s, &alice).await;

  let under_first = s.list_post_solutions(first.post_id).await.unwrap();
  assert_eq!(under_first.len(), 1);
  assert_eq!(under_first[0].solution_id, first.solution_id);

  assert_eq!(s.list_solutions().await.unwrap().len(), 2);
  assert!(s.list_post_solutions(Uuid::new_v4()).await.unwrap().is_empty());
}

#[tokio::test]
async fn comment_update_and_delete() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let sol = solution(&s, &alice).await;
  let comment = s
    .create_comment(alice.user_id, NewComment {
      solution_id: sol.solution_id,
      description: "first".into(),
    })
    .await
    .unwrap();

  let updated = s
    .update_comment(comment.comment_id, CommentPatch { description: Some("edited".into()) })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.description, "edited");
  assert_eq!(updated.owner_id, alice.user_id);
  assert_eq!(s.list_comments().await.unwrap().len(), 1);

  assert!(s.delete_comment(comment.comment_id).await.unwrap());
  assert!(!s.delete_comment(comment.comment_id).await.unwrap());
}

// ─── Tags ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn tag_slug_follows_name() {
  let s = store().await;
  let tag = s.create_tag(NewTag { name: "Data Loss".into() }).await.unwrap();
  assert_eq!(tag.slug, "data-loss");

  let renamed = s
    .update_tag(tag.tag_id, TagPatch { name: Some("Data Corruption".into()) })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(renamed.slug, "data-corruption");

  let unchanged = s.update_tag(tag.tag_id, TagPatch::default()).await.unwrap().unwrap();
  assert_eq!(unchanged, renamed);
}

#[tokio::test]
async fn duplicate_tag_is_conflict() {
  let s = store().await;
  s.create_tag(NewTag { name: "crash".into() }).await.unwrap();

  // Same slug, different name.
  let err = s.create_tag(NewTag { name: "Crash!".into() }).await.unwrap_err();
  assert!(matches!(bugboard_core::Error::from(err), bugboard_core::Error::Conflict(_)));
  assert_eq!(s.list_tags().await.unwrap().len(), 1);
}

// ─── Votes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn toggle_alternates_and_counts() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let sol = solution(&s, &alice).await;

  for round in 0..3 {
    let state = s.toggle_vote(bob.user_id, sol.solution_id).await.unwrap();
    assert_eq!(state, VoteState::Voted, "round {round}");
    let fetched = s.get_solution(sol.solution_id).await.unwrap().unwrap();
    assert_eq!(fetched.upvotes, 1);
    assert!(s.find_vote(bob.user_id, sol.solution_id).await.unwrap().is_some());

    let state = s.toggle_vote(bob.user_id, sol.solution_id).await.unwrap();
    assert_eq!(state, VoteState::Unvoted, "round {round}");
    let fetched = s.get_solution(sol.solution_id).await.unwrap().unwrap();
    assert_eq!(fetched.upvotes, 0);
  }
}

#[tokio::test]
async fn engine_rejects_self_vote_before_storage() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let sol = solution(&s, &alice).await;

  let err = vote::toggle(&s, &sol, &identity_of(&alice)).await.unwrap_err();
  assert!(matches!(err, bugboard_core::Error::Forbidden(_)));
  assert!(s.find_vote(alice.user_id, sol.solution_id).await.unwrap().is_none());
}

#[tokio::test]
async fn votes_from_different_users_accumulate() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let sol = solution(&s, &alice).await;

  for name in ["bob", "carol", "dave"] {
    let voter = user(&s, name).await;
    let state = vote::toggle(&s, &sol, &identity_of(&voter)).await.unwrap();
    assert_eq!(state, VoteState::Voted);
  }

  let fetched = s.get_solution(sol.solution_id).await.unwrap().unwrap();
  assert_eq!(fetched.upvotes, 3);
}

#[tokio::test]
async fn concurrent_toggles_never_duplicate_a_vote() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let sol = solution(&s, &alice).await;

  let handles: Vec<_> = (0..16)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move { s.toggle_vote(bob.user_id, sol.solution_id).await })
    })
    .collect();

  let mut voted = 0;
  for handle in handles {
    if handle.await.unwrap().unwrap() == VoteState::Voted {
      voted += 1;
    }
  }

  // Every toggle is serialised, so an even number of them cancels out.
  assert_eq!(voted, 8);
  let fetched = s.get_solution(sol.solution_id).await.unwrap().unwrap();
  assert_eq!(fetched.upvotes, 0);
}

#[tokio::test]
async fn voting_on_unknown_solution_is_not_found() {
  let s = store().await;
  let bob = user(&s, "bob").await;

  let err = s.toggle_vote(bob.user_id, Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(bugboard_core::Error::from(err), bugboard_core::Error::NotFound(_)));
}
