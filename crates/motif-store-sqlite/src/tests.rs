//! Integration tests for `SqliteStore` against an in-memory database.

use motif_core::{
  store::{Ballot, Submission, TagStore},
  topic::TopicSelector,
  video::{NewVideo, VideoId},
  vote::{DesiredVote, VoteOutcome, VoteValue},
};

use crate::SqliteStore;

const VID_A: &str = "aaaaaaaaaaa";
const VID_B: &str = "bbbbbbbbbbb";
const VID_C: &str = "ccccccccccc";
const VID_D: &str = "ddddddddddd";

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn vid(id: &str) -> VideoId {
  VideoId::parse(id).expect("valid video id")
}

async fn add_video(s: &SqliteStore, id: &str, title: Option<&str>) -> Submission {
  s.add_video(NewVideo::new(vid(id), title.map(str::to_owned)))
    .await
    .unwrap()
}

fn ballot(video: &str, topic: &str, user: &str, desired: i64) -> Ballot {
  Ballot {
    video_id: vid(video),
    topic:    TopicSelector::Name(topic.into()),
    user_id:  user.into(),
    username: None,
    desired:  DesiredVote::from_clamped(desired),
  }
}

// ─── Videos ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_video() {
  let s = store().await;

  let sub = add_video(&s, VID_A, Some("First title")).await;
  assert!(sub.was_created());
  assert_eq!(sub.video().title.as_deref(), Some("First title"));

  let fetched = s.get_video(vid(VID_A)).await.unwrap().unwrap();
  assert_eq!(fetched.id.as_str(), VID_A);
  assert_eq!(fetched.title.as_deref(), Some("First title"));
  assert!(fetched.upload_date.is_none());
}

#[tokio::test]
async fn get_video_missing_returns_none() {
  let s = store().await;
  assert!(s.get_video(vid(VID_A)).await.unwrap().is_none());
}

#[tokio::test]
async fn resubmission_keeps_first_title() {
  let s = store().await;

  add_video(&s, VID_A, Some("Original")).await;
  let second = add_video(&s, VID_A, Some("Usurper")).await;

  assert!(!second.was_created());
  assert_eq!(second.video().title.as_deref(), Some("Original"));
}

#[tokio::test]
async fn resubmission_does_not_backfill_title() {
  let s = store().await;

  add_video(&s, VID_A, None).await;
  let second = add_video(&s, VID_A, Some("Late title")).await;

  assert!(!second.was_created());
  assert_eq!(second.video().title, None);
}

#[tokio::test]
async fn resubmission_leaves_last_updated_alone() {
  let s = store().await;

  let first  = add_video(&s, VID_A, Some("t")).await;
  let second = add_video(&s, VID_A, Some("t")).await;

  assert_eq!(first.video().last_updated, second.video().last_updated);
}

// ─── Topics ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn resolve_creates_then_reuses() {
  let s = store().await;

  let first = s
    .resolve_or_create_topic(TopicSelector::Name("rust".into()))
    .await
    .unwrap();
  let second = s
    .resolve_or_create_topic(TopicSelector::Name("rust".into()))
    .await
    .unwrap();
  assert_eq!(first, second);

  let topic = s.get_topic_by_name("rust".into()).await.unwrap().unwrap();
  assert_eq!(topic.id, first);
  assert_eq!(topic.name, "rust");
}

#[tokio::test]
async fn distinct_names_get_distinct_ids() {
  let s = store().await;

  let a = s
    .resolve_or_create_topic(TopicSelector::Name("rust".into()))
    .await
    .unwrap();
  let b = s
    .resolve_or_create_topic(TopicSelector::Name("go".into()))
    .await
    .unwrap();
  assert_ne!(a, b);
}

#[tokio::test]
async fn resolve_by_id_passes_through() {
  let s = store().await;
  let id = s
    .resolve_or_create_topic(TopicSelector::Id(42))
    .await
    .unwrap();
  assert_eq!(id, 42);
}

#[tokio::test]
async fn concurrent_creations_converge_on_one_row() {
  let s = store().await;

  let (a, b) = tokio::join!(
    tokio::spawn({
      let s = s.clone();
      async move {
        s.resolve_or_create_topic(TopicSelector::Name("newtopic".into()))
          .await
          .unwrap()
      }
    }),
    tokio::spawn({
      let s = s.clone();
      async move {
        s.resolve_or_create_topic(TopicSelector::Name("newtopic".into()))
          .await
          .unwrap()
      }
    }),
  );
  assert_eq!(a.unwrap(), b.unwrap());

  let topic = s.get_topic_by_name("newtopic".into()).await.unwrap().unwrap();
  assert_eq!(topic.name, "newtopic");
}

#[tokio::test]
async fn get_topic_by_name_missing_returns_none() {
  let s = store().await;
  assert!(s.get_topic_by_name("ghost".into()).await.unwrap().is_none());
}

// ─── Vote state machine ──────────────────────────────────────────────────────

#[tokio::test]
async fn first_upvote_creates_row() {
  let s = store().await;

  let receipt = s.submit_vote(ballot(VID_A, "rust", "u1", 1)).await.unwrap();
  assert_eq!(receipt.outcome, VoteOutcome::Created);

  let current = s
    .get_vote(vid(VID_A), receipt.topic_id, "u1".into())
    .await
    .unwrap();
  assert_eq!(current, Some(VoteValue::Up));
}

#[tokio::test]
async fn repeating_a_vote_toggles_it_off_and_on() {
  let s = store().await;

  let first = s.submit_vote(ballot(VID_A, "rust", "u1", 1)).await.unwrap();
  assert_eq!(first.outcome, VoteOutcome::Created);

  let second = s.submit_vote(ballot(VID_A, "rust", "u1", 1)).await.unwrap();
  assert_eq!(second.outcome, VoteOutcome::Removed);
  assert_eq!(second.topic_id, first.topic_id);
  assert_eq!(
    s.get_vote(vid(VID_A), first.topic_id, "u1".into()).await.unwrap(),
    None
  );

  let third = s.submit_vote(ballot(VID_A, "rust", "u1", 1)).await.unwrap();
  assert_eq!(third.outcome, VoteOutcome::Created);
  assert_eq!(
    s.get_vote(vid(VID_A), first.topic_id, "u1".into()).await.unwrap(),
    Some(VoteValue::Up)
  );
}

#[tokio::test]
async fn opposite_vote_overwrites_in_place() {
  let s = store().await;

  s.submit_vote(ballot(VID_A, "rust", "u1", 1)).await.unwrap();
  let receipt = s.submit_vote(ballot(VID_A, "rust", "u1", -1)).await.unwrap();
  assert_eq!(receipt.outcome, VoteOutcome::Updated);

  assert_eq!(
    s.get_vote(vid(VID_A), receipt.topic_id, "u1".into()).await.unwrap(),
    Some(VoteValue::Down)
  );

  // Still a single ledger row: the tally is exactly -1.
  let tallies = s.topic_tallies(vid(VID_A)).await.unwrap();
  assert_eq!(tallies.len(), 1);
  assert_eq!(tallies[0].total_votes, -1);
}

#[tokio::test]
async fn clear_removes_standing_vote() {
  let s = store().await;

  s.submit_vote(ballot(VID_A, "rust", "u1", 1)).await.unwrap();
  let receipt = s.submit_vote(ballot(VID_A, "rust", "u1", 0)).await.unwrap();
  assert_eq!(receipt.outcome, VoteOutcome::Removed);
  assert_eq!(
    s.get_vote(vid(VID_A), receipt.topic_id, "u1".into()).await.unwrap(),
    None
  );
}

#[tokio::test]
async fn clear_with_no_standing_vote_writes_nothing() {
  let s = store().await;

  let receipt = s.submit_vote(ballot(VID_A, "rust", "u1", 0)).await.unwrap();
  assert_eq!(receipt.outcome, VoteOutcome::Removed);

  // No zero row ever lands in the ledger.
  assert_eq!(
    s.get_vote(vid(VID_A), receipt.topic_id, "u1".into()).await.unwrap(),
    None
  );
  assert!(s.topic_tallies(vid(VID_A)).await.unwrap().is_empty());

  // The user and topic registrations still happened.
  assert!(s.get_user("u1".into()).await.unwrap().is_some());
  assert!(s.get_topic_by_name("rust".into()).await.unwrap().is_some());
  let stats = s.user_stats("u1".into()).await.unwrap().unwrap();
  assert_eq!(stats.submissions_count, 0);
}

#[tokio::test]
async fn out_of_range_desires_are_clamped() {
  let s = store().await;

  let receipt = s.submit_vote(ballot(VID_A, "rust", "u1", 7)).await.unwrap();
  assert_eq!(receipt.outcome, VoteOutcome::Created);
  assert_eq!(
    s.get_vote(vid(VID_A), receipt.topic_id, "u1".into()).await.unwrap(),
    Some(VoteValue::Up)
  );

  let receipt = s
    .submit_vote(ballot(VID_A, "rust", "u1", -100))
    .await
    .unwrap();
  assert_eq!(receipt.outcome, VoteOutcome::Updated);
  assert_eq!(
    s.get_vote(vid(VID_A), receipt.topic_id, "u1".into()).await.unwrap(),
    Some(VoteValue::Down)
  );
}

#[tokio::test]
async fn vote_on_unsubmitted_video_is_allowed() {
  let s = store().await;

  // VID_D was never POSTed; the ledger accepts it anyway.
  let receipt = s.submit_vote(ballot(VID_D, "rust", "u1", 1)).await.unwrap();
  assert_eq!(receipt.outcome, VoteOutcome::Created);

  let tallies = s.topic_tallies(vid(VID_D)).await.unwrap();
  assert_eq!(tallies.len(), 1);
  assert_eq!(tallies[0].total_votes, 1);
}

#[tokio::test]
async fn ballot_against_unknown_topic_id_rolls_back() {
  let s = store().await;

  let result = s
    .submit_vote(Ballot {
      video_id: vid(VID_A),
      topic:    TopicSelector::Id(9999),
      user_id:  "u1".into(),
      username: None,
      desired:  DesiredVote::Up,
    })
    .await;
  assert!(result.is_err());

  // The user upsert from the failed ballot must have rolled back too.
  assert!(s.get_user("u1".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn ballot_by_existing_topic_id() {
  let s = store().await;

  let topic_id = s
    .resolve_or_create_topic(TopicSelector::Name("rust".into()))
    .await
    .unwrap();

  let receipt = s
    .submit_vote(Ballot {
      video_id: vid(VID_A),
      topic:    TopicSelector::Id(topic_id),
      user_id:  "u1".into(),
      username: None,
      desired:  DesiredVote::Up,
    })
    .await
    .unwrap();
  assert_eq!(receipt.outcome, VoteOutcome::Created);
  assert_eq!(receipt.topic_id, topic_id);

  let tallies = s.topic_tallies(vid(VID_A)).await.unwrap();
  assert_eq!(tallies[0].topic_name, "rust");
}

#[tokio::test]
async fn username_recorded_and_preserved() {
  let s = store().await;

  let mut b = ballot(VID_A, "rust", "u1", 1);
  b.username = Some("alice".into());
  s.submit_vote(b).await.unwrap();

  let user = s.get_user("u1".into()).await.unwrap().unwrap();
  assert_eq!(user.username.as_deref(), Some("alice"));

  // A later ballot without a username leaves the stored one alone.
  s.submit_vote(ballot(VID_B, "rust", "u1", 1)).await.unwrap();
  let user = s.get_user("u1".into()).await.unwrap().unwrap();
  assert_eq!(user.username.as_deref(), Some("alice"));

  // A later ballot with a new username overwrites.
  let mut b = ballot(VID_C, "rust", "u1", 1);
  b.username = Some("alicia".into());
  s.submit_vote(b).await.unwrap();
  let user = s.get_user("u1".into()).await.unwrap().unwrap();
  assert_eq!(user.username.as_deref(), Some("alicia"));
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn tallies_sum_across_users() {
  let s = store().await;

  s.submit_vote(ballot(VID_A, "rust", "u1", 1)).await.unwrap();
  s.submit_vote(ballot(VID_A, "rust", "u2", 1)).await.unwrap();
  s.submit_vote(ballot(VID_A, "rust", "u3", -1)).await.unwrap();

  let tallies = s.topic_tallies(vid(VID_A)).await.unwrap();
  assert_eq!(tallies.len(), 1);
  assert_eq!(tallies[0].topic_name, "rust");
  assert_eq!(tallies[0].total_votes, 1);
}

#[tokio::test]
async fn tallies_order_by_total_then_topic_id() {
  let s = store().await;

  // "alpha" gets id 1, "beta" id 2, "gamma" id 3.
  s.submit_vote(ballot(VID_A, "alpha", "u1", 1)).await.unwrap();
  s.submit_vote(ballot(VID_A, "beta", "u1", 1)).await.unwrap();
  s.submit_vote(ballot(VID_A, "gamma", "u1", 1)).await.unwrap();
  s.submit_vote(ballot(VID_A, "gamma", "u2", 1)).await.unwrap();

  let tallies = s.topic_tallies(vid(VID_A)).await.unwrap();
  let names: Vec<_> = tallies.iter().map(|t| t.topic_name.as_str()).collect();

  // gamma leads on total; alpha and beta tie and fall back to id order.
  assert_eq!(names, ["gamma", "alpha", "beta"]);
}

#[tokio::test]
async fn tallies_empty_for_unvoted_video() {
  let s = store().await;
  add_video(&s, VID_A, None).await;
  assert!(s.topic_tallies(vid(VID_A)).await.unwrap().is_empty());
}

#[tokio::test]
async fn similar_videos_ranked_by_shared_topics() {
  let s = store().await;

  add_video(&s, VID_A, Some("subject")).await;
  add_video(&s, VID_B, Some("close")).await;
  add_video(&s, VID_C, Some("far")).await;

  s.submit_vote(ballot(VID_A, "rust", "u1", 1)).await.unwrap();
  s.submit_vote(ballot(VID_A, "async", "u1", 1)).await.unwrap();
  s.submit_vote(ballot(VID_B, "rust", "u1", 1)).await.unwrap();
  s.submit_vote(ballot(VID_B, "async", "u2", 1)).await.unwrap();
  s.submit_vote(ballot(VID_C, "rust", "u2", 1)).await.unwrap();

  let similar = s.similar_videos(vid(VID_A)).await.unwrap();
  assert_eq!(similar.len(), 2);

  assert_eq!(similar[0].video_id.as_str(), VID_B);
  assert_eq!(similar[0].shared_topics_count, 2);
  assert_eq!(similar[1].video_id.as_str(), VID_C);
  assert_eq!(similar[1].shared_topics_count, 1);

  // The subject never ranks against itself.
  assert!(similar.iter().all(|m| m.video_id.as_str() != VID_A));
}

#[tokio::test]
async fn similar_videos_ignores_votes_on_unrelated_topics() {
  let s = store().await;

  add_video(&s, VID_A, None).await;
  add_video(&s, VID_B, None).await;

  s.submit_vote(ballot(VID_A, "rust", "u1", 1)).await.unwrap();
  s.submit_vote(ballot(VID_B, "knitting", "u1", 1)).await.unwrap();

  assert!(s.similar_videos(vid(VID_A)).await.unwrap().is_empty());
}

#[tokio::test]
async fn user_stats_counts_standing_votes_only() {
  let s = store().await;

  s.submit_vote(ballot(VID_A, "rust", "u1", 1)).await.unwrap();
  s.submit_vote(ballot(VID_B, "rust", "u1", 1)).await.unwrap();
  s.submit_vote(ballot(VID_C, "go", "u1", 1)).await.unwrap();
  // Toggle one off; it must vanish from the counts.
  s.submit_vote(ballot(VID_C, "go", "u1", 1)).await.unwrap();

  let stats = s.user_stats("u1".into()).await.unwrap().unwrap();
  assert_eq!(stats.user_id, "u1");
  assert_eq!(stats.submissions_count, 2);
  assert!(stats.last_submission_date.is_some());

  let tag = stats.most_frequent_tag.unwrap();
  assert_eq!(tag.topic_name, "rust");
  assert_eq!(tag.topic_count, 2);
}

#[tokio::test]
async fn user_stats_most_frequent_tag_ties_break_by_name() {
  let s = store().await;

  s.submit_vote(ballot(VID_A, "zebra", "u1", 1)).await.unwrap();
  s.submit_vote(ballot(VID_A, "aard", "u1", 1)).await.unwrap();

  let stats = s.user_stats("u1".into()).await.unwrap().unwrap();
  let tag = stats.most_frequent_tag.unwrap();
  assert_eq!(tag.topic_name, "aard");
  assert_eq!(tag.topic_count, 1);
}

#[tokio::test]
async fn user_stats_missing_user_returns_none() {
  let s = store().await;
  assert!(s.user_stats("ghost".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn user_stats_with_no_votes() {
  let s = store().await;

  // Registration happens via a no-op ballot.
  s.submit_vote(ballot(VID_A, "rust", "u1", 0)).await.unwrap();

  let stats = s.user_stats("u1".into()).await.unwrap().unwrap();
  assert_eq!(stats.submissions_count, 0);
  assert!(stats.last_submission_date.is_none());
  assert!(stats.most_frequent_tag.is_none());
  assert_eq!(stats.reputation, 0);
}

#[tokio::test]
async fn contributions_rank_users_and_keep_zeroes() {
  let s = store().await;

  s.submit_vote(ballot(VID_A, "rust", "busy", 1)).await.unwrap();
  s.submit_vote(ballot(VID_B, "rust", "busy", 1)).await.unwrap();
  s.submit_vote(ballot(VID_A, "go", "casual", 1)).await.unwrap();
  // "idle" voted once and toggled it off again.
  s.submit_vote(ballot(VID_A, "rust", "idle", 1)).await.unwrap();
  s.submit_vote(ballot(VID_A, "rust", "idle", 1)).await.unwrap();

  let contributors = s.users_with_contributions().await.unwrap();
  assert_eq!(contributors.len(), 3);

  assert_eq!(contributors[0].id, "busy");
  assert_eq!(contributors[0].contributions_count, 2);
  assert_eq!(contributors[1].id, "casual");
  assert_eq!(contributors[1].contributions_count, 1);
  assert_eq!(contributors[2].id, "idle");
  assert_eq!(contributors[2].contributions_count, 0);
}

// ─── Embeddings ──────────────────────────────────────────────────────────────

fn axis_embedding(hot: usize) -> Vec<f32> {
  let mut v = vec![0.0f32; 384];
  v[hot] = 1.0;
  v
}

#[tokio::test]
async fn embedding_round_trips_through_blob() {
  let s = store().await;
  add_video(&s, VID_A, None).await;

  let embedding: Vec<f32> =
    (0..384).map(|i| (i as f32) * 0.25 - 40.0).collect();
  assert!(
    s.set_video_embedding(vid(VID_A), embedding.clone())
      .await
      .unwrap()
  );

  let stored = s.get_video_embedding(vid(VID_A)).await.unwrap().unwrap();
  assert_eq!(stored, embedding);
}

#[tokio::test]
async fn set_embedding_on_missing_video_returns_false() {
  let s = store().await;
  let updated = s
    .set_video_embedding(vid(VID_A), axis_embedding(0))
    .await
    .unwrap();
  assert!(!updated);
}

#[tokio::test]
async fn get_embedding_absent_returns_none() {
  let s = store().await;
  add_video(&s, VID_A, None).await;
  assert!(s.get_video_embedding(vid(VID_A)).await.unwrap().is_none());
}

#[tokio::test]
async fn ranking_without_subject_embedding_is_empty() {
  let s = store().await;

  add_video(&s, VID_A, None).await;
  add_video(&s, VID_B, None).await;
  s.set_video_embedding(vid(VID_B), axis_embedding(0))
    .await
    .unwrap();

  // VID_A has no embedding of its own, so there is nothing to rank against.
  assert!(s.rank_by_similarity(vid(VID_A), 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn ranking_orders_by_cosine_and_excludes_subject() {
  let s = store().await;

  add_video(&s, VID_A, Some("subject")).await;
  add_video(&s, VID_B, Some("twin")).await;
  add_video(&s, VID_C, Some("stranger")).await;
  add_video(&s, VID_D, Some("no embedding")).await;

  s.set_video_embedding(vid(VID_A), axis_embedding(0))
    .await
    .unwrap();
  s.set_video_embedding(vid(VID_B), axis_embedding(0))
    .await
    .unwrap();
  s.set_video_embedding(vid(VID_C), axis_embedding(1))
    .await
    .unwrap();

  let ranked = s.rank_by_similarity(vid(VID_A), 10).await.unwrap();

  // VID_D has no embedding and the subject is excluded.
  assert_eq!(ranked.len(), 2);
  assert_eq!(ranked[0].video.id.as_str(), VID_B);
  assert!((ranked[0].similarity - 1.0).abs() < 1e-6);
  assert_eq!(ranked[1].video.id.as_str(), VID_C);
  assert!(ranked[1].similarity.abs() < 1e-6);
}

#[tokio::test]
async fn ranking_honors_limit() {
  let s = store().await;

  for (i, id) in [VID_A, VID_B, VID_C, VID_D].iter().enumerate() {
    add_video(&s, id, None).await;
    s.set_video_embedding(vid(id), axis_embedding(i)).await.unwrap();
  }

  let ranked = s.rank_by_similarity(vid(VID_A), 1).await.unwrap();
  assert_eq!(ranked.len(), 1);
}
