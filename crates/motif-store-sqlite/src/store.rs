//! [`SqliteStore`] — the SQLite implementation of [`TagStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use motif_core::{
  embedding::cosine_similarity,
  store::{
    Ballot, Contributor, FrequentTopic, SharedTopicMatch, SimilarityMatch,
    Submission, TagStore, TopicTally, UserStats, VoteReceipt,
  },
  topic::{Topic, TopicId, TopicSelector},
  user::User,
  video::{NewVideo, Video, VideoId},
  vote::{self, VoteAction, VoteValue},
};

use crate::{
  encode::{
    decode_dt, decode_embedding, encode_dt, encode_embedding, RawTopic,
    RawUser, RawVideo,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Motif tag store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted, and all
/// clones funnel their work through one dedicated database thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Resolve a topic name to its id, creating the row if needed.
///
/// The UNIQUE constraint on the name is the arbiter under concurrency: the
/// insert is `OR IGNORE`, and whoever loses re-reads the winner's row. Also
/// called from inside the vote transaction, where `conn` derefs from the
/// open [`rusqlite::Transaction`].
fn resolve_topic_id(
  conn: &rusqlite::Connection,
  name: &str,
  now_str: &str,
) -> rusqlite::Result<TopicId> {
  conn.execute(
    "INSERT OR IGNORE INTO topics (name, created_at) VALUES (?1, ?2)",
    rusqlite::params![name, now_str],
  )?;
  conn.query_row(
    "SELECT id FROM topics WHERE name = ?1",
    rusqlite::params![name],
    |row| row.get(0),
  )
}

// ─── TagStore impl ───────────────────────────────────────────────────────────

impl TagStore for SqliteStore {
  type Error = Error;

  // ── Videos ────────────────────────────────────────────────────────────────

  async fn add_video(&self, input: NewVideo) -> Result<Submission> {
    let id_str  = input.id.into_string();
    let title   = input.title;
    let now_str = encode_dt(Utc::now());

    let (raw, created) = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT OR IGNORE INTO videos (id, title, last_updated)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, title, now_str],
        )?;

        let raw = conn.query_row(
          "SELECT id, title, upload_date, last_updated
           FROM videos WHERE id = ?1",
          rusqlite::params![id_str],
          |row| {
            Ok(RawVideo {
              id:           row.get(0)?,
              title:        row.get(1)?,
              upload_date:  row.get(2)?,
              last_updated: row.get(3)?,
            })
          },
        )?;

        Ok((raw, inserted > 0))
      })
      .await?;

    let video = raw.into_video()?;
    Ok(if created {
      Submission::Created(video)
    } else {
      Submission::Existing(video)
    })
  }

  async fn get_video(&self, id: VideoId) -> Result<Option<Video>> {
    let id_str = id.into_string();

    let raw: Option<RawVideo> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, title, upload_date, last_updated
               FROM videos WHERE id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawVideo {
                  id:           row.get(0)?,
                  title:        row.get(1)?,
                  upload_date:  row.get(2)?,
                  last_updated: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVideo::into_video).transpose()
  }

  async fn set_video_embedding(
    &self,
    id: VideoId,
    embedding: Vec<f32>,
  ) -> Result<bool> {
    let id_str  = id.into_string();
    let blob    = encode_embedding(&embedding);
    let now_str = encode_dt(Utc::now());

    let updated = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE videos SET embedding = ?1, last_updated = ?2 WHERE id = ?3",
          rusqlite::params![blob, now_str, id_str],
        )?;
        Ok(n > 0)
      })
      .await?;

    Ok(updated)
  }

  async fn get_video_embedding(&self, id: VideoId) -> Result<Option<Vec<f32>>> {
    let id_str = id.into_string();

    let blob: Option<Vec<u8>> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT embedding FROM videos WHERE id = ?1",
              rusqlite::params![id_str],
              |row| row.get::<_, Option<Vec<u8>>>(0),
            )
            .optional()?
            .flatten(),
        )
      })
      .await?;

    Ok(blob.map(|b| decode_embedding(&b)))
  }

  // ── Topics ────────────────────────────────────────────────────────────────

  async fn get_topic_by_name(&self, name: String) -> Result<Option<Topic>> {
    let raw: Option<RawTopic> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, name, created_at FROM topics WHERE name = ?1",
              rusqlite::params![name],
              |row| {
                Ok(RawTopic {
                  id:         row.get(0)?,
                  name:       row.get(1)?,
                  created_at: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTopic::into_topic).transpose()
  }

  async fn resolve_or_create_topic(
    &self,
    selector: TopicSelector,
  ) -> Result<TopicId> {
    match selector {
      TopicSelector::Id(id) => Ok(id),
      TopicSelector::Name(name) => {
        let now_str = encode_dt(Utc::now());
        let id = self
          .conn
          .call(move |conn| Ok(resolve_topic_id(conn, &name, &now_str)?))
          .await?;
        Ok(id)
      }
    }
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  async fn get_vote(
    &self,
    video_id: VideoId,
    topic_id: TopicId,
    user_id: String,
  ) -> Result<Option<VoteValue>> {
    let video_str = video_id.into_string();

    let raw: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT vote FROM video_topics
               WHERE video_id = ?1 AND topic_id = ?2 AND user_id = ?3",
              rusqlite::params![video_str, topic_id, user_id],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|v| {
        VoteValue::from_i64(v)
          .ok_or_else(|| Error::Decode(format!("stored vote out of range: {v}")))
      })
      .transpose()
  }

  async fn submit_vote(&self, ballot: Ballot) -> Result<VoteReceipt> {
    let Ballot { video_id, topic, user_id, username, desired } = ballot;
    let video_str = video_id.into_string();
    let now_str   = encode_dt(Utc::now());

    let (action, topic_id) = self
      .conn
      .call(move |conn| {
        // Everything below happens in one transaction; the rusqlite
        // transaction rolls back on drop, so any error exits clean.
        let tx = conn.transaction()?;

        // User row first, so the vote row never references a missing user.
        // A caller-supplied username overwrites; absence leaves the stored
        // one alone.
        match &username {
          Some(name) => tx.execute(
            "INSERT INTO users (id, username, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET username = excluded.username",
            rusqlite::params![user_id, name, now_str],
          )?,
          None => tx.execute(
            "INSERT OR IGNORE INTO users (id, created_at) VALUES (?1, ?2)",
            rusqlite::params![user_id, now_str],
          )?,
        };

        let topic_id = match &topic {
          TopicSelector::Id(id) => *id,
          TopicSelector::Name(name) => resolve_topic_id(&tx, name, &now_str)?,
        };

        let current: Option<i64> = tx
          .query_row(
            "SELECT vote FROM video_topics
             WHERE video_id = ?1 AND topic_id = ?2 AND user_id = ?3",
            rusqlite::params![video_str, topic_id, user_id],
            |row| row.get(0),
          )
          .optional()?;
        let current = match current {
          Some(raw) => Some(
            VoteValue::from_i64(raw)
              .ok_or(rusqlite::Error::IntegralValueOutOfRange(0, raw))?,
          ),
          None => None,
        };

        let action = vote::transition(current, desired);
        match action {
          VoteAction::Insert(value) => {
            tx.execute(
              "INSERT INTO video_topics
                 (video_id, topic_id, user_id, vote, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5)",
              rusqlite::params![
                video_str,
                topic_id,
                user_id,
                value.as_i64(),
                now_str,
              ],
            )?;
          }
          VoteAction::Update(value) => {
            tx.execute(
              "UPDATE video_topics SET vote = ?1, created_at = ?2
               WHERE video_id = ?3 AND topic_id = ?4 AND user_id = ?5",
              rusqlite::params![
                value.as_i64(),
                now_str,
                video_str,
                topic_id,
                user_id,
              ],
            )?;
          }
          VoteAction::Delete => {
            tx.execute(
              "DELETE FROM video_topics
               WHERE video_id = ?1 AND topic_id = ?2 AND user_id = ?3",
              rusqlite::params![video_str, topic_id, user_id],
            )?;
          }
          VoteAction::Noop => {}
        }

        tx.commit()?;
        Ok((action, topic_id))
      })
      .await?;

    Ok(VoteReceipt { outcome: action.outcome(), topic_id })
  }

  // ── Aggregation ───────────────────────────────────────────────────────────

  async fn topic_tallies(&self, video_id: VideoId) -> Result<Vec<TopicTally>> {
    let video_str = video_id.into_string();

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT t.id, t.name, SUM(vt.vote) AS total_votes
           FROM video_topics vt
           JOIN topics t ON vt.topic_id = t.id
           WHERE vt.video_id = ?1
           GROUP BY t.id, t.name
           ORDER BY total_votes DESC, t.id ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![video_str], |row| {
            Ok(TopicTally {
              topic_id:    row.get(0)?,
              topic_name:  row.get(1)?,
              total_votes: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }

  async fn similar_videos(
    &self,
    video_id: VideoId,
  ) -> Result<Vec<SharedTopicMatch>> {
    let video_str = video_id.into_string();

    let raws: Vec<(String, Option<String>, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT vt2.video_id, v2.title,
                  COUNT(DISTINCT vt2.topic_id) AS shared_topics_count
           FROM video_topics vt1
           JOIN video_topics vt2 ON vt1.topic_id = vt2.topic_id
           JOIN videos v2 ON vt2.video_id = v2.id
           WHERE vt1.video_id = ?1 AND vt2.video_id != ?1
           GROUP BY vt2.video_id, v2.title
           ORDER BY shared_topics_count DESC, vt2.video_id ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![video_str], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(id, title, shared_topics_count)| {
        Ok(SharedTopicMatch {
          video_id: VideoId::parse(&id)?,
          title,
          shared_topics_count,
        })
      })
      .collect()
  }

  async fn get_user(&self, id: String) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, username, reputation, created_at
               FROM users WHERE id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(RawUser {
                  id:         row.get(0)?,
                  username:   row.get(1)?,
                  reputation: row.get(2)?,
                  created_at: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn user_stats(&self, id: String) -> Result<Option<UserStats>> {
    let fetched = self
      .conn
      .call(move |conn| {
        let user: Option<RawUser> = conn
          .query_row(
            "SELECT id, username, reputation, created_at
             FROM users WHERE id = ?1",
            rusqlite::params![id],
            |row| {
              Ok(RawUser {
                id:         row.get(0)?,
                username:   row.get(1)?,
                reputation: row.get(2)?,
                created_at: row.get(3)?,
              })
            },
          )
          .optional()?;

        let Some(user) = user else {
          return Ok(None);
        };

        let submissions_count: i64 = conn.query_row(
          "SELECT COUNT(*) FROM video_topics WHERE user_id = ?1",
          rusqlite::params![user.id],
          |row| row.get(0),
        )?;

        let last_submission: Option<String> = conn
          .query_row(
            "SELECT created_at FROM video_topics
             WHERE user_id = ?1
             ORDER BY created_at DESC
             LIMIT 1",
            rusqlite::params![user.id],
            |row| row.get(0),
          )
          .optional()?;

        let most_frequent_tag: Option<FrequentTopic> = conn
          .query_row(
            "SELECT t.name, COUNT(vt.topic_id) AS topic_count
             FROM video_topics vt
             JOIN topics t ON vt.topic_id = t.id
             WHERE vt.user_id = ?1
             GROUP BY t.name
             ORDER BY topic_count DESC, t.name ASC
             LIMIT 1",
            rusqlite::params![user.id],
            |row| {
              Ok(FrequentTopic {
                topic_name:  row.get(0)?,
                topic_count: row.get(1)?,
              })
            },
          )
          .optional()?;

        Ok(Some((user, submissions_count, last_submission, most_frequent_tag)))
      })
      .await?;

    let Some((user, submissions_count, last_submission, most_frequent_tag)) =
      fetched
    else {
      return Ok(None);
    };

    let last_submission_date =
      last_submission.as_deref().map(decode_dt).transpose()?;

    let user = user.into_user()?;
    Ok(Some(UserStats {
      user_id:    user.id,
      username:   user.username,
      reputation: user.reputation,
      created_at: user.created_at,
      submissions_count,
      last_submission_date,
      most_frequent_tag,
    }))
  }

  async fn users_with_contributions(&self) -> Result<Vec<Contributor>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT u.id, u.username, COUNT(vt.user_id) AS contributions_count
           FROM users u
           LEFT JOIN video_topics vt ON u.id = vt.user_id
           GROUP BY u.id, u.username
           ORDER BY contributions_count DESC, u.username ASC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Contributor {
              id:                  row.get(0)?,
              username:            row.get(1)?,
              contributions_count: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }

  // ── Vector similarity ─────────────────────────────────────────────────────

  async fn rank_by_similarity(
    &self,
    video_id: VideoId,
    limit: usize,
  ) -> Result<Vec<SimilarityMatch>> {
    let video_str = video_id.into_string();

    let fetched = self
      .conn
      .call(move |conn| {
        let target: Option<Vec<u8>> = conn
          .query_row(
            "SELECT embedding FROM videos WHERE id = ?1",
            rusqlite::params![video_str],
            |row| row.get::<_, Option<Vec<u8>>>(0),
          )
          .optional()?
          .flatten();

        // No stored embedding is a normal outcome: nothing to rank against.
        let Some(target) = target else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(
          "SELECT id, title, upload_date, last_updated, embedding
           FROM videos
           WHERE id != ?1 AND embedding IS NOT NULL",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![video_str], |row| {
            Ok((
              RawVideo {
                id:           row.get(0)?,
                title:        row.get(1)?,
                upload_date:  row.get(2)?,
                last_updated: row.get(3)?,
              },
              row.get::<_, Vec<u8>>(4)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some((target, rows)))
      })
      .await?;

    let Some((target_blob, rows)) = fetched else {
      return Ok(Vec::new());
    };
    let target = decode_embedding(&target_blob);

    let mut ranked = rows
      .into_iter()
      .map(|(raw, blob)| {
        let candidate = decode_embedding(&blob);
        Ok(SimilarityMatch {
          video:      raw.into_video()?,
          similarity: cosine_similarity(&target, &candidate),
        })
      })
      .collect::<Result<Vec<_>>>()?;

    ranked.sort_by(|a, b| {
      b.similarity
        .partial_cmp(&a.similarity)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| a.video.id.as_str().cmp(b.video.id.as_str()))
    });
    ranked.truncate(limit);

    Ok(ranked)
  }
}
