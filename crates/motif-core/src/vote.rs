//! The vote state machine.
//!
//! For each (video, topic, user) triple the ledger holds at most one row,
//! and that row is always +1 or -1. A cleared vote is an absent row, never a
//! stored zero. Every ballot is interpreted against the standing row by
//! [`transition`], which is pure; the store applies the resulting action
//! inside a single transaction.

// ─── Values ──────────────────────────────────────────────────────────────────

/// A stored vote polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteValue {
  Up,
  Down,
}

impl VoteValue {
  /// The integer stored in the ledger: `1` or `-1`.
  pub fn as_i64(self) -> i64 {
    match self {
      Self::Up => 1,
      Self::Down => -1,
    }
  }

  /// Decode a stored ledger value. Zero and out-of-range values violate the
  /// table's CHECK constraint and decode to `None`.
  pub fn from_i64(raw: i64) -> Option<Self> {
    match raw {
      1 => Some(Self::Up),
      -1 => Some(Self::Down),
      _ => None,
    }
  }
}

/// What a caller wants their vote on a (video, topic) pair to become.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesiredVote {
  Up,
  Down,
  /// Clear any standing vote.
  Clear,
}

impl DesiredVote {
  /// Interpret a raw wire integer, clamping anything outside `[-1, 1]`.
  pub fn from_clamped(raw: i64) -> Self {
    match raw.clamp(-1, 1) {
      1 => Self::Up,
      -1 => Self::Down,
      _ => Self::Clear,
    }
  }
}

// ─── Transition ──────────────────────────────────────────────────────────────

/// The ledger mutation a ballot requires, given the standing vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteAction {
  /// No standing row; insert one with this polarity.
  Insert(VoteValue),
  /// A standing row of the opposite polarity; overwrite it.
  Update(VoteValue),
  /// Remove the standing row.
  Delete,
  /// No standing row and nothing to record.
  Noop,
}

/// What a processed ballot did, as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
  Created,
  Updated,
  Removed,
}

impl VoteAction {
  /// The outcome reported to the caller. A no-op reports `Removed`: the
  /// terminal state is "no vote" either way.
  pub fn outcome(self) -> VoteOutcome {
    match self {
      Self::Insert(_) => VoteOutcome::Created,
      Self::Update(_) => VoteOutcome::Updated,
      Self::Delete | Self::Noop => VoteOutcome::Removed,
    }
  }
}

/// Decide how the ledger changes when a ballot arrives.
///
/// Repeating a standing vote toggles it off. Voting the opposite way
/// overwrites. A cleared desire deletes the standing row, or does nothing if
/// there is none.
pub fn transition(
  current: Option<VoteValue>,
  desired: DesiredVote,
) -> VoteAction {
  match (current, desired) {
    (None, DesiredVote::Up) => VoteAction::Insert(VoteValue::Up),
    (None, DesiredVote::Down) => VoteAction::Insert(VoteValue::Down),
    (None, DesiredVote::Clear) => VoteAction::Noop,

    (Some(_), DesiredVote::Clear) => VoteAction::Delete,
    (Some(VoteValue::Up), DesiredVote::Up) => VoteAction::Delete,
    (Some(VoteValue::Down), DesiredVote::Down) => VoteAction::Delete,

    (Some(VoteValue::Up), DesiredVote::Down) => {
      VoteAction::Update(VoteValue::Down)
    }
    (Some(VoteValue::Down), DesiredVote::Up) => {
      VoteAction::Update(VoteValue::Up)
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
