use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::domain::{EffectiveStatus, Payment, PaymentStatus, TrustScore};

pub const BASE_SCORE: i64 = 70;
pub const COMPLETED_REWARD: i64 = 5;
pub const DEFERRED_PENALTY: i64 = 2;
pub const ABANDONED_PENALTY: i64 = 10;
pub const OUTSTANDING_PENALTY: i64 = 5;

/// Trust score from a client's payment outcome counts, clamped to `0..=100`.
///
/// Abandonment weighs twice an outstanding payment and five times a
/// completion. Arithmetic saturates, so arbitrarily large counts still land
/// on the bounds.
pub fn score(completed: usize, deferred: usize, abandoned: usize, outstanding: usize) -> u8 {
    let raw = BASE_SCORE
        .saturating_add(weighted(completed, COMPLETED_REWARD))
        .saturating_sub(weighted(deferred, DEFERRED_PENALTY))
        .saturating_sub(weighted(abandoned, ABANDONED_PENALTY))
        .saturating_sub(weighted(outstanding, OUTSTANDING_PENALTY));

    TrustScore::clamped(raw).value()
}

fn weighted(count: usize, points: i64) -> i64 {
    i64::try_from(count)
        .unwrap_or(i64::MAX)
        .saturating_mul(points)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    Base,
    Completed,
    Deferred,
    Abandoned,
    Outstanding,
}

/// Discrete contribution to a trust score, kept for audit displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub points: i64,
    pub notes: String,
}

/// Per-outcome payment counts for one client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PaymentTally {
    pub completed: usize,
    pub deferred: usize,
    pub abandoned: usize,
    pub outstanding: usize,
}

impl PaymentTally {
    /// Counts every payment. Stored `outstanding` payments and scheduled
    /// payments that are overdue at `now` both count as outstanding; payments
    /// still on schedule do not affect the score.
    pub fn from_payments<'a, I>(payments: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a Payment>,
    {
        Self::within(payments, now, None)
    }

    /// Same as [`PaymentTally::from_payments`], restricted to payments due on
    /// or after `since` when a lookback window is set.
    pub fn within<'a, I>(payments: I, now: DateTime<Utc>, since: Option<NaiveDate>) -> Self
    where
        I: IntoIterator<Item = &'a Payment>,
    {
        let mut tally = Self::default();

        for payment in payments {
            if since.is_some_and(|start| payment.due_date < start) {
                continue;
            }

            if payment.status == PaymentStatus::Outstanding {
                tally.outstanding += 1;
                continue;
            }

            match payment.effective_status(now) {
                EffectiveStatus::Completed => tally.completed += 1,
                EffectiveStatus::Deferred => tally.deferred += 1,
                EffectiveStatus::Abandoned => tally.abandoned += 1,
                EffectiveStatus::Overdue => tally.outstanding += 1,
                EffectiveStatus::Scheduled => {}
            }
        }

        tally
    }

    pub fn score(&self) -> TrustScore {
        TrustScore::clamped(i64::from(score(
            self.completed,
            self.deferred,
            self.abandoned,
            self.outstanding,
        )))
    }

    pub fn components(&self) -> Vec<ScoreComponent> {
        let mut components = vec![ScoreComponent {
            factor: ScoreFactor::Base,
            points: BASE_SCORE,
            notes: "baseline trust".to_string(),
        }];

        let counted = [
            (ScoreFactor::Completed, self.completed, COMPLETED_REWARD, "completed"),
            (ScoreFactor::Deferred, self.deferred, -DEFERRED_PENALTY, "deferred"),
            (ScoreFactor::Abandoned, self.abandoned, -ABANDONED_PENALTY, "abandoned"),
            (
                ScoreFactor::Outstanding,
                self.outstanding,
                -OUTSTANDING_PENALTY,
                "outstanding",
            ),
        ];

        for (factor, count, points, noun) in counted {
            if count == 0 {
                continue;
            }
            components.push(ScoreComponent {
                factor,
                points: weighted(count, points.abs()).saturating_mul(points.signum()),
                notes: format!(
                    "{count} {noun} payment{} at {points:+} each",
                    if count == 1 { "" } else { "s" }
                ),
            });
        }

        components
    }
}
