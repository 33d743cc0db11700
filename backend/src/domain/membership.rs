//! Segment membership: the (user, segment) link, its expiry policy, and the
//! reconciliation plan used by storage adapters to apply an update.
//!
//! A pair is ABSENT (no row), ACTIVE (`expires_at > now`) or EXPIRED (row
//! still stored, `expires_at <= now`). Expiry is derived at read time and
//! never written.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, TimeDelta, Utc};

use super::{SegmentId, SegmentSlug, UserId};

/// Default lifetime applied to additions that omit an expiration time.
pub const DEFAULT_MEMBERSHIP_TTL_YEARS: u32 = 100;

const DAYS_PER_YEAR: i64 = 365;

/// Policy deciding the expiry of additions without an explicit time.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use segments_backend::domain::ExpiryPolicy;
///
/// let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
/// let policy = ExpiryPolicy::from_years(1);
/// assert_eq!(
///     policy.resolve(None, now),
///     Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    default_ttl: TimeDelta,
}

impl ExpiryPolicy {
    /// Build a policy with an explicit default TTL.
    pub fn new(default_ttl: TimeDelta) -> Self {
        Self { default_ttl }
    }

    /// Build a policy whose TTL is `years` years of 365 days.
    pub fn from_years(years: u32) -> Self {
        let ttl = TimeDelta::try_days(i64::from(years) * DAYS_PER_YEAR).unwrap_or(TimeDelta::MAX);
        Self::new(ttl)
    }

    /// The TTL applied when an addition has no expiration time.
    pub fn default_ttl(&self) -> TimeDelta {
        self.default_ttl
    }

    /// Return `requested`, or `now + default TTL` when absent.
    ///
    /// Saturates at the largest representable timestamp.
    pub fn resolve(&self, requested: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
        requested.unwrap_or_else(|| {
            now.checked_add_signed(self.default_ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        })
    }
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::from_years(DEFAULT_MEMBERSHIP_TTL_YEARS)
    }
}

/// Derived state of a stored membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipState {
    /// The expiry lies strictly in the future.
    Active,
    /// The expiry has passed; the row remains until removed or re-added.
    Expired,
}

/// Stored (user, segment) link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub user_id: UserId,
    pub segment_id: SegmentId,
    pub expires_at: DateTime<Utc>,
    /// When the link was last established.
    pub created_at: DateTime<Utc>,
}

impl Membership {
    /// `true` when `expires_at` is strictly after `at`.
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.expires_at > at
    }

    /// Derive the membership state at `at`.
    pub fn state_at(&self, at: DateTime<Utc>) -> MembershipState {
        if self.is_active_at(at) {
            MembershipState::Active
        } else {
            MembershipState::Expired
        }
    }
}

/// Requested addition: a slug and an optional explicit expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentAddition {
    pub slug: SegmentSlug,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SegmentAddition {
    /// Addition that falls back to the default TTL.
    pub fn new(slug: SegmentSlug) -> Self {
        Self {
            slug,
            expires_at: None,
        }
    }

    /// Addition with an explicit expiry.
    pub fn expiring_at(slug: SegmentSlug, expires_at: DateTime<Utc>) -> Self {
        Self {
            slug,
            expires_at: Some(expires_at),
        }
    }
}

/// Caller-facing request to change one user's memberships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipUpdateRequest {
    pub user_id: UserId,
    pub additions: Vec<SegmentAddition>,
    pub removals: Vec<SegmentSlug>,
}

/// Addition with its expiry resolved by the [`ExpiryPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddition {
    pub slug: SegmentSlug,
    pub expires_at: DateTime<Utc>,
}

/// Normalised update handed to storage: duplicates collapsed, expiries
/// resolved, and a single `applied_at` instant for every write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipUpdate {
    pub user_id: UserId,
    pub removals: Vec<SegmentSlug>,
    pub additions: Vec<ResolvedAddition>,
    pub applied_at: DateTime<Utc>,
}

impl MembershipUpdate {
    /// Normalise `request` at `now`.
    ///
    /// Repeated removals collapse to the first occurrence. Repeated additions
    /// collapse to the last occurrence, keeping its position.
    pub fn resolve(
        request: MembershipUpdateRequest,
        policy: &ExpiryPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        let MembershipUpdateRequest {
            user_id,
            additions,
            removals,
        } = request;

        let mut seen = BTreeSet::new();
        let removals = removals
            .into_iter()
            .filter(|slug| seen.insert(slug.clone()))
            .collect();

        let mut seen = BTreeSet::new();
        let mut deduped: Vec<ResolvedAddition> = additions
            .into_iter()
            .rev()
            .filter(|addition| seen.insert(addition.slug.clone()))
            .map(|addition| ResolvedAddition {
                expires_at: policy.resolve(addition.expires_at, now),
                slug: addition.slug,
            })
            .collect();
        deduped.reverse();

        Self {
            user_id,
            removals,
            additions: deduped,
            applied_at: now,
        }
    }

    /// `true` when there is nothing to add or remove.
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.additions.is_empty()
    }

    /// Every slug the update references, sorted and without duplicates.
    pub fn referenced_slugs(&self) -> Vec<SegmentSlug> {
        self.removals
            .iter()
            .chain(self.additions.iter().map(|addition| &addition.slug))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// How a planned upsert relates to the stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertKind {
    /// No row existed (or it was removed earlier in the same update).
    Insert,
    /// An ACTIVE row gets a new expiry; `created_at` is kept.
    Refresh,
    /// An EXPIRED row is re-established; `created_at` moves to `applied_at`.
    Reactivate,
}

/// Row write planned for one addition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpsert {
    pub segment_id: SegmentId,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub kind: UpsertKind,
}

/// Slugs an update referenced that the catalogue does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown segment slugs: {}", join_slugs(.0))]
pub struct UnknownSegments(pub Vec<SegmentSlug>);

fn join_slugs(slugs: &[SegmentSlug]) -> String {
    slugs
        .iter()
        .map(SegmentSlug::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Writes needed to apply a [`MembershipUpdate`] to a storage snapshot.
///
/// Deletions are applied before upserts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipPlan {
    pub deletions: Vec<SegmentId>,
    pub upserts: Vec<PlannedUpsert>,
}

impl MembershipPlan {
    /// Plan `update` against `existing`, the user's stored rows for the
    /// referenced segments.
    ///
    /// # Errors
    /// Returns [`UnknownSegments`] listing every slug missing from
    /// `segment_ids`.
    pub fn build(
        update: &MembershipUpdate,
        segment_ids: &BTreeMap<SegmentSlug, SegmentId>,
        existing: &[Membership],
    ) -> Result<Self, UnknownSegments> {
        let missing: Vec<SegmentSlug> = update
            .referenced_slugs()
            .into_iter()
            .filter(|slug| !segment_ids.contains_key(slug))
            .collect();
        if !missing.is_empty() {
            return Err(UnknownSegments(missing));
        }

        let mut current: BTreeMap<SegmentId, &Membership> = existing
            .iter()
            .filter(|membership| membership.user_id == update.user_id)
            .map(|membership| (membership.segment_id, membership))
            .collect();

        let mut plan = Self::default();
        for slug in &update.removals {
            let Some(&segment_id) = segment_ids.get(slug) else {
                continue;
            };
            if current.remove(&segment_id).is_some() {
                plan.deletions.push(segment_id);
            }
        }

        for addition in &update.additions {
            let Some(&segment_id) = segment_ids.get(&addition.slug) else {
                continue;
            };
            let (kind, created_at) = match current
                .get(&segment_id)
                .map(|row| (row.state_at(update.applied_at), row.created_at))
            {
                None => (UpsertKind::Insert, update.applied_at),
                Some((MembershipState::Active, created_at)) => (UpsertKind::Refresh, created_at),
                Some((MembershipState::Expired, _)) => (UpsertKind::Reactivate, update.applied_at),
            };
            plan.upserts.push(PlannedUpsert {
                segment_id,
                expires_at: addition.expires_at,
                created_at,
                kind,
            });
        }

        Ok(plan)
    }
}
