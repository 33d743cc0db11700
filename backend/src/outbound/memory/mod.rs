//! In-process store implementing every repository port.
//!
//! All state lives behind one mutex, so each port call observes and mutates a
//! consistent snapshot. `apply_update` validates and plans before it writes,
//! which gives the same all-or-nothing outcome as a database transaction.
//! Deleting a user or segment cascades into memberships and history.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::ports::{
    AppliedMembershipUpdate, SegmentAssignmentRepository, SegmentAssignmentRepositoryError,
    SegmentPersistenceError, SegmentRepository, UserPersistenceError, UserRepository,
};
use crate::domain::{
    HistoryEvent, HistoryPeriod, HistoryRecord, Membership, MembershipPlan, MembershipUpdate,
    Segment, SegmentDescription, SegmentId, SegmentSlug, UnknownSegments, User, UserId, UserName,
};

const POISONED: &str = "in-memory store lock poisoned";

#[derive(Default)]
struct StoreState {
    last_user_id: i32,
    last_segment_id: i32,
    users: BTreeMap<UserId, User>,
    segments: BTreeMap<SegmentId, Segment>,
    memberships: BTreeMap<(UserId, SegmentId), Membership>,
    /// Append order doubles as the history sequence.
    history: Vec<HistoryEvent>,
}

impl StoreState {
    fn segment_by_slug(&self, slug: &SegmentSlug) -> Option<&Segment> {
        self.segments.values().find(|segment| &segment.slug == slug)
    }

    fn record(&mut self, event: HistoryEvent) -> bool {
        if self.history.contains(&event) {
            return false;
        }
        self.history.push(event);
        true
    }

    fn purge_user(&mut self, id: UserId) {
        self.memberships.retain(|(user_id, _), _| *user_id != id);
        self.history.retain(|event| event.user_id != id);
    }

    fn purge_segment(&mut self, id: SegmentId) {
        self.memberships.retain(|(_, segment_id), _| *segment_id != id);
        self.history.retain(|event| event.segment_id != id);
    }
}

/// Mutex-guarded store used by tests and database-less deployments.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Option<MutexGuard<'_, StoreState>> {
        self.state.lock().ok()
    }
}

fn next_id(counter: &mut i32) -> Option<i32> {
    *counter = counter.checked_add(1)?;
    Some(*counter)
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(
        &self,
        name: &UserName,
        created_at: DateTime<Utc>,
    ) -> Result<User, UserPersistenceError> {
        let mut state = self
            .lock()
            .ok_or_else(|| UserPersistenceError::query(POISONED))?;
        let id = next_id(&mut state.last_user_id)
            .and_then(|raw| UserId::new(raw).ok())
            .ok_or_else(|| UserPersistenceError::query("user id sequence exhausted"))?;
        let user = User {
            id,
            name: name.clone(),
            created_at,
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn rename(
        &self,
        id: UserId,
        name: &UserName,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut state = self
            .lock()
            .ok_or_else(|| UserPersistenceError::query(POISONED))?;
        Ok(state.users.get_mut(&id).map(|user| {
            user.name = name.clone();
            user.clone()
        }))
    }

    async fn delete(&self, id: UserId) -> Result<bool, UserPersistenceError> {
        let mut state = self
            .lock()
            .ok_or_else(|| UserPersistenceError::query(POISONED))?;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        state.purge_user(id);
        Ok(true)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        let state = self
            .lock()
            .ok_or_else(|| UserPersistenceError::query(POISONED))?;
        Ok(state.users.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let state = self
            .lock()
            .ok_or_else(|| UserPersistenceError::query(POISONED))?;
        Ok(state.users.values().cloned().collect())
    }
}

#[async_trait]
impl SegmentRepository for InMemoryStore {
    async fn create(
        &self,
        slug: &SegmentSlug,
        description: &SegmentDescription,
        created_at: DateTime<Utc>,
    ) -> Result<Segment, SegmentPersistenceError> {
        let mut state = self
            .lock()
            .ok_or_else(|| SegmentPersistenceError::query(POISONED))?;
        if state.segment_by_slug(slug).is_some() {
            return Err(SegmentPersistenceError::duplicate_slug(slug.as_str()));
        }
        let id = next_id(&mut state.last_segment_id)
            .and_then(|raw| SegmentId::new(raw).ok())
            .ok_or_else(|| SegmentPersistenceError::query("segment id sequence exhausted"))?;
        let segment = Segment {
            id,
            slug: slug.clone(),
            description: description.clone(),
            created_at,
        };
        state.segments.insert(id, segment.clone());
        Ok(segment)
    }

    async fn update_description(
        &self,
        slug: &SegmentSlug,
        description: &SegmentDescription,
    ) -> Result<Option<Segment>, SegmentPersistenceError> {
        let mut state = self
            .lock()
            .ok_or_else(|| SegmentPersistenceError::query(POISONED))?;
        Ok(state
            .segments
            .values_mut()
            .find(|segment| &segment.slug == slug)
            .map(|segment| {
                segment.description = description.clone();
                segment.clone()
            }))
    }

    async fn delete(&self, slug: &SegmentSlug) -> Result<bool, SegmentPersistenceError> {
        let mut state = self
            .lock()
            .ok_or_else(|| SegmentPersistenceError::query(POISONED))?;
        let Some(id) = state.segment_by_slug(slug).map(|segment| segment.id) else {
            return Ok(false);
        };
        state.segments.remove(&id);
        state.purge_segment(id);
        Ok(true)
    }

    async fn find_by_slug(
        &self,
        slug: &SegmentSlug,
    ) -> Result<Option<Segment>, SegmentPersistenceError> {
        let state = self
            .lock()
            .ok_or_else(|| SegmentPersistenceError::query(POISONED))?;
        Ok(state.segment_by_slug(slug).cloned())
    }

    async fn list(&self) -> Result<Vec<Segment>, SegmentPersistenceError> {
        let state = self
            .lock()
            .ok_or_else(|| SegmentPersistenceError::query(POISONED))?;
        let mut segments: Vec<Segment> = state.segments.values().cloned().collect();
        segments.sort_by(|left, right| left.slug.cmp(&right.slug));
        Ok(segments)
    }
}

#[async_trait]
impl SegmentAssignmentRepository for InMemoryStore {
    async fn apply_update(
        &self,
        update: &MembershipUpdate,
    ) -> Result<AppliedMembershipUpdate, SegmentAssignmentRepositoryError> {
        let mut state = self
            .lock()
            .ok_or_else(|| SegmentAssignmentRepositoryError::query(POISONED))?;

        let user_id = update.user_id;
        if !state.users.contains_key(&user_id) {
            return Err(SegmentAssignmentRepositoryError::unknown_user(user_id.get()));
        }

        let segment_ids: BTreeMap<SegmentSlug, SegmentId> = update
            .referenced_slugs()
            .into_iter()
            .filter_map(|slug| {
                let id = state.segment_by_slug(&slug)?.id;
                Some((slug, id))
            })
            .collect();
        let existing: Vec<Membership> = segment_ids
            .values()
            .filter_map(|segment_id| state.memberships.get(&(user_id, *segment_id)).cloned())
            .collect();

        let plan = MembershipPlan::build(update, &segment_ids, &existing).map_err(
            |UnknownSegments(slugs)| {
                SegmentAssignmentRepositoryError::unknown_segments(
                    slugs.into_iter().map(String::from).collect::<Vec<_>>(),
                )
            },
        )?;

        let mut applied = AppliedMembershipUpdate::default();
        for segment_id in plan.deletions {
            if let Some(row) = state.memberships.remove(&(user_id, segment_id)) {
                let event = HistoryEvent::removed(&row);
                if state.record(event.clone()) {
                    applied.recorded.push(event);
                }
                applied.removed.push(row);
            }
        }
        for upsert in plan.upserts {
            debug!(
                %user_id,
                segment_id = %upsert.segment_id,
                kind = ?upsert.kind,
                "upserting membership"
            );
            let row = Membership {
                user_id,
                segment_id: upsert.segment_id,
                expires_at: upsert.expires_at,
                created_at: upsert.created_at,
            };
            state
                .memberships
                .insert((user_id, upsert.segment_id), row.clone());
            let event = HistoryEvent::added(&row);
            if state.record(event.clone()) {
                applied.recorded.push(event);
            }
            applied.upserted.push(row);
        }

        debug!(
            %user_id,
            removed = applied.removed.len(),
            upserted = applied.upserted.len(),
            recorded = applied.recorded.len(),
            "in-memory membership update committed"
        );
        Ok(applied)
    }

    async fn active_segments(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<Vec<Segment>, SegmentAssignmentRepositoryError> {
        let state = self
            .lock()
            .ok_or_else(|| SegmentAssignmentRepositoryError::query(POISONED))?;
        let mut segments: Vec<Segment> = state
            .memberships
            .values()
            .filter(|row| row.user_id == user_id && row.is_active_at(at))
            .filter_map(|row| state.segments.get(&row.segment_id).cloned())
            .collect();
        segments.sort_by(|left, right| left.slug.cmp(&right.slug));
        Ok(segments)
    }

    async fn history_for_period(
        &self,
        user_id: UserId,
        period: HistoryPeriod,
    ) -> Result<Vec<HistoryRecord>, SegmentAssignmentRepositoryError> {
        let state = self
            .lock()
            .ok_or_else(|| SegmentAssignmentRepositoryError::query(POISONED))?;
        let Some(user) = state.users.get(&user_id) else {
            return Ok(Vec::new());
        };
        let mut records: Vec<HistoryRecord> = state
            .history
            .iter()
            .filter(|event| event.user_id == user_id && period.contains(event.created_at))
            .filter_map(|event| {
                let segment = state.segments.get(&event.segment_id)?;
                Some(HistoryRecord {
                    user_id,
                    user_name: user.name.clone(),
                    segment_slug: segment.slug.clone(),
                    segment_description: segment.description.as_str().to_owned(),
                    action: event.action,
                    created_at: event.created_at,
                })
            })
            .collect();
        // Stable sort keeps append order for equal timestamps.
        records.sort_by_key(|record| record.created_at);
        Ok(records)
    }
}
