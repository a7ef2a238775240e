// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! In-memory working copy of one table and the bookkeeping that classifies
//! each row as new, modified or deleted relative to the last loaded snapshot.

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use thiserror::Error;
use tracing::debug;

use crate::validation::ValidationResult;

/// Primary key of a persisted record.
pub trait RecordKey: Clone + Eq + Hash + Debug + Display {
    /// True for the sentinel value carried by records that were never saved.
    fn is_unsaved(&self) -> bool;
}

/// Column selector for one record type.
pub trait FieldSpec: Copy + Eq + Debug + 'static {
    fn as_str(self) -> &'static str;
    fn parse(value: &str) -> Option<Self>;
}

/// Per-entity configuration plugged into [`ChangeTracker`].
pub trait Record: Clone + Debug {
    type Key: RecordKey;
    type Field: FieldSpec;
    /// Load filter, e.g. the store a book list belongs to.
    type Scope: Clone + Debug;

    const LABEL: &'static str;
    const PLURAL: &'static str;
    /// Every column shown to the user, in display order.
    const FIELDS: &'static [Self::Field];
    /// Columns whose edits count as changes. Everything else is display-only.
    const TRACKED: &'static [Self::Field];
    /// Column holding a user-entered key, if the key is editable at all.
    const KEY_FIELD: Option<Self::Field> = None;

    fn key(&self) -> &Self::Key;
    fn field_text(&self, field: Self::Field) -> String;
    fn set_text(&mut self, field: Self::Field, raw: &str) -> ValidationResult<()>;
    fn field_differs(&self, other: &Self, field: Self::Field) -> bool;
    fn copy_field(&mut self, source: &Self, field: Self::Field);
    fn validate(&self) -> anyhow::Result<()>;

    fn copy_tracked(&mut self, source: &Self) {
        for field in Self::TRACKED {
            self.copy_field(source, *field);
        }
    }

    fn is_tracked(field: Self::Field) -> bool {
        Self::TRACKED.contains(&field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(u64);

impl RowId {
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Row<R: Record> {
    id: RowId,
    origin: Option<R::Key>,
    record: R,
}

impl<R: Record> Row<R> {
    pub fn id(&self) -> RowId {
        self.id
    }

    /// Key the row was loaded with; `None` for rows added this session.
    pub fn origin(&self) -> Option<&R::Key> {
        self.origin.as_ref()
    }

    pub fn record(&self) -> &R {
        &self.record
    }

    pub fn is_new(&self) -> bool {
        self.origin.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Unchanged,
    New,
    Modified,
}

impl RowState {
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Unchanged => " ",
            Self::New => "+",
            Self::Modified => "*",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    Loaded { rows: usize },
    RowAdded(RowId),
    RowRemoved(RowId),
    InsertStaged(RowId),
    InsertUnstaged(RowId),
    DeleteStaged(String),
    DeleteUnstaged(String),
    UpdateStaged(RowId),
    UpdateUnstaged(RowId),
    FieldChanged { row: RowId, field: &'static str },
    DirtyChanged(bool),
    Discarded,
}

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("load failed: {0:#}")]
    Load(#[source] anyhow::Error),
    #[error("save failed: {0:#}")]
    Save(#[source] anyhow::Error),
    #[error("no row {0} on this screen -- run `list` to see row numbers")]
    UnknownRow(RowId),
    #[error("{field} identifies a saved record and cannot be changed -- delete and re-add instead")]
    KeyLocked { field: &'static str },
    #[error("{field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("nothing loaded yet -- open a screen first")]
    NotLoaded,
}

/// Anything holding unsaved edits. Lets the screen coordinator treat
/// trackers of different record types uniformly.
pub trait PendingWork {
    fn label(&self) -> &'static str;
    fn has_changes(&self) -> bool;
    fn discard(&mut self) -> Vec<TrackerEvent>;
}

#[derive(Debug, Clone)]
pub struct ChangeTracker<R: Record> {
    pub(crate) scope: Option<R::Scope>,
    rows: Vec<Row<R>>,
    baseline: Vec<R>,
    deleted: Vec<R>,
    updated: Vec<RowId>,
    next_row: u64,
}

impl<R: Record> Default for ChangeTracker<R> {
    fn default() -> Self {
        Self {
            scope: None,
            rows: Vec::new(),
            baseline: Vec::new(),
            deleted: Vec::new(),
            updated: Vec::new(),
            next_row: 1,
        }
    }
}

impl<R: Record> ChangeTracker<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(&self) -> Option<&R::Scope> {
        self.scope.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.scope.is_some()
    }

    pub fn rows(&self) -> &[Row<R>] {
        &self.rows
    }

    pub fn row(&self, id: RowId) -> Option<&Row<R>> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn baseline(&self) -> &[R] {
        &self.baseline
    }

    pub fn has_changes(&self) -> bool {
        !self.deleted.is_empty()
            || !self.updated.is_empty()
            || self.rows.iter().any(Row::is_new)
    }

    pub fn pending_inserts(&self) -> impl Iterator<Item = &Row<R>> {
        self.rows.iter().filter(|row| row.is_new())
    }

    pub fn pending_deletes(&self) -> &[R] {
        &self.deleted
    }

    pub fn pending_updates(&self) -> impl Iterator<Item = &Row<R>> {
        self.rows.iter().filter(|row| self.updated.contains(&row.id))
    }

    pub fn row_state(&self, id: RowId) -> Option<RowState> {
        let row = self.row(id)?;
        if row.is_new() {
            return Some(RowState::New);
        }
        if self.updated.contains(&id) {
            return Some(RowState::Modified);
        }
        Some(RowState::Unchanged)
    }

    /// Stages `record` as a new row. A record whose key is pending deletion
    /// takes that deletion back instead.
    pub fn add(&mut self, record: R) -> (RowId, Vec<TrackerEvent>) {
        let was_dirty = self.has_changes();
        let id = self.next_row_id();
        let mut events = vec![TrackerEvent::RowAdded(id)];

        let origin = match self.unstage_delete(record.key()) {
            Some(key) => {
                events.push(TrackerEvent::DeleteUnstaged(key.to_string()));
                Some(key)
            }
            None => {
                events.push(TrackerEvent::InsertStaged(id));
                None
            }
        };
        debug!(record = R::LABEL, row = %id, restored = origin.is_some(), "row added");
        self.rows.push(Row { id, origin, record });
        events.extend(self.reclassify(was_dirty));
        (id, events)
    }

    /// Removes a row. New rows vanish without trace; persisted rows are
    /// staged for deletion.
    pub fn remove(&mut self, id: RowId) -> Result<(R, Vec<TrackerEvent>), TrackingError> {
        let was_dirty = self.has_changes();
        let position = self.position(id)?;
        let row = self.rows.remove(position);
        let mut events = vec![TrackerEvent::RowRemoved(id)];
        match row.origin {
            None => events.push(TrackerEvent::InsertUnstaged(id)),
            Some(key) => {
                events.push(TrackerEvent::DeleteStaged(key.to_string()));
                self.deleted.push(row.record.clone());
            }
        }
        debug!(record = R::LABEL, row = %id, "row removed");
        events.extend(self.reclassify(was_dirty));
        Ok((row.record, events))
    }

    /// Applies `mutate` to one row and reclassifies the working set. A new
    /// row that takes the key of a pending deletion becomes that persisted
    /// row again.
    pub fn edit<F>(
        &mut self,
        id: RowId,
        field: R::Field,
        mutate: F,
    ) -> Result<Vec<TrackerEvent>, TrackingError>
    where
        F: FnOnce(&mut R),
    {
        let was_dirty = self.has_changes();
        let position = self.editable_position(id, field)?;
        let before = self.rows[position].record.clone();
        mutate(&mut self.rows[position].record);

        let row = &mut self.rows[position];
        if let Some(origin) = row.origin.as_ref()
            && row.record.key() != origin
        {
            row.record = before;
            return Err(TrackingError::KeyLocked {
                field: R::KEY_FIELD.map_or(field.as_str(), |key| key.as_str()),
            });
        }

        let mut events = vec![TrackerEvent::FieldChanged {
            row: id,
            field: field.as_str(),
        }];
        if self.rows[position].origin.is_none() {
            let key = self.rows[position].record.key().clone();
            if let Some(key) = self.unstage_delete(&key) {
                debug!(record = R::LABEL, row = %id, %key, "new row took a deleted key, restored");
                events.push(TrackerEvent::InsertUnstaged(id));
                events.push(TrackerEvent::DeleteUnstaged(key.to_string()));
                self.rows[position].origin = Some(key);
            }
        }
        // Untracked fields can still be changed through the closure.
        events.extend(self.reclassify(was_dirty));
        Ok(events)
    }

    /// Textual edit. A parse failure leaves the row untouched.
    pub fn set_field(
        &mut self,
        id: RowId,
        field: R::Field,
        raw: &str,
    ) -> Result<Vec<TrackerEvent>, TrackingError> {
        let position = self.editable_position(id, field)?;
        let mut draft = self.rows[position].record.clone();
        draft
            .set_text(field, raw)
            .map_err(|reason| TrackingError::InvalidField {
                field: field.as_str(),
                reason: reason.to_string(),
            })?;
        self.edit(id, field, move |record| *record = draft)
    }

    /// Problems that block a save, one line each. Only rows that would be
    /// written are checked.
    pub fn validation_problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for row in self.pending_inserts().chain(self.pending_updates()) {
            if let Err(error) = row.record.validate() {
                problems.push(format!("row {}: {error:#}", row.id));
            }
        }

        let mut seen: HashMap<&R::Key, RowId> = HashMap::new();
        for row in &self.rows {
            let key = row.record.key();
            if key.is_unsaved() {
                continue;
            }
            if let Some(first) = seen.insert(key, row.id) {
                problems.push(format!(
                    "rows {first} and {}: duplicate {} {key} -- change one of them and retry",
                    row.id,
                    R::LABEL
                ));
            }
        }
        problems
    }

    pub fn can_save(&self) -> bool {
        self.has_changes() && self.validation_problems().is_empty()
    }

    /// Drops the working copy and all pending work.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.baseline.clear();
        self.deleted.clear();
        self.updated.clear();
    }

    /// Replaces working and baseline sets wholesale.
    pub(crate) fn install(&mut self, records: Vec<R>) -> Vec<TrackerEvent> {
        let was_dirty = self.has_changes();
        self.clear();
        let mut rows = Vec::with_capacity(records.len());
        for record in &records {
            let id = self.next_row_id();
            rows.push(Row {
                id,
                origin: Some(record.key().clone()),
                record: record.clone(),
            });
        }
        self.rows = rows;
        self.baseline = records;
        let mut events = vec![TrackerEvent::Loaded {
            rows: self.rows.len(),
        }];
        if was_dirty {
            events.push(TrackerEvent::DirtyChanged(false));
        }
        events
    }

    pub(crate) fn deleted(&self) -> &[R] {
        &self.deleted
    }

    pub(crate) fn updated(&self) -> &[RowId] {
        &self.updated
    }

    fn reset_to_baseline(&mut self) -> Vec<TrackerEvent> {
        let baseline = std::mem::take(&mut self.baseline);
        let mut events = self.install(baseline);
        events.insert(0, TrackerEvent::Discarded);
        events
    }

    fn reclassify(&mut self, was_dirty: bool) -> Vec<TrackerEvent> {
        let next = classify(&self.rows, &self.baseline);
        let mut events = Vec::new();
        for id in self.updated.iter().filter(|id| !next.contains(id)) {
            if self.rows.iter().any(|row| row.id == *id) {
                events.push(TrackerEvent::UpdateUnstaged(*id));
            }
        }
        for id in next.iter().filter(|id| !self.updated.contains(id)) {
            events.push(TrackerEvent::UpdateStaged(*id));
        }
        self.updated = next;

        let dirty = self.has_changes();
        if dirty != was_dirty {
            events.push(TrackerEvent::DirtyChanged(dirty));
        }
        events
    }

    fn position(&self, id: RowId) -> Result<usize, TrackingError> {
        self.rows
            .iter()
            .position(|row| row.id == id)
            .ok_or(TrackingError::UnknownRow(id))
    }

    /// Takes the record staged for deletion under `key` back out of the
    /// delete bucket, returning its key.
    fn unstage_delete(&mut self, key: &R::Key) -> Option<R::Key> {
        if key.is_unsaved() {
            return None;
        }
        let position = self.deleted.iter().position(|pending| pending.key() == key)?;
        Some(self.deleted.remove(position).key().clone())
    }

    fn editable_position(&self, id: RowId, field: R::Field) -> Result<usize, TrackingError> {
        let position = self.position(id)?;
        if R::KEY_FIELD == Some(field) && self.rows[position].origin.is_some() {
            return Err(TrackingError::KeyLocked {
                field: field.as_str(),
            });
        }
        Ok(position)
    }

    fn next_row_id(&mut self) -> RowId {
        let id = RowId(self.next_row);
        self.next_row += 1;
        id
    }
}

impl<R: Record> PendingWork for ChangeTracker<R> {
    fn label(&self) -> &'static str {
        R::PLURAL
    }

    fn has_changes(&self) -> bool {
        ChangeTracker::has_changes(self)
    }

    fn discard(&mut self) -> Vec<TrackerEvent> {
        if !ChangeTracker::has_changes(self) {
            return Vec::new();
        }
        debug!(record = R::LABEL, "pending changes discarded");
        self.reset_to_baseline()
    }
}

/// Persisted rows whose tracked fields differ from their baseline
/// counterpart. Every row is visited.
fn classify<R: Record>(rows: &[Row<R>], baseline: &[R]) -> Vec<RowId> {
    let by_key: HashMap<&R::Key, &R> = baseline.iter().map(|record| (record.key(), record)).collect();
    let mut changed = Vec::new();
    for row in rows {
        let Some(origin) = row.origin.as_ref() else {
            continue;
        };
        let Some(base) = by_key.get(origin) else {
            continue;
        };
        if R::TRACKED
            .iter()
            .any(|field| row.record.field_differs(base, *field))
        {
            changed.push(row.id);
        }
    }
    changed
}
