// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Loading, saving and cancelling a [`ChangeTracker`] against storage.

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::tracking::{ChangeTracker, PendingWork, Record, TrackerEvent, TrackingError};

pub const ERROR_TITLE: &str = "ERROR";
pub const INFO_TITLE: &str = "Information";
pub const SAVED_MESSAGE: &str = "Successfully saved changes.";
pub const CANCELLED_MESSAGE: &str = "Successfully cancelled all changes.";
pub const NOTHING_SAVED_MESSAGE: &str = "Deletion declined. No changes were saved.";

/// Modal question/answer surface supplied by the front end.
pub trait Dialog {
    fn confirm(&mut self, message: &str, title: &str) -> bool;
    fn notify(&mut self, message: &str, title: &str);
}

/// Storage gateway for one record type.
pub trait Storage<R: Record> {
    type Session<'a>: StorageSession<R>
    where
        Self: 'a;

    fn load_all(&self, scope: &R::Scope) -> Result<Vec<R>>;

    /// Opens a unit of work. Dropping it without `commit` discards every
    /// write made through it.
    fn session(&mut self) -> Result<Self::Session<'_>>;
}

pub trait StorageSession<R: Record> {
    /// Writes a new row and returns the key it was stored under.
    fn insert(&mut self, scope: &R::Scope, record: &R) -> Result<R::Key>;
    /// Removes a row after everything that references it.
    fn delete(&mut self, scope: &R::Scope, key: &R::Key) -> Result<()>;
    fn find(&mut self, scope: &R::Scope, key: &R::Key) -> Result<Option<R>>;
    fn update(&mut self, scope: &R::Scope, record: &R) -> Result<()>;
    fn commit(self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Deletions the user declined to confirm. They reappear after reload.
    pub deletions_skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    NothingToSave,
    Blocked(Vec<String>),
    /// Only deletions were pending and the user declined them. Nothing was
    /// written and the removed rows are back in the working set.
    Declined { deletions: usize },
    Saved(SaveReport),
}

pub fn delete_prompt(count: usize, label: &str) -> String {
    format!(
        "You are about to delete {count} {label}(s) and all of their related records. Continue?"
    )
}

impl<R: Record> ChangeTracker<R> {
    /// Replaces working and baseline sets with the rows in `scope`. On
    /// failure the previous contents stay in place.
    pub fn load<S, D>(
        &mut self,
        storage: &S,
        dialog: &mut D,
        scope: R::Scope,
    ) -> Result<Vec<TrackerEvent>, TrackingError>
    where
        S: Storage<R> + ?Sized,
        D: Dialog + ?Sized,
    {
        match storage.load_all(&scope) {
            Ok(records) => {
                debug!(record = R::LABEL, rows = records.len(), ?scope, "loaded");
                self.scope = Some(scope);
                Ok(self.install(records))
            }
            Err(error) => {
                warn!(record = R::LABEL, ?scope, error = %format!("{error:#}"), "load failed");
                dialog.notify(
                    &format!("Error when loading {} details.", R::PLURAL),
                    ERROR_TITLE,
                );
                Err(TrackingError::Load(error))
            }
        }
    }

    /// Writes every pending insert, update and delete in one unit of work,
    /// then reloads.
    pub fn save<S, D>(
        &mut self,
        storage: &mut S,
        dialog: &mut D,
    ) -> Result<SaveOutcome, TrackingError>
    where
        S: Storage<R> + ?Sized,
        D: Dialog + ?Sized,
    {
        let Some(scope) = self.scope.clone() else {
            return Err(TrackingError::NotLoaded);
        };
        if !self.has_changes() {
            return Ok(SaveOutcome::NothingToSave);
        }

        let problems = self.validation_problems();
        if !problems.is_empty() {
            debug!(record = R::LABEL, problems = problems.len(), "save blocked");
            dialog.notify(&problems.join("\n"), ERROR_TITLE);
            return Ok(SaveOutcome::Blocked(problems));
        }

        let apply_deletes = !self.deleted().is_empty()
            && dialog.confirm(
                &delete_prompt(self.deleted().len(), R::LABEL),
                "Confirm deletion",
            );

        if !apply_deletes
            && self.pending_inserts().next().is_none()
            && self.updated().is_empty()
        {
            let deletions = self.deleted().len();
            debug!(record = R::LABEL, deletions, "deletion declined, nothing to write");
            self.discard();
            dialog.notify(NOTHING_SAVED_MESSAGE, INFO_TITLE);
            return Ok(SaveOutcome::Declined { deletions });
        }

        let report = match self.write(storage, &scope, apply_deletes) {
            Ok(report) => report,
            Err(error) => {
                warn!(record = R::LABEL, error = %format!("{error:#}"), "save rolled back");
                dialog.notify(
                    &format!("Error when saving {} changes: {error:#}", R::PLURAL),
                    ERROR_TITLE,
                );
                return Err(TrackingError::Save(error));
            }
        };
        info!(
            record = R::LABEL,
            inserted = report.inserted,
            updated = report.updated,
            deleted = report.deleted,
            skipped = report.deletions_skipped,
            "changes saved"
        );

        match storage.load_all(&scope) {
            Ok(records) => {
                self.install(records);
            }
            Err(error) => {
                warn!(record = R::LABEL, error = %format!("{error:#}"), "reload after save failed");
                self.clear();
                dialog.notify(
                    &format!(
                        "Changes were saved but {} could not be reloaded. Reopen the screen.",
                        R::PLURAL
                    ),
                    ERROR_TITLE,
                );
                return Err(TrackingError::Load(error));
            }
        }
        dialog.notify(SAVED_MESSAGE, INFO_TITLE);
        Ok(SaveOutcome::Saved(report))
    }

    /// Throws away pending work and reloads. Returns `false` when there was
    /// nothing to cancel.
    pub fn cancel<S, D>(&mut self, storage: &S, dialog: &mut D) -> Result<bool, TrackingError>
    where
        S: Storage<R> + ?Sized,
        D: Dialog + ?Sized,
    {
        let Some(scope) = self.scope.clone() else {
            return Err(TrackingError::NotLoaded);
        };
        if !self.has_changes() {
            return Ok(false);
        }

        match storage.load_all(&scope) {
            Ok(records) => {
                self.install(records);
                dialog.notify(CANCELLED_MESSAGE, INFO_TITLE);
            }
            Err(error) => {
                warn!(record = R::LABEL, error = %format!("{error:#}"), "reload after cancel failed");
                self.discard();
                dialog.notify(
                    &format!(
                        "Error when loading {} details after cancelling changes.",
                        R::PLURAL
                    ),
                    ERROR_TITLE,
                );
            }
        }
        debug!(record = R::LABEL, "changes cancelled");
        Ok(true)
    }

    fn write<S>(&self, storage: &mut S, scope: &R::Scope, apply_deletes: bool) -> Result<SaveReport>
    where
        S: Storage<R> + ?Sized,
    {
        let mut session = storage.session().context("open save session")?;
        let mut report = SaveReport::default();

        if apply_deletes {
            for record in self.deleted() {
                session
                    .delete(scope, record.key())
                    .with_context(|| format!("delete {} {}", R::LABEL, record.key()))?;
                report.deleted += 1;
            }
        } else {
            report.deletions_skipped = self.deleted().len();
        }

        for row in self.pending_inserts() {
            let key = session
                .insert(scope, row.record())
                .with_context(|| format!("insert {} from row {}", R::LABEL, row.id()))?;
            debug!(record = R::LABEL, row = %row.id(), %key, "inserted");
            report.inserted += 1;
        }

        for id in self.updated() {
            let Some(row) = self.row(*id) else {
                continue;
            };
            let Some(key) = row.origin() else {
                continue;
            };
            let Some(mut persisted) = session
                .find(scope, key)
                .with_context(|| format!("find {} {key}", R::LABEL))?
            else {
                bail!(
                    "{} {key} no longer exists -- cancel to reload and retry",
                    R::LABEL
                );
            };
            persisted.copy_tracked(row.record());
            session
                .update(scope, &persisted)
                .with_context(|| format!("update {} {key}", R::LABEL))?;
            report.updated += 1;
        }

        session.commit().context("commit changes")?;
        Ok(report)
    }
}
