// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::debug;

use crate::reconcile::Dialog;
use crate::tracking::{ChangeTracker, PendingWork, TrackerEvent};
use crate::{Author, Book, Customer, Publisher, ScreenKind, Store, StoreId};

pub const UNSAVED_PROMPT: &str = "There are unsaved changes, do you still want to proceed?";
pub const UNSAVED_TITLE: &str = "Proceed without saving?";

/// One tracker per editable screen.
#[derive(Debug, Default)]
pub struct Screens {
    pub books: ChangeTracker<Book>,
    pub authors: ChangeTracker<Author>,
    pub publishers: ChangeTracker<Publisher>,
    pub stores: ChangeTracker<Store>,
    pub customers: ChangeTracker<Customer>,
}

impl Screens {
    fn all(&self) -> [&dyn PendingWork; 5] {
        [
            &self.books,
            &self.authors,
            &self.publishers,
            &self.stores,
            &self.customers,
        ]
    }

    fn all_mut(&mut self) -> [&mut dyn PendingWork; 5] {
        [
            &mut self.books,
            &mut self.authors,
            &mut self.publishers,
            &mut self.stores,
            &mut self.customers,
        ]
    }

    pub fn has_changes(&self) -> bool {
        self.all().iter().any(|work| work.has_changes())
    }

    pub fn dirty_labels(&self) -> Vec<&'static str> {
        self.all()
            .iter()
            .filter(|work| work.has_changes())
            .map(|work| work.label())
            .collect()
    }

    pub fn discard_all(&mut self) -> Vec<TrackerEvent> {
        self.all_mut()
            .into_iter()
            .flat_map(|work| work.discard())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub active: ScreenKind,
    pub selected_store: Option<StoreId>,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            active: ScreenKind::Books,
            selected_store: None,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ScreenChanged(ScreenKind),
    StoreSelected(StoreId),
    ChangesDiscarded(Vec<&'static str>),
    SwitchRefused(ScreenKind),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    /// Moves to another screen. Unsaved work anywhere must be confirmed
    /// away first.
    pub fn switch_to<D>(
        &mut self,
        kind: ScreenKind,
        screens: &mut Screens,
        dialog: &mut D,
    ) -> Vec<AppEvent>
    where
        D: Dialog + ?Sized,
    {
        let mut events = match self.leave(screens, dialog) {
            Some(events) => events,
            None => {
                debug!(from = self.active.label(), to = kind.label(), "switch refused");
                return vec![
                    AppEvent::SwitchRefused(kind),
                    self.set_status("switch cancelled"),
                ];
            }
        };
        self.active = kind;
        events.push(AppEvent::ScreenChanged(kind));
        events.push(self.set_status(kind.label()));
        events
    }

    /// Points the books screen at another store, under the same guard as
    /// a screen switch.
    pub fn select_store<D>(
        &mut self,
        store: StoreId,
        screens: &mut Screens,
        dialog: &mut D,
    ) -> Vec<AppEvent>
    where
        D: Dialog + ?Sized,
    {
        if self.selected_store == Some(store) {
            return Vec::new();
        }
        let mut events = match self.leave(screens, dialog) {
            Some(events) => events,
            None => return vec![AppEvent::SwitchRefused(ScreenKind::Books)],
        };
        self.selected_store = Some(store);
        events.push(AppEvent::StoreSelected(store));
        events
    }

    /// Asks before abandoning unsaved work. `None` means the user declined
    /// and nothing was touched.
    pub fn leave<D>(&mut self, screens: &mut Screens, dialog: &mut D) -> Option<Vec<AppEvent>>
    where
        D: Dialog + ?Sized,
    {
        if !screens.has_changes() {
            return Some(Vec::new());
        }
        if !dialog.confirm(UNSAVED_PROMPT, UNSAVED_TITLE) {
            return None;
        }
        let labels = screens.dirty_labels();
        screens.discard_all();
        debug!(screens = ?labels, "unsaved changes discarded");
        Some(vec![AppEvent::ChangesDiscarded(labels)])
    }

    pub fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }

    pub fn clear_status(&mut self) -> AppEvent {
        self.status_line = None;
        AppEvent::StatusCleared
    }
}
