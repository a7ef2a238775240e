// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use folio_app::validation::{format_date, format_ore};
use folio_app::{
    AppEvent, AppState, ChangeTracker, Dialog, FieldSpec, Record, RowId, RowState, SaveOutcome,
    ScreenKind, Screens, Storage, StoreId, TrackingError,
};
use folio_db::Database;
use std::io::{self, BufRead, Write};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open {
        screen: ScreenKind,
        store: Option<StoreId>,
    },
    List,
    Add,
    Set {
        row: u64,
        field: String,
        value: String,
    },
    Remove {
        row: u64,
    },
    Save,
    Cancel,
    Status,
    Fields,
    Help,
    Quit,
}

/// Parses one shell line. Blank lines and `#` comments yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (word, rest) = split_word(line);
    let command = match word {
        "open" | "o" => {
            let (screen, rest) = split_word(rest);
            if screen.is_empty() {
                bail!("open requires a screen; use one of: {}", screen_names());
            }
            let screen = ScreenKind::parse(screen).ok_or_else(|| {
                anyhow!("unknown screen {screen:?}; use one of: {}", screen_names())
            })?;
            let (store, rest) = split_word(rest);
            expect_end(word, rest)?;
            let store = if store.is_empty() {
                None
            } else {
                if screen != ScreenKind::Books {
                    bail!("only the books screen takes a store id");
                }
                Some(StoreId::new(parse_store_id(store)?))
            };
            Command::Open { screen, store }
        }
        "set" => {
            let (row, rest) = split_word(rest);
            let (field, value) = split_word(rest);
            if row.is_empty() || field.is_empty() {
                bail!("usage: set <row> <field> <value>");
            }
            Command::Set {
                row: parse_row(row)?,
                field: field.to_owned(),
                value: unquote(value.trim_end()).to_owned(),
            }
        }
        "rm" | "delete" => {
            let (row, rest) = split_word(rest);
            if row.is_empty() {
                bail!("usage: rm <row>");
            }
            expect_end(word, rest)?;
            Command::Remove {
                row: parse_row(row)?,
            }
        }
        "list" | "ls" => bare(word, rest, Command::List)?,
        "add" => bare(word, rest, Command::Add)?,
        "save" => bare(word, rest, Command::Save)?,
        "cancel" => bare(word, rest, Command::Cancel)?,
        "status" => bare(word, rest, Command::Status)?,
        "fields" => bare(word, rest, Command::Fields)?,
        "help" | "?" => bare(word, rest, Command::Help)?,
        "quit" | "exit" | "q" => bare(word, rest, Command::Quit)?,
        other => bail!("unknown command {other:?}; type `help` for the command list"),
    };
    Ok(Some(command))
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (input, ""),
    }
}

fn bare(word: &str, rest: &str, command: Command) -> Result<Command> {
    expect_end(word, rest)?;
    Ok(command)
}

fn expect_end(word: &str, rest: &str) -> Result<()> {
    if !rest.trim().is_empty() {
        bail!("unexpected arguments after `{word}`: {:?}", rest.trim());
    }
    Ok(())
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

fn parse_row(raw: &str) -> Result<u64> {
    raw.parse()
        .map_err(|_| anyhow!("row must be a number from `list`, got {raw:?}"))
}

fn parse_store_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| anyhow!("store id must be a positive number, got {raw:?}"))
}

fn screen_names() -> String {
    ScreenKind::ALL
        .iter()
        .map(|kind| kind.label())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Runs `$body` against the tracker behind the active screen.
macro_rules! with_tracker {
    ($self:ident, $tracker:ident => $body:expr) => {
        match $self.state.active {
            ScreenKind::Books => {
                let $tracker = &mut $self.screens.books;
                $body
            }
            ScreenKind::Authors => {
                let $tracker = &mut $self.screens.authors;
                $body
            }
            ScreenKind::Publishers => {
                let $tracker = &mut $self.screens.publishers;
                $body
            }
            ScreenKind::Stores => {
                let $tracker = &mut $self.screens.stores;
                $body
            }
            ScreenKind::Customers => {
                let $tracker = &mut $self.screens.customers;
                $body
            }
            ScreenKind::Orders => bail!("the orders screen is read-only"),
        }
    };
}

pub struct Shell<'a, D> {
    db: &'a mut Database,
    dialog: D,
    state: AppState,
    screens: Screens,
}

impl<'a, D: Dialog> Shell<'a, D> {
    pub fn new(db: &'a mut Database, dialog: D) -> Self {
        Self {
            db,
            dialog,
            state: AppState::default(),
            screens: Screens::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn screens(&self) -> &Screens {
        &self.screens
    }

    pub fn dialog(&self) -> &D {
        &self.dialog
    }

    /// Reads commands until `quit` or end of input.
    pub fn run<L, W>(&mut self, mut next_line: L, out: &mut W) -> Result<()>
    where
        L: FnMut() -> io::Result<Option<String>>,
        W: Write,
    {
        loop {
            write!(out, "{}> ", self.prompt())?;
            out.flush()?;
            let Some(line) = next_line()? else {
                writeln!(out)?;
                let dirty = self.screens.dirty_labels();
                if !dirty.is_empty() {
                    writeln!(out, "unsaved changes left in: {}", dirty.join(", "))?;
                }
                return Ok(());
            };

            let command = match parse_command(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(error) => {
                    writeln!(out, "{error:#}")?;
                    continue;
                }
            };
            match self.execute(command, out) {
                Ok(Flow::Quit) => return Ok(()),
                Ok(Flow::Continue) => {}
                Err(error) => writeln!(out, "error: {error:#}")?,
            }
        }
    }

    pub fn prompt(&self) -> String {
        let store = match (self.state.active, self.state.selected_store) {
            (ScreenKind::Books, Some(store)) => format!("[{store}]"),
            _ => String::new(),
        };
        let dirty = if self.screens.has_changes() { "*" } else { "" };
        format!("folio:{}{store}{dirty}", self.state.active.label())
    }

    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Flow> {
        match command {
            Command::Open { screen, store } => self.open(screen, store, out)?,
            Command::List => self.list(out)?,
            Command::Add => {
                let id = with_tracker!(self, tracker => add_row(tracker)?);
                writeln!(out, "added row {id}")?;
            }
            Command::Set { row, field, value } => {
                with_tracker!(self, tracker => set_row_field(tracker, row, &field, &value)?);
            }
            Command::Remove { row } => {
                with_tracker!(self, tracker => remove_row(tracker, row)?);
                writeln!(out, "row {row} marked for deletion; `save` to apply")?;
            }
            Command::Save => {
                let summary = with_tracker!(
                    self,
                    tracker => save_screen(tracker, &mut *self.db, &mut self.dialog)?
                );
                writeln!(out, "{summary}")?;
                self.state.set_status(&summary);
            }
            Command::Cancel => {
                let cancelled = with_tracker!(
                    self,
                    tracker => tracker.cancel(&*self.db, &mut self.dialog)?
                );
                let summary = if cancelled {
                    "changes cancelled"
                } else {
                    "nothing to cancel"
                };
                writeln!(out, "{summary}")?;
                self.state.set_status(summary);
            }
            Command::Status => self.status(out)?,
            Command::Fields => {
                with_tracker!(self, tracker => write_fields(&*tracker, out)?);
            }
            Command::Help => print_commands(out)?,
            Command::Quit => {
                if self.state.leave(&mut self.screens, &mut self.dialog).is_some() {
                    return Ok(Flow::Quit);
                }
                writeln!(out, "quit cancelled")?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Shows `screen`, reloading it when the screen or store changes or
    /// nothing is loaded yet.
    pub fn open<W: Write>(
        &mut self,
        screen: ScreenKind,
        store: Option<StoreId>,
        out: &mut W,
    ) -> Result<()> {
        let mut needs_load = false;

        if let Some(store) = store
            && self.state.selected_store != Some(store)
        {
            let events = self
                .state
                .select_store(store, &mut self.screens, &mut self.dialog);
            if refused(&events) {
                writeln!(out, "staying on {}", self.state.active.label())?;
                return Ok(());
            }
            needs_load = true;
        }

        if screen != self.state.active {
            let events = self
                .state
                .switch_to(screen, &mut self.screens, &mut self.dialog);
            if refused(&events) {
                writeln!(out, "staying on {}", self.state.active.label())?;
                return Ok(());
            }
            debug!(?events, "screen switched");
            needs_load = true;
        }

        if needs_load || !self.active_loaded() {
            self.load_active(out)?;
        }
        self.list(out)
    }

    fn active_loaded(&self) -> bool {
        match self.state.active {
            ScreenKind::Books => {
                self.screens.books.is_loaded()
                    && self.screens.books.scope() == self.state.selected_store.as_ref()
            }
            ScreenKind::Authors => self.screens.authors.is_loaded(),
            ScreenKind::Publishers => self.screens.publishers.is_loaded(),
            ScreenKind::Stores => self.screens.stores.is_loaded(),
            ScreenKind::Customers => self.screens.customers.is_loaded(),
            ScreenKind::Orders => true,
        }
    }

    fn load_active<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let db = &*self.db;
        let dialog = &mut self.dialog;
        match self.state.active {
            ScreenKind::Books => {
                let Some(store) = self.state.selected_store else {
                    writeln!(out, "choose a store first: open books <store-id>")?;
                    return Ok(());
                };
                load_screen(&mut self.screens.books, db, dialog, store);
            }
            ScreenKind::Authors => load_screen(&mut self.screens.authors, db, dialog, ()),
            ScreenKind::Publishers => load_screen(&mut self.screens.publishers, db, dialog, ()),
            ScreenKind::Stores => load_screen(&mut self.screens.stores, db, dialog, ()),
            ScreenKind::Customers => load_screen(&mut self.screens.customers, db, dialog, ()),
            ScreenKind::Orders => {}
        }
        Ok(())
    }

    fn list<W: Write>(&mut self, out: &mut W) -> Result<()> {
        match self.state.active {
            ScreenKind::Books => write_rows(&self.screens.books, out),
            ScreenKind::Authors => write_rows(&self.screens.authors, out),
            ScreenKind::Publishers => write_rows(&self.screens.publishers, out),
            ScreenKind::Stores => write_rows(&self.screens.stores, out),
            ScreenKind::Customers => write_rows(&self.screens.customers, out),
            ScreenKind::Orders => self.write_orders(out),
        }
    }

    fn write_orders<W: Write>(&self, out: &mut W) -> Result<()> {
        let orders = self.db.list_orders()?;
        writeln!(
            out,
            "{:>5}  {:<10}  {:<20}  {:<22}  {:>5}  {:>14}",
            "order", "date", "customer", "store", "items", "total"
        )?;
        for order in &orders {
            writeln!(
                out,
                "{:>5}  {:<10}  {:<20}  {:<22}  {:>5}  {:>14}",
                order.id.get(),
                format_date(Some(order.ordered_at)),
                order.customer_name,
                order.store_name,
                order.item_count,
                format_ore(order.total_ore),
            )?;
        }
        writeln!(out, "{} orders", orders.len())?;
        Ok(())
    }

    fn status<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "screen: {}", self.state.active.label())?;
        if let Some(store) = self.state.selected_store {
            writeln!(out, "store: {store}")?;
        }
        let dirty = self.screens.dirty_labels();
        if dirty.is_empty() {
            writeln!(out, "no unsaved changes")?;
        } else {
            writeln!(out, "unsaved changes in: {}", dirty.join(", "))?;
        }
        if let Some(status) = &self.state.status_line {
            writeln!(out, "last: {status}")?;
        }
        Ok(())
    }
}

fn refused(events: &[AppEvent]) -> bool {
    events
        .iter()
        .any(|event| matches!(event, AppEvent::SwitchRefused(_)))
}

fn load_screen<R, D>(
    tracker: &mut ChangeTracker<R>,
    db: &Database,
    dialog: &mut D,
    scope: R::Scope,
) where
    R: Record,
    Database: Storage<R>,
    D: Dialog,
{
    match tracker.load(db, dialog, scope) {
        Ok(events) => debug!(record = R::LABEL, ?events, "screen loaded"),
        Err(error) => warn!(record = R::LABEL, error = %error, "screen load failed"),
    }
}

fn write_rows<R: Record, W: Write>(tracker: &ChangeTracker<R>, out: &mut W) -> Result<()> {
    if !tracker.is_loaded() {
        writeln!(out, "no {} loaded", R::PLURAL)?;
        return Ok(());
    }

    let header = R::FIELDS
        .iter()
        .map(|field| field.as_str())
        .collect::<Vec<_>>()
        .join(" | ");
    writeln!(out, "  {:>5}  {header}", "row")?;
    for row in tracker.rows() {
        let marker = tracker
            .row_state(row.id())
            .map_or(" ", RowState::marker);
        let cells = R::FIELDS
            .iter()
            .map(|field| row.record().field_text(*field))
            .collect::<Vec<_>>()
            .join(" | ");
        writeln!(out, "{marker} {:>5}  {cells}", row.id().get())?;
    }

    let deletes = tracker.pending_deletes().len();
    if deletes > 0 {
        writeln!(out, "  ({deletes} pending deletion)")?;
    }
    writeln!(out, "{} {}", tracker.rows().len(), R::PLURAL)?;
    Ok(())
}

fn write_fields<R: Record, W: Write>(_tracker: &ChangeTracker<R>, out: &mut W) -> Result<()> {
    for field in R::FIELDS {
        let note = if R::KEY_FIELD == Some(*field) {
            " (key, fixed once saved)"
        } else if R::is_tracked(*field) {
            ""
        } else {
            " (read-only)"
        };
        writeln!(out, "  {}{note}", field.as_str())?;
    }
    Ok(())
}

fn find_row<R: Record>(tracker: &ChangeTracker<R>, row: u64) -> Result<RowId> {
    tracker
        .rows()
        .iter()
        .map(|candidate| candidate.id())
        .find(|id| id.get() == row)
        .ok_or_else(|| anyhow!("no row {row} on this screen; run `list` to see row numbers"))
}

fn add_row<R: Record + Default>(tracker: &mut ChangeTracker<R>) -> Result<RowId> {
    if !tracker.is_loaded() {
        bail!("no {} loaded; open the screen first", R::PLURAL);
    }
    let (id, events) = tracker.add(R::default());
    debug!(record = R::LABEL, ?events, "row added");
    Ok(id)
}

fn set_row_field<R: Record>(
    tracker: &mut ChangeTracker<R>,
    row: u64,
    field: &str,
    value: &str,
) -> Result<()> {
    let id = find_row(tracker, row)?;
    let field = <R::Field as FieldSpec>::parse(field).ok_or_else(|| {
        let known = R::FIELDS
            .iter()
            .map(|field| field.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        anyhow!("unknown {} field {field:?}; fields: {known}", R::LABEL)
    })?;
    let events = tracker.set_field(id, field, value)?;
    debug!(record = R::LABEL, ?events, "field set");
    Ok(())
}

fn remove_row<R: Record>(tracker: &mut ChangeTracker<R>, row: u64) -> Result<()> {
    let id = find_row(tracker, row)?;
    let (_, events) = tracker.remove(id)?;
    debug!(record = R::LABEL, ?events, "row removed");
    Ok(())
}

fn save_screen<R, D>(
    tracker: &mut ChangeTracker<R>,
    db: &mut Database,
    dialog: &mut D,
) -> Result<String>
where
    R: Record,
    Database: Storage<R>,
    D: Dialog,
{
    let summary = match tracker.save(db, dialog) {
        Ok(SaveOutcome::NothingToSave) => "nothing to save".to_owned(),
        Ok(SaveOutcome::Blocked(problems)) => {
            format!("save blocked by {} problem(s)", problems.len())
        }
        Ok(SaveOutcome::Declined { deletions }) => {
            format!("{deletions} deletion(s) declined, nothing saved")
        }
        Ok(SaveOutcome::Saved(report)) => {
            let mut summary = format!(
                "saved {}: {} inserted, {} updated, {} deleted",
                R::PLURAL,
                report.inserted,
                report.updated,
                report.deleted
            );
            if report.deletions_skipped > 0 {
                summary.push_str(&format!(", {} deletion(s) kept", report.deletions_skipped));
            }
            summary
        }
        Err(TrackingError::NotLoaded) => bail!("no {} loaded; open the screen first", R::PLURAL),
        Err(error) => {
            warn!(record = R::LABEL, error = %error, "save failed");
            format!("save of {} failed", R::PLURAL)
        }
    };
    Ok(summary)
}

fn print_commands<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "  open <screen> [store-id]  show a screen ({})", screen_names())?;
    writeln!(out, "  list                      list rows on the current screen")?;
    writeln!(out, "  add                       append an empty row")?;
    writeln!(out, "  set <row> <field> <value> edit one field")?;
    writeln!(out, "  rm <row>                  mark a row for deletion")?;
    writeln!(out, "  save                      write pending changes")?;
    writeln!(out, "  cancel                    drop pending changes and reload")?;
    writeln!(out, "  fields                    list editable fields")?;
    writeln!(out, "  status                    show screen and unsaved work")?;
    writeln!(out, "  quit                      leave the shell")?;
    Ok(())
}

/// Interprets a y/N answer. Anything but yes, including end of input,
/// declines.
pub fn read_answer<B: BufRead>(input: &mut B) -> bool {
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(0) | Err(_) => false,
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
    }
}

#[derive(Debug, Default)]
pub struct TerminalDialog;

impl Dialog for TerminalDialog {
    fn confirm(&mut self, message: &str, title: &str) -> bool {
        print!("{title}: {message} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        read_answer(&mut io::stdin().lock())
    }

    fn notify(&mut self, message: &str, title: &str) {
        println!("[{title}] {message}");
    }
}

pub fn stdin_line() -> io::Result<Option<String>> {
    let mut line = String::new();
    match io::stdin().read_line(&mut line)? {
        0 => Ok(None),
        _ => Ok(Some(line)),
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, Flow, Shell, parse_command, read_answer};
    use anyhow::{Context, Result};
    use folio_app::{SAVED_MESSAGE, ScreenKind, StoreId, UNSAVED_TITLE};
    use folio_db::Database;
    use folio_testkit::ScriptedDialog;
    use std::io::Cursor;

    fn demo_db() -> Result<Database> {
        let mut db = Database::open_memory()?;
        db.bootstrap()?;
        db.seed_demo_data()?;
        Ok(db)
    }

    fn run_script(shell: &mut Shell<'_, ScriptedDialog>, script: &[&str]) -> Result<String> {
        let mut lines = script.iter().map(|line| (*line).to_owned());
        let mut out = Vec::new();
        shell.run(|| Ok(lines.next()), &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn parse_command_reads_every_form() -> Result<()> {
        assert_eq!(
            parse_command("open books 2")?,
            Some(Command::Open {
                screen: ScreenKind::Books,
                store: Some(StoreId::new(2)),
            })
        );
        assert_eq!(
            parse_command("  o Authors ")?,
            Some(Command::Open {
                screen: ScreenKind::Authors,
                store: None,
            })
        );
        assert_eq!(
            parse_command("set 4 address Drottninggatan 52")?,
            Some(Command::Set {
                row: 4,
                field: "address".to_owned(),
                value: "Drottninggatan 52".to_owned(),
            })
        );
        assert_eq!(
            parse_command("set 4 died \"\"")?,
            Some(Command::Set {
                row: 4,
                field: "died".to_owned(),
                value: String::new(),
            })
        );
        assert_eq!(parse_command("rm 7")?, Some(Command::Remove { row: 7 }));
        assert_eq!(parse_command("q")?, Some(Command::Quit));
        assert_eq!(parse_command("# comment")?, None);
        assert_eq!(parse_command("   ")?, None);
        Ok(())
    }

    #[test]
    fn parse_command_rejects_bad_input() {
        let cases = [
            ("frobnicate", "unknown command"),
            ("open", "requires a screen"),
            ("open invoices", "unknown screen"),
            ("open authors 2", "only the books screen"),
            ("open books 0", "positive number"),
            ("set 1", "usage: set"),
            ("rm x", "row must be a number"),
            ("save now", "unexpected arguments"),
        ];
        for (line, expected) in cases {
            let error = parse_command(line).expect_err(line);
            assert!(
                error.to_string().contains(expected),
                "{line:?} gave {error}"
            );
        }
    }

    #[test]
    fn read_answer_accepts_only_yes() {
        assert!(read_answer(&mut Cursor::new("y\n")));
        assert!(read_answer(&mut Cursor::new(" YES \n")));
        assert!(!read_answer(&mut Cursor::new("n\n")));
        assert!(!read_answer(&mut Cursor::new("\n")));
        assert!(!read_answer(&mut Cursor::new("")));
    }

    #[test]
    fn books_need_a_store() -> Result<()> {
        let mut db = demo_db()?;
        let mut shell = Shell::new(&mut db, ScriptedDialog::default());
        let output = run_script(&mut shell, &["open books", "open books 3", "quit"])?;
        assert!(output.contains("choose a store first"), "{output}");
        assert!(output.contains("4 books"), "{output}");
        assert!(output.contains("folio:books[3]>"), "{output}");
        Ok(())
    }

    #[test]
    fn edit_and_save_through_the_shell() -> Result<()> {
        let mut db = demo_db()?;
        let row = {
            let mut shell = Shell::new(&mut db, ScriptedDialog::default());
            let mut out = Vec::new();
            shell.execute(
                Command::Open {
                    screen: ScreenKind::Authors,
                    store: None,
                },
                &mut out,
            )?;
            let row = shell
                .screens()
                .authors
                .rows()
                .iter()
                .find(|row| row.record().last_name == "Boye")
                .map(|row| row.id().get())
                .context("Boye loaded")?;

            let set = format!("set {row} first_name Karin Maria");
            let output = run_script(&mut shell, &[set.as_str(), "list", "save", "quit"])?;
            assert!(output.contains("folio:authors*>"), "{output}");
            assert!(output.contains("saved authors: 0 inserted, 1 updated"), "{output}");
            assert_eq!(shell.dialog().last_notice(), Some(SAVED_MESSAGE));
            assert!(!shell.screens().has_changes());
            row
        };
        assert!(row > 0);
        let renamed: i64 = db.raw_connection().query_row(
            "SELECT COUNT(*) FROM authors WHERE first_name = 'Karin Maria'",
            [],
            |r| r.get(0),
        )?;
        assert_eq!(renamed, 1);
        Ok(())
    }

    #[test]
    fn book_authors_are_assigned_by_id() -> Result<()> {
        let mut db = demo_db()?;
        let boye: i64 = db.raw_connection().query_row(
            "SELECT id FROM authors WHERE last_name = 'Boye'",
            [],
            |r| r.get(0),
        )?;
        {
            let mut shell = Shell::new(&mut db, ScriptedDialog::default());
            run_script(&mut shell, &["open books 1"])?;
            let row = shell
                .screens()
                .books
                .rows()
                .iter()
                .find(|row| row.record().title == "Roseanna")
                .map(|row| row.id().get())
                .context("Roseanna loaded")?;
            let set = format!("set {row} author_ids {boye}, {boye}");
            let output = run_script(&mut shell, &[set.as_str(), "save", "quit"])?;
            assert!(output.contains("saved books: 0 inserted, 1 updated"), "{output}");
        }
        let linked: i64 = db.raw_connection().query_row(
            "SELECT COUNT(*) FROM book_authorships WHERE isbn13 = '9789100181234'",
            [],
            |r| r.get(0),
        )?;
        assert_eq!(linked, 1);
        Ok(())
    }

    #[test]
    fn declined_lone_deletion_reports_nothing_saved() -> Result<()> {
        let mut db = demo_db()?;
        let mut shell = Shell::new(&mut db, ScriptedDialog::answering(&[false]));
        run_script(&mut shell, &["open stores"])?;
        let row = shell
            .screens()
            .stores
            .rows()
            .first()
            .map(|row| row.id().get())
            .context("stores loaded")?;
        let remove = format!("rm {row}");
        let output = run_script(&mut shell, &[remove.as_str(), "save", "quit"])?;
        assert!(output.contains("1 deletion(s) declined, nothing saved"), "{output}");
        assert_eq!(shell.screens().stores.rows().len(), 3);
        assert!(!shell.screens().has_changes());
        Ok(())
    }

    #[test]
    fn declined_switch_keeps_pending_work() -> Result<()> {
        let mut db = demo_db()?;
        let mut shell = Shell::new(&mut db, ScriptedDialog::answering(&[false, true]));
        let output = run_script(
            &mut shell,
            &["open stores", "add", "open customers", "status", "open customers"],
        )?;
        assert!(output.contains("staying on stores"), "{output}");
        assert!(output.contains("unsaved changes in: stores"), "{output}");
        assert_eq!(shell.state().active, ScreenKind::Customers);
        assert!(!shell.screens().has_changes());
        assert_eq!(shell.dialog().confirms.len(), 2);
        assert_eq!(shell.dialog().confirms[0].1, UNSAVED_TITLE);
        Ok(())
    }

    #[test]
    fn quit_with_unsaved_work_asks_first() -> Result<()> {
        let mut db = demo_db()?;
        let mut shell = Shell::new(&mut db, ScriptedDialog::answering(&[false]));
        let mut out = Vec::new();
        shell.execute(
            Command::Open {
                screen: ScreenKind::Publishers,
                store: None,
            },
            &mut out,
        )?;
        shell.execute(Command::Add, &mut out)?;
        assert_eq!(shell.execute(Command::Quit, &mut out)?, Flow::Continue);
        assert!(String::from_utf8(out)?.contains("quit cancelled"));
        Ok(())
    }

    #[test]
    fn orders_are_listed_read_only() -> Result<()> {
        let mut db = demo_db()?;
        let mut shell = Shell::new(&mut db, ScriptedDialog::default());
        let output = run_script(&mut shell, &["open orders", "add", "quit"])?;
        assert!(output.contains("Oskar Ek"), "{output}");
        assert!(output.contains("507.00 kr"), "{output}");
        assert!(output.contains("5 orders"), "{output}");
        assert!(output.contains("read-only"), "{output}");
        Ok(())
    }

    #[test]
    fn unknown_field_lists_the_choices() -> Result<()> {
        let mut db = demo_db()?;
        let mut shell = Shell::new(&mut db, ScriptedDialog::default());
        let output = run_script(
            &mut shell,
            &["open customers", "set 1 shoe_size 42", "fields", "quit"],
        )?;
        assert!(output.contains("unknown customer field"), "{output}");
        assert!(output.contains("first_name, last_name, email, phone, orders"), "{output}");
        assert!(output.contains("orders (read-only)"), "{output}");
        Ok(())
    }

    #[test]
    fn blocked_save_reports_problems() -> Result<()> {
        let mut db = demo_db()?;
        let mut shell = Shell::new(&mut db, ScriptedDialog::default());
        let output = run_script(&mut shell, &["open publishers", "add", "save", "status"])?;
        assert!(output.contains("save blocked by 1 problem(s)"), "{output}");
        assert!(output.contains("unsaved changes left in: publishers"), "{output}");
        Ok(())
    }
}
