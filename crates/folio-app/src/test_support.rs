// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::VecDeque;
use std::fmt;

use anyhow::{Result, bail};

use crate::reconcile::{Dialog, Storage, StorageSession};
use crate::tracking::{FieldSpec, Record, RecordKey};
use crate::validation::{ValidationError, ValidationResult, format_ore, parse_required_ore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl RecordKey for ItemId {
    fn is_unsaved(&self) -> bool {
        self.0 <= 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Code,
    Name,
    Price,
    Note,
}

impl FieldSpec for ItemField {
    fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Name => "name",
            Self::Price => "price",
            Self::Note => "note",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "code" => Some(Self::Code),
            "name" => Some(Self::Name),
            "price" => Some(Self::Price),
            "note" => Some(Self::Note),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub code: ItemId,
    pub name: String,
    pub price_ore: i64,
    pub note: String,
}

impl Item {
    pub fn new(code: i64, name: &str) -> Self {
        Self {
            code: ItemId(code),
            name: name.to_owned(),
            price_ore: 100,
            note: String::new(),
        }
    }
}

impl Record for Item {
    type Key = ItemId;
    type Field = ItemField;
    type Scope = ();

    const LABEL: &'static str = "item";
    const PLURAL: &'static str = "items";
    const FIELDS: &'static [ItemField] = &[
        ItemField::Code,
        ItemField::Name,
        ItemField::Price,
        ItemField::Note,
    ];
    const TRACKED: &'static [ItemField] = &[ItemField::Code, ItemField::Name, ItemField::Price];
    const KEY_FIELD: Option<ItemField> = Some(ItemField::Code);

    fn key(&self) -> &ItemId {
        &self.code
    }

    fn field_text(&self, field: ItemField) -> String {
        match field {
            ItemField::Code => self.code.to_string(),
            ItemField::Name => self.name.clone(),
            ItemField::Price => format_ore(self.price_ore),
            ItemField::Note => self.note.clone(),
        }
    }

    fn set_text(&mut self, field: ItemField, raw: &str) -> ValidationResult<()> {
        match field {
            ItemField::Code => {
                self.code = ItemId(raw.trim().parse().map_err(|_| ValidationError::InvalidInt)?);
            }
            ItemField::Name => self.name = raw.trim().to_owned(),
            ItemField::Price => self.price_ore = parse_required_ore(raw)?,
            ItemField::Note => self.note = raw.to_owned(),
        }
        Ok(())
    }

    fn field_differs(&self, other: &Self, field: ItemField) -> bool {
        match field {
            ItemField::Code => self.code != other.code,
            ItemField::Name => self.name != other.name,
            ItemField::Price => self.price_ore != other.price_ore,
            ItemField::Note => self.note != other.note,
        }
    }

    fn copy_field(&mut self, source: &Self, field: ItemField) {
        match field {
            ItemField::Code => self.code = source.code,
            ItemField::Name => self.name.clone_from(&source.name),
            ItemField::Price => self.price_ore = source.price_ore,
            ItemField::Note => self.note.clone_from(&source.note),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("item name is required -- enter a name and retry");
        }
        Ok(())
    }
}

/// Storage double. Sessions work on a copy and publish it on commit.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    pub items: Vec<Item>,
    pub next_code: i64,
    pub fail_load: bool,
    pub fail_commit: bool,
    pub fail_load_after_commit: bool,
    pub commits: usize,
    pub writes: Vec<String>,
}

impl MemoryStorage {
    pub fn with_items(items: &[(i64, &str)]) -> Self {
        let items = items
            .iter()
            .map(|(code, name)| Item::new(*code, name))
            .collect::<Vec<_>>();
        let next_code = items.iter().map(|item| item.code.0).max().unwrap_or(0) + 1;
        Self {
            items,
            next_code,
            ..Self::default()
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.name.as_str()).collect()
    }
}

pub struct MemorySession<'a> {
    storage: &'a mut MemoryStorage,
    staged: Vec<Item>,
    next_code: i64,
    writes: Vec<String>,
}

impl Storage<Item> for MemoryStorage {
    type Session<'a> = MemorySession<'a>;

    fn load_all(&self, _scope: &()) -> Result<Vec<Item>> {
        if self.fail_load {
            bail!("load items: storage offline");
        }
        Ok(self.items.clone())
    }

    fn session(&mut self) -> Result<MemorySession<'_>> {
        Ok(MemorySession {
            staged: self.items.clone(),
            next_code: self.next_code,
            writes: Vec::new(),
            storage: self,
        })
    }
}

impl StorageSession<Item> for MemorySession<'_> {
    fn insert(&mut self, _scope: &(), record: &Item) -> Result<ItemId> {
        let mut record = record.clone();
        if record.code.is_unsaved() {
            record.code = ItemId(self.next_code);
            self.next_code += 1;
        }
        self.writes.push(format!("insert {}", record.code));
        let code = record.code;
        self.staged.push(record);
        Ok(code)
    }

    fn delete(&mut self, _scope: &(), key: &ItemId) -> Result<()> {
        self.writes.push(format!("delete {key}"));
        self.staged.retain(|item| item.code != *key);
        Ok(())
    }

    fn find(&mut self, _scope: &(), key: &ItemId) -> Result<Option<Item>> {
        Ok(self.staged.iter().find(|item| item.code == *key).cloned())
    }

    fn update(&mut self, _scope: &(), record: &Item) -> Result<()> {
        let Some(slot) = self.staged.iter_mut().find(|item| item.code == record.code) else {
            bail!("update item {}: not found", record.code);
        };
        *slot = record.clone();
        self.writes.push(format!("update {}", record.code));
        Ok(())
    }

    fn commit(self) -> Result<()> {
        if self.storage.fail_commit {
            bail!("commit: disk full");
        }
        self.storage.items = self.staged;
        self.storage.next_code = self.next_code;
        self.storage.writes.extend(self.writes);
        self.storage.commits += 1;
        if self.storage.fail_load_after_commit {
            self.storage.fail_load = true;
        }
        Ok(())
    }
}

/// Dialog double that answers confirmations from a script and records
/// everything it was shown.
#[derive(Debug, Default)]
pub struct ScriptedDialog {
    pub answers: VecDeque<bool>,
    pub confirms: Vec<(String, String)>,
    pub notices: Vec<(String, String)>,
}

impl ScriptedDialog {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn last_notice(&self) -> Option<&(String, String)> {
        self.notices.last()
    }
}

impl Dialog for ScriptedDialog {
    fn confirm(&mut self, message: &str, title: &str) -> bool {
        self.confirms.push((message.to_owned(), title.to_owned()));
        self.answers.pop_front().unwrap_or(false)
    }

    fn notify(&mut self, message: &str, title: &str) {
        self.notices.push((message.to_owned(), title.to_owned()));
    }
}
