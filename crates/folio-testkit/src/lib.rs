// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use folio_app::{
    Author, AuthorId, Book, Customer, CustomerId, Dialog, Isbn13, Publisher, PublisherId, Store,
    StoreId,
};
use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;
use time::{Date, Month};

const FIRST_NAMES: [&str; 16] = [
    "Astrid", "Selma", "Karin", "Hjalmar", "Vilhelm", "Sigrid", "Gustaf", "Edith", "Harry",
    "Moa", "Pär", "Kerstin", "Tove", "Henning", "Majgull", "Jonas",
];
const LAST_NAMES: [&str; 16] = [
    "Lindgren",
    "Lagerlöf",
    "Boye",
    "Söderberg",
    "Moberg",
    "Södergran",
    "Fröding",
    "Martinson",
    "Lagerkvist",
    "Ekman",
    "Mankell",
    "Axelsson",
    "Jansson",
    "Gardell",
    "Ajvide",
    "Tranströmer",
];
const TITLE_OPENERS: [&str; 10] = [
    "Den", "Det", "Vägen till", "Sommaren i", "Huset vid", "Natten över", "Ljuset från",
    "Minnen av", "Brev från", "Skuggan av",
];
const TITLE_NOUNS: [&str; 12] = [
    "skärgården",
    "fjällen",
    "staden",
    "sjön",
    "gården",
    "hamnen",
    "skogen",
    "kusten",
    "vintern",
    "havet",
    "bruket",
    "ödemarken",
];
const LANGUAGES: [&str; 4] = ["Swedish", "Swedish", "English", "Norwegian"];
const CITIES: [&str; 8] = [
    "Stockholm",
    "Göteborg",
    "Malmö",
    "Uppsala",
    "Lund",
    "Umeå",
    "Örebro",
    "Visby",
];
const STREETS: [&str; 8] = [
    "Storgatan",
    "Kungsgatan",
    "Drottninggatan",
    "Västra Hamngatan",
    "Sveavägen",
    "Järntorget",
    "Klostergatan",
    "Strandvägen",
];
const PUBLISHER_WORDS: [&str; 8] = [
    "Förlag", "Bokförlag", "Press", "& Söner", "Böcker", "Publishing", "Utgivning", "& Co",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator of catalog records. Every record comes back unsaved,
/// ready to hand to a tracker.
#[derive(Debug, Clone)]
pub struct CatalogFaker {
    rng: DeterministicRng,
    issued_isbns: BTreeSet<String>,
    issued_emails: BTreeSet<String>,
}

impl CatalogFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            issued_isbns: BTreeSet::new(),
            issued_emails: BTreeSet::new(),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn author(&mut self) -> Author {
        let birth_year = self.int_range_i32(1840, 1990);
        let death_date = if birth_year < 1930 {
            let lifespan = self.int_range_i32(40, 90);
            Some(self.date_in_year(birth_year + lifespan))
        } else {
            None
        };
        Author {
            id: AuthorId::UNSAVED,
            first_name: self.pick(&FIRST_NAMES).to_owned(),
            last_name: self.pick(&LAST_NAMES).to_owned(),
            birth_date: Some(self.date_in_year(birth_year)),
            death_date,
            ..Author::default()
        }
    }

    pub fn publisher(&mut self) -> Publisher {
        let base = self.pick(&LAST_NAMES);
        let name = format!("{base} {}", self.pick(&PUBLISHER_WORDS));
        let slug = ascii_slug(base);
        Publisher {
            id: PublisherId::UNSAVED,
            name,
            address: self.street_address(),
            country: "Sweden".to_owned(),
            email: format!("info@{slug}.example"),
            title_count: 0,
        }
    }

    pub fn store(&mut self) -> Store {
        let city = self.pick(&CITIES);
        let street = self.pick(&STREETS);
        Store {
            id: StoreId::UNSAVED,
            name: format!("Folio {street}"),
            address: format!("{street} {}", self.int_range_i32(1, 120)),
            city: city.to_owned(),
            postal_code: format!(
                "{:03} {:02}",
                self.int_range_i32(100, 989),
                self.int_range_i32(10, 99)
            ),
            country: "Sweden".to_owned(),
            webpage_url: format!("https://folio.example/{}", ascii_slug(city)),
            phone: self.phone(),
        }
    }

    pub fn customer(&mut self) -> Customer {
        let first_name = self.pick(&FIRST_NAMES);
        let last_name = self.pick(&LAST_NAMES);
        let stem = format!("{}.{}", ascii_slug(first_name), ascii_slug(last_name));
        let mut email = format!("{stem}@example.se");
        let mut suffix = 2;
        while !self.issued_emails.insert(email.clone()) {
            email = format!("{stem}{suffix}@example.se");
            suffix += 1;
        }
        Customer {
            id: CustomerId::UNSAVED,
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            email,
            phone: self.phone(),
            order_count: 0,
        }
    }

    pub fn book(&mut self) -> Book {
        let year = self.int_range_i32(1880, 2025);
        Book {
            isbn13: self.isbn13(),
            title: format!("{} {}", self.pick(&TITLE_OPENERS), self.pick(&TITLE_NOUNS)),
            language: self.pick(&LANGUAGES).to_owned(),
            price_ore: i64::from(self.int_range_i32(79, 449)) * 100,
            publication_date: Some(self.date_in_year(year)),
            quantity: self.int_range_i32(0, 25),
            ..Book::default()
        }
    }

    /// A fresh 978-prefixed ISBN with a valid check digit, never repeated by
    /// this faker.
    pub fn isbn13(&mut self) -> Isbn13 {
        loop {
            let body = format!("978{:09}", self.rng.next_u64() % 1_000_000_000);
            let isbn = format!("{body}{}", isbn13_check_digit(&body));
            if self.issued_isbns.insert(isbn.clone()) {
                return Isbn13::new(isbn);
            }
        }
    }

    pub fn date_in_year(&mut self, year: i32) -> Date {
        let month = Month::January.nth_next(self.int_n(12) as u8);
        let day = self.int_range_i32(1, 28) as u8;
        Date::from_calendar_date(year, month, day).expect("days 1-28 exist in every month")
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range_i32(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = i64::from(max) - i64::from(min) + 1;
        let offset = (self.rng.next_u64() % (span as u64)) as i64;
        (i64::from(min) + offset) as i32
    }

    fn street_address(&mut self) -> String {
        format!(
            "{} {}, {}",
            self.pick(&STREETS),
            self.int_range_i32(1, 120),
            self.pick(&CITIES)
        )
    }

    fn phone(&mut self) -> String {
        format!(
            "07{}-{:03} {:02} {:02}",
            self.int_range_i32(0, 9),
            self.int_range_i32(100, 999),
            self.int_range_i32(10, 99),
            self.int_range_i32(10, 99)
        )
    }
}

/// Dialog that answers confirmations from a queue (declining once the
/// queue runs dry) and records every prompt and notice it was shown.
#[derive(Debug, Default)]
pub struct ScriptedDialog {
    answers: VecDeque<bool>,
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

    pub fn push_answer(&mut self, answer: bool) {
        self.answers.push_back(answer);
    }

    pub fn last_notice(&self) -> Option<&str> {
        self.notices.last().map(|(message, _)| message.as_str())
    }

    pub fn last_title(&self) -> Option<&str> {
        self.notices.last().map(|(_, title)| title.as_str())
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

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("folio.db");
    Ok((dir, db_path))
}

pub fn isbn13_check_digit(body: &str) -> u32 {
    let sum: u32 = body
        .chars()
        .filter_map(|ch| ch.to_digit(10))
        .enumerate()
        .map(|(index, digit)| if index % 2 == 0 { digit } else { digit * 3 })
        .sum();
    (10 - sum % 10) % 10
}

fn ascii_slug(value: &str) -> String {
    value
        .chars()
        .filter_map(|ch| match ch {
            'å' | 'ä' | 'Å' | 'Ä' => Some('a'),
            'ö' | 'Ö' => Some('o'),
            'é' => Some('e'),
            ch if ch.is_ascii_alphanumeric() => Some(ch.to_ascii_lowercase()),
            _ => None,
        })
        .collect()
}
