// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use tracing::info;

struct DemoStore {
    name: &'static str,
    address: &'static str,
    city: &'static str,
    postal_code: &'static str,
    webpage_url: &'static str,
    phone: &'static str,
}

const STORES: [DemoStore; 3] = [
    DemoStore {
        name: "Folio Drottninggatan",
        address: "Drottninggatan 52",
        city: "Stockholm",
        postal_code: "111 21",
        webpage_url: "https://folio.example/stockholm",
        phone: "08-123 45 67",
    },
    DemoStore {
        name: "Folio Avenyn",
        address: "Kungsportsavenyen 14",
        city: "Göteborg",
        postal_code: "411 36",
        webpage_url: "https://folio.example/goteborg",
        phone: "031-765 43 21",
    },
    DemoStore {
        name: "Folio Stortorget",
        address: "Stortorget 3",
        city: "Malmö",
        postal_code: "211 22",
        webpage_url: "https://folio.example/malmo",
        phone: "040-55 66 77",
    },
];

const PUBLISHERS: [(&str, &str, &str); 3] = [
    ("Bonnierförlagen", "Sveavägen 56, Stockholm", "info@bonnier.example"),
    ("Norstedts", "Tryckerigatan 4, Stockholm", "kontakt@norstedts.example"),
    ("Natur & Kultur", "Döbelnsgatan 15, Stockholm", "info@nok.example"),
];

const AUTHORS: [(&str, &str, Option<&str>, Option<&str>); 5] = [
    ("Selma", "Lagerlöf", Some("1858-11-20"), Some("1940-03-16")),
    ("August", "Strindberg", Some("1849-01-22"), Some("1912-05-14")),
    ("Karin", "Boye", Some("1900-10-26"), Some("1941-04-24")),
    ("Astrid", "Lindgren", Some("1907-11-14"), Some("2002-01-28")),
    ("Maj", "Sjöwall", Some("1935-09-25"), Some("2020-04-29")),
];

struct DemoBook {
    isbn13: &'static str,
    title: &'static str,
    language: &'static str,
    price_ore: i64,
    published: &'static str,
    publisher: usize,
    authors: &'static [usize],
}

const BOOKS: [DemoBook; 6] = [
    DemoBook {
        isbn13: "9789100123456",
        title: "Nils Holgerssons underbara resa",
        language: "Swedish",
        price_ore: 19_900,
        published: "1906-11-24",
        publisher: 0,
        authors: &[0],
    },
    DemoBook {
        isbn13: "9789113012345",
        title: "Röda rummet",
        language: "Swedish",
        price_ore: 14_900,
        published: "1879-11-01",
        publisher: 1,
        authors: &[1],
    },
    DemoBook {
        isbn13: "9789127054321",
        title: "Kallocain",
        language: "Swedish",
        price_ore: 12_900,
        published: "1940-09-01",
        publisher: 2,
        authors: &[2],
    },
    DemoBook {
        isbn13: "9789129688310",
        title: "Pippi Långstrump",
        language: "Swedish",
        price_ore: 16_900,
        published: "1945-11-26",
        publisher: 0,
        authors: &[3],
    },
    DemoBook {
        isbn13: "9789100181234",
        title: "Roseanna",
        language: "Swedish",
        price_ore: 11_900,
        published: "1965-06-01",
        publisher: 1,
        authors: &[4],
    },
    DemoBook {
        isbn13: "9780141189635",
        title: "The Wonderful Adventures of Nils",
        language: "English",
        price_ore: 24_900,
        published: "1907-01-01",
        publisher: 2,
        authors: &[0],
    },
];

const CUSTOMERS: [(&str, &str, &str, &str); 4] = [
    ("Elsa", "Berg", "elsa.berg@example.se", "070-111 22 33"),
    ("Nils", "Holm", "nils.holm@example.se", "070-222 33 44"),
    ("Greta", "Lind", "greta.lind@example.se", "070-333 44 55"),
    ("Oskar", "Ek", "oskar.ek@example.se", "070-444 55 66"),
];

/// (customer, store, date, [(book, quantity)])
const ORDERS: [(usize, usize, &str, &[(usize, i32)]); 5] = [
    (0, 0, "2026-01-12", &[(0, 1), (3, 2)]),
    (1, 0, "2026-02-03", &[(1, 1)]),
    (2, 1, "2026-02-17", &[(2, 1), (4, 1)]),
    (0, 2, "2026-03-08", &[(5, 1)]),
    (3, 1, "2026-03-21", &[(3, 3)]),
];

pub(crate) fn seed(conn: &mut Connection) -> Result<()> {
    let existing: i64 = conn
        .query_row("SELECT COUNT(*) FROM stores", [], |row| row.get(0))
        .context("count stores")?;
    if existing > 0 {
        return Ok(());
    }

    let tx = conn.transaction().context("begin demo seed")?;

    let mut store_ids = Vec::with_capacity(STORES.len());
    for store in &STORES {
        tx.execute(
            "
            INSERT INTO stores (name, address, city, postal_code, country, webpage_url, phone)
            VALUES (?, ?, ?, ?, 'Sweden', ?, ?)
            ",
            params![
                store.name,
                store.address,
                store.city,
                store.postal_code,
                store.webpage_url,
                store.phone,
            ],
        )
        .with_context(|| format!("insert demo store {}", store.name))?;
        store_ids.push(tx.last_insert_rowid());
    }

    let mut publisher_ids = Vec::with_capacity(PUBLISHERS.len());
    for (name, address, email) in PUBLISHERS {
        tx.execute(
            "INSERT INTO publishers (name, address, country, email) VALUES (?, ?, 'Sweden', ?)",
            params![name, address, email],
        )
        .with_context(|| format!("insert demo publisher {name}"))?;
        publisher_ids.push(tx.last_insert_rowid());
    }

    let mut author_ids = Vec::with_capacity(AUTHORS.len());
    for (first_name, last_name, born, died) in AUTHORS {
        tx.execute(
            "INSERT INTO authors (first_name, last_name, birth_date, death_date) VALUES (?, ?, ?, ?)",
            params![first_name, last_name, born, died],
        )
        .with_context(|| format!("insert demo author {first_name} {last_name}"))?;
        author_ids.push(tx.last_insert_rowid());
    }

    for (index, book) in BOOKS.iter().enumerate() {
        tx.execute(
            "
            INSERT INTO books (isbn13, title, language, price_ore, publication_date, publisher_id)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
            params![
                book.isbn13,
                book.title,
                book.language,
                book.price_ore,
                book.published,
                publisher_ids[book.publisher],
            ],
        )
        .with_context(|| format!("insert demo book {}", book.isbn13))?;

        for author in book.authors {
            tx.execute(
                "INSERT INTO book_authorships (isbn13, author_id) VALUES (?, ?)",
                params![book.isbn13, author_ids[*author]],
            )
            .with_context(|| format!("link demo book {} to its author", book.isbn13))?;
        }

        for (store_index, store_id) in store_ids.iter().enumerate() {
            // Malmö carries a smaller Swedish range.
            if store_index == 2 && book.language == "Swedish" && index % 2 == 1 {
                continue;
            }
            let quantity = ((index * 3 + store_index * 5) % 11) as i64 + 1;
            tx.execute(
                "INSERT INTO inventory_balances (store_id, isbn13, quantity) VALUES (?, ?, ?)",
                params![store_id, book.isbn13, quantity],
            )
            .with_context(|| format!("stock demo book {} at store {store_id}", book.isbn13))?;
        }
    }

    let mut customer_ids = Vec::with_capacity(CUSTOMERS.len());
    for (first_name, last_name, email, phone) in CUSTOMERS {
        tx.execute(
            "INSERT INTO customers (first_name, last_name, email, phone) VALUES (?, ?, ?, ?)",
            params![first_name, last_name, email, phone],
        )
        .with_context(|| format!("insert demo customer {email}"))?;
        customer_ids.push(tx.last_insert_rowid());
    }

    for (customer, store, ordered_at, items) in ORDERS {
        tx.execute(
            "INSERT INTO orders (customer_id, store_id, order_date) VALUES (?, ?, ?)",
            params![customer_ids[customer], store_ids[store], ordered_at],
        )
        .with_context(|| format!("insert demo order from {ordered_at}"))?;
        let order_id = tx.last_insert_rowid();
        for (book, quantity) in items {
            let book = &BOOKS[*book];
            tx.execute(
                "
                INSERT INTO order_items (order_id, isbn13, quantity, unit_price_ore)
                VALUES (?, ?, ?, ?)
                ",
                params![order_id, book.isbn13, quantity, book.price_ore],
            )
            .with_context(|| format!("insert demo order item {}", book.isbn13))?;
        }
    }

    tx.commit().context("commit demo seed")?;
    info!(
        stores = STORES.len(),
        books = BOOKS.len(),
        orders = ORDERS.len(),
        "demo data seeded"
    );
    Ok(())
}
