// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use folio_app::validation::parse_id_list;
use folio_app::{
    Author, AuthorId, Book, Customer, CustomerId, Isbn13, Publisher, PublisherId, Storage,
    StorageSession, Store, StoreId,
};
use rusqlite::{Connection, Transaction, params};
use tracing::debug;

use crate::{Database, format_date, format_opt_date, parse_date, parse_opt_date, to_sql_error};

/// One save's worth of writes. Dropping it rolls everything back.
pub struct SqliteSession<'a> {
    tx: Transaction<'a>,
}

impl Database {
    fn begin(&mut self) -> Result<SqliteSession<'_>> {
        let tx = self.conn.transaction().context("begin transaction")?;
        Ok(SqliteSession { tx })
    }
}

impl SqliteSession<'_> {
    fn finish(self) -> Result<()> {
        self.tx.commit().context("commit transaction")
    }
}

macro_rules! sqlite_storage {
    ($record:ty, $query:ident) => {
        impl Storage<$record> for Database {
            type Session<'a> = SqliteSession<'a>;

            fn load_all(&self, scope: &<$record as folio_app::Record>::Scope) -> Result<Vec<$record>> {
                $query(&self.conn, scope, None)
            }

            fn session(&mut self) -> Result<SqliteSession<'_>> {
                self.begin()
            }
        }
    };
}

sqlite_storage!(Book, query_books);
sqlite_storage!(Author, query_authors);
sqlite_storage!(Publisher, query_publishers);
sqlite_storage!(Store, query_stores);
sqlite_storage!(Customer, query_customers);

fn query_books(conn: &Connection, store: &StoreId, isbn: Option<&Isbn13>) -> Result<Vec<Book>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT
              b.isbn13, b.title, b.language, b.price_ore, b.publication_date,
              ib.quantity,
              b.publisher_id,
              COALESCE((
                SELECT group_concat(ba.author_id, ',')
                FROM book_authorships ba
                WHERE ba.isbn13 = b.isbn13
              ), ''),
              COALESCE(p.name, ''),
              COALESCE((
                SELECT group_concat(a.first_name || ' ' || a.last_name, ', ')
                FROM book_authorships ba
                JOIN authors a ON a.id = ba.author_id
                WHERE ba.isbn13 = b.isbn13
              ), '')
            FROM inventory_balances ib
            JOIN books b ON b.isbn13 = ib.isbn13
            LEFT JOIN publishers p ON p.id = b.publisher_id
            WHERE ib.store_id = ?1
              AND (?2 IS NULL OR b.isbn13 = ?2)
            ORDER BY b.title ASC, b.isbn13 ASC
            ",
        )
        .context("prepare books query")?;
    let rows = stmt
        .query_map(params![store.get(), isbn.map(Isbn13::as_str)], |row| {
            let published_raw: String = row.get(4)?;
            let author_ids: String = row.get(7)?;
            let author_ids = parse_id_list(&author_ids).map_err(|error| to_sql_error(error.into()))?;
            Ok(Book {
                isbn13: Isbn13::new(row.get::<_, String>(0)?),
                title: row.get(1)?,
                language: row.get(2)?,
                price_ore: row.get(3)?,
                publication_date: Some(parse_date(&published_raw).map_err(to_sql_error)?),
                quantity: row.get(5)?,
                publisher_id: row.get::<_, Option<i64>>(6)?.map(PublisherId::new),
                author_ids: author_ids.into_iter().map(AuthorId::new).collect(),
                publisher: row.get(8)?,
                authors: row.get(9)?,
            })
        })
        .with_context(|| format!("load books for store {store}"))?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("collect books for store {store}"))
}

fn query_authors(conn: &Connection, _scope: &(), id: Option<&AuthorId>) -> Result<Vec<Author>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT
              a.id, a.first_name, a.last_name, a.birth_date, a.death_date,
              COALESCE((
                SELECT group_concat(b.title, ', ')
                FROM book_authorships ba
                JOIN books b ON b.isbn13 = ba.isbn13
                WHERE ba.author_id = a.id
              ), ''),
              COALESCE((
                SELECT group_concat(ba.isbn13, ', ')
                FROM book_authorships ba
                WHERE ba.author_id = a.id
              ), '')
            FROM authors a
            WHERE (?1 IS NULL OR a.id = ?1)
            ORDER BY a.last_name ASC, a.first_name ASC, a.id ASC
            ",
        )
        .context("prepare authors query")?;
    let rows = stmt
        .query_map(params![id.map(|id| id.get())], |row| {
            Ok(Author {
                id: AuthorId::new(row.get(0)?),
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                birth_date: parse_opt_date(row.get(3)?).map_err(to_sql_error)?,
                death_date: parse_opt_date(row.get(4)?).map_err(to_sql_error)?,
                book_titles: row.get(5)?,
                isbns: row.get(6)?,
            })
        })
        .context("load authors")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("collect authors")
}

fn query_publishers(
    conn: &Connection,
    _scope: &(),
    id: Option<&PublisherId>,
) -> Result<Vec<Publisher>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT
              p.id, p.name, p.address, p.country, p.email,
              (SELECT COUNT(*) FROM books b WHERE b.publisher_id = p.id)
            FROM publishers p
            WHERE (?1 IS NULL OR p.id = ?1)
            ORDER BY p.name ASC, p.id ASC
            ",
        )
        .context("prepare publishers query")?;
    let rows = stmt
        .query_map(params![id.map(|id| id.get())], |row| {
            Ok(Publisher {
                id: PublisherId::new(row.get(0)?),
                name: row.get(1)?,
                address: row.get(2)?,
                country: row.get(3)?,
                email: row.get(4)?,
                title_count: row.get(5)?,
            })
        })
        .context("load publishers")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("collect publishers")
}

fn query_stores(conn: &Connection, _scope: &(), id: Option<&StoreId>) -> Result<Vec<Store>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT id, name, address, city, postal_code, country, webpage_url, phone
            FROM stores
            WHERE (?1 IS NULL OR id = ?1)
            ORDER BY name ASC, id ASC
            ",
        )
        .context("prepare stores query")?;
    let rows = stmt
        .query_map(params![id.map(|id| id.get())], |row| {
            Ok(Store {
                id: StoreId::new(row.get(0)?),
                name: row.get(1)?,
                address: row.get(2)?,
                city: row.get(3)?,
                postal_code: row.get(4)?,
                country: row.get(5)?,
                webpage_url: row.get(6)?,
                phone: row.get(7)?,
            })
        })
        .context("load stores")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("collect stores")
}

fn query_customers(
    conn: &Connection,
    _scope: &(),
    id: Option<&CustomerId>,
) -> Result<Vec<Customer>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT
              c.id, c.first_name, c.last_name, c.email, c.phone,
              (SELECT COUNT(*) FROM orders o WHERE o.customer_id = c.id)
            FROM customers c
            WHERE (?1 IS NULL OR c.id = ?1)
            ORDER BY c.last_name ASC, c.first_name ASC, c.id ASC
            ",
        )
        .context("prepare customers query")?;
    let rows = stmt
        .query_map(params![id.map(|id| id.get())], |row| {
            Ok(Customer {
                id: CustomerId::new(row.get(0)?),
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                email: row.get(3)?,
                phone: row.get(4)?,
                order_count: row.get(5)?,
            })
        })
        .context("load customers")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("collect customers")
}

fn first<T>(rows: Vec<T>) -> Option<T> {
    rows.into_iter().next()
}

fn require_one(rows_affected: usize, what: &str) -> Result<()> {
    if rows_affected == 0 {
        bail!("{what} not found -- cancel to reload and retry");
    }
    Ok(())
}

impl SqliteSession<'_> {
    fn require_row(&self, table: &str, id: i64, what: &str) -> Result<()> {
        let exists: bool = self
            .tx
            .query_row(
                &format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE id = ?)"),
                params![id],
                |row| row.get(0),
            )
            .with_context(|| format!("look up {what}"))?;
        if !exists {
            bail!("{what} does not exist -- check the {table} screen for valid ids and retry");
        }
        Ok(())
    }

    /// Points the catalog entry at its publisher and replaces its authorships.
    fn link_book(&self, book: &Book) -> Result<()> {
        let isbn = book.isbn13.as_str();
        if let Some(publisher) = book.publisher_id {
            self.require_row("publishers", publisher.get(), &format!("publisher {publisher}"))?;
        }
        for author in &book.author_ids {
            self.require_row("authors", author.get(), &format!("author {author}"))?;
        }

        self.tx
            .execute(
                "UPDATE books SET publisher_id = ? WHERE isbn13 = ?",
                params![book.publisher_id.map(PublisherId::get), isbn],
            )
            .context("set book publisher")?;
        self.tx
            .execute("DELETE FROM book_authorships WHERE isbn13 = ?", params![isbn])
            .context("clear authorships")?;
        for author in &book.author_ids {
            self.tx
                .execute(
                    "INSERT INTO book_authorships (isbn13, author_id) VALUES (?, ?)",
                    params![isbn, author.get()],
                )
                .with_context(|| format!("link author {author} to book {isbn}"))?;
        }
        Ok(())
    }
}

impl StorageSession<Book> for SqliteSession<'_> {
    /// Adds the title to the catalog if it is not there yet, then stocks it
    /// at `store`. An existing catalog entry keeps its details.
    fn insert(&mut self, store: &StoreId, book: &Book) -> Result<Isbn13> {
        let published = book
            .publication_date
            .map(format_date)
            .context("book publication date is required")?;
        let created = self
            .tx
            .execute(
                "
                INSERT INTO books (isbn13, title, language, price_ore, publication_date)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT (isbn13) DO NOTHING
                ",
                params![
                    book.isbn13.as_str(),
                    book.title,
                    book.language,
                    book.price_ore,
                    published,
                ],
            )
            .context("insert book")?;
        if created == 0 {
            debug!(isbn = %book.isbn13, "book already catalogued, linking to store");
        } else {
            self.link_book(book)?;
        }
        self.tx
            .execute(
                "INSERT INTO inventory_balances (store_id, isbn13, quantity) VALUES (?, ?, ?)",
                params![store.get(), book.isbn13.as_str(), book.quantity],
            )
            .with_context(|| format!("stock book {} at store {store}", book.isbn13))?;
        Ok(book.isbn13.clone())
    }

    fn delete(&mut self, _store: &StoreId, isbn: &Isbn13) -> Result<()> {
        let isbn = isbn.as_str();
        self.tx
            .execute("DELETE FROM inventory_balances WHERE isbn13 = ?", params![isbn])
            .context("delete inventory balances")?;
        self.tx
            .execute("DELETE FROM order_items WHERE isbn13 = ?", params![isbn])
            .context("delete order items")?;
        self.tx
            .execute("DELETE FROM book_authorships WHERE isbn13 = ?", params![isbn])
            .context("delete authorships")?;
        self.tx
            .execute("DELETE FROM books WHERE isbn13 = ?", params![isbn])
            .context("delete book")?;
        Ok(())
    }

    fn find(&mut self, store: &StoreId, isbn: &Isbn13) -> Result<Option<Book>> {
        Ok(first(query_books(&self.tx, store, Some(isbn))?))
    }

    fn update(&mut self, store: &StoreId, book: &Book) -> Result<()> {
        let published = book
            .publication_date
            .map(format_date)
            .context("book publication date is required")?;
        let rows_affected = self
            .tx
            .execute(
                "
                UPDATE books
                SET title = ?, language = ?, price_ore = ?, publication_date = ?
                WHERE isbn13 = ?
                ",
                params![
                    book.title,
                    book.language,
                    book.price_ore,
                    published,
                    book.isbn13.as_str(),
                ],
            )
            .context("update book")?;
        require_one(rows_affected, &format!("book {}", book.isbn13))?;
        self.link_book(book)?;

        let rows_affected = self
            .tx
            .execute(
                "UPDATE inventory_balances SET quantity = ? WHERE store_id = ? AND isbn13 = ?",
                params![book.quantity, store.get(), book.isbn13.as_str()],
            )
            .context("update inventory balance")?;
        require_one(
            rows_affected,
            &format!("inventory for book {} at store {store}", book.isbn13),
        )
    }

    fn commit(self) -> Result<()> {
        self.finish()
    }
}

impl StorageSession<Author> for SqliteSession<'_> {
    fn insert(&mut self, _scope: &(), author: &Author) -> Result<AuthorId> {
        self.tx
            .execute(
                "
                INSERT INTO authors (first_name, last_name, birth_date, death_date)
                VALUES (?, ?, ?, ?)
                ",
                params![
                    author.first_name,
                    author.last_name,
                    format_opt_date(author.birth_date),
                    format_opt_date(author.death_date),
                ],
            )
            .context("insert author")?;
        Ok(AuthorId::new(self.tx.last_insert_rowid()))
    }

    fn delete(&mut self, _scope: &(), id: &AuthorId) -> Result<()> {
        self.tx
            .execute(
                "DELETE FROM book_authorships WHERE author_id = ?",
                params![id.get()],
            )
            .context("delete authorships")?;
        self.tx
            .execute("DELETE FROM authors WHERE id = ?", params![id.get()])
            .context("delete author")?;
        Ok(())
    }

    fn find(&mut self, scope: &(), id: &AuthorId) -> Result<Option<Author>> {
        Ok(first(query_authors(&self.tx, scope, Some(id))?))
    }

    fn update(&mut self, _scope: &(), author: &Author) -> Result<()> {
        let rows_affected = self
            .tx
            .execute(
                "
                UPDATE authors
                SET first_name = ?, last_name = ?, birth_date = ?, death_date = ?
                WHERE id = ?
                ",
                params![
                    author.first_name,
                    author.last_name,
                    format_opt_date(author.birth_date),
                    format_opt_date(author.death_date),
                    author.id.get(),
                ],
            )
            .context("update author")?;
        require_one(rows_affected, &format!("author {}", author.id))
    }

    fn commit(self) -> Result<()> {
        self.finish()
    }
}

impl StorageSession<Publisher> for SqliteSession<'_> {
    fn insert(&mut self, _scope: &(), publisher: &Publisher) -> Result<PublisherId> {
        self.tx
            .execute(
                "INSERT INTO publishers (name, address, country, email) VALUES (?, ?, ?, ?)",
                params![
                    publisher.name,
                    publisher.address,
                    publisher.country,
                    publisher.email,
                ],
            )
            .context("insert publisher")?;
        Ok(PublisherId::new(self.tx.last_insert_rowid()))
    }

    /// Books outlive their publisher; they just lose the reference.
    fn delete(&mut self, _scope: &(), id: &PublisherId) -> Result<()> {
        self.tx
            .execute(
                "UPDATE books SET publisher_id = NULL WHERE publisher_id = ?",
                params![id.get()],
            )
            .context("detach books from publisher")?;
        self.tx
            .execute("DELETE FROM publishers WHERE id = ?", params![id.get()])
            .context("delete publisher")?;
        Ok(())
    }

    fn find(&mut self, scope: &(), id: &PublisherId) -> Result<Option<Publisher>> {
        Ok(first(query_publishers(&self.tx, scope, Some(id))?))
    }

    fn update(&mut self, _scope: &(), publisher: &Publisher) -> Result<()> {
        let rows_affected = self
            .tx
            .execute(
                "UPDATE publishers SET name = ?, address = ?, country = ?, email = ? WHERE id = ?",
                params![
                    publisher.name,
                    publisher.address,
                    publisher.country,
                    publisher.email,
                    publisher.id.get(),
                ],
            )
            .context("update publisher")?;
        require_one(rows_affected, &format!("publisher {}", publisher.id))
    }

    fn commit(self) -> Result<()> {
        self.finish()
    }
}

impl StorageSession<Store> for SqliteSession<'_> {
    fn insert(&mut self, _scope: &(), store: &Store) -> Result<StoreId> {
        self.tx
            .execute(
                "
                INSERT INTO stores (
                  name, address, city, postal_code, country, webpage_url, phone
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    store.name,
                    store.address,
                    store.city,
                    store.postal_code,
                    store.country,
                    store.webpage_url,
                    store.phone,
                ],
            )
            .context("insert store")?;
        Ok(StoreId::new(self.tx.last_insert_rowid()))
    }

    fn delete(&mut self, _scope: &(), id: &StoreId) -> Result<()> {
        self.tx
            .execute(
                "
                DELETE FROM order_items
                WHERE order_id IN (SELECT id FROM orders WHERE store_id = ?)
                ",
                params![id.get()],
            )
            .context("delete order items")?;
        self.tx
            .execute("DELETE FROM orders WHERE store_id = ?", params![id.get()])
            .context("delete orders")?;
        self.tx
            .execute(
                "DELETE FROM inventory_balances WHERE store_id = ?",
                params![id.get()],
            )
            .context("delete inventory balances")?;
        self.tx
            .execute("DELETE FROM stores WHERE id = ?", params![id.get()])
            .context("delete store")?;
        Ok(())
    }

    fn find(&mut self, scope: &(), id: &StoreId) -> Result<Option<Store>> {
        Ok(first(query_stores(&self.tx, scope, Some(id))?))
    }

    fn update(&mut self, _scope: &(), store: &Store) -> Result<()> {
        let rows_affected = self
            .tx
            .execute(
                "
                UPDATE stores
                SET
                  name = ?,
                  address = ?,
                  city = ?,
                  postal_code = ?,
                  country = ?,
                  webpage_url = ?,
                  phone = ?
                WHERE id = ?
                ",
                params![
                    store.name,
                    store.address,
                    store.city,
                    store.postal_code,
                    store.country,
                    store.webpage_url,
                    store.phone,
                    store.id.get(),
                ],
            )
            .context("update store")?;
        require_one(rows_affected, &format!("store {}", store.id))
    }

    fn commit(self) -> Result<()> {
        self.finish()
    }
}

impl StorageSession<Customer> for SqliteSession<'_> {
    fn insert(&mut self, _scope: &(), customer: &Customer) -> Result<CustomerId> {
        self.tx
            .execute(
                "INSERT INTO customers (first_name, last_name, email, phone) VALUES (?, ?, ?, ?)",
                params![
                    customer.first_name,
                    customer.last_name,
                    customer.email,
                    customer.phone,
                ],
            )
            .with_context(|| format!("insert customer {}", customer.email))?;
        Ok(CustomerId::new(self.tx.last_insert_rowid()))
    }

    fn delete(&mut self, _scope: &(), id: &CustomerId) -> Result<()> {
        self.tx
            .execute(
                "
                DELETE FROM order_items
                WHERE order_id IN (SELECT id FROM orders WHERE customer_id = ?)
                ",
                params![id.get()],
            )
            .context("delete order items")?;
        self.tx
            .execute(
                "DELETE FROM orders WHERE customer_id = ?",
                params![id.get()],
            )
            .context("delete orders")?;
        self.tx
            .execute("DELETE FROM customers WHERE id = ?", params![id.get()])
            .context("delete customer")?;
        Ok(())
    }

    fn find(&mut self, scope: &(), id: &CustomerId) -> Result<Option<Customer>> {
        Ok(first(query_customers(&self.tx, scope, Some(id))?))
    }

    fn update(&mut self, _scope: &(), customer: &Customer) -> Result<()> {
        let rows_affected = self
            .tx
            .execute(
                "UPDATE customers SET first_name = ?, last_name = ?, email = ?, phone = ? WHERE id = ?",
                params![
                    customer.first_name,
                    customer.last_name,
                    customer.email,
                    customer.phone,
                    customer.id.get(),
                ],
            )
            .with_context(|| format!("update customer {}", customer.email))?;
        require_one(rows_affected, &format!("customer {}", customer.id))
    }

    fn commit(self) -> Result<()> {
        self.finish()
    }
}
