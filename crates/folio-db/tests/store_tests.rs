// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use folio_app::{
    Author, AuthorField, Book, BookField, CANCELLED_MESSAGE, ChangeTracker, Customer,
    CustomerField, ERROR_TITLE, Isbn13, NOTHING_SAVED_MESSAGE, Publisher, Record, RowId,
    SAVED_MESSAGE, SaveOutcome, SaveReport, Storage, Store, StoreField, StoreId, TrackingError,
};
use folio_db::Database;
use folio_testkit::{CatalogFaker, ScriptedDialog, temp_db_path};

const LAGERLOF_NILS: &str = "9789100123456";
const RODA_RUMMET: &str = "9789113012345";
const PIPPI: &str = "9789129688310";

fn demo_db() -> Result<Database> {
    let mut db = Database::open_memory()?;
    db.bootstrap()?;
    db.seed_demo_data()?;
    Ok(db)
}

fn loaded<R>(db: &Database, scope: R::Scope) -> Result<ChangeTracker<R>>
where
    R: Record,
    Database: Storage<R>,
{
    let mut tracker = ChangeTracker::new();
    tracker.load(db, &mut ScriptedDialog::default(), scope)?;
    Ok(tracker)
}

fn row_where<R: Record>(tracker: &ChangeTracker<R>, matches: impl Fn(&R) -> bool) -> Result<RowId> {
    tracker
        .rows()
        .iter()
        .find(|row| matches(row.record()))
        .map(|row| row.id())
        .context("expected row not loaded")
}

fn count(db: &Database, sql: &str) -> Result<i64> {
    Ok(db.raw_connection().query_row(sql, [], |row| row.get(0))?)
}

fn assert_no_orphans(db: &Database) -> Result<()> {
    let mut stmt = db.raw_connection().prepare("PRAGMA foreign_key_check")?;
    let mut rows = stmt.query([])?;
    assert!(rows.next()?.is_none(), "dangling references left behind");
    Ok(())
}

#[test]
fn demo_seed_is_idempotent() -> Result<()> {
    let mut db = demo_db()?;
    db.seed_demo_data()?;
    assert_eq!(count(&db, "SELECT COUNT(*) FROM stores")?, 3);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM books")?, 6);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM inventory_balances")?, 16);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM order_items")?, 7);
    assert_no_orphans(&db)
}

#[test]
fn books_load_per_store_with_display_columns() -> Result<()> {
    let db = demo_db()?;
    let stockholm = loaded::<Book>(&db, StoreId::new(1))?;
    let malmo = loaded::<Book>(&db, StoreId::new(3))?;
    assert_eq!(stockholm.rows().len(), 6);
    assert_eq!(malmo.rows().len(), 4);

    let nils = row_where(&stockholm, |book| book.isbn13.as_str() == LAGERLOF_NILS)?;
    let nils = stockholm.row(nils).context("row")?.record();
    assert_eq!(nils.authors, "Selma Lagerlöf");
    assert_eq!(nils.publisher, "Bonnierförlagen");
    assert_eq!(nils.price_ore, 19_900);
    assert!(!stockholm.has_changes());
    Ok(())
}

#[test]
fn renaming_an_author_persists_and_clears_the_flag() -> Result<()> {
    let mut db = demo_db()?;
    let mut authors = loaded::<Author>(&db, ())?;
    let row = row_where(&authors, |author| author.last_name == "Lagerlöf")?;

    authors.set_field(row, AuthorField::FirstName, "Zelma")?;
    assert!(authors.has_changes());
    assert_eq!(authors.pending_updates().count(), 1);

    let mut dialog = ScriptedDialog::default();
    let outcome = authors.save(&mut db, &mut dialog)?;
    assert_eq!(
        outcome,
        SaveOutcome::Saved(SaveReport {
            updated: 1,
            ..SaveReport::default()
        })
    );
    assert!(!authors.has_changes());
    assert_eq!(dialog.last_notice(), Some(SAVED_MESSAGE));

    let reloaded = loaded::<Author>(&db, ())?;
    assert_eq!(authors.baseline(), reloaded.baseline());
    let renamed = row_where(&reloaded, |author| author.last_name == "Lagerlöf")?;
    let renamed = reloaded.row(renamed).context("row")?.record();
    assert_eq!(renamed.first_name, "Zelma");
    assert!(renamed.book_titles.contains("Nils Holgerssons underbara resa"));
    Ok(())
}

#[test]
fn new_publisher_receives_generated_key() -> Result<()> {
    let mut db = demo_db()?;
    let mut publishers = loaded::<Publisher>(&db, ())?;
    let (row, _) = publishers.add(Publisher {
        name: "Albert Bonniers Förlag".to_owned(),
        email: "info@abf.example".to_owned(),
        ..Publisher::default()
    });
    assert!(publishers.row(row).context("row")?.is_new());

    let outcome = publishers.save(&mut db, &mut ScriptedDialog::default())?;
    assert!(matches!(outcome, SaveOutcome::Saved(report) if report.inserted == 1));
    let saved = row_where(&publishers, |publisher| publisher.name == "Albert Bonniers Förlag")?;
    let saved = publishers.row(saved).context("row")?;
    assert!(!saved.is_new());
    assert_eq!(saved.record().id.get(), 4);
    assert!(!publishers.has_changes());
    Ok(())
}

#[test]
fn new_book_is_catalogued_and_stocked() -> Result<()> {
    let mut db = demo_db()?;
    let mut faker = CatalogFaker::new(11);
    let mut book = faker.book();
    book.quantity = 7;
    let isbn = book.isbn13.clone();

    let mut books = loaded::<Book>(&db, StoreId::new(2))?;
    books.add(book);
    books.save(&mut db, &mut ScriptedDialog::default())?;

    assert_eq!(books.rows().len(), 7);
    let stocked = row_where(&books, |book| book.isbn13 == isbn)?;
    assert_eq!(books.row(stocked).context("row")?.record().quantity, 7);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM books")?, 7);
    assert_eq!(loaded::<Book>(&db, StoreId::new(1))?.rows().len(), 6);
    Ok(())
}

#[test]
fn known_isbn_is_linked_to_the_store() -> Result<()> {
    let mut db = demo_db()?;
    let mut books = loaded::<Book>(&db, StoreId::new(3))?;
    let (row, _) = books.add(Book::default());
    books.set_field(row, BookField::Isbn13, RODA_RUMMET)?;
    books.set_field(row, BookField::Title, "Det röda rummet")?;
    books.set_field(row, BookField::Language, "Swedish")?;
    books.set_field(row, BookField::Price, "99")?;
    books.set_field(row, BookField::PublicationDate, "1879-11-01")?;
    books.set_field(row, BookField::Quantity, "2")?;

    books.save(&mut db, &mut ScriptedDialog::default())?;
    let linked = row_where(&books, |book| book.isbn13.as_str() == RODA_RUMMET)?;
    let linked = books.row(linked).context("row")?.record();
    assert_eq!(linked.title, "Röda rummet");
    assert_eq!(linked.quantity, 2);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM books")?, 6);
    Ok(())
}

#[test]
fn quantity_edit_only_touches_this_store() -> Result<()> {
    let mut db = demo_db()?;
    let mut books = loaded::<Book>(&db, StoreId::new(1))?;
    let row = row_where(&books, |book| book.isbn13.as_str() == PIPPI)?;
    books.set_field(row, BookField::Quantity, "40")?;
    books.set_field(row, BookField::Price, "189.50")?;
    books.save(&mut db, &mut ScriptedDialog::default())?;

    let goteborg = loaded::<Book>(&db, StoreId::new(2))?;
    let other = row_where(&goteborg, |book| book.isbn13.as_str() == PIPPI)?;
    let other = goteborg.row(other).context("row")?.record();
    assert_ne!(other.quantity, 40);
    assert_eq!(other.price_ore, 18_950);
    Ok(())
}

#[test]
fn deleting_an_author_removes_authorships_first() -> Result<()> {
    let mut db = demo_db()?;
    let mut authors = loaded::<Author>(&db, ())?;
    let row = row_where(&authors, |author| author.last_name == "Lagerlöf")?;
    let (removed, _) = authors.remove(row)?;

    let mut dialog = ScriptedDialog::answering(&[true]);
    let outcome = authors.save(&mut db, &mut dialog)?;
    assert!(matches!(outcome, SaveOutcome::Saved(report) if report.deleted == 1));
    assert_eq!(
        dialog.confirms[0].0,
        "You are about to delete 1 author(s) and all of their related records. Continue?"
    );
    assert_eq!(
        count(
            &db,
            &format!(
                "SELECT COUNT(*) FROM book_authorships WHERE author_id = {}",
                removed.id.get()
            )
        )?,
        0
    );
    assert_eq!(count(&db, "SELECT COUNT(*) FROM authors")?, 4);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM books")?, 6);
    assert_eq!(authors.rows().len(), 4);
    assert_no_orphans(&db)
}

#[test]
fn deleting_a_store_cascades_to_orders_and_inventory() -> Result<()> {
    let mut db = demo_db()?;
    let mut stores = loaded::<Store>(&db, ())?;
    let row = row_where(&stores, |store| store.city == "Stockholm")?;
    stores.remove(row)?;
    stores.save(&mut db, &mut ScriptedDialog::answering(&[true]))?;

    assert_eq!(count(&db, "SELECT COUNT(*) FROM stores")?, 2);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM orders")?, 3);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM order_items")?, 4);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM inventory_balances")?, 10);
    assert_no_orphans(&db)
}

#[test]
fn deleting_a_customer_cascades_to_orders() -> Result<()> {
    let mut db = demo_db()?;
    let mut customers = loaded::<Customer>(&db, ())?;
    let row = row_where(&customers, |customer| customer.first_name == "Elsa")?;
    assert_eq!(customers.row(row).context("row")?.record().order_count, 2);
    customers.remove(row)?;
    customers.save(&mut db, &mut ScriptedDialog::answering(&[true]))?;

    assert_eq!(count(&db, "SELECT COUNT(*) FROM customers")?, 3);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM orders")?, 3);
    assert_no_orphans(&db)
}

#[test]
fn deleting_a_book_cascades_everywhere() -> Result<()> {
    let mut db = demo_db()?;
    let mut books = loaded::<Book>(&db, StoreId::new(2))?;
    let row = row_where(&books, |book| book.isbn13.as_str() == PIPPI)?;
    books.remove(row)?;
    books.save(&mut db, &mut ScriptedDialog::answering(&[true]))?;

    assert_eq!(count(&db, "SELECT COUNT(*) FROM books")?, 5);
    assert_eq!(
        count(
            &db,
            &format!("SELECT COUNT(*) FROM inventory_balances WHERE isbn13 = '{PIPPI}'")
        )?,
        0
    );
    assert_eq!(
        count(
            &db,
            &format!("SELECT COUNT(*) FROM order_items WHERE isbn13 = '{PIPPI}'")
        )?,
        0
    );
    assert_eq!(loaded::<Book>(&db, StoreId::new(1))?.rows().len(), 5);
    assert_no_orphans(&db)
}

#[test]
fn deleting_a_publisher_keeps_its_books() -> Result<()> {
    let mut db = demo_db()?;
    let mut publishers = loaded::<Publisher>(&db, ())?;
    let row = row_where(&publishers, |publisher| publisher.name == "Norstedts")?;
    assert_eq!(publishers.row(row).context("row")?.record().title_count, 2);
    publishers.remove(row)?;
    publishers.save(&mut db, &mut ScriptedDialog::answering(&[true]))?;

    assert_eq!(count(&db, "SELECT COUNT(*) FROM books")?, 6);
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM books WHERE publisher_id IS NULL")?,
        2
    );
    let books = loaded::<Book>(&db, StoreId::new(1))?;
    let orphaned = row_where(&books, |book| book.isbn13.as_str() == RODA_RUMMET)?;
    assert_eq!(books.row(orphaned).context("row")?.record().publisher, "");
    assert_no_orphans(&db)
}

#[test]
fn declined_deletion_still_saves_edits() -> Result<()> {
    let mut db = demo_db()?;
    let mut stores = loaded::<Store>(&db, ())?;
    let doomed = row_where(&stores, |store| store.city == "Malmö")?;
    let renamed = row_where(&stores, |store| store.city == "Göteborg")?;
    stores.set_field(renamed, StoreField::Name, "Folio Avenyn 14")?;
    stores.remove(doomed)?;

    let outcome = stores.save(&mut db, &mut ScriptedDialog::answering(&[false]))?;
    assert_eq!(
        outcome,
        SaveOutcome::Saved(SaveReport {
            updated: 1,
            deletions_skipped: 1,
            ..SaveReport::default()
        })
    );
    assert_eq!(stores.rows().len(), 3);
    assert!(!stores.has_changes());
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM stores WHERE name = 'Folio Avenyn 14'")?,
        1
    );
    Ok(())
}

#[test]
fn failed_save_rolls_back_every_write() -> Result<()> {
    let mut db = demo_db()?;
    let mut customers = loaded::<Customer>(&db, ())?;
    let nils = row_where(&customers, |customer| customer.first_name == "Nils")?;
    customers.set_field(nils, CustomerField::FirstName, "Nisse")?;
    customers.add(Customer {
        first_name: "Elsa".to_owned(),
        last_name: "Dubblett".to_owned(),
        email: "elsa.berg@example.se".to_owned(),
        ..Customer::default()
    });

    let mut dialog = ScriptedDialog::default();
    let err = customers
        .save(&mut db, &mut dialog)
        .expect_err("duplicate email must fail");
    assert!(matches!(err, TrackingError::Save(_)));
    assert_eq!(dialog.last_title(), Some(ERROR_TITLE));

    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM customers WHERE first_name = 'Nils'")?,
        1
    );
    assert_eq!(count(&db, "SELECT COUNT(*) FROM customers")?, 4);
    assert!(customers.has_changes());
    assert_eq!(customers.pending_inserts().count(), 1);
    assert_eq!(customers.pending_updates().count(), 1);
    Ok(())
}

#[test]
fn vanished_row_aborts_the_save() -> Result<()> {
    let mut db = demo_db()?;
    let mut authors = loaded::<Author>(&db, ())?;
    let boye = row_where(&authors, |author| author.last_name == "Boye")?;
    let boye_id = authors.row(boye).context("row")?.record().id;
    authors.set_field(boye, AuthorField::LastName, "Boye-Björk")?;
    authors.add(Author {
        first_name: "Edith".to_owned(),
        last_name: "Södergran".to_owned(),
        ..Author::default()
    });

    db.raw_connection().execute_batch(&format!(
        "
        DELETE FROM book_authorships WHERE author_id = {id};
        DELETE FROM authors WHERE id = {id};
        ",
        id = boye_id.get()
    ))?;

    let err = authors
        .save(&mut db, &mut ScriptedDialog::default())
        .expect_err("stale row must abort");
    assert!(err.to_string().contains("no longer exists"), "err={err}");
    assert_eq!(count(&db, "SELECT COUNT(*) FROM authors")?, 4);
    Ok(())
}

#[test]
fn invalid_rows_never_reach_the_database() -> Result<()> {
    let mut db = demo_db()?;
    let mut publishers = loaded::<Publisher>(&db, ())?;
    publishers.add(Publisher {
        name: "Nameless".to_owned(),
        email: "nope".to_owned(),
        ..Publisher::default()
    });

    let outcome = publishers.save(&mut db, &mut ScriptedDialog::default())?;
    assert!(matches!(outcome, SaveOutcome::Blocked(ref problems) if problems.len() == 1));
    assert_eq!(count(&db, "SELECT COUNT(*) FROM publishers")?, 3);
    Ok(())
}

#[test]
fn add_then_remove_writes_nothing() -> Result<()> {
    let mut db = demo_db()?;
    let mut faker = CatalogFaker::new(5);
    let mut customers = loaded::<Customer>(&db, ())?;
    let (row, _) = customers.add(faker.customer());
    customers.remove(row)?;

    let outcome = customers.save(&mut db, &mut ScriptedDialog::default())?;
    assert_eq!(outcome, SaveOutcome::NothingToSave);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM customers")?, 4);
    Ok(())
}

#[test]
fn cancel_reloads_and_is_idempotent() -> Result<()> {
    let db = demo_db()?;
    let mut books = loaded::<Book>(&db, StoreId::new(1))?;
    let pippi = row_where(&books, |book| book.isbn13.as_str() == PIPPI)?;
    let nils = row_where(&books, |book| book.isbn13.as_str() == LAGERLOF_NILS)?;
    books.set_field(pippi, BookField::Price, "1")?;
    books.remove(nils)?;
    books.add(Book {
        isbn13: Isbn13::new("9789100000017"),
        ..Book::default()
    });

    let mut dialog = ScriptedDialog::default();
    assert!(books.cancel(&db, &mut dialog)?);
    assert_eq!(dialog.last_notice(), Some(CANCELLED_MESSAGE));
    let fresh = loaded::<Book>(&db, StoreId::new(1))?;
    assert_eq!(books.baseline(), fresh.baseline());
    assert_eq!(books.rows().len(), 6);

    assert!(!books.cancel(&db, &mut dialog)?);
    assert_eq!(books.baseline(), fresh.baseline());
    Ok(())
}

#[test]
fn generated_customers_round_trip() -> Result<()> {
    let mut db = Database::open_memory()?;
    db.bootstrap()?;
    let mut faker = CatalogFaker::new(99);
    let mut customers = loaded::<Customer>(&db, ())?;
    for _ in 0..20 {
        customers.add(faker.customer());
    }
    let outcome = customers.save(&mut db, &mut ScriptedDialog::default())?;
    assert!(matches!(outcome, SaveOutcome::Saved(report) if report.inserted == 20));
    assert_eq!(customers.rows().len(), 20);
    assert!(customers.rows().iter().all(|row| !row.is_new()));
    assert!(!customers.has_changes());
    Ok(())
}

#[test]
fn orders_list_with_totals() -> Result<()> {
    let db = demo_db()?;
    let orders = db.list_orders()?;
    assert_eq!(orders.len(), 5);

    let latest = &orders[0];
    assert_eq!(latest.customer_name, "Oskar Ek");
    assert_eq!(latest.store_name, "Folio Avenyn");
    assert_eq!(latest.item_count, 3);
    assert_eq!(latest.total_ore, 50_700);

    let first = orders.last().context("oldest order")?;
    assert_eq!(first.customer_name, "Elsa Berg");
    assert_eq!(first.item_count, 3);
    assert_eq!(first.total_ore, 53_700);
    Ok(())
}

#[test]
fn saved_changes_survive_reopen() -> Result<()> {
    let (_dir, path) = temp_db_path()?;
    {
        let mut db = Database::open(&path)?;
        db.bootstrap()?;
        let mut stores = loaded::<Store>(&db, ())?;
        stores.add(Store {
            name: "Folio Fyristorg".to_owned(),
            city: "Uppsala".to_owned(),
            ..Store::default()
        });
        stores.save(&mut db, &mut ScriptedDialog::default())?;
    }

    let db = Database::open(&path)?;
    db.bootstrap()?;
    let stores = loaded::<Store>(&db, ())?;
    assert_eq!(stores.rows().len(), 1);
    assert_eq!(stores.rows()[0].record().city, "Uppsala");
    Ok(())
}

fn id_of(db: &Database, sql: &str) -> Result<String> {
    Ok(count(db, sql)?.to_string())
}

#[test]
fn book_publisher_and_authors_are_saved() -> Result<()> {
    let mut db = demo_db()?;
    let bonnier = id_of(&db, "SELECT id FROM publishers WHERE name = 'Bonnierförlagen'")?;
    let strindberg = id_of(&db, "SELECT id FROM authors WHERE last_name = 'Strindberg'")?;
    let boye = id_of(&db, "SELECT id FROM authors WHERE last_name = 'Boye'")?;

    let mut books = loaded::<Book>(&db, StoreId::new(1))?;
    let row = row_where(&books, |book| book.isbn13.as_str() == RODA_RUMMET)?;
    books.set_field(row, BookField::PublisherId, &bonnier)?;
    books.set_field(row, BookField::AuthorIds, &format!("{boye}, {strindberg}"))?;
    assert_eq!(books.pending_updates().count(), 1);

    let outcome = books.save(&mut db, &mut ScriptedDialog::default())?;
    assert!(matches!(outcome, SaveOutcome::Saved(report) if report.updated == 1));
    assert!(!books.has_changes());

    let goteborg = loaded::<Book>(&db, StoreId::new(2))?;
    let saved = row_where(&goteborg, |book| book.isbn13.as_str() == RODA_RUMMET)?;
    let saved = goteborg.row(saved).context("row")?.record();
    assert_eq!(saved.publisher, "Bonnierförlagen");
    assert!(saved.authors.contains("Karin Boye"));
    assert!(saved.authors.contains("August Strindberg"));
    assert_eq!(saved.author_ids.len(), 2);
    assert_eq!(
        count(
            &db,
            &format!("SELECT COUNT(*) FROM book_authorships WHERE isbn13 = '{RODA_RUMMET}'")
        )?,
        2
    );
    assert_no_orphans(&db)
}

#[test]
fn new_book_is_linked_to_its_publisher_and_authors() -> Result<()> {
    let mut db = demo_db()?;
    let norstedts = id_of(&db, "SELECT id FROM publishers WHERE name = 'Norstedts'")?;
    let lindgren = id_of(&db, "SELECT id FROM authors WHERE last_name = 'Lindgren'")?;
    let mut book = CatalogFaker::new(5).book();
    let isbn = book.isbn13.clone();
    book.set_text(BookField::PublisherId, &norstedts)?;
    book.set_text(BookField::AuthorIds, &lindgren)?;

    let mut books = loaded::<Book>(&db, StoreId::new(3))?;
    books.add(book);
    books.save(&mut db, &mut ScriptedDialog::default())?;

    let saved = row_where(&books, |book| book.isbn13 == isbn)?;
    let saved = books.row(saved).context("row")?.record();
    assert_eq!(saved.publisher, "Norstedts");
    assert_eq!(saved.authors, "Astrid Lindgren");
    Ok(())
}

#[test]
fn unknown_author_id_rolls_the_book_save_back() -> Result<()> {
    let mut db = demo_db()?;
    let mut books = loaded::<Book>(&db, StoreId::new(1))?;
    let row = row_where(&books, |book| book.isbn13.as_str() == RODA_RUMMET)?;
    books.set_field(row, BookField::Quantity, "30")?;
    books.set_field(row, BookField::AuthorIds, "999")?;

    let mut dialog = ScriptedDialog::default();
    let err = books
        .save(&mut db, &mut dialog)
        .expect_err("missing author must fail the save");
    assert!(matches!(err, TrackingError::Save(_)));
    assert!(err.to_string().contains("author 999 does not exist"));
    assert_eq!(dialog.last_title(), Some(ERROR_TITLE));
    assert!(books.has_changes());
    assert_eq!(
        count(
            &db,
            &format!("SELECT COUNT(*) FROM book_authorships WHERE isbn13 = '{RODA_RUMMET}'")
        )?,
        1
    );
    assert_eq!(
        count(
            &db,
            &format!(
                "SELECT COUNT(*) FROM inventory_balances WHERE isbn13 = '{RODA_RUMMET}' AND quantity = 30"
            )
        )?,
        0
    );
    Ok(())
}

#[test]
fn re_entering_a_removed_isbn_keeps_the_book_everywhere() -> Result<()> {
    let mut db = demo_db()?;
    let order_lines = format!("SELECT COUNT(*) FROM order_items WHERE isbn13 = '{PIPPI}'");
    let lines_before = count(&db, &order_lines)?;

    let mut books = loaded::<Book>(&db, StoreId::new(1))?;
    let row = row_where(&books, |book| book.isbn13.as_str() == PIPPI)?;
    let (removed, _) = books.remove(row)?;
    let (fresh, _) = books.add(Book::default());
    books.set_field(fresh, BookField::Isbn13, PIPPI)?;
    books.set_field(fresh, BookField::Title, &removed.title)?;
    books.set_field(fresh, BookField::Language, &removed.language)?;
    books.set_field(fresh, BookField::Price, "159")?;
    books.set_field(fresh, BookField::PublicationDate, "1945-11-26")?;
    books.set_field(fresh, BookField::Quantity, "12")?;
    books.set_field(
        fresh,
        BookField::PublisherId,
        &removed.field_text(BookField::PublisherId),
    )?;
    books.set_field(fresh, BookField::AuthorIds, &removed.field_text(BookField::AuthorIds))?;
    assert!(books.pending_deletes().is_empty());
    assert_eq!(books.pending_inserts().count(), 0);

    let mut dialog = ScriptedDialog::default();
    let outcome = books.save(&mut db, &mut dialog)?;
    assert!(dialog.confirms.is_empty());
    assert_eq!(
        outcome,
        SaveOutcome::Saved(SaveReport {
            updated: 1,
            ..SaveReport::default()
        })
    );
    assert_eq!(count(&db, &order_lines)?, lines_before);
    let goteborg = loaded::<Book>(&db, StoreId::new(2))?;
    let kept = row_where(&goteborg, |book| book.isbn13.as_str() == PIPPI)?;
    let kept = goteborg.row(kept).context("row")?.record();
    assert_eq!(kept.price_ore, 15_900);
    assert_eq!(kept.authors, "Astrid Lindgren");
    assert_eq!(
        count(
            &db,
            &format!(
                "SELECT COUNT(*) FROM inventory_balances WHERE isbn13 = '{PIPPI}' AND store_id = 1 AND quantity = 12"
            )
        )?,
        1
    );
    assert_no_orphans(&db)
}

#[test]
fn declining_the_only_deletion_leaves_the_database_alone() -> Result<()> {
    let mut db = demo_db()?;
    let mut stores = loaded::<Store>(&db, ())?;
    let doomed = row_where(&stores, |store| store.city == "Malmö")?;
    stores.remove(doomed)?;

    let mut dialog = ScriptedDialog::answering(&[false]);
    let outcome = stores.save(&mut db, &mut dialog)?;
    assert_eq!(outcome, SaveOutcome::Declined { deletions: 1 });
    assert_eq!(dialog.last_notice(), Some(NOTHING_SAVED_MESSAGE));
    assert_eq!(stores.rows().len(), 3);
    assert!(!stores.has_changes());
    assert_eq!(count(&db, "SELECT COUNT(*) FROM stores")?, 3);
    Ok(())
}
