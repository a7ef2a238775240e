// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Tracker configuration for each editable entity: key, tracked columns,
//! comparison, copying and row validation.

use anyhow::{Result, bail};

use crate::ids::*;
use crate::model::*;
use crate::tracking::Record;
use crate::validation::{
    ValidationError, ValidationResult, format_date, format_id_list, format_ore, looks_like_email,
    parse_id_list, parse_isbn13, parse_optional_date, parse_optional_id, parse_required_int,
    parse_required_ore,
};

fn text(raw: &str) -> String {
    raw.trim().to_owned()
}

impl Record for Book {
    type Key = Isbn13;
    type Field = BookField;
    type Scope = StoreId;

    const LABEL: &'static str = "book";
    const PLURAL: &'static str = "books";
    const FIELDS: &'static [BookField] = &[
        BookField::Isbn13,
        BookField::Title,
        BookField::Language,
        BookField::Price,
        BookField::PublicationDate,
        BookField::Quantity,
        BookField::PublisherId,
        BookField::AuthorIds,
        BookField::Publisher,
        BookField::Authors,
    ];
    const TRACKED: &'static [BookField] = &[
        BookField::Isbn13,
        BookField::Title,
        BookField::Language,
        BookField::Price,
        BookField::PublicationDate,
        BookField::Quantity,
        BookField::PublisherId,
        BookField::AuthorIds,
    ];
    const KEY_FIELD: Option<BookField> = Some(BookField::Isbn13);

    fn key(&self) -> &Isbn13 {
        &self.isbn13
    }

    fn field_text(&self, field: BookField) -> String {
        match field {
            BookField::Isbn13 => self.isbn13.to_string(),
            BookField::Title => self.title.clone(),
            BookField::Language => self.language.clone(),
            BookField::Price => format_ore(self.price_ore),
            BookField::PublicationDate => format_date(self.publication_date),
            BookField::Quantity => self.quantity.to_string(),
            BookField::PublisherId => self
                .publisher_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            BookField::AuthorIds => format_id_list(self.author_ids.iter().map(|id| id.get())),
            BookField::Publisher => self.publisher.clone(),
            BookField::Authors => self.authors.clone(),
        }
    }

    fn set_text(&mut self, field: BookField, raw: &str) -> ValidationResult<()> {
        match field {
            BookField::Isbn13 => self.isbn13 = Isbn13::new(parse_isbn13(raw)?),
            BookField::Title => self.title = text(raw),
            BookField::Language => self.language = text(raw),
            BookField::Price => self.price_ore = parse_required_ore(raw)?,
            BookField::PublicationDate => self.publication_date = parse_optional_date(raw)?,
            BookField::Quantity => self.quantity = parse_required_int(raw)?,
            BookField::PublisherId => {
                self.publisher_id = parse_optional_id(raw)?.map(PublisherId::new);
            }
            BookField::AuthorIds => {
                self.author_ids = parse_id_list(raw)?.into_iter().map(AuthorId::new).collect();
            }
            BookField::Publisher | BookField::Authors => return Err(ValidationError::ReadOnly),
        }
        Ok(())
    }

    fn field_differs(&self, other: &Self, field: BookField) -> bool {
        match field {
            BookField::Isbn13 => self.isbn13 != other.isbn13,
            BookField::Title => self.title != other.title,
            BookField::Language => self.language != other.language,
            BookField::Price => self.price_ore != other.price_ore,
            BookField::PublicationDate => self.publication_date != other.publication_date,
            BookField::Quantity => self.quantity != other.quantity,
            BookField::PublisherId => self.publisher_id != other.publisher_id,
            BookField::AuthorIds => self.author_ids != other.author_ids,
            BookField::Publisher => self.publisher != other.publisher,
            BookField::Authors => self.authors != other.authors,
        }
    }

    fn copy_field(&mut self, source: &Self, field: BookField) {
        match field {
            BookField::Isbn13 => self.isbn13.clone_from(&source.isbn13),
            BookField::Title => self.title.clone_from(&source.title),
            BookField::Language => self.language.clone_from(&source.language),
            BookField::Price => self.price_ore = source.price_ore,
            BookField::PublicationDate => self.publication_date = source.publication_date,
            BookField::Quantity => self.quantity = source.quantity,
            BookField::PublisherId => self.publisher_id = source.publisher_id,
            BookField::AuthorIds => self.author_ids.clone_from(&source.author_ids),
            BookField::Publisher => self.publisher.clone_from(&source.publisher),
            BookField::Authors => self.authors.clone_from(&source.authors),
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.isbn13.is_well_formed() {
            bail!("book ISBN-13 must be exactly 13 digits -- enter the full ISBN and retry");
        }
        if self.title.trim().is_empty() {
            bail!("book title is required -- enter a title and retry");
        }
        if self.language.trim().is_empty() {
            bail!("book language is required -- enter a language and retry");
        }
        if self.price_ore <= 0 {
            bail!("book price must be positive");
        }
        if self.publication_date.is_none() {
            bail!("book publication date is required -- enter YYYY-MM-DD and retry");
        }
        if self.quantity < 0 {
            bail!("book quantity cannot be negative");
        }
        Ok(())
    }
}

impl Record for Author {
    type Key = AuthorId;
    type Field = AuthorField;
    type Scope = ();

    const LABEL: &'static str = "author";
    const PLURAL: &'static str = "authors";
    const FIELDS: &'static [AuthorField] = &[
        AuthorField::FirstName,
        AuthorField::LastName,
        AuthorField::BirthDate,
        AuthorField::DeathDate,
        AuthorField::BookTitles,
        AuthorField::Isbns,
    ];
    const TRACKED: &'static [AuthorField] = &[
        AuthorField::FirstName,
        AuthorField::LastName,
        AuthorField::BirthDate,
        AuthorField::DeathDate,
    ];

    fn key(&self) -> &AuthorId {
        &self.id
    }

    fn field_text(&self, field: AuthorField) -> String {
        match field {
            AuthorField::FirstName => self.first_name.clone(),
            AuthorField::LastName => self.last_name.clone(),
            AuthorField::BirthDate => format_date(self.birth_date),
            AuthorField::DeathDate => format_date(self.death_date),
            AuthorField::BookTitles => self.book_titles.clone(),
            AuthorField::Isbns => self.isbns.clone(),
        }
    }

    fn set_text(&mut self, field: AuthorField, raw: &str) -> ValidationResult<()> {
        match field {
            AuthorField::FirstName => self.first_name = text(raw),
            AuthorField::LastName => self.last_name = text(raw),
            AuthorField::BirthDate => self.birth_date = parse_optional_date(raw)?,
            AuthorField::DeathDate => self.death_date = parse_optional_date(raw)?,
            AuthorField::BookTitles | AuthorField::Isbns => return Err(ValidationError::ReadOnly),
        }
        Ok(())
    }

    fn field_differs(&self, other: &Self, field: AuthorField) -> bool {
        match field {
            AuthorField::FirstName => self.first_name != other.first_name,
            AuthorField::LastName => self.last_name != other.last_name,
            AuthorField::BirthDate => self.birth_date != other.birth_date,
            AuthorField::DeathDate => self.death_date != other.death_date,
            AuthorField::BookTitles => self.book_titles != other.book_titles,
            AuthorField::Isbns => self.isbns != other.isbns,
        }
    }

    fn copy_field(&mut self, source: &Self, field: AuthorField) {
        match field {
            AuthorField::FirstName => self.first_name.clone_from(&source.first_name),
            AuthorField::LastName => self.last_name.clone_from(&source.last_name),
            AuthorField::BirthDate => self.birth_date = source.birth_date,
            AuthorField::DeathDate => self.death_date = source.death_date,
            AuthorField::BookTitles => self.book_titles.clone_from(&source.book_titles),
            AuthorField::Isbns => self.isbns.clone_from(&source.isbns),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.first_name.trim().is_empty() {
            bail!("author first name is required -- enter a first name and retry");
        }
        if self.last_name.trim().is_empty() {
            bail!("author last name is required -- enter a last name and retry");
        }
        if let (Some(born), Some(died)) = (self.birth_date, self.death_date)
            && died < born
        {
            bail!("author death date must be on/after birth date");
        }
        Ok(())
    }
}

impl Record for Publisher {
    type Key = PublisherId;
    type Field = PublisherField;
    type Scope = ();

    const LABEL: &'static str = "publisher";
    const PLURAL: &'static str = "publishers";
    const FIELDS: &'static [PublisherField] = &[
        PublisherField::Name,
        PublisherField::Address,
        PublisherField::Country,
        PublisherField::Email,
        PublisherField::TitleCount,
    ];
    const TRACKED: &'static [PublisherField] = &[
        PublisherField::Name,
        PublisherField::Address,
        PublisherField::Country,
        PublisherField::Email,
    ];

    fn key(&self) -> &PublisherId {
        &self.id
    }

    fn field_text(&self, field: PublisherField) -> String {
        match field {
            PublisherField::Name => self.name.clone(),
            PublisherField::Address => self.address.clone(),
            PublisherField::Country => self.country.clone(),
            PublisherField::Email => self.email.clone(),
            PublisherField::TitleCount => self.title_count.to_string(),
        }
    }

    fn set_text(&mut self, field: PublisherField, raw: &str) -> ValidationResult<()> {
        match field {
            PublisherField::Name => self.name = text(raw),
            PublisherField::Address => self.address = text(raw),
            PublisherField::Country => self.country = text(raw),
            PublisherField::Email => self.email = text(raw),
            PublisherField::TitleCount => return Err(ValidationError::ReadOnly),
        }
        Ok(())
    }

    fn field_differs(&self, other: &Self, field: PublisherField) -> bool {
        match field {
            PublisherField::Name => self.name != other.name,
            PublisherField::Address => self.address != other.address,
            PublisherField::Country => self.country != other.country,
            PublisherField::Email => self.email != other.email,
            PublisherField::TitleCount => self.title_count != other.title_count,
        }
    }

    fn copy_field(&mut self, source: &Self, field: PublisherField) {
        match field {
            PublisherField::Name => self.name.clone_from(&source.name),
            PublisherField::Address => self.address.clone_from(&source.address),
            PublisherField::Country => self.country.clone_from(&source.country),
            PublisherField::Email => self.email.clone_from(&source.email),
            PublisherField::TitleCount => self.title_count = source.title_count,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("publisher name is required -- enter a name and retry");
        }
        if !looks_like_email(&self.email) {
            bail!("publisher email must contain @ and be longer than 5 characters");
        }
        Ok(())
    }
}

impl Record for Store {
    type Key = StoreId;
    type Field = StoreField;
    type Scope = ();

    const LABEL: &'static str = "store";
    const PLURAL: &'static str = "stores";
    const FIELDS: &'static [StoreField] = &[
        StoreField::Name,
        StoreField::Address,
        StoreField::City,
        StoreField::PostalCode,
        StoreField::Country,
        StoreField::WebpageUrl,
        StoreField::Phone,
    ];
    const TRACKED: &'static [StoreField] = Self::FIELDS;

    fn key(&self) -> &StoreId {
        &self.id
    }

    fn field_text(&self, field: StoreField) -> String {
        match field {
            StoreField::Name => self.name.clone(),
            StoreField::Address => self.address.clone(),
            StoreField::City => self.city.clone(),
            StoreField::PostalCode => self.postal_code.clone(),
            StoreField::Country => self.country.clone(),
            StoreField::WebpageUrl => self.webpage_url.clone(),
            StoreField::Phone => self.phone.clone(),
        }
    }

    fn set_text(&mut self, field: StoreField, raw: &str) -> ValidationResult<()> {
        let value = text(raw);
        match field {
            StoreField::Name => self.name = value,
            StoreField::Address => self.address = value,
            StoreField::City => self.city = value,
            StoreField::PostalCode => self.postal_code = value,
            StoreField::Country => self.country = value,
            StoreField::WebpageUrl => self.webpage_url = value,
            StoreField::Phone => self.phone = value,
        }
        Ok(())
    }

    fn field_differs(&self, other: &Self, field: StoreField) -> bool {
        self.field_text(field) != other.field_text(field)
    }

    fn copy_field(&mut self, source: &Self, field: StoreField) {
        match field {
            StoreField::Name => self.name.clone_from(&source.name),
            StoreField::Address => self.address.clone_from(&source.address),
            StoreField::City => self.city.clone_from(&source.city),
            StoreField::PostalCode => self.postal_code.clone_from(&source.postal_code),
            StoreField::Country => self.country.clone_from(&source.country),
            StoreField::WebpageUrl => self.webpage_url.clone_from(&source.webpage_url),
            StoreField::Phone => self.phone.clone_from(&source.phone),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("store name is required -- enter a name and retry");
        }
        if self.city.trim().is_empty() {
            bail!("store city is required -- enter a city and retry");
        }
        Ok(())
    }
}

impl Record for Customer {
    type Key = CustomerId;
    type Field = CustomerField;
    type Scope = ();

    const LABEL: &'static str = "customer";
    const PLURAL: &'static str = "customers";
    const FIELDS: &'static [CustomerField] = &[
        CustomerField::FirstName,
        CustomerField::LastName,
        CustomerField::Email,
        CustomerField::Phone,
        CustomerField::OrderCount,
    ];
    const TRACKED: &'static [CustomerField] = &[
        CustomerField::FirstName,
        CustomerField::LastName,
        CustomerField::Email,
        CustomerField::Phone,
    ];

    fn key(&self) -> &CustomerId {
        &self.id
    }

    fn field_text(&self, field: CustomerField) -> String {
        match field {
            CustomerField::FirstName => self.first_name.clone(),
            CustomerField::LastName => self.last_name.clone(),
            CustomerField::Email => self.email.clone(),
            CustomerField::Phone => self.phone.clone(),
            CustomerField::OrderCount => self.order_count.to_string(),
        }
    }

    fn set_text(&mut self, field: CustomerField, raw: &str) -> ValidationResult<()> {
        match field {
            CustomerField::FirstName => self.first_name = text(raw),
            CustomerField::LastName => self.last_name = text(raw),
            CustomerField::Email => self.email = text(raw),
            CustomerField::Phone => self.phone = text(raw),
            CustomerField::OrderCount => return Err(ValidationError::ReadOnly),
        }
        Ok(())
    }

    fn field_differs(&self, other: &Self, field: CustomerField) -> bool {
        match field {
            CustomerField::FirstName => self.first_name != other.first_name,
            CustomerField::LastName => self.last_name != other.last_name,
            CustomerField::Email => self.email != other.email,
            CustomerField::Phone => self.phone != other.phone,
            CustomerField::OrderCount => self.order_count != other.order_count,
        }
    }

    fn copy_field(&mut self, source: &Self, field: CustomerField) {
        match field {
            CustomerField::FirstName => self.first_name.clone_from(&source.first_name),
            CustomerField::LastName => self.last_name.clone_from(&source.last_name),
            CustomerField::Email => self.email.clone_from(&source.email),
            CustomerField::Phone => self.phone.clone_from(&source.phone),
            CustomerField::OrderCount => self.order_count = source.order_count,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.first_name.trim().is_empty() {
            bail!("customer first name is required -- enter a first name and retry");
        }
        if self.last_name.trim().is_empty() {
            bail!("customer last name is required -- enter a last name and retry");
        }
        if !looks_like_email(&self.email) {
            bail!("customer email must contain @ and be longer than 5 characters");
        }
        Ok(())
    }
}
