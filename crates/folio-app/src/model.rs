// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::Date;

use crate::ids::*;
use crate::tracking::FieldSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScreenKind {
    Books,
    Authors,
    Publishers,
    Stores,
    Customers,
    Orders,
}

impl ScreenKind {
    pub const ALL: [Self; 6] = [
        Self::Books,
        Self::Authors,
        Self::Publishers,
        Self::Stores,
        Self::Customers,
        Self::Orders,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Books => "books",
            Self::Authors => "authors",
            Self::Publishers => "publishers",
            Self::Stores => "stores",
            Self::Customers => "customers",
            Self::Orders => "orders",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "books" | "book" => Some(Self::Books),
            "authors" | "author" => Some(Self::Authors),
            "publishers" | "publisher" => Some(Self::Publishers),
            "stores" | "store" => Some(Self::Stores),
            "customers" | "customer" => Some(Self::Customers),
            "orders" | "order" => Some(Self::Orders),
            _ => None,
        }
    }

    pub const fn is_editable(self) -> bool {
        !matches!(self, Self::Orders)
    }
}

macro_rules! field_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl FieldSpec for $name {
            fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            fn parse(value: &str) -> Option<Self> {
                match value {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

field_enum!(BookField {
    Isbn13 => "isbn",
    Title => "title",
    Language => "language",
    Price => "price",
    PublicationDate => "published",
    Quantity => "quantity",
    PublisherId => "publisher_id",
    AuthorIds => "author_ids",
    Publisher => "publisher",
    Authors => "authors",
});

field_enum!(AuthorField {
    FirstName => "first_name",
    LastName => "last_name",
    BirthDate => "born",
    DeathDate => "died",
    BookTitles => "titles",
    Isbns => "isbns",
});

field_enum!(PublisherField {
    Name => "name",
    Address => "address",
    Country => "country",
    Email => "email",
    TitleCount => "titles",
});

field_enum!(StoreField {
    Name => "name",
    Address => "address",
    City => "city",
    PostalCode => "postal_code",
    Country => "country",
    WebpageUrl => "url",
    Phone => "phone",
});

field_enum!(CustomerField {
    FirstName => "first_name",
    LastName => "last_name",
    Email => "email",
    Phone => "phone",
    OrderCount => "orders",
});

/// A title as stocked by one store. Quantity comes from that store's
/// inventory balance. `publisher` and `authors` are display names resolved
/// from `publisher_id` and `author_ids` on load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Book {
    pub isbn13: Isbn13,
    pub title: String,
    pub language: String,
    pub price_ore: i64,
    pub publication_date: Option<Date>,
    pub quantity: i32,
    pub publisher_id: Option<PublisherId>,
    /// Sorted and distinct.
    pub author_ids: Vec<AuthorId>,
    pub publisher: String,
    pub authors: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<Date>,
    pub death_date: Option<Date>,
    pub book_titles: String,
    pub isbns: String,
}

impl Author {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Publisher {
    pub id: PublisherId,
    pub name: String,
    pub address: String,
    pub country: String,
    pub email: String,
    pub title_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub webpage_url: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub order_count: i64,
}

/// One row of the read-only orders listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub customer_name: String,
    pub store_name: String,
    pub ordered_at: Date,
    pub item_count: i64,
    pub total_ore: i64,
}
