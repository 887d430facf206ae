//! Paging and sorting descriptors shared by the binder and repositories.
//!
//! A [`Pageable`] is built per request from the `page`, `size` and `order`
//! query parameters. `order` is a two-token `field,direction` spec; anything
//! else means "no ordering". Both renderings ([`Pageable::to_query_order`] and
//! [`Pageable::to_sql_order`]) report "no ordering" as `None`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Page index used when the client does not send `page`.
pub const DEFAULT_PAGE: u32 = 0;
/// Page size used when the client does not send `size`.
pub const DEFAULT_SIZE: u32 = 50;

/// Sort direction. Only `asc` (any case) is ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn parse(token: &str) -> Self {
        if token.eq_ignore_ascii_case("asc") {
            Direction::Asc
        } else {
            Direction::Desc
        }
    }

    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Parsed sort spec: a single field and direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: Direction,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }

    /// Parse `field,direction`. Exactly two non-empty tokens are required.
    #[must_use]
    pub fn parse(spec: &str) -> Option<Self> {
        let mut tokens = spec.trim().split(',');
        let field = tokens.next()?.trim();
        let direction = tokens.next()?.trim();
        if tokens.next().is_some() || field.is_empty() || direction.is_empty() {
            return None;
        }
        Some(Self {
            field: field.to_string(),
            direction: Direction::parse(direction),
        })
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        write!(f, "{},{}", self.field, dir)
    }
}

/// Client-supplied paging descriptor.
///
/// Fields stay optional until [`Pageable::defaults`] is applied; the binder
/// always hands handlers a defaulted value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pageable {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub order: Option<String>,
}

impl Pageable {
    /// A fully specified descriptor without ordering.
    #[must_use]
    pub fn of(page: u32, size: u32) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
            order: None,
        }
    }

    #[must_use]
    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// Build from decoded query pairs. Unparsable `page`/`size` count as absent,
    /// later occurrences override earlier ones.
    pub fn from_query<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut pageable = Pageable::default();
        for (key, value) in pairs {
            match key {
                "page" => pageable.page = value.trim().parse().ok(),
                "size" => pageable.size = value.trim().parse().ok(),
                "order" => pageable.order = Some(value.to_string()),
                _ => {}
            }
        }
        pageable
    }

    /// Fill in `page` and `size`. Idempotent.
    #[must_use]
    pub fn defaults(mut self) -> Self {
        self.page.get_or_insert(DEFAULT_PAGE);
        self.size.get_or_insert(DEFAULT_SIZE);
        self
    }

    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(DEFAULT_PAGE)
    }

    #[must_use]
    pub fn size(&self) -> u32 {
        self.size.unwrap_or(DEFAULT_SIZE)
    }

    /// Number of elements to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page()) * u64::from(self.size())
    }

    #[must_use]
    pub fn sort(&self) -> Option<Sort> {
        self.order.as_deref().and_then(Sort::parse)
    }

    /// Generic query-language rendering of the ordering.
    #[must_use]
    pub fn to_query_order(&self) -> Option<Sort> {
        self.sort()
    }

    /// Raw SQL rendering, e.g. `" ORDER BY t.name ASC"`, meant to be appended
    /// to a query whose root alias is `t`.
    ///
    /// Fields that are not plain identifiers are refused.
    #[must_use]
    pub fn to_sql_order(&self) -> Option<String> {
        let sort = self.sort()?;
        let safe = sort
            .field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if !safe {
            return None;
        }
        Some(format!(
            " ORDER BY t.{} {}",
            sort.field,
            sort.direction.as_sql()
        ))
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub order: Option<String>,
    pub total_elements: u64,
}

impl<T> Page<T> {
    /// Build a page for `pageable`, which is defaulted first.
    pub fn new(pageable: &Pageable, content: Vec<T>, total_elements: u64) -> Self {
        let pageable = pageable.clone().defaults();
        Self {
            content,
            page: pageable.page(),
            size: pageable.size(),
            order: pageable.order,
            total_elements,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            order: self.order,
            total_elements: self.total_elements,
        }
    }
}
