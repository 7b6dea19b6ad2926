//! Sort-option catalog for product and blog listings.
//!
//! The listing components carry a sort `<select>` authored in the page
//! builder; the server pre-selects the option matching the current query
//! so the control reflects state without a client round-trip.

/// A single sort option: the `value` attribute plus its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOption {
    pub value: &'static str,
    pub name: &'static str,
}

/// Sort options offered on product listings.
pub const PRODUCT_SORT_OPTIONS: &[SortOption] = &[
    SortOption { value: "name-asc", name: "Name A-Z" },
    SortOption { value: "name-desc", name: "Name Z-A" },
    SortOption { value: "date-desc", name: "Newest" },
    SortOption { value: "date-asc", name: "Oldest" },
];

/// Sort options offered on blog listings.
pub const BLOG_SORT_OPTIONS: &[SortOption] = &[
    SortOption { value: "published_at-desc", name: "Latest" },
    SortOption { value: "published_at-asc", name: "Earliest" },
    SortOption { value: "name-asc", name: "Title A-Z" },
    SortOption { value: "name-desc", name: "Title Z-A" },
];

/// Listing flavor, selects the option catalog and the hardcoded default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKind {
    Product,
    Blog,
}

impl SortKind {
    fn options(self) -> &'static [SortOption] {
        match self {
            Self::Product => PRODUCT_SORT_OPTIONS,
            Self::Blog => BLOG_SORT_OPTIONS,
        }
    }

    /// Hardcoded fallback when neither the request nor the component
    /// config supplies a sort value.
    pub fn default_value(self) -> &'static str {
        match self {
            Self::Product => "name-asc",
            Self::Blog => "published_at-desc",
        }
    }
}

/// Split a `field-order` sort value into `(field, order)`.
///
/// ```ignore
/// assert_eq!(parse_sort_value("name-asc"), ("name", "asc"));
/// ```
pub fn parse_sort_value(value: &str) -> (&str, &str) {
    match value.split_once('-') {
        Some((field, order)) => (field, order),
        None => (value, ""),
    }
}

/// Check whether a sort value belongs to the catalog for `kind`.
pub fn is_valid_sort_value(value: &str, kind: SortKind) -> bool {
    kind.options().iter().any(|opt| opt.value == value)
}

/// Return `value` if it is valid for `kind`, else the hardcoded default.
pub fn valid_sort_or_default(value: &str, kind: SortKind) -> &str {
    if is_valid_sort_value(value, kind) {
        value
    } else {
        kind.default_value()
    }
}
