//! Catalog listing parameters: sort, filters and pagination.
//!
//! Parameters arrive as URL query strings (`?sort=price.desc&sellers=acme.bolt&page=2`).
//! Every malformed value falls back to its default instead of failing the
//! request.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use super::ProductWithStore;

/// Default number of products per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Largest accepted page size.
pub const MAX_PAGE_SIZE: u32 = 100;
/// Upper price bound when `pmax` is absent.
pub const DEFAULT_MAX_PRICE: Decimal = Decimal::from_parts(9_999_999, 0, 0, false, 0);

/// Column a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Name,
    Price,
    CreatedAt,
    Stock,
}

impl SortField {
    const fn column(self) -> &'static str {
        match self {
            Self::Name => "p.name",
            Self::Price => "p.price",
            Self::CreatedAt => "p.created_at",
            Self::Stock => "p.stock",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Listing order, written as `<field>.<asc|desc>` in query strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProductSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl ProductSort {
    /// `ORDER BY` clause. Ties are broken by product ID so pages never
    /// overlap.
    #[must_use]
    pub fn order_by_sql(self) -> String {
        let direction = match self.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        format!("{} {direction}, p.id ASC", self.field.column())
    }
}

impl FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = s.split_once('.').ok_or_else(|| s.to_owned())?;
        let field = match field {
            "name" => SortField::Name,
            "price" => SortField::Price,
            "createdAt" => SortField::CreatedAt,
            "stock" => SortField::Stock,
            _ => return Err(s.to_owned()),
        };
        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return Err(s.to_owned()),
        };
        Ok(Self { field, direction })
    }
}

/// Filters, order and page of a catalog listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductListParams {
    pub sort: ProductSort,
    /// Inclusive lower price bound.
    pub min_price: Decimal,
    /// Inclusive upper price bound.
    pub max_price: Decimal,
    /// Store slugs to include; `None` means every store.
    pub sellers: Option<Vec<String>>,
    /// Categories to include; `None` means every category.
    pub categories: Option<Vec<String>>,
    /// 1-based page number.
    pub page: u32,
    /// Rows per page, read through [`Self::effective_page_size`].
    pub page_size: u32,
}

impl Default for ProductListParams {
    fn default() -> Self {
        Self {
            sort: ProductSort::default(),
            min_price: Decimal::ZERO,
            max_price: DEFAULT_MAX_PRICE,
            sellers: None,
            categories: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ProductListParams {
    /// Build parameters from query-string pairs.
    ///
    /// Recognized keys: `sort`, `pmin`, `pmax`, `sellers`, `category`,
    /// `page`, `page_size`. `sellers` and `category` are dot-separated lists.
    #[must_use]
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| query.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        Self {
            sort: get("sort")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.sort),
            min_price: get("pmin")
                .and_then(|s| Decimal::from_str(s).ok())
                .unwrap_or(defaults.min_price),
            max_price: get("pmax")
                .and_then(|s| Decimal::from_str(s).ok())
                .unwrap_or(defaults.max_price),
            sellers: get("sellers").and_then(split_list),
            categories: get("category").and_then(split_list),
            page: get("page")
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(defaults.page)
                .max(1),
            page_size: get("page_size")
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(defaults.page_size)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// `page_size` clamped to `1..=MAX_PAGE_SIZE`.
    ///
    /// Offset, limit and page count all derive from this value, so pages stay
    /// disjoint and exhaustive even when `page_size` was set directly.
    #[must_use]
    pub const fn effective_page_size(&self) -> u32 {
        if self.page_size == 0 {
            1
        } else if self.page_size > MAX_PAGE_SIZE {
            MAX_PAGE_SIZE
        } else {
            self.page_size
        }
    }

    /// Rows to skip before this page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.max(1) - 1) * i64::from(self.effective_page_size())
    }

    /// Rows on one page.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.effective_page_size())
    }

    /// Number of pages needed for `total` matching products.
    #[must_use]
    pub fn page_count(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.effective_page_size()))
    }
}

fn split_list(raw: &str) -> Option<Vec<String>> {
    let items: Vec<String> = raw
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect();
    (!items.is_empty()).then_some(items)
}

/// One page of a catalog listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub items: Vec<ProductWithStore>,
    /// Products matching the filters across all pages.
    pub total: u64,
    pub page: u32,
    pub page_count: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let params = ProductListParams::from_query(&HashMap::new());
        assert_eq!(params, ProductListParams::default());
        assert_eq!(params.sort.order_by_sql(), "p.name ASC, p.id ASC");
        assert_eq!(params.max_price, Decimal::from(9_999_999));
        assert_eq!(params.offset(), 0);
        assert_eq!(params.limit(), 10);
    }

    #[test]
    fn test_sort_parsing() {
        let sort: ProductSort = "price.desc".parse().unwrap();
        assert_eq!(sort.order_by_sql(), "p.price DESC, p.id ASC");
        let sort: ProductSort = "createdAt.asc".parse().unwrap();
        assert_eq!(sort.field, SortField::CreatedAt);
        assert!("price".parse::<ProductSort>().is_err());
        assert!("price.sideways".parse::<ProductSort>().is_err());
        assert!("id.asc".parse::<ProductSort>().is_err());
    }

    #[test]
    fn test_unknown_sort_falls_back_to_name() {
        let params = ProductListParams::from_query(&query(&[("sort", "password.asc")]));
        assert_eq!(params.sort, ProductSort::default());
    }

    #[test]
    fn test_filters() {
        let params = ProductListParams::from_query(&query(&[
            ("pmin", "10"),
            ("pmax", "99.5"),
            ("sellers", "acme.bolt."),
            ("category", "tools"),
        ]));
        assert_eq!(params.min_price, Decimal::from(10));
        assert_eq!(params.max_price, Decimal::new(995, 1));
        assert_eq!(
            params.sellers,
            Some(vec!["acme".to_owned(), "bolt".to_owned()])
        );
        assert_eq!(params.categories, Some(vec!["tools".to_owned()]));
    }

    #[test]
    fn test_malformed_values_use_defaults() {
        let params = ProductListParams::from_query(&query(&[
            ("pmin", "cheap"),
            ("pmax", ""),
            ("sellers", "..."),
            ("page", "two"),
            ("page_size", "-4"),
        ]));
        assert_eq!(params, ProductListParams::default());
    }

    #[test]
    fn test_page_bounds() {
        let params =
            ProductListParams::from_query(&query(&[("page", "0"), ("page_size", "1000")]));
        assert_eq!(params.page, 1);
        assert_eq!(params.page_size, MAX_PAGE_SIZE);

        let params = ProductListParams::from_query(&query(&[("page", "3"), ("page_size", "0")]));
        assert_eq!(params.page_size, 1);
        assert_eq!(params.offset(), 2);
    }

    /// Walk every page over `total` rows and return the row indices covered.
    fn covered_rows(params: &ProductListParams, total: u64) -> Vec<i64> {
        let mut params = params.clone();
        let mut rows = Vec::new();
        for page in 1..=params.page_count(total) {
            params.page = u32::try_from(page).unwrap();
            let end = (params.offset() + params.limit()).min(i64::try_from(total).unwrap());
            rows.extend(params.offset()..end);
        }
        rows
    }

    #[test]
    fn test_pages_cover_rows_for_out_of_range_page_size() {
        let total = 300_u64;
        for page_size in [0, 1, 7, 100, 250, u32::MAX] {
            let params = ProductListParams {
                page_size,
                ..ProductListParams::default()
            };
            let expected: Vec<i64> = (0..300).collect();
            assert_eq!(covered_rows(&params, total), expected, "page_size {page_size}");
            assert_eq!(
                params.page_count(total),
                total.div_ceil(u64::from(params.effective_page_size()))
            );
        }

        let params = ProductListParams {
            page: 2,
            page_size: 250,
            ..ProductListParams::default()
        };
        assert_eq!(params.offset(), 100);
        assert_eq!(params.limit(), 100);
        assert_eq!(params.page_count(total), 3);
    }

    #[test]
    fn test_page_count() {
        let params = ProductListParams::default();
        assert_eq!(params.page_count(0), 0);
        assert_eq!(params.page_count(10), 1);
        assert_eq!(params.page_count(11), 2);
        assert_eq!(params.page_count(25), 3);
    }
}
