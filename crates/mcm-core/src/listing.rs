//! Client-side filtering, sorting and pagination over a fetched set.

use std::cmp::Ordering;

/// What a list view asks for. Sort keys are interpreted per view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Case-insensitive substring filter; `None` or blank keeps everything.
    pub search: Option<String>,
    pub sort: Option<String>,
    pub descending: bool,
    /// 1-based.
    pub page: u32,
    pub per_page: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort: None,
            descending: false,
            page: 1,
            per_page: 20,
        }
    }
}

impl ListQuery {
    pub fn with_page_size(per_page: u32) -> Self {
        Self {
            per_page,
            ..Self::default()
        }
    }

    /// Normalized search needle, if any.
    pub fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }

    /// Whether any of `fields` contains the search needle.
    pub fn matches<'a, I>(&self, fields: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        match self.needle() {
            None => true,
            Some(needle) => fields
                .into_iter()
                .any(|f| f.to_lowercase().contains(&needle)),
        }
    }

    /// The sort key, or `default` when none (or an unknown one) was asked for.
    pub fn sort_key<'a>(&'a self, known: &[&str], default: &'a str) -> &'a str {
        match self.sort.as_deref() {
            Some(k) if known.contains(&k) => k,
            _ => default,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// The current page number (1-based).
    pub page: u32,
    pub per_page: u32,
    /// Items matching the filter, across all pages.
    pub total: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Filter, sort (stable) and cut one page out of `items`.
///
/// `compare` gives ascending order; `descending` reverses it.
/// Pages past the end come back empty with the real totals.
pub fn paginate<T, F, C>(
    items: Vec<T>,
    query: &ListQuery,
    filter: F,
    mut compare: C,
) -> Page<T>
where
    F: Fn(&T) -> bool,
    C: FnMut(&T, &T) -> Ordering,
{
    let page = query.page.max(1);
    let per_page = query.per_page.max(1);

    let mut items: Vec<T> = items.into_iter().filter(|i| filter(i)).collect();
    if query.descending {
        items.sort_by(|a, b| compare(b, a));
    } else {
        items.sort_by(|a, b| compare(a, b));
    }

    let total = u64::try_from(items.len()).unwrap_or(u64::MAX);
    let total_pages = if total == 0 {
        0
    } else {
        total.div_ceil(u64::from(per_page)) as u32
    };

    let offset = usize::try_from(page - 1)
        .unwrap_or(usize::MAX)
        .saturating_mul(usize::try_from(per_page).unwrap_or(usize::MAX));
    let items = items
        .into_iter()
        .skip(offset)
        .take(usize::try_from(per_page).unwrap_or(usize::MAX))
        .collect();

    Page {
        items,
        page,
        per_page,
        total,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<&'static str> {
        vec!["delta", "alpha", "charlie", "bravo", "echo"]
    }

    #[test]
    fn sorts_and_pages() {
        let q = ListQuery {
            per_page: 2,
            page: 2,
            ..ListQuery::default()
        };
        let p = paginate(names(), &q, |_| true, |a, b| a.cmp(b));
        assert_eq!(p.items, vec!["charlie", "delta"]);
        assert_eq!(p.total, 5);
        assert_eq!(p.total_pages, 3);
    }

    #[test]
    fn descending_reverses_order() {
        let q = ListQuery {
            descending: true,
            ..ListQuery::default()
        };
        let p = paginate(names(), &q, |_| true, |a, b| a.cmp(b));
        assert_eq!(p.items.first(), Some(&"echo"));
        assert_eq!(p.items.last(), Some(&"alpha"));
    }

    #[test]
    fn search_filters_case_insensitively() {
        let q = ListQuery {
            search: Some("  HA ".into()),
            ..ListQuery::default()
        };
        let p = paginate(names(), &q, |n| q.matches([*n]), |a, b| a.cmp(b));
        assert_eq!(p.items, vec!["alpha", "charlie"]);
    }

    #[test]
    fn page_past_end_is_empty_with_totals() {
        let q = ListQuery {
            page: 9,
            per_page: 2,
            ..ListQuery::default()
        };
        let p = paginate(names(), &q, |_| true, |a, b| a.cmp(b));
        assert!(p.is_empty());
        assert_eq!(p.total, 5);
        assert_eq!(p.total_pages, 3);
    }

    #[test]
    fn zero_page_and_size_are_clamped() {
        let q = ListQuery {
            page: 0,
            per_page: 0,
            ..ListQuery::default()
        };
        let p = paginate(names(), &q, |_| true, |a, b| a.cmp(b));
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 1);
        assert_eq!(p.items, vec!["alpha"]);
    }

    #[test]
    fn empty_input_has_zero_pages() {
        let p = paginate(Vec::<u8>::new(), &ListQuery::default(), |_| true, |a, b| a.cmp(b));
        assert_eq!(p.total, 0);
        assert_eq!(p.total_pages, 0);
    }

    #[test]
    fn unknown_sort_key_falls_back() {
        let q = ListQuery {
            sort: Some("shoe_size".into()),
            ..ListQuery::default()
        };
        assert_eq!(q.sort_key(&["name", "joined"], "name"), "name");
        let q = ListQuery {
            sort: Some("joined".into()),
            ..ListQuery::default()
        };
        assert_eq!(q.sort_key(&["name", "joined"], "name"), "joined");
    }
}
