//! Fixed-size page slicing.
//!
//! Requested page numbers never fail: anything below 1 or unparseable reads
//! as the first page, anything past the end reads as the last page.

use std::num::NonZeroU32;

use yatube_types::api::Page;

pub const DEFAULT_PAGE_SIZE: NonZeroU32 = NonZeroU32::new(10).unwrap();

/// Lenient parse of a `?page=` query value. Non-numeric input means "no page requested".
pub fn parse_page(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse().ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: NonZeroU32,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Paginator {
    pub fn new(per_page: NonZeroU32) -> Self {
        Self { per_page }
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.get()
    }

    pub fn num_pages(&self, total: u64) -> u32 {
        let pages = total.div_ceil(u64::from(self.per_page())).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Resolve `requested` against a listing of `total` items.
    pub fn window(&self, total: u64, requested: Option<i64>) -> PageWindow {
        let num_pages = self.num_pages(total);
        let number = match requested {
            Some(n) if n > i64::from(num_pages) => num_pages,
            Some(n) if n >= 1 => n as u32,
            _ => 1,
        };

        PageWindow {
            number,
            num_pages,
            per_page: self.per_page(),
            total,
        }
    }

    /// Slice an in-memory sequence.
    pub fn paginate<T>(&self, items: Vec<T>, requested: Option<i64>) -> Page<T> {
        let window = self.window(items.len() as u64, requested);
        let start = usize::try_from(window.offset()).unwrap_or(usize::MAX);
        let items = items
            .into_iter()
            .skip(start)
            .take(window.per_page as usize)
            .collect();
        window.page(items)
    }
}

/// A resolved page position: what to fetch (`offset`/`limit`) and how to describe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u32,
    pub num_pages: u32,
    pub per_page: u32,
    pub total: u64,
}

impl PageWindow {
    pub fn offset(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> u32 {
        self.per_page
    }

    pub fn page<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            per_page: self.per_page,
            total: self.total,
            has_previous: self.number > 1,
            has_next: self.number < self.num_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paginator(per_page: u32) -> Paginator {
        Paginator::new(NonZeroU32::new(per_page).unwrap())
    }

    #[test]
    fn thirteen_items_split_ten_and_three() {
        let p = paginator(10);
        let items: Vec<u32> = (1..=13).collect();

        let first = p.paginate(items.clone(), None);
        assert_eq!(first.len(), 10);
        assert_eq!(first.number, 1);
        assert!(!first.has_previous);
        assert!(first.has_next);

        let second = p.paginate(items, Some(2));
        assert_eq!(second.items, vec![11, 12, 13]);
        assert!(second.has_previous);
        assert!(!second.has_next);
        assert_eq!(second.total, 13);
    }

    #[test]
    fn out_of_range_clamps() {
        let p = paginator(10);
        let items: Vec<u32> = (1..=25).collect();

        assert_eq!(p.paginate(items.clone(), Some(99)).number, 3);
        assert_eq!(p.paginate(items.clone(), Some(99)).items, vec![21, 22, 23, 24, 25]);
        assert_eq!(p.paginate(items.clone(), Some(0)).number, 1);
        assert_eq!(p.paginate(items, Some(-4)).number, 1);
    }

    #[test]
    fn empty_listing_has_one_empty_page() {
        let p = paginator(10);
        let page = p.paginate(Vec::<u32>::new(), Some(5));
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(page.is_empty());
        assert!(!page.has_next);
    }

    #[test]
    fn pages_cover_every_item_exactly_once() {
        for per_page in 1..=7u32 {
            for n in 0..=30u32 {
                let p = paginator(per_page);
                let items: Vec<u32> = (0..n).collect();
                let num_pages = p.num_pages(u64::from(n));
                if n > 0 {
                    assert_eq!(num_pages, n.div_ceil(per_page));
                }

                let mut seen = Vec::new();
                for number in 1..=num_pages {
                    let page = p.paginate(items.clone(), Some(i64::from(number)));
                    assert!(n == 0 || !page.is_empty());
                    seen.extend(page.items);
                }
                assert_eq!(seen, items);
            }
        }
    }

    #[test]
    fn parse_page_is_lenient() {
        assert_eq!(parse_page(Some("2")), Some(2));
        assert_eq!(parse_page(Some(" 3 ")), Some(3));
        assert_eq!(parse_page(Some("last")), None);
        assert_eq!(parse_page(Some("")), None);
        assert_eq!(parse_page(None), None);
    }

    #[test]
    fn window_offsets() {
        let window = paginator(10).window(35, Some(3));
        assert_eq!(window.offset(), 20);
        assert_eq!(window.limit(), 10);
        assert_eq!(window.num_pages, 4);
    }
}
