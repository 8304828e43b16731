use heapless::Vec;

/// Number of filters a node can hold.
pub const MAX_FILTERS: usize = 8;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FilterError {
    TableFull,
}

pub type Result<T> = core::result::Result<T, FilterError>;

/// Accepts group ids whose masked bits equal `value`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    pub mask: u16,
    pub value: u16,
}

impl Filter {
    pub fn new(mask: u16, value: u16) -> Self {
        Filter { mask, value }
    }

    pub fn matches(&self, group: u16) -> bool {
        group & self.mask == self.value
    }
}

/// Ordered filter table. Filters are evaluated in registration order and
/// the first match wins.
#[derive(Clone, Debug, Default)]
pub struct FilterTable {
    filters: Vec<Filter, MAX_FILTERS>,
}

impl FilterTable {
    pub fn new() -> Self {
        FilterTable { filters: Vec::new() }
    }

    pub fn register(&mut self, filter: Filter) -> Result<()> {
        self.filters
            .push(filter)
            .map_err(|_| FilterError::TableFull)
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    /// Returns the value of the first filter accepting `group`.
    pub fn find(&self, group: u16) -> Option<u16> {
        self.filters
            .iter()
            .find(|filter| filter.matches(group))
            .map(|filter| filter.value)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.filters.is_full()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::filter::{Filter, FilterError, FilterTable, MAX_FILTERS};

    #[test]
    fn filter_matches() {
        struct TestCase {
            mask: u16,
            value: u16,
            group: u16,
            matches: bool,
        }
        let test_cases = [
            TestCase {
                mask: 0x7ff,
                value: 0x010,
                group: 0x010,
                matches: true,
            },
            TestCase {
                mask: 0x7ff,
                value: 0x010,
                group: 0x011,
                matches: false,
            },
            TestCase {
                mask: 0x7f0,
                value: 0x010,
                group: 0x01f,
                matches: true,
            },
            TestCase {
                mask: 0x000,
                value: 0x000,
                group: 0x5a5,
                matches: true,
            },
            // a value with bits outside the mask can never match
            TestCase {
                mask: 0x0f0,
                value: 0x101,
                group: 0x101,
                matches: false,
            },
        ];
        for i in &test_cases {
            assert_eq!(Filter::new(i.mask, i.value).matches(i.group), i.matches)
        }
    }

    #[test]
    fn first_registered_filter_wins() {
        let mut table = FilterTable::new();
        table.register(Filter::new(0x700, 0x100)).unwrap();
        table.register(Filter::new(0x7ff, 0x123)).unwrap();

        assert_eq!(table.find(0x123), Some(0x100));
        assert_eq!(table.find(0x1ff), Some(0x100));
        assert_eq!(table.find(0x223), None);
    }

    #[test]
    fn table_capacity() {
        let mut table = FilterTable::new();
        for i in 0..MAX_FILTERS as u16 {
            assert_eq!(table.register(Filter::new(0x7ff, i)), Ok(()));
        }
        assert!(table.is_full());
        assert_eq!(
            table.register(Filter::new(0x7ff, 0x42)),
            Err(FilterError::TableFull)
        );
        assert_eq!(table.len(), MAX_FILTERS);
        assert_eq!(table.find(0x42), None);
        assert_eq!(table.iter().last(), Some(&Filter::new(0x7ff, 7)));
    }

    #[test]
    fn clear_makes_room() {
        let mut table = FilterTable::new();
        for i in 0..MAX_FILTERS as u16 {
            table.register(Filter::new(0x7ff, i)).unwrap();
        }
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.find(3), None);
        assert_eq!(table.register(Filter::new(0x7ff, 0x42)), Ok(()));
        assert_eq!(table.find(0x42), Some(0x42));
    }
}
