//! Keyboard model over the visible suggestion list.

use crate::domain::Address;

/// Keys the suggestion list reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
}

/// Result of feeding a key to the list.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    /// Highlight moved.
    Moved(usize),
    /// The highlighted suggestion was chosen; the list is now closed.
    Commit(Address),
    /// The list was closed.
    Closed,
    /// Nothing to do (list closed or empty, or Enter with no highlight).
    Ignored,
}

/// Suggestions plus highlight and open state.
#[derive(Debug, Clone, Default)]
pub struct SuggestionList {
    items: Vec<Address>,
    highlighted: Option<usize>,
    open: bool,
}

impl SuggestionList {
    pub fn items(&self) -> &[Address] {
        &self.items
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Show a fresh result set. An empty set still opens the list so a
    /// "no results" state can be shown.
    pub fn replace(&mut self, items: Vec<Address>) {
        self.items = items;
        self.highlighted = None;
        self.open = true;
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.highlighted = None;
        self.open = false;
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.highlighted = None;
    }

    /// Choose the suggestion at `index` and close the list.
    pub fn take(&mut self, index: usize) -> Option<Address> {
        let address = self.items.get(index).cloned()?;
        self.close();
        Some(address)
    }

    pub fn handle(&mut self, key: Key) -> KeyOutcome {
        if !self.open || self.items.is_empty() {
            return KeyOutcome::Ignored;
        }

        let last = self.items.len() - 1;
        match key {
            Key::ArrowDown => {
                let next = match self.highlighted {
                    Some(i) if i < last => i + 1,
                    _ => 0,
                };
                self.highlighted = Some(next);
                KeyOutcome::Moved(next)
            }
            Key::ArrowUp => {
                let next = match self.highlighted {
                    Some(i) if i > 0 => i - 1,
                    _ => last,
                };
                self.highlighted = Some(next);
                KeyOutcome::Moved(next)
            }
            Key::Enter => match self.highlighted.and_then(|i| self.take(i)) {
                Some(address) => KeyOutcome::Commit(address),
                None => KeyOutcome::Ignored,
            },
            Key::Escape => {
                self.close();
                KeyOutcome::Closed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(n: usize) -> SuggestionList {
        let mut list = SuggestionList::default();
        list.replace(
            (0..n)
                .map(|i| Address::new(format!("Herzl {i}"), "32.0", "34.8"))
                .collect(),
        );
        list
    }

    #[test]
    fn arrow_down_wraps_to_first() {
        let mut l = list(3);
        assert_eq!(l.handle(Key::ArrowDown), KeyOutcome::Moved(0));
        assert_eq!(l.handle(Key::ArrowDown), KeyOutcome::Moved(1));
        assert_eq!(l.handle(Key::ArrowDown), KeyOutcome::Moved(2));
        assert_eq!(l.handle(Key::ArrowDown), KeyOutcome::Moved(0));
    }

    #[test]
    fn arrow_up_wraps_to_last() {
        let mut l = list(3);
        assert_eq!(l.handle(Key::ArrowUp), KeyOutcome::Moved(2));
        assert_eq!(l.handle(Key::ArrowUp), KeyOutcome::Moved(1));
        assert_eq!(l.handle(Key::ArrowUp), KeyOutcome::Moved(0));
        assert_eq!(l.handle(Key::ArrowUp), KeyOutcome::Moved(2));
    }

    #[test]
    fn enter_without_highlight_is_noop() {
        let mut l = list(2);
        assert_eq!(l.handle(Key::Enter), KeyOutcome::Ignored);
        assert!(l.is_open());
    }

    #[test]
    fn enter_commits_and_closes() {
        let mut l = list(3);
        l.handle(Key::ArrowDown);
        l.handle(Key::ArrowDown);

        let KeyOutcome::Commit(address) = l.handle(Key::Enter) else {
            panic!("expected a commit");
        };
        assert_eq!(address.display_name, "Herzl 1");
        assert!(!l.is_open());
        assert_eq!(l.highlighted(), None);
    }

    #[test]
    fn escape_closes_and_resets() {
        let mut l = list(3);
        l.handle(Key::ArrowDown);
        assert_eq!(l.handle(Key::Escape), KeyOutcome::Closed);
        assert!(!l.is_open());
        assert_eq!(l.highlighted(), None);

        // Closed list ignores navigation
        assert_eq!(l.handle(Key::ArrowDown), KeyOutcome::Ignored);
    }

    #[test]
    fn empty_list_ignores_keys() {
        let mut l = list(0);
        assert!(l.is_open());
        assert_eq!(l.handle(Key::ArrowDown), KeyOutcome::Ignored);
        assert_eq!(l.handle(Key::Escape), KeyOutcome::Ignored);
    }

    #[test]
    fn take_out_of_range() {
        let mut l = list(2);
        assert_eq!(l.take(5), None);
        assert!(l.is_open());
        assert_eq!(l.take(1).map(|a| a.display_name), Some("Herzl 1".into()));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn list(n: usize) -> SuggestionList {
        let mut list = SuggestionList::default();
        list.replace(
            (0..n)
                .map(|i| Address::new(i.to_string(), "0", "0"))
                .collect(),
        );
        list
    }

    proptest! {
        /// n presses of ArrowDown from the top land back on the top
        #[test]
        fn full_cycle_down(n in 1usize..20) {
            let mut l = list(n);
            l.handle(Key::ArrowDown);
            for _ in 0..n {
                l.handle(Key::ArrowDown);
            }
            prop_assert_eq!(l.highlighted(), Some(0));
        }

        /// The highlight is always a valid index
        #[test]
        fn highlight_in_bounds(
            n in 1usize..10,
            keys in prop::collection::vec(
                prop_oneof![Just(Key::ArrowDown), Just(Key::ArrowUp)],
                0..50,
            ),
        ) {
            let mut l = list(n);
            for key in keys {
                l.handle(key);
                if let Some(i) = l.highlighted() {
                    prop_assert!(i < n);
                }
            }
        }

        /// Down then up returns to the same index
        #[test]
        fn down_up_inverse(n in 1usize..10, steps in 1usize..30) {
            let mut l = list(n);
            for _ in 0..steps {
                l.handle(Key::ArrowDown);
            }
            let before = l.highlighted();
            l.handle(Key::ArrowDown);
            l.handle(Key::ArrowUp);
            prop_assert_eq!(l.highlighted(), before);
        }
    }
}
