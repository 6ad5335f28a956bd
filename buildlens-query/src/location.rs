//! The list URL's history stack.
//!
//! The query string is the single source of truth for committed state. Every
//! write goes through [`Location::navigate`]; readers decode
//! [`Location::current`] after each change instead of caching what they wrote.

/// A request to move to a new query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Adds a history entry (explicit filter application).
    Push(String),
    /// Rewrites the current entry (tab switches, default redirects).
    Replace(String),
}

impl Navigation {
    pub fn query(&self) -> &str {
        match self {
            Navigation::Push(query) | Navigation::Replace(query) => query,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    entries: Vec<String>,
    index: usize,
}

impl Location {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![normalize(initial.into())],
            index: 0,
        }
    }

    pub fn current(&self) -> &str {
        &self.entries[self.index]
    }

    /// Apply `nav`. Returns `true` when the current query string changed.
    ///
    /// Pushing the query already shown is a no-op, so re-applying identical
    /// filters does not grow history.
    pub fn navigate(&mut self, nav: Navigation) -> bool {
        match nav {
            Navigation::Push(query) => {
                let query = normalize(query);
                if query == self.current() {
                    return false;
                }
                self.entries.truncate(self.index + 1);
                self.entries.push(query);
                self.index += 1;
                true
            }
            Navigation::Replace(query) => {
                let query = normalize(query);
                let changed = query != self.current();
                self.entries[self.index] = query;
                changed
            }
        }
    }

    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Number of history entries.
    pub fn history_len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(String::new())
    }
}

fn normalize(query: String) -> String {
    match query.strip_prefix('?') {
        Some(stripped) => stripped.to_string(),
        None => query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_grows_history_replace_does_not() {
        let mut loc = Location::new("?a=1");
        assert_eq!(loc.current(), "a=1");

        assert!(loc.navigate(Navigation::Push("a=2".to_string())));
        assert_eq!(loc.history_len(), 2);

        assert!(loc.navigate(Navigation::Replace("a=3".to_string())));
        assert_eq!(loc.history_len(), 2);
        assert_eq!(loc.current(), "a=3");
    }

    #[test]
    fn test_push_same_query_is_noop() {
        let mut loc = Location::new("a=1");
        assert!(!loc.navigate(Navigation::Push("?a=1".to_string())));
        assert_eq!(loc.history_len(), 1);
    }

    #[test]
    fn test_back_forward_and_truncation() {
        let mut loc = Location::new("");
        loc.navigate(Navigation::Push("a=1".to_string()));
        loc.navigate(Navigation::Push("a=2".to_string()));

        assert!(loc.back());
        assert_eq!(loc.current(), "a=1");
        assert!(loc.forward());
        assert_eq!(loc.current(), "a=2");
        assert!(!loc.forward());

        loc.back();
        loc.navigate(Navigation::Push("b=1".to_string()));
        assert_eq!(loc.history_len(), 3);
        assert!(!loc.forward());

        loc.back();
        loc.back();
        assert_eq!(loc.current(), "");
        assert!(!loc.back());
    }
}
