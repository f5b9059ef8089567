//! Target navigation
//!
//! An insertion-ordered history of star identifiers with a single cursor.
//! New identifiers are spliced immediately after the cursor rather than
//! appended, so a batch added mid-history is what `go_next` visits next.

use tracing::debug;

/// Ordered history of star identifiers (duplicates allowed) with a cursor.
///
/// The cursor is `None` exactly when the history is empty; otherwise it is a
/// valid index. Navigation moves the cursor only, never the sequence.
#[derive(Debug, Clone, Default)]
pub struct TargetNavigator {
    targets: Vec<String>,
    cursor: Option<usize>,
}

impl TargetNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identifiers in the history.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Identifier under the cursor, `None` when the history is empty.
    pub fn current(&self) -> Option<&str> {
        self.cursor.and_then(|i| self.targets.get(i)).map(String::as_str)
    }

    /// Splice identifiers in immediately after the cursor.
    ///
    /// The cursor ends on the *first* newly inserted identifier, so an
    /// immediately following `go_next` visits the rest in order. Blank
    /// identifiers are skipped; an entirely empty batch is a no-op. Adding
    /// to an empty history puts the cursor at 0.
    pub fn add<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let incoming: Vec<String> = ids
            .into_iter()
            .map(Into::into)
            .filter(|id| !id.trim().is_empty())
            .collect();
        if incoming.is_empty() {
            return;
        }
        let insert_at = match self.cursor {
            Some(i) => i + 1,
            None => 0,
        };
        debug!(added = incoming.len(), at = insert_at, "targets spliced in");
        self.targets.splice(insert_at..insert_at, incoming);
        self.cursor = Some(insert_at);
    }

    /// Add a single identifier; identical to adding a one-element batch.
    pub fn add_one(&mut self, id: impl Into<String>) {
        self.add(std::iter::once(id.into()));
    }

    pub fn has_previous(&self) -> bool {
        matches!(self.cursor, Some(i) if i > 0)
    }

    pub fn has_next(&self) -> bool {
        matches!(self.cursor, Some(i) if i + 1 < self.targets.len())
    }

    /// Step back one identifier and return it; `None` (no movement) at the
    /// start or when empty.
    pub fn go_previous(&mut self) -> Option<&str> {
        match self.cursor {
            Some(i) if i > 0 => {
                self.cursor = Some(i - 1);
                self.targets.get(i - 1).map(String::as_str)
            }
            _ => None,
        }
    }

    /// Step forward one identifier and return it; `None` (no movement) at
    /// the end or when empty.
    pub fn go_next(&mut self) -> Option<&str> {
        match self.cursor {
            Some(i) if i + 1 < self.targets.len() => {
                self.cursor = Some(i + 1);
                self.targets.get(i + 1).map(String::as_str)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_adds_keep_order_and_cursor() {
        let mut nav = TargetNavigator::new();
        nav.add_one("A");
        nav.add_one("B");
        nav.add_one("C");
        assert_eq!(nav.len(), 3);
        assert_eq!(nav.current(), Some("C"));

        assert_eq!(nav.go_previous(), Some("B"));
        assert_eq!(nav.go_previous(), Some("A"));
        assert_eq!(nav.go_previous(), None);
        assert_eq!(nav.current(), Some("A"));
        assert_eq!(nav.go_next(), Some("B"));
        assert_eq!(nav.go_next(), Some("C"));
        assert_eq!(nav.go_next(), None);
    }

    #[test]
    fn test_empty_navigator() {
        let mut nav = TargetNavigator::new();
        assert!(nav.current().is_none());
        assert!(!nav.has_previous());
        assert!(!nav.has_next());
        assert!(nav.go_previous().is_none());
        assert!(nav.go_next().is_none());
    }

    #[test]
    fn test_batch_add_cursor_lands_on_first_new() {
        let mut nav = TargetNavigator::new();
        nav.add(["X", "Y", "Z"]);
        assert_eq!(nav.current(), Some("X"));
        assert_eq!(nav.go_next(), Some("Y"));
        assert_eq!(nav.go_next(), Some("Z"));
    }

    #[test]
    fn test_mid_history_splice() {
        let mut nav = TargetNavigator::new();
        nav.add(["A", "B", "C"]);
        // Cursor sits on A; a new batch lands between A and B.
        nav.add(["X", "Y"]);
        assert_eq!(nav.current(), Some("X"));
        assert_eq!(nav.go_next(), Some("Y"));
        assert_eq!(nav.go_next(), Some("B"));
        assert_eq!(nav.go_next(), Some("C"));
        assert_eq!(nav.len(), 5);
    }

    #[test]
    fn test_single_element_batch_equals_bare_add() {
        let mut nav_bare = TargetNavigator::new();
        nav_bare.add_one("ST Tri");
        let mut nav_list = TargetNavigator::new();
        nav_list.add(["ST Tri"]);
        assert_eq!(nav_bare.current(), nav_list.current());
        assert_eq!(nav_bare.len(), nav_list.len());
    }

    #[test]
    fn test_blank_identifiers_are_skipped() {
        let mut nav = TargetNavigator::new();
        nav.add(["", "  "]);
        assert!(nav.is_empty());
        assert!(nav.current().is_none());
        nav.add(["", "RR Lyr", " "]);
        assert_eq!(nav.len(), 1);
        assert_eq!(nav.current(), Some("RR Lyr"));
    }

    #[test]
    fn test_duplicates_are_allowed() {
        let mut nav = TargetNavigator::new();
        nav.add_one("A");
        nav.add_one("A");
        assert_eq!(nav.len(), 2);
    }
}
