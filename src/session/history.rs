/// Bounded undo/redo stack addressed by a cursor.
///
/// `entries[cursor]` is always the current state. Pushing discards anything
/// after the cursor; once `depth` entries are held the oldest is dropped.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: Vec<T>,
    cursor: usize,
    depth: usize,
}

impl<T: Clone + PartialEq> History<T> {
    pub fn new(initial: T, depth: usize) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
            depth: depth.max(1),
        }
    }

    pub fn current(&self) -> &T {
        &self.entries[self.cursor]
    }

    /// Records a new current state. Pushing the current state again is a no-op.
    pub fn push(&mut self, state: T) {
        if *self.current() == state {
            return;
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(state);
        if self.entries.len() > self.depth {
            let excess = self.entries.len() - self.depth;
            self.entries.drain(..excess);
        }
        self.cursor = self.entries.len() - 1;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn undo(&mut self) -> Option<&T> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.current())
    }

    pub fn redo(&mut self) -> Option<&T> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.current())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_cursor() {
        let mut history = History::new(0, 10);
        history.push(1);
        history.push(2);
        assert_eq!(history.undo(), Some(&1));
        assert_eq!(history.undo(), Some(&0));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), Some(&1));

        // A new push drops the redo tail.
        history.push(5);
        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        assert_eq!(*history.current(), 5);
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut history = History::new(0, 3);
        for n in 1..=5 {
            history.push(n);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.undo(), Some(&4));
        assert_eq!(history.undo(), Some(&3));
        assert_eq!(history.undo(), None);
    }

    #[test]
    fn test_duplicate_push_ignored() {
        let mut history = History::new("a", 5);
        history.push("a");
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
    }
}
