//! Parent reconstruction for the flattened spreadsheet export.
//!
//! The sheet encodes hierarchy through a group of level columns: each row
//! populates exactly one of them, and the populated column's position is the
//! row's depth. The parent of a row is therefore not stated anywhere; it has
//! to be recovered from the codes of the rows above it.
//!
//! Example rows:
//!
//! ```text
//! code      Level1    Level2    Level3
//! 01000000  01000000
//! 20000002            20000002
//! 20000003                      20000003
//! 20000038            20000038
//! 16000000  16000000
//! ```
//!
//! `ParentStack` keeps the open ancestor chain (one code per depth) while the
//! rows are folded in source order. Processing is strictly sequential: a
//! row's parent depends on every preceding row.

/// Stack of open ancestor codes, innermost last.
#[derive(Debug, Default)]
pub struct ParentStack {
    stack: Vec<String>,
    current_level: usize,
}

impl ParentStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the parent code for a row at `level`, then record the row's
    /// own code for the rows below it.
    ///
    /// A row without a level (no level column populated) yields no parent
    /// and leaves the stack untouched, so later rows still resolve against
    /// the last well-formed chain. Popping past the bottom of the stack is
    /// treated as a return to root, not an error.
    pub fn resolve(&mut self, level: Option<usize>, code: &str) -> Option<String> {
        let Some(level) = level else {
            return None;
        };

        if level == 0 {
            self.reset_to_root(code);
            return None;
        }

        if level == self.current_level {
            // Sibling of the previous row: replace it on the stack.
            self.stack.pop();
            let parent = self.stack.last().cloned();
            self.stack.push(code.to_string());
            parent
        } else if level > self.current_level {
            // Child of the previous row.
            let parent = self.stack.last().cloned();
            self.stack.push(code.to_string());
            self.current_level = level;
            parent
        } else {
            // Back up to a shallower level, possibly skipping several.
            self.stack.pop();
            for _ in 0..self.current_level - level {
                self.stack.pop();
            }

            match self.stack.last().cloned() {
                Some(parent) => {
                    self.current_level = level;
                    self.stack.push(code.to_string());
                    Some(parent)
                }
                None => {
                    self.reset_to_root(code);
                    None
                }
            }
        }
    }

    fn reset_to_root(&mut self, code: &str) {
        self.stack.clear();
        self.current_level = 0;
        self.stack.push(code.to_string());
    }
}
