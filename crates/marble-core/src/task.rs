//! Task-list content codec.
//!
//! Task nodes store their items as newline-delimited text, one item per
//! line, each prefixed `[ ] ` (open) or `[x] ` (done). Internally the list
//! is an ordered `TaskList`; the text form exists only at the storage and
//! export boundary. Re-encoding keeps the exact `[ ] ` / `[x] ` prefixes.
//! Content that is already in canonical form comes back unchanged; blank
//! lines are dropped and unprefixed lines gain an open `[ ] ` prefix.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use winnow::combinator::{alt, opt};
use winnow::prelude::*;
use winnow::token::rest;

const OPEN_PREFIX: &str = "[ ] ";
const DONE_PREFIX: &str = "[x] ";

/// A single checklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub text: String,
    pub completed: bool,
}

impl TaskItem {
    pub fn new(text: impl Into<String>, completed: bool) -> Self {
        Self {
            text: text.into(),
            completed,
        }
    }
}

/// Ordered checklist decoded from a task node's content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    items: SmallVec<[TaskItem; 4]>,
}

impl TaskList {
    /// Decode task content. Blank lines are skipped; a line without a
    /// recognised prefix is an open item carrying the whole line.
    pub fn parse(content: &str) -> Self {
        let items = content
            .split('\n')
            .filter(|line| !line.is_empty())
            .map(|line| {
                let mut input = line;
                task_line
                    .parse_next(&mut input)
                    .unwrap_or_else(|_| TaskItem::new(line, false))
            })
            .collect();
        Self { items }
    }

    /// Encode back to the bracket-prefixed line format.
    pub fn to_content(&self) -> String {
        self.items
            .iter()
            .map(|item| {
                let prefix = if item.completed { DONE_PREFIX } else { OPEN_PREFIX };
                format!("{prefix}{}", item.text)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Flip completion of the item at `index`. Returns false when out of range.
    pub fn toggle(&mut self, index: usize) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                item.completed = !item.completed;
                true
            }
            None => false,
        }
    }

    /// Append an open item. Whitespace-only text is ignored.
    pub fn push(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.items.push(TaskItem::new(text, false));
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<TaskItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|i| i.completed).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskItem> {
        self.items.iter()
    }
}

impl FromIterator<TaskItem> for TaskList {
    fn from_iter<I: IntoIterator<Item = TaskItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

fn task_line(input: &mut &str) -> ModalResult<TaskItem> {
    let completed = opt(alt((OPEN_PREFIX.value(false), DONE_PREFIX.value(true)))).parse_next(input)?;
    let text = rest.parse_next(input)?;
    Ok(TaskItem::new(text, completed.unwrap_or(false)))
}
