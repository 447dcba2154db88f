//! Section navigator: which section is displayed, bounded by the section list.

use crate::error::{Result, ReviewError};

/// Tracks the displayed section index.
///
/// `current` is `None` until the first successful `go_to`; afterwards it is
/// always within `[0, count)`. `generation` increments on every move so that
/// late analysis responses can tell whether their section is still on screen.
#[derive(Debug, Default, Clone)]
pub struct Navigator {
    count: usize,
    current: Option<usize>,
    generation: u64,
}

impl Navigator {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            current: None,
            generation: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Moves to `index`. Out-of-range indices leave the navigator untouched.
    pub fn go_to(&mut self, index: usize) -> Result<usize> {
        if index >= self.count {
            return Err(ReviewError::InvalidSectionIndex {
                index,
                count: self.count,
            });
        }
        self.current = Some(index);
        self.generation += 1;
        Ok(index)
    }

    /// Target index for "next", saturating at the last section.
    ///
    /// Before any section is shown the first section is the target.
    pub fn next_index(&self) -> Result<usize> {
        match self.current {
            None if self.count > 0 => Ok(0),
            None => Err(ReviewError::InvalidSectionIndex { index: 0, count: 0 }),
            Some(i) if i + 1 >= self.count => Err(ReviewError::AtLastSection),
            Some(i) => Ok(i + 1),
        }
    }

    /// Target index for "previous", saturating at the first section.
    pub fn previous_index(&self) -> Result<usize> {
        match self.current {
            None if self.count > 0 => Ok(0),
            None => Err(ReviewError::InvalidSectionIndex { index: 0, count: 0 }),
            Some(0) => Err(ReviewError::AtFirstSection),
            Some(i) => Ok(i - 1),
        }
    }

    pub fn next(&mut self) -> Result<usize> {
        let target = self.next_index()?;
        self.go_to(target)
    }

    pub fn previous(&mut self) -> Result<usize> {
        let target = self.previous_index()?;
        self.go_to(target)
    }
}
