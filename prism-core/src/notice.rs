//! Transient user-facing notices.
//!
//! Every failure path and most successful state changes end in a notice. The
//! queue is bounded; the oldest notice is dropped when it is full.

use std::collections::VecDeque;

/// Maximum notices retained before the oldest is discarded.
pub const NOTICE_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Bounded FIFO of notices waiting to be shown.
#[derive(Debug, Default)]
pub struct NoticeQueue {
    items: VecDeque<Notice>,
}

impl NoticeQueue {
    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) {
        if self.items.len() == NOTICE_CAPACITY {
            self.items.pop_front();
        }
        let message = message.into();
        tracing::debug!(?level, %message, "notice");
        self.items.push_back(Notice { level, message });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Success, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message);
    }

    /// Removes and returns the oldest pending notice.
    pub fn pop(&mut self) -> Option<Notice> {
        self.items.pop_front()
    }

    /// Removes and returns every pending notice, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.items.drain(..).collect()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.items.back()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_drops_oldest_when_full() {
        let mut q = NoticeQueue::default();
        for i in 0..NOTICE_CAPACITY + 3 {
            q.info(format!("n{i}"));
        }
        assert_eq!(q.len(), NOTICE_CAPACITY);
        assert_eq!(q.pop().unwrap().message, "n3");
        assert_eq!(q.latest().unwrap().message, format!("n{}", NOTICE_CAPACITY + 2));
    }
}
