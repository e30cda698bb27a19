use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeVariant {
    Default,
    Destructive,
}

/// A short user-visible message (a "toast").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

impl Notice {
    pub fn success(description: impl Into<String>) -> Self {
        Self { title: "Success".into(), description: description.into(), variant: NoticeVariant::Default }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), variant: NoticeVariant::Destructive }
    }

    pub fn is_error(&self) -> bool {
        self.variant == NoticeVariant::Destructive
    }
}

/// Where views surface their notices.
pub trait NoticeSink: Send + Sync {
    fn push(&self, notice: Notice);
}

/// Collects notices in order; the presentation layer drains it.
#[derive(Clone, Default)]
pub struct NoticeBoard {
    inner: Arc<Mutex<Vec<Notice>>>,
}

impl NoticeBoard {
    pub fn new() -> Self { Self::default() }

    pub fn snapshot(&self) -> Vec<Notice> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.inner.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl NoticeSink for NoticeBoard {
    fn push(&self, notice: Notice) {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).push(notice);
    }
}

/// Writes notices to the log; used by the terminal front-end.
#[derive(Clone, Copy, Default)]
pub struct LogNotices;

impl NoticeSink for LogNotices {
    fn push(&self, notice: Notice) {
        match notice.variant {
            NoticeVariant::Default => tracing::info!(title = %notice.title, "{}", notice.description),
            NoticeVariant::Destructive => tracing::warn!(title = %notice.title, "{}", notice.description),
        }
    }
}
