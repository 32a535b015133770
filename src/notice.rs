/// Transient user-facing notifications produced by editor actions

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short toast-style message: a title plus one line of description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl From<&Error> for Notice {
    fn from(err: &Error) -> Self {
        Notice::error(err.title(), err.to_string())
    }
}
