//! ---
//! ra_section: "01-core-functionality"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Shared primitives and utilities for the archive runtime."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity category of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
    Warning,
    Info,
}

/// Message shown to the dashboard user (rendered as a toast by the front end).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "error",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Info => "info",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_level_lowercase() {
        let value = serde_json::to_value(Notice::warning("Data belum lengkap")).unwrap();
        assert_eq!(value["level"], "warning");
        assert_eq!(value["message"], "Data belum lengkap");
    }

    #[test]
    fn display_prefixes_level() {
        assert_eq!(Notice::error("gagal").to_string(), "[error] gagal");
        assert!(Notice::error("gagal").is_error());
        assert!(!Notice::info("x").is_error());
    }
}
