//! Dialog seam between page controllers and whatever front-end shows them.
//!
//! Controllers never print. Everything the operator sees goes through a
//! [`Notifier`].

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogKind {
    Success,
    Error,
    Warning,
    Info,
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        })
    }
}

/// A modal message: kind, title, and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub kind: DialogKind,
    pub title: String,
    pub text: String,
}

impl Dialog {
    pub fn new(kind: DialogKind, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            text: text.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn show(&self, dialog: Dialog);

    /// Ask a yes/no question. `false` cancels the pending operation.
    fn confirm(&self, title: &str, text: &str) -> bool;

    fn success(&self, title: &str, text: &str) {
        self.show(Dialog::new(DialogKind::Success, title, text));
    }

    fn error(&self, title: &str, text: &str) {
        self.show(Dialog::new(DialogKind::Error, title, text));
    }

    fn warning(&self, title: &str, text: &str) {
        self.show(Dialog::new(DialogKind::Warning, title, text));
    }

    fn info(&self, title: &str, text: &str) {
        self.show(Dialog::new(DialogKind::Info, title, text));
    }
}
