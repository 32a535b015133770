//! Editor session: the two text buffers the user edits.
//!
//! The session is a plain value passed by reference to whoever needs it (the
//! assembler, the workbench, the CLI); there is no ambient editor state.

use crate::{Assembler, Notice, Result, Target};
use std::path::Path;

/// Which of the two buffers an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Markup,
    Style,
}

impl BufferKind {
    pub fn label(self) -> &'static str {
        match self {
            BufferKind::Markup => "HTML",
            BufferKind::Style => "CSS",
        }
    }
}

/// Markup and style buffers plus a revision counter bumped on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorSession {
    markup: String,
    style: String,
    revision: u64,
}

impl EditorSession {
    pub fn new(markup: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            style: style.into(),
            revision: 0,
        }
    }

    /// A session seeded with the starter page the editor opens with.
    pub fn with_starter() -> Self {
        Self::new(STARTER_MARKUP, STARTER_STYLE)
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn buffer(&self, kind: BufferKind) -> &str {
        match kind {
            BufferKind::Markup => &self.markup,
            BufferKind::Style => &self.style,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_markup(&mut self, text: impl Into<String>) {
        self.set(BufferKind::Markup, text.into());
    }

    pub fn set_style(&mut self, text: impl Into<String>) {
        self.set(BufferKind::Style, text.into());
    }

    /// Replace a buffer; the revision only moves when the text changed.
    pub fn set(&mut self, kind: BufferKind, text: String) {
        let slot = match kind {
            BufferKind::Markup => &mut self.markup,
            BufferKind::Style => &mut self.style,
        };
        if *slot != text {
            *slot = text;
            self.revision += 1;
        }
    }

    /// Bulk-replace a buffer with the full contents of a local text file.
    pub fn load_file(&mut self, kind: BufferKind, path: impl AsRef<Path>) -> Result<Notice> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::info!(
            "loaded {} buffer from {} ({} bytes)",
            kind.label(),
            path.as_ref().display(),
            text.len()
        );
        self.set(kind, text);
        Ok(Notice::success(
            "File uploaded successfully",
            format!("{} file has been loaded into the editor.", kind.label()),
        ))
    }

    pub fn load_markup_file(&mut self, path: impl AsRef<Path>) -> Result<Notice> {
        self.load_file(BufferKind::Markup, path)
    }

    pub fn load_style_file(&mut self, path: impl AsRef<Path>) -> Result<Notice> {
        self.load_file(BufferKind::Style, path)
    }

    /// Empty both buffers.
    pub fn clear(&mut self) -> Notice {
        self.set(BufferKind::Markup, String::new());
        self.set(BufferKind::Style, String::new());
        Notice::success("Code cleared", "Both HTML and CSS editors have been cleared.")
    }

    /// Force consumers to treat the buffers as changed.
    pub fn touch(&mut self) {
        self.revision += 1;
    }

    /// Assemble the session's buffers for `target`.
    pub fn assemble(&self, assembler: &Assembler, target: Target) -> String {
        assembler.assemble(&self.markup, &self.style, target)
    }
}

const STARTER_MARKUP: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Your Creation</title>
</head>
<body>
    <div class="container">
        <h1>Welcome to Your HTML/CSS Playground</h1>
        <p>Start editing the code to see your creation come to life!</p>
        <div class="card">
            <h2>Beautiful Card Component</h2>
            <p>This is a sample card with modern styling.</p>
            <button class="btn">Click Me</button>
        </div>
    </div>
</body>
</html>"#;

const STARTER_STYLE: &str = r#"/* Modern CSS Styles */
body {
    margin: 0;
    padding: 20px;
    font-family: 'Arial', sans-serif;
    background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
    min-height: 100vh;
    color: #333;
}

.container {
    max-width: 800px;
    margin: 0 auto;
    padding: 20px;
}

.card {
    background: white;
    padding: 30px;
    border-radius: 15px;
    box-shadow: 0 10px 30px rgba(0,0,0,0.2);
}

.btn {
    background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
    color: white;
    border: none;
    padding: 12px 24px;
    border-radius: 8px;
    cursor: pointer;
}"#;
