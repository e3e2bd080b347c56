//! Output classification and page rendering

use crate::domain::execution::ExecutionResult;

/// Markers that identify a complete markup document (matched lowercase)
const DOCUMENT_MARKERS: &[&str] = &["<html", "<!doctype"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    /// Already a full document, used verbatim
    Markup,
    /// Plain text, embedded in the wrapper page
    PlainText,
}

/// Decide whether `output` is already a full document. Total: never fails.
pub fn classify(output: &str) -> DocumentKind {
    let lower = output.to_lowercase();
    if DOCUMENT_MARKERS.iter().any(|marker| lower.contains(marker)) {
        DocumentKind::Markup
    } else {
        DocumentKind::PlainText
    }
}

/// Everything the publish directory receives for one attempt
#[derive(Clone, Debug)]
pub struct RenderedArtifact {
    pub source: String,
    pub document: String,
    pub kind: DocumentKind,
    pub manifest: String,
}

impl RenderedArtifact {
    pub fn from_execution(source: &str, execution: &ExecutionResult, source_file: &str) -> Self {
        let output = execution.output();
        let kind = classify(output);
        let document = match kind {
            DocumentKind::Markup => output.to_string(),
            DocumentKind::PlainText => wrap_plain_text(output),
        };

        Self {
            source: source.to_string(),
            document,
            kind,
            manifest: manifest(source_file),
        }
    }
}

/// Embed plain output in the fixed wrapper page
pub fn wrap_plain_text(output: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Generated Output</title>
    <style>
        body {{ background: #111827; color: #f9fafb; font-family: system-ui, sans-serif; margin: 0; padding: 2rem; }}
        main {{ max-width: 56rem; margin: 0 auto; }}
        h1 {{ color: #60a5fa; }}
        pre {{ background: #1f2937; color: #4ade80; padding: 1.5rem; border-radius: 0.5rem; white-space: pre-wrap; font-family: ui-monospace, monospace; }}
        footer {{ margin-top: 2rem; text-align: center; color: #9ca3af; }}
    </style>
</head>
<body>
    <main>
        <h1>Generated Output</h1>
        <pre>{}</pre>
        <footer>
            <p>Generated by LLM Code Deployment Tool</p>
        </footer>
    </main>
</body>
</html>
"#,
        escape_html(output)
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Provenance readme written next to the page
pub fn manifest(source_file: &str) -> String {
    format!(
        "# Generated Code Output

This page was automatically generated and deployed by the LLM Code Deployment Tool.

## Auto-Deployment

This project uses automated GitHub Pages deployment.

## Source Code

The code that generated this output is available in `{}`.
",
        source_file
    )
}
