//! Plain-text and JSON renderings of a session for the command line.

use serde::Serialize;
use std::fmt::Write;

use planmark_annotator::{AnnotationNode, AnnotatorSession};

/// One annotation in a JSON forest dump.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForestEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    pub page: u32,
    pub children: Vec<ForestEntry>,
}

impl From<&AnnotationNode<'_>> for ForestEntry {
    fn from(node: &AnnotationNode<'_>) -> Self {
        let a = node.annotation;
        Self {
            id: a.id.to_string(),
            kind: a.kind().to_string(),
            label: a.label.clone(),
            page: a.page_number,
            children: node.children.iter().map(ForestEntry::from).collect(),
        }
    }
}

pub fn forest_entries(session: &AnnotatorSession) -> Vec<ForestEntry> {
    session.store().forest().iter().map(ForestEntry::from).collect()
}

/// Indented annotation forest, one annotation per line.
pub fn render_forest(session: &AnnotatorSession) -> String {
    fn walk(node: &AnnotationNode<'_>, depth: usize, out: &mut String) {
        let a = node.annotation;
        let _ = writeln!(
            out,
            "{}{} [{} {}]",
            "  ".repeat(depth),
            a.label,
            a.kind(),
            a.id
        );
        for child in &node.children {
            walk(child, depth + 1, out);
        }
    }

    let mut out = String::new();
    for root in session.store().forest() {
        walk(&root, 0, &mut out);
    }
    out
}

/// Breadcrumbs, then the annotations left visible, then the hidden count.
pub fn render_visible(session: &AnnotatorSession) -> String {
    let mut out = String::new();

    let crumbs: Vec<String> = session
        .breadcrumbs()
        .into_iter()
        .map(|c| format!("{} {}", c.icon, c.name))
        .collect();
    if !crumbs.is_empty() {
        let _ = writeln!(out, "{}", crumbs.join(" › "));
    }

    for a in session.visible_annotations() {
        let _ = writeln!(out, "  {} [{} {}]", a.label, a.kind(), a.id);
    }
    let _ = writeln!(out, "{} hidden", session.hidden().len());
    out
}
