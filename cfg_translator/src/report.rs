use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use chartparse::Tree;
use itertools::Itertools;
use serde::Serialize;

use crate::corpus::CorpusEntry;
use crate::pipeline::{CoverageSummary, SentenceResult};

/// Stands in for tree and text fields of sentences that did not parse.
pub const NOT_PARSED: &str = "Not Parsed";

/// One line of the JSON Lines report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub original: String,
    pub tokens: String,
    pub reference: String,
    pub parsed: bool,
    pub parsed_tree: String,
    pub parsed_tree_single_line: String,
    pub rewritten_tree: String,
    pub rewritten_tree_single_line: String,
    pub rewritten_text: String,
    pub translation: String,
}

impl ReportRow {
    pub fn new(entry: &CorpusEntry, result: &SentenceResult) -> Self {
        let (parsed_tree, parsed_tree_single_line) = tree_fields(result.outcome.tree());
        let (rewritten_tree, rewritten_tree_single_line) = tree_fields(result.rewritten.as_ref());
        ReportRow {
            original: entry.source.clone(),
            tokens: result.tokens.join(" "),
            reference: entry.reference.clone(),
            parsed: result.is_parsed(),
            parsed_tree,
            parsed_tree_single_line,
            rewritten_tree,
            rewritten_tree_single_line,
            rewritten_text: result
                .rewritten_text()
                .unwrap_or_else(|| NOT_PARSED.to_string()),
            translation: result.translation.clone(),
        }
    }
}

fn tree_fields(tree: Option<&Tree>) -> (String, String) {
    match tree {
        Some(tree) => (tree.to_string(), single_line(tree)),
        None => (NOT_PARSED.to_string(), NOT_PARSED.to_string()),
    }
}

/// The indented rendering folded onto one line.
fn single_line(tree: &Tree) -> String {
    let mut out = String::new();
    for line in tree.pretty().lines().map(str::trim) {
        if !out.is_empty() && line != ")" {
            out.push(' ');
        }
        out.push_str(line);
    }
    out
}

pub fn report_rows(entries: &[CorpusEntry], results: &[SentenceResult]) -> Vec<ReportRow> {
    entries
        .iter()
        .zip(results.iter())
        .map(|(entry, result)| ReportRow::new(entry, result))
        .collect()
}

/// Writes one JSON object per line, replacing any existing file.
pub fn write_jsonl<P: AsRef<Path>>(path: P, rows: &[ReportRow]) -> std::io::Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(
        OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(path)?,
    );
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Renders the console report: coverage counts, then up to `examples` unparsed and parsed
/// sentences.
pub fn console_report(
    entries: &[CorpusEntry],
    results: &[SentenceResult],
    summary: &CoverageSummary,
    examples: usize,
) -> String {
    let mut out = String::new();
    out.push_str("=== Parse coverage summary ===\n");
    out.push_str(&format!("          Sentences: {}\n", summary.total));
    out.push_str(&format!("             Parsed: {}\n", summary.parsed));
    out.push_str(&format!("     Unknown tokens: {}\n", summary.unknown_token));
    out.push_str(&format!("      No derivation: {}\n", summary.no_derivation));
    out.push_str(&format!("              Empty: {}\n", summary.empty));
    if let Some(average) = summary.average_parse_time() {
        out.push_str(&format!(
            " Average parse time: {:.3} ms per attempted sentence ({} attempted)\n",
            average.as_secs_f64() * 1000.0,
            summary.attempted
        ));
    }
    if !summary.unknown_tokens.is_empty() {
        out.push_str(&format!(
            "   Uncovered tokens: {}\n",
            summary.unknown_tokens.keys().join(", ")
        ));
    }

    let pairs = || entries.iter().zip(results.iter());

    let unparsed: Vec<_> = pairs().filter(|(_, r)| !r.is_parsed()).take(examples).collect();
    if !unparsed.is_empty() {
        out.push_str(&format!(
            "\n--- Unparsed Sentences (first {} examples) ---\n",
            unparsed.len()
        ));
        for (entry, result) in unparsed {
            out.push_str(&format!("Original: {}\n", entry.source));
            if let Some(reason) = result.outcome.reason() {
                out.push_str(&format!("  Reason: {}\n", reason));
            }
        }
    }

    out.push_str("\n=== Examples of Parsed Sentences ===\n");
    let parsed: Vec<_> = pairs().filter(|(_, r)| r.is_parsed()).take(examples).collect();
    if summary.parsed == 0 {
        out.push_str("No sentences were parsed with the current grammar.\n");
    }
    for (entry, result) in parsed {
        out.push_str(&format!("{}\n", "-".repeat(40)));
        out.push_str(&format!("Original:        {}\n", entry.source));
        out.push_str(&format!("Tokens:          {}\n", result.tokens.join(" ")));
        out.push_str(&format!("Reference:       {}\n", entry.reference));
        if let Some(tree) = result.outcome.tree() {
            out.push_str(&format!("\nParsed tree:\n{}", tree.pretty()));
        }
        if let Some(tree) = &result.rewritten {
            out.push_str(&format!("\nRewritten tree:\n{}", tree.pretty()));
        }
        if let Some(text) = result.rewritten_text() {
            out.push_str(&format!("\nRewritten text:  {}\n", text));
        }
        out.push_str(&format!("Translation:     {}\n", result.translation));
    }
    out.push_str(&format!("{}\n", "-".repeat(40)));
    out
}
