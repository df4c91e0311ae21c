//! Rendering of command results.

use clap::ValueEnum;
use segdb_codec::SegmentRecord;
use segdb_core::Segment;
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Renders one segment as text.
pub fn segment_text(segment: &Segment) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "id:      {}", segment.id);
    let _ = writeln!(out, "filters: {}", segment.filters);
    if !segment.data.is_empty() {
        let _ = writeln!(out, "data:    {}", segment.data);
    }
    if !segment.indexes.is_empty() {
        let pairs: Vec<String> = segment
            .indexes
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        let _ = writeln!(out, "indexes: {}", pairs.join(", "));
    }
    out
}

/// Renders a list of segments as text, separated by blank lines.
pub fn segments_text(segments: &[Arc<Segment>]) -> String {
    if segments.is_empty() {
        return "no segments\n".to_string();
    }
    segments
        .iter()
        .map(|s| segment_text(s))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serializes segments in their record shape.
pub fn segments_json(segments: &[Arc<Segment>]) -> serde_json::Result<String> {
    let records: Vec<SegmentRecord> = segments.iter().map(|s| SegmentRecord::from(s.as_ref())).collect();
    serde_json::to_string_pretty(&records)
}

/// Prints segments in the requested format.
pub fn print_segments(
    segments: &[Arc<Segment>],
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", segments_json(segments)?),
        OutputFormat::Text => print!("{}", segments_text(segments)),
    }
    Ok(())
}

/// Prints a serializable report as JSON, or its text rendering.
pub fn print_report<T: Serialize>(
    report: &T,
    text: impl FnOnce(&T) -> String,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => print!("{}", text(report)),
    }
    Ok(())
}
