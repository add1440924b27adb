//! The two-part report the display layer renders: per-command totals and a
//! detailed table of every batch. Pure aggregation over recorded state.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::calls::CallBatch;

/// Exact occurrence count per command name, across all calls in all batches.
pub fn command_counts(batches: &[CallBatch]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for batch in batches {
        for call in &batch.calls {
            *counts.entry(call.function.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// One display row: a single call within a batch group.
#[derive(Debug, Clone, Serialize)]
pub struct CallRow {
    pub function: String,
    pub key: String,
    pub args: String,
    pub return_value: Option<String>,
    /// Pre-escaped stack rendering, shown beneath the row when present.
    pub stacktrace: Option<String>,
}

/// One row group: a batch with its duration shown once.
#[derive(Debug, Clone, Serialize)]
pub struct BatchGroup {
    pub started_at: DateTime<Utc>,
    pub duration_ms: f64,
    pub rows: Vec<CallRow>,
}

/// Everything the display layer needs, ready to serialize.
#[derive(Debug, Clone, Serialize)]
pub struct PanelContent {
    pub commands: BTreeMap<String, u64>,
    pub groups: Vec<BatchGroup>,
}

impl PanelContent {
    pub fn from_batches(batches: &[CallBatch]) -> Self {
        let groups = batches
            .iter()
            .map(|batch| BatchGroup {
                started_at: batch.started_at,
                duration_ms: batch.duration_ms,
                rows: batch
                    .calls
                    .iter()
                    .map(|call| CallRow {
                        function: call.function.clone(),
                        key: call.key.clone(),
                        args: call.args.clone(),
                        return_value: call.return_value.clone(),
                        stacktrace: call.trace_rendered.clone(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            commands: command_counts(batches),
            groups,
        }
    }

    /// Fixed-width text rendering: the per-command summary, then one row
    /// per call with each batch's duration printed on its first row only.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        out.push_str("Calls\n");
        for (command, count) in &self.commands {
            let _ = writeln!(out, "  {command}: {count}");
        }
        out.push('\n');

        let _ = writeln!(
            out,
            "{:<12} {:<10} {:<20} {:<24} {}",
            "Duration", "Command", "Key", "Args", "Result"
        );
        let _ = writeln!(out, "{}", "-".repeat(80));

        for group in &self.groups {
            for (i, row) in group.rows.iter().enumerate() {
                let duration = if i == 0 {
                    format!("{:.2} ms", group.duration_ms)
                } else {
                    String::new()
                };
                let _ = writeln!(
                    out,
                    "{:<12} {:<10} {:<20} {:<24} {}",
                    duration,
                    row.function,
                    row.key,
                    row.args,
                    row.return_value.as_deref().unwrap_or(""),
                );
                if let Some(stack) = &row.stacktrace {
                    for line in stack.lines() {
                        let _ = writeln!(out, "    {line}");
                    }
                }
            }
        }

        out
    }

    /// JSON rendering for a dashboard or API consumer.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calls::Call;

    fn call(function: &str, key: &str, return_value: &str) -> Call {
        Call {
            function: function.into(),
            key: key.into(),
            args: String::new(),
            return_value: Some(return_value.into()),
            trace: Vec::new(),
            trace_rendered: None,
        }
    }

    fn batch(duration_ms: f64, calls: Vec<Call>) -> CallBatch {
        CallBatch {
            started_at: Utc::now(),
            duration_ms,
            calls,
        }
    }

    #[test]
    fn counts_commands_across_batches() {
        let batches = vec![
            batch(1.0, vec![call("GET", "a", "1")]),
            batch(2.0, vec![call("SET", "b", "OK"), call("GET", "b", "2")]),
        ];

        let counts = command_counts(&batches);
        assert_eq!(counts.get("GET"), Some(&2));
        assert_eq!(counts.get("SET"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn text_report_shows_each_batch_duration_once() {
        let batches = vec![
            batch(1.5, vec![call("GET", "key1", "v1")]),
            batch(
                2.5,
                vec![call("SET", "key2", "OK"), call("GET", "key2", "v2")],
            ),
        ];

        let text = PanelContent::from_batches(&batches).render_text();
        assert_eq!(text.matches("1.50 ms").count(), 1);
        assert_eq!(text.matches("2.50 ms").count(), 1);
    }

    #[test]
    fn text_report_lists_summary_and_rows() {
        let batches = vec![batch(
            1.0,
            vec![call("SET", "key2", "OK"), call("GET", "key2", "v2")],
        )];

        let text = PanelContent::from_batches(&batches).render_text();
        assert!(text.contains("GET: 1"));
        assert!(text.contains("SET: 1"));
        assert!(text.contains("key2"));
        assert!(text.contains("v2"));
    }

    #[test]
    fn stack_rows_render_beneath_their_call() {
        let mut c = call("GET", "key1", "v1");
        c.trace_rendered = Some("/app/main.rs in app::main(3)".into());
        let text = PanelContent::from_batches(&[batch(1.0, vec![c])]).render_text();

        assert!(text.contains("    /app/main.rs in app::main(3)"));
    }

    #[test]
    fn json_rendering_carries_both_parts() {
        let batches = vec![batch(1.0, vec![call("GET", "a", "1")])];
        let json = PanelContent::from_batches(&batches).to_json_pretty();

        assert!(json.contains("\"commands\""));
        assert!(json.contains("\"groups\""));
        assert!(json.contains("\"GET\""));
    }
}
