//! Output formatting: plain text (human-readable) and JSON.

use serde::Serialize;
use statuscake_lib::Test;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables and key-value
    Plain,
    /// JSON (pretty-printed)
    Json,
}

const COLUMNS: [(&str, usize); 6] = [
    ("ID", 10),
    ("NAME", 24),
    ("TYPE", 5),
    ("STATUS", 7),
    ("UPTIME", 7),
    ("PAUSED", 6),
];

/// One row per test.
pub fn format_test_table(tests: &[Test]) -> String {
    if tests.is_empty() {
        return "<no tests>\n".to_string();
    }
    let mut out = String::new();
    let header: Vec<String> = COLUMNS
        .iter()
        .map(|(name, w)| format!("{:<w$}", name, w = w))
        .collect();
    let header = header.join(" ");
    let _ = writeln!(out, "{}", header.trim_end());
    let _ = writeln!(out, "{}", "-".repeat(header.trim_end().len()));
    for t in tests {
        let cells = [
            t.test_id.to_string(),
            truncate(&t.website_name, COLUMNS[1].1),
            t.test_type.to_string(),
            t.status.clone().unwrap_or_else(|| "-".to_string()),
            t.uptime
                .map(|u| format!("{:.2}%", u))
                .unwrap_or_else(|| "-".to_string()),
            if t.paused { "yes" } else { "no" }.to_string(),
        ];
        let row: Vec<String> = cells
            .iter()
            .zip(COLUMNS.iter())
            .map(|(c, (_, w))| format!("{:<w$}", c, w = w))
            .collect();
        let _ = writeln!(out, "{}", row.join(" ").trim_end());
    }
    out
}

/// Key-value view of a single test; empty fields are skipped.
pub fn format_test_detail(t: &Test) -> String {
    let mut out = String::new();
    let mut line = |k: &str, v: String| {
        if !v.is_empty() {
            let _ = writeln!(out, "{:<15} {}", format!("{}:", k), v);
        }
    };
    line("ID", t.test_id.to_string());
    line("Name", t.website_name.clone());
    line("URL", t.website_url.clone());
    line("Type", t.test_type.to_string());
    line("Status", t.status.clone().unwrap_or_default());
    line(
        "Uptime",
        t.uptime.map(|u| format!("{:.2}%", u)).unwrap_or_default(),
    );
    line("Paused", if t.paused { "yes" } else { "no" }.to_string());
    line("Check rate", format!("{}s", t.check_rate));
    if t.timeout != 0 {
        line("Timeout", format!("{}s", t.timeout));
    }
    if t.port != 0 {
        line("Port", t.port.to_string());
    }
    line("Contact groups", t.contact_group.join(", "));
    line("Tags", t.test_tags.join(", "));
    line("Locations", t.node_locations.join(", "));
    line("Last tested", t.last_tested.clone().unwrap_or_default());
    out
}

fn truncate(s: &str, max: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max {
        s
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

/// Format value as JSON (pretty).
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use statuscake_lib::TestType;

    fn sample() -> Test {
        Test {
            test_id: 101,
            website_name: "Example".into(),
            website_url: "https://example.com".into(),
            test_type: TestType::Http,
            status: Some("Up".into()),
            uptime: Some(99.5),
            check_rate: 300,
            test_tags: vec!["prod".into(), "web".into()],
            ..Test::default()
        }
    }

    #[test]
    fn table_lists_each_test() {
        let mut paused = sample();
        paused.test_id = 102;
        paused.paused = true;
        paused.status = None;
        let out = format_test_table(&[sample(), paused]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[2].contains("101"));
        assert!(lines[2].contains("99.50%"));
        assert!(lines[3].contains("yes"));
        assert!(lines[3].contains('-'));
    }

    #[test]
    fn empty_table() {
        assert!(format_test_table(&[]).contains("no tests"));
    }

    #[test]
    fn detail_skips_empty_fields() {
        let out = format_test_detail(&sample());
        assert!(out.contains("https://example.com"));
        assert!(out.contains("prod, web"));
        assert!(!out.contains("Port"));
        assert!(!out.contains("Last tested"));
    }

    #[test]
    fn long_names_are_truncated() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }

    #[test]
    fn json_uses_wire_names() {
        let s = format_json(&sample()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&s).unwrap();
        assert_eq!(v["TestID"], 101);
        assert_eq!(v["WebsiteURL"], "https://example.com");
    }
}
