// Output formatting: terminal display of detection results.

pub mod terminal;

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Respects UTF-8 character boundaries, so account ids with multi-byte
/// characters never panic.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

/// Join up to `max_nodes` member ids, noting how many were left out.
pub fn summarize_nodes(nodes: &[String], max_nodes: usize) -> String {
    let shown: Vec<&str> = nodes.iter().take(max_nodes).map(String::as_str).collect();
    let mut line = shown.join(", ");
    if nodes.len() > max_nodes {
        line.push_str(&format!(" (+{} more)", nodes.len() - max_nodes));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("did:plc:ééé", 9), "did:plc:é...");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn test_summarize_nodes_counts_hidden_members() {
        let nodes: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(summarize_nodes(&nodes, 2), "a, b (+2 more)");
        assert_eq!(summarize_nodes(&nodes, 4), "a, b, c, d");
    }
}
