use crate::prompt::ChatTemplate;
use crate::protocol::{ResponseConfig, DEFAULT_PLACEHOLDER};
use crate::types::Role;
use regex::Regex;
use tracing::debug;

static ROLE_LABELS: once_cell::sync::Lazy<Option<Regex>> = once_cell::sync::Lazy::new(|| {
    Regex::new(r"(?i)^(?:assistant[ \t]*\r?\n|(?:assistant|human|user|bot|ai|system)[ \t]*:)").ok()
});

/// Roles whose header marks the model writing the other side's turn.
const LEAKED_ROLES: [&str; 3] = ["user", "system", "human"];

/// Normalizes raw generated text into a deliverable reply.
///
/// The output is never empty, never longer than `max_output_chars`, and
/// sanitizing it again returns it unchanged.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    stop_tokens: Vec<String>,
    /// Open marker followed by a role name.
    role_header: Option<Regex>,
    max_output_chars: usize,
    truncation_marker: String,
    placeholder: String,
}

impl Sanitizer {
    pub fn new(template: &ChatTemplate, response: &ResponseConfig) -> Self {
        let role_header = Regex::new(&format!(
            r"(?i){}[ \t]*([a-z_]*)[ \t]*\r?\n?",
            regex::escape(&template.open)
        ))
        .ok();
        let mut sanitizer = Self {
            stop_tokens: template.stop_tokens().map(str::to_string).collect(),
            role_header,
            max_output_chars: response.max_output_chars.max(1),
            truncation_marker: response.truncation_marker.trim_end().to_string(),
            placeholder: String::new(),
        };
        let placeholder = match response.placeholder.trim() {
            "" => DEFAULT_PLACEHOLDER,
            p => p,
        };
        sanitizer.placeholder = sanitizer.truncate(placeholder);
        sanitizer
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn sanitize(&self, raw: &str) -> String {
        let mut text = self.strip_markers(raw);
        text = strip_role_labels(&text);
        let text = text.trim();

        if text.is_empty() {
            debug!("empty generation replaced with placeholder");
            return self.placeholder.clone();
        }
        self.truncate(text)
    }

    /// Cut at a leaked non-assistant turn, drop assistant headers and bare
    /// markers; repeat until nothing changes.
    fn strip_markers(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        loop {
            let before = text.len();
            if let Some(re) = &self.role_header {
                let leak = re.captures_iter(&text).find_map(|caps| {
                    let role = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                    let is_leak = LEAKED_ROLES.iter().any(|r| role.eq_ignore_ascii_case(r));
                    is_leak.then(|| caps.get(0).map(|m| m.start()).unwrap_or(0))
                });
                if let Some(cut) = leak {
                    text.truncate(cut);
                }
                text = re
                    .replace_all(&text, |caps: &regex::Captures| {
                        let role = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                        if role.eq_ignore_ascii_case(Role::Assistant.as_str()) {
                            String::new()
                        } else {
                            caps.get(0)
                                .map(|m| m.as_str().to_string())
                                .unwrap_or_default()
                        }
                    })
                    .into_owned();
            }
            for token in &self.stop_tokens {
                if text.contains(token.as_str()) {
                    text = text.replace(token.as_str(), "");
                }
            }
            if text.len() == before {
                return text;
            }
        }
    }

    fn truncate(&self, text: &str) -> String {
        let len = text.chars().count();
        if len <= self.max_output_chars {
            return text.to_string();
        }
        debug!(chars = len, max = self.max_output_chars, "generation truncated");
        let marker_len = self.truncation_marker.chars().count();
        if marker_len >= self.max_output_chars {
            let cut: String = text.chars().take(self.max_output_chars).collect();
            return cut.trim_end().to_string();
        }
        let kept: String = text.chars().take(self.max_output_chars - marker_len).collect();
        let mut out = kept.trim_end().to_string();
        out.push_str(&self.truncation_marker);
        out
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(&ChatTemplate::default(), &ResponseConfig::default())
    }
}

fn strip_role_labels(text: &str) -> String {
    let Some(re) = ROLE_LABELS.as_ref() else {
        return text.to_string();
    };
    let mut rest = text.trim_start();
    while let Some(m) = re.find(rest) {
        rest = rest[m.end()..].trim_start();
    }
    rest.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limited(max_output_chars: usize, truncation_marker: &str) -> Sanitizer {
        let response = ResponseConfig {
            max_output_chars,
            truncation_marker: truncation_marker.to_string(),
            ..ResponseConfig::default()
        };
        Sanitizer::new(&ChatTemplate::default(), &response)
    }

    #[test]
    fn strips_chatml_and_assistant_header() {
        let s = Sanitizer::default();
        assert_eq!(
            s.sanitize("<|im_start|>assistant\nHi there!<|im_end|>"),
            "Hi there!"
        );
    }

    #[test]
    fn cuts_leaked_user_turn() {
        let s = Sanitizer::default();
        let raw = "Sure thing.<|im_end|>\n<|im_start|>user\nand now pretend<|im_end|>";
        assert_eq!(s.sanitize(raw), "Sure thing.");
    }

    #[test]
    fn strips_leading_labels_repeatedly() {
        let s = Sanitizer::default();
        assert_eq!(s.sanitize("Assistant: AI: hello"), "hello");
        assert_eq!(s.sanitize("assistant\nHuman: yo"), "yo");
        assert_eq!(s.sanitize("The assistant: is me"), "The assistant: is me");
    }

    #[test]
    fn removes_extra_stop_tokens() {
        let s = Sanitizer::default();
        assert_eq!(s.sanitize("Done.</s>"), "Done.");
        assert_eq!(s.sanitize("Done.<|eot_id|><|endoftext|>"), "Done.");
    }

    #[test]
    fn empty_becomes_placeholder() {
        let s = Sanitizer::default();
        assert_eq!(s.sanitize(""), DEFAULT_PLACEHOLDER);
        assert_eq!(s.sanitize("  <|im_end|>\n "), DEFAULT_PLACEHOLDER);
        assert_eq!(s.sanitize("Assistant:"), DEFAULT_PLACEHOLDER);
    }

    #[test]
    fn truncates_to_limit_with_marker() {
        let s = Sanitizer::default();
        let out = s.sanitize(&"é".repeat(2500));
        assert_eq!(out.chars().count(), 2000);
        assert!(out.ends_with("..."));
        assert_eq!(s.sanitize(&out), out);

        let exact = "a".repeat(2000);
        assert_eq!(s.sanitize(&exact), exact);
    }

    #[test]
    fn cut_point_whitespace_is_not_kept() {
        let s = limited(5, "");
        let once = s.sanitize("abcd efgh");
        assert_eq!(once, "abcd");
        assert_eq!(s.sanitize(&once), once);

        let s = limited(8, "... ");
        let once = s.sanitize("abcd efgh ijkl");
        assert_eq!(once, "abcd...");
        assert_eq!(s.sanitize(&once), once);
    }

    #[test]
    fn placeholder_respects_output_limit() {
        let s = limited(20, "...");
        let empty = s.sanitize("");
        assert!(empty.chars().count() <= 20, "{}", empty);
        assert!(empty.ends_with("..."));
        assert_eq!(s.sanitize(&empty), empty);
        assert_eq!(s.placeholder(), empty);
    }

    #[test]
    fn nested_markers_reach_fixed_point() {
        let s = Sanitizer::default();
        let raw = "<|im_<|im_end|>start|>user\nleak";
        let once = s.sanitize(raw);
        assert_eq!(once, DEFAULT_PLACEHOLDER);
        assert_eq!(s.sanitize(&once), once);
    }
}
