//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values in a
/// single left-to-right pass; substituted text is never scanned again, and
/// unknown `{...}` spans are kept verbatim.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(tpl.len());
  let mut rest = tpl;
  while let Some(open) = rest.find('{') {
    out.push_str(&rest[..open]);
    let after = &rest[open + 1..];
    let value = after
      .find('}')
      .and_then(|close| pairs.iter().find(|(k, _)| *k == &after[..close]).map(|(_, v)| (close, *v)));
    match value {
      Some((close, v)) => {
        out.push_str(v);
        rest = &after[close + 1..];
      }
      None => {
        out.push('{');
        rest = after;
      }
    }
  }
  out.push_str(rest);
  out
}

/// Strip a surrounding Markdown code fence (```json ... ```) if present.
/// Models sometimes wrap JSON output this way even when asked not to.
pub fn strip_code_fence(s: &str) -> &str {
  let t = s.trim();
  let Some(rest) = t.strip_prefix("```") else { return t };
  let Some(body) = rest.strip_suffix("```") else { return t };
  // Drop the info string ("json") on the opening line.
  match body.find('\n') {
    Some(nl) => body[nl + 1..].trim(),
    None => body.trim(),
  }
}

/// Log-safe truncation for large strings (char-boundary aware).
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let head: String = s.chars().take(max).collect();
    format!("{}… ({} bytes total)", head, s.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn template_replaces_all_keys() {
    let out = fill_template("{topic} at {difficulty}; again {topic}", &[("topic", "Hotel"), ("difficulty", "B1")]);
    assert_eq!(out, "Hotel at B1; again Hotel");
  }

  #[test]
  fn template_values_are_not_rescanned() {
    let out = fill_template("{topic} at {difficulty}", &[("topic", "x {difficulty}"), ("difficulty", "B1")]);
    assert_eq!(out, "x {difficulty} at B1");
    let out = fill_template("{difficulty}: {topic}", &[("topic", "{topic}"), ("difficulty", "B1")]);
    assert_eq!(out, "B1: {topic}");
  }

  #[test]
  fn template_keeps_unknown_and_unbalanced_braces() {
    assert_eq!(fill_template("{\"a\": {x}} {{topic}", &[("topic", "T")]), "{\"a\": {x}} {T");
    assert_eq!(fill_template("open {topic", &[("topic", "T")]), "open {topic");
  }

  #[test]
  fn strips_fences_with_and_without_info_string() {
    assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    assert_eq!(strip_code_fence("```\nnull\n```"), "null");
    assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    assert_eq!(strip_code_fence("```unterminated"), "```unterminated");
  }

  #[test]
  fn truncation_respects_multibyte_chars() {
    assert_eq!(trunc_for_log("short", 10), "short");
    let t = trunc_for_log("预订预订预订", 2);
    assert!(t.starts_with("预订…"));
  }
}
