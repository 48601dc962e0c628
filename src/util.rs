pub(crate) fn urljoin(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

/// Pulls the `<ows:ExceptionText>` payload out of a WCS ExceptionReport.
///
/// MapServer replies with this XML (often under HTTP 200) when a coverage
/// request is rejected.
pub(crate) fn ows_exception_text(body: &str) -> Option<String> {
    let open = body.find("ExceptionText")?;
    let start = body[open..].find('>')? + open + 1;
    let end = body[start..].find("</")? + start;
    let text = body[start..end].trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Shortest round-trip rendering used in output file names: the same box
/// always maps to the same path and distinct boxes never share one.
pub(crate) fn format_bound(v: f64) -> String {
    // -0.0 and 0.0 must name the same file
    let v = if v == 0.0 { 0.0 } else { v };
    format!("{v}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urljoin_handles_slashes() {
        assert_eq!(urljoin("https://a/b/", "/c"), "https://a/b/c");
        assert_eq!(urljoin("https://a/b", "c"), "https://a/b/c");
        assert_eq!(urljoin("https://a/b", "https://z/q"), "https://z/q");
    }

    #[test]
    fn extracts_ows_exception() {
        let xml = r#"<?xml version="1.0"?>
<ows:ExceptionReport version="2.0.1">
  <ows:Exception exceptionCode="InvalidSubsetting" locator="subset">
    <ows:ExceptionText>msWCSGetCoverage20(): Subset outside of coverage extent.</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>"#;
        assert_eq!(
            ows_exception_text(xml).as_deref(),
            Some("msWCSGetCoverage20(): Subset outside of coverage extent.")
        );
        assert_eq!(ows_exception_text("not xml"), None);
    }

    #[test]
    fn bounds_format_deterministically() {
        assert_eq!(format_bound(-3.6), "-3.6");
        assert_eq!(format_bound(50.0), "50");
        assert_eq!(format_bound(-0.0), "0");
        assert_ne!(format_bound(-3.600_000_4), format_bound(-3.6));
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
    }
}
