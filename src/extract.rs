//! Extraction of verification codes from HTML message bodies.
//!
//! The sender renders the code inside a table cell with a fixed inline style.
//! Extraction is exact-signature based: the markup is parsed tolerantly and
//! every element whose name and `style` attribute match the configured
//! [`CodeSignature`] contributes its trimmed text. A message without the
//! signature yields an empty result, never an error — non-verification mail
//! and template changes are expected, observable outcomes.

use scraper::{Html, Selector};

/// Inline style the sender applies to the code-bearing table cell.
const DEFAULT_STYLE_FINGERPRINT: &str = "background:#f1f1f1;margin-top:20px;\
    font-family: arial,helvetica,sans-serif; mso-line-height-rule: exactly; \
    font-size:30px; color:#202020; line-height:19px; line-height: 134%; \
    letter-spacing: 10px;text-align: center;padding: 20px 0px !important;\
    letter-spacing: 10px !important;border-radius: 4px;";

/// The structural pattern used to locate code-bearing elements in markup.
///
/// The default signature matches the known sender template: a `<td>` with a
/// specific inline style. Both the element name and the full style string
/// must match exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSignature {
    element: String,
    style: String,
}

impl CodeSignature {
    /// Creates a signature matching `element` cells carrying exactly `style`.
    #[must_use]
    pub fn new(element: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            style: style.into(),
        }
    }

    /// Returns the element name this signature matches.
    #[must_use]
    pub fn element(&self) -> &str {
        &self.element
    }

    /// Returns the exact `style` attribute value this signature matches.
    #[must_use]
    pub fn style(&self) -> &str {
        &self.style
    }
}

impl Default for CodeSignature {
    fn default() -> Self {
        Self::new("td", DEFAULT_STYLE_FINGERPRINT)
    }
}

/// Extracts all verification codes from one body part's markup.
///
/// Parses tolerantly (malformed markup never fails), selects elements
/// matching the signature, and returns each element's text with whitespace
/// stripped. Empty results are dropped. The input is never mutated.
///
/// # Example
///
/// ```
/// use mailcode::{extract_codes, CodeSignature};
///
/// let signature = CodeSignature::new("td", "color:#202020;");
/// let markup = r#"<table><td style="color:#202020;"> 123456 </td></table>"#;
/// assert_eq!(extract_codes(markup, &signature), vec!["123456"]);
/// ```
#[must_use]
pub fn extract_codes(markup: &str, signature: &CodeSignature) -> Vec<String> {
    let document = Html::parse_document(markup);

    // A signature with an unparseable element name can never match anything
    let Ok(selector) = Selector::parse(signature.element()) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|element| element.value().attr("style") == Some(signature.style()))
        .map(|element| {
            element
                .text()
                .map(str::trim)
                .collect::<String>()
                .trim()
                .to_string()
        })
        .filter(|code| !code.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_signature() -> CodeSignature {
        CodeSignature::new("td", "font-size:30px;letter-spacing: 10px;")
    }

    fn code_cell(text: &str) -> String {
        format!(r#"<html><body><table><tr><td style="font-size:30px;letter-spacing: 10px;">{text}</td></tr></table></body></html>"#)
    }

    #[test]
    fn test_extracts_trimmed_code() {
        let markup = code_cell(" 123456 ");
        assert_eq!(extract_codes(&markup, &test_signature()), vec!["123456"]);
    }

    #[test]
    fn test_extracts_all_matches() {
        let markup = format!("{}{}", code_cell("111111"), code_cell("222222"));
        assert_eq!(
            extract_codes(&markup, &test_signature()),
            vec!["111111", "222222"]
        );
    }

    #[test]
    fn test_no_signature_yields_empty() {
        let markup = r#"<html><body><td style="color:red">123456</td></body></html>"#;
        assert!(extract_codes(markup, &test_signature()).is_empty());
    }

    #[test]
    fn test_partial_style_does_not_match() {
        // The fingerprint must match the full style string, not a prefix
        let markup =
            r#"<td style="font-size:30px;letter-spacing: 10px;color:blue">123456</td>"#;
        assert!(extract_codes(markup, &test_signature()).is_empty());
    }

    #[test]
    fn test_malformed_markup_yields_empty_not_error() {
        // Unmatched tags, no DOCTYPE, stray brackets
        let markup = "<html><td><b>oops</html>><<div";
        assert!(extract_codes(markup, &test_signature()).is_empty());
    }

    #[test]
    fn test_malformed_markup_with_signature_still_matches() {
        // Tolerant parsing: the signature cell is found despite the mess around it
        let markup = format!("<div><b>{}</div>", code_cell("654321"));
        assert_eq!(extract_codes(&markup, &test_signature()), vec!["654321"]);
    }

    #[test]
    fn test_empty_cell_is_dropped() {
        let markup = code_cell("   ");
        assert!(extract_codes(&markup, &test_signature()).is_empty());
    }

    #[test]
    fn test_nested_markup_text_is_joined() {
        let markup = code_cell("<span> 123 </span><span> 456 </span>");
        assert_eq!(extract_codes(&markup, &test_signature()), vec!["123456"]);
    }

    #[test]
    fn test_default_signature_matches_sender_template() {
        let markup = format!(
            r#"<table><td style="{DEFAULT_STYLE_FINGERPRINT}"> 987654 </td></table>"#
        );
        assert_eq!(
            extract_codes(&markup, &CodeSignature::default()),
            vec!["987654"]
        );
    }

    #[test]
    fn test_alphanumeric_codes_pass_through() {
        let markup = code_cell("A1B2C3");
        assert_eq!(extract_codes(&markup, &test_signature()), vec!["A1B2C3"]);
    }
}
