//! Placeholder substitution for signature templates.

use signet_entity::signature::Signature;

/// Placeholders recognized inside signature templates.
const PLACEHOLDER_NAME: &str = "{{NAME}}";
const PLACEHOLDER_ROLE: &str = "{{ROLE}}";
const PLACEHOLDER_EMAIL: &str = "{{EMAIL}}";
const PLACEHOLDER_PHONE: &str = "{{PHONE}}";
const PLACEHOLDER_PHONE_CLEAN: &str = "{{PHONE_CLEAN}}";

/// Renders signature records into HTML templates.
///
/// Every field value is HTML-escaped before substitution; templates are
/// trusted, field values are not. `{{PHONE_CLEAN}}` additionally strips
/// the phone number down to a dialable form for `tel:` links.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureRenderer;

impl SignatureRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Substitute all placeholders in `template` with the signature's
    /// escaped field values. Unknown placeholders are left untouched.
    pub fn render(&self, template: &str, signature: &Signature) -> String {
        template
            .replace(PLACEHOLDER_NAME, &escape_html(&signature.name))
            .replace(PLACEHOLDER_ROLE, &escape_html(&signature.role))
            .replace(PLACEHOLDER_EMAIL, &escape_html(&signature.email))
            .replace(PLACEHOLDER_PHONE_CLEAN, &escape_html(&clean_phone(&signature.phone)))
            .replace(PLACEHOLDER_PHONE, &escape_html(&signature.phone))
    }
}

/// Escape the five HTML-significant characters, quotes included.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Keep only digits and `+` so the result is usable in a `tel:` URI.
pub fn clean_phone(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}
