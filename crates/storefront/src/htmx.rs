//! HTMX response helpers.
//!
//! Cart routes tell the page what changed through the `HX-Trigger` response
//! header, a JSON object mapping event names to payloads:
//!
//! ```json
//! {"cart-updated": {"itemCount": 3, "total": "$42.00"},
//!  "toast": {"level": "success", "message": "Tee added to cart"}}
//! ```

use axum::http::{HeaderMap, HeaderValue};
use serde_json::{Map, Value};
use shopfront_core::cart::{Notice, NoticeLevel};

/// Request header sent by HTMX on every request it issues.
pub const HX_REQUEST: &str = "hx-request";

/// Response header carrying client-side events.
pub const HX_TRIGGER: &str = "hx-trigger";

/// Whether the request came from HTMX rather than a plain form post.
#[must_use]
pub fn is_htmx_request(headers: &HeaderMap) -> bool {
    headers
        .get(HX_REQUEST)
        .is_some_and(|value| value.as_bytes() == b"true")
}

/// Builder for the `HX-Trigger` header.
#[derive(Debug, Default, Clone)]
pub struct HxTrigger {
    events: Map<String, Value>,
}

impl HxTrigger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `cart-updated` with the new badge count and formatted total.
    #[must_use]
    pub fn cart_updated(mut self, item_count: u64, total: &str) -> Self {
        self.events.insert(
            "cart-updated".to_string(),
            serde_json::json!({ "itemCount": item_count, "total": total }),
        );
        self
    }

    /// Show the last of `notices` as a toast.
    #[must_use]
    pub fn toast_from(self, notices: &[Notice]) -> Self {
        match notices.last() {
            Some(notice) => self.toast(notice.level, &notice.message),
            None => self,
        }
    }

    #[must_use]
    pub fn toast(mut self, level: NoticeLevel, message: &str) -> Self {
        self.events.insert(
            "toast".to_string(),
            serde_json::json!({ "level": level, "message": message }),
        );
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Render the header value, or `None` if there is nothing to send.
    #[must_use]
    pub fn header_value(&self) -> Option<HeaderValue> {
        if self.events.is_empty() {
            return None;
        }
        let json = ascii_json(&Value::Object(self.events.clone()));
        HeaderValue::from_str(&json).ok()
    }

    /// Add the header to `headers` if there is anything to send.
    pub fn apply(&self, headers: &mut HeaderMap) {
        if let Some(value) = self.header_value() {
            headers.insert(HX_TRIGGER, value);
        }
    }
}

/// Serialize `value` as JSON with every non-ASCII character escaped, since
/// header values must be visible ASCII.
fn ascii_json(value: &Value) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0_u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_trigger_has_no_header() {
        assert!(HxTrigger::new().header_value().is_none());
        assert!(HxTrigger::new().toast_from(&[]).is_empty());
    }

    #[test]
    fn test_trigger_payload() {
        let notices = [
            Notice::new(NoticeLevel::Info, "first"),
            Notice::new(NoticeLevel::Success, "Tee added to cart"),
        ];
        let value = HxTrigger::new()
            .cart_updated(2, "$10.00")
            .toast_from(&notices)
            .header_value()
            .unwrap();

        let parsed: Value = serde_json::from_str(value.to_str().unwrap()).unwrap();
        assert_eq!(parsed["cart-updated"]["itemCount"], 2);
        assert_eq!(parsed["cart-updated"]["total"], "$10.00");
        assert_eq!(parsed["toast"]["level"], "success");
        assert_eq!(parsed["toast"]["message"], "Tee added to cart");
    }

    #[test]
    fn test_non_ascii_names_are_escaped() {
        let value = HxTrigger::new()
            .toast(NoticeLevel::Success, "Café crème 🍍 added to cart")
            .header_value()
            .unwrap();

        let parsed: Value = serde_json::from_str(value.to_str().unwrap()).unwrap();
        assert_eq!(parsed["toast"]["message"], "Café crème 🍍 added to cart");
    }

    #[test]
    fn test_is_htmx_request() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx_request(&headers));
        headers.insert(HX_REQUEST, HeaderValue::from_static("true"));
        assert!(is_htmx_request(&headers));
    }
}
