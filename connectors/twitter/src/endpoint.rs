//! Endpoint body-encoding classification.
//!
//! Twitter expects POST bodies to be URL-encoded and covered by the OAuth
//! signature. A handful of endpoints take a raw JSON payload instead, and
//! those payloads are not part of the signature.

/// Resources whose POST body is sent as unsigned JSON.
pub const JSON_ENDPOINTS: &[&str] = &[
    "direct_messages/events/new",
    "direct_messages/welcome_messages/new",
    "direct_messages/welcome_messages/rules/new",
    "media/metadata/create",
    "collections/entries/curate",
];

/// Whether `resource` takes a JSON body (excluded from signing).
#[must_use]
pub fn is_json_endpoint(resource: &str) -> bool {
    JSON_ENDPOINTS.contains(&resource)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_endpoints() {
        for resource in JSON_ENDPOINTS {
            assert!(is_json_endpoint(resource), "{resource} should be JSON");
        }
    }

    #[test]
    fn test_form_endpoints() {
        assert!(!is_json_endpoint("statuses/update"));
        assert!(!is_json_endpoint("direct_messages/indicate_typing"));
        assert!(!is_json_endpoint("media/upload"));
        // exact match only
        assert!(!is_json_endpoint("direct_messages/events/new/"));
        assert!(!is_json_endpoint(""));
    }
}
