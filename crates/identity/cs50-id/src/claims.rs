//! Normalizes a user-info document into [`Claims`].

use cs50_id_core::{Claims, IDENTITY_CLAIM};
use serde_json::{Map, Value};

/// Legacy subject member used by older OAuth2 user-info endpoints
const FALLBACK_SUBJECT_CLAIM: &str = "id";

/// Requested field name to the OIDC member that usually carries it
const FIELD_ALIASES: &[(&str, &str)] = &[
    ("fullname", "name"),
    ("displayName", "name"),
    ("mail", "email"),
    ("nickname", "preferred_username"),
];

/// Build claims from `identity` plus every requested field the provider
/// actually returned. Returns `None` when the document has no subject.
pub(crate) fn merge_claims(
    user_info: &Map<String, Value>,
    identity_claim: &str,
    profile_fields: &[String],
) -> Option<Claims> {
    let identity = subject(user_info, identity_claim)
        .or_else(|| subject(user_info, FALLBACK_SUBJECT_CLAIM))?;

    let mut claims = Claims::new(identity);
    for field in profile_fields {
        if field == IDENTITY_CLAIM {
            continue;
        }
        if let Some(value) = lookup(user_info, field) {
            claims.insert(field.clone(), value.clone());
        }
    }

    Some(claims)
}

fn subject(user_info: &Map<String, Value>, key: &str) -> Option<String> {
    match user_info.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lookup<'a>(user_info: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    let present = |key: &str| user_info.get(key).filter(|v| !v.is_null());

    present(field).or_else(|| {
        FIELD_ALIASES
            .iter()
            .find(|(alias, _)| *alias == field)
            .and_then(|(_, member)| present(member))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_only_returned_fields_are_overlaid() {
        let user_info = object(json!({"sub": "u1", "email": "a@b.com", "locale": "en"}));
        let claims = merge_claims(&user_info, "sub", &fields(&["email", "fullname"])).unwrap();

        assert_eq!(
            serde_json::to_value(&claims).unwrap(),
            json!({"identity": "u1", "email": "a@b.com"})
        );
    }

    #[test]
    fn test_aliases_fill_legacy_field_names() {
        let user_info = object(json!({
            "sub": "u1",
            "name": "David J. Malan",
            "email": "malan@harvard.edu",
            "preferred_username": "malan"
        }));
        let claims = merge_claims(
            &user_info,
            "sub",
            &fields(&["fullname", "displayName", "mail", "nickname"]),
        )
        .unwrap();

        assert_eq!(claims.get_str("fullname"), Some("David J. Malan"));
        assert_eq!(claims.get_str("displayName"), Some("David J. Malan"));
        assert_eq!(claims.get_str("mail"), Some("malan@harvard.edu"));
        assert_eq!(claims.get_str("nickname"), Some("malan"));
    }

    #[test]
    fn test_direct_member_wins_over_alias() {
        let user_info = object(json!({"sub": "u1", "fullname": "Full", "name": "Short"}));
        let claims = merge_claims(&user_info, "sub", &fields(&["fullname"])).unwrap();
        assert_eq!(claims.get_str("fullname"), Some("Full"));
    }

    #[test]
    fn test_null_values_are_skipped() {
        let user_info = object(json!({"sub": "u1", "email": null}));
        let claims = merge_claims(&user_info, "sub", &fields(&["email"])).unwrap();
        assert!(!claims.contains("email"));
    }

    #[test]
    fn test_identity_field_cannot_be_overridden() {
        let user_info = object(json!({"sub": "u1", "identity": "attacker"}));
        let claims = merge_claims(&user_info, "sub", &fields(&["identity"])).unwrap();
        assert_eq!(claims.identity(), "u1");
    }

    #[test]
    fn test_subject_sources() {
        let numeric = object(json!({"id": 12345}));
        assert_eq!(merge_claims(&numeric, "sub", &[]).unwrap().identity(), "12345");

        let custom = object(json!({"uid": "abc", "sub": "ignored"}));
        assert_eq!(merge_claims(&custom, "uid", &[]).unwrap().identity(), "abc");

        let missing = object(json!({"email": "a@b.com"}));
        assert!(merge_claims(&missing, "sub", &fields(&["email"])).is_none());

        let empty = object(json!({"sub": ""}));
        assert!(merge_claims(&empty, "sub", &[]).is_none());
    }
}
