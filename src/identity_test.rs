use super::*;

#[test]
fn role_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    let role: Role = serde_json::from_str("\"admin\"").unwrap();
    assert_eq!(role, Role::Admin);
}

#[test]
fn role_is_admin() {
    assert!(Role::Admin.is_admin());
    assert!(!Role::User.is_admin());
}

#[test]
fn participant_shorthands() {
    assert_eq!(Participant::user("mallory").role, Role::User);
    assert_eq!(Participant::admin("dispatch").role, Role::Admin);
    assert_eq!(Participant::admin("dispatch").name, "dispatch");
}

#[test]
fn display_code_is_deterministic() {
    let a = display_code("mallory");
    let b = display_code("mallory");
    assert_eq!(a, b);
}

#[test]
fn display_code_known_values() {
    // Empty input never iterates: hash stays 0.
    assert_eq!(display_code(""), "USR000000");
    // Single code unit: 0 * 31 + 65.
    assert_eq!(display_code("A"), "USR000065");
    // Two units: (65 * 31 + 66) = 2081.
    assert_eq!(display_code("AB"), "USR002081");
}

#[test]
fn display_code_shape() {
    for name in ["mallory", "Support Team", "市場", "a-rather-long-identity-string"] {
        let code = display_code(name);
        assert!(code.starts_with("USR"), "{code}");
        assert!(code.len() >= 9, "{code}");
        assert!(code[3..].chars().all(|c| c.is_ascii_digit()), "{code}");
    }
}

#[test]
fn display_code_distinguishes_typical_names() {
    assert_ne!(display_code("Alice"), display_code("Bob"));
    assert_ne!(display_code("mallory"), display_code("Mallory"));
}
