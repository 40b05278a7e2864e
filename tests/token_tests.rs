use chrono::Duration;
use gatehouse::{GateError, TokenService};

#[test]
fn round_trips_the_account_id_until_expiry() {
    let svc = TokenService::new("round-trip-secret", Duration::days(30));
    for id in [1, 42, i64::MAX] {
        let token = svc.issue(id).expect("issue failed");
        assert_eq!(svc.verify(&token).expect("verify failed"), id);
    }
}

#[test]
fn two_tokens_for_the_same_account_are_distinct() {
    // The session store has a unique token column; back-to-back logins in
    // the same second must not collide.
    let svc = TokenService::new("uniq-secret", Duration::days(30));
    let a = svc.issue(7).expect("issue failed");
    let b = svc.issue(7).expect("issue failed");
    assert_ne!(a, b);
}

#[test]
fn expired_token_fails_with_token_expired() {
    let svc = TokenService::new("expiry-secret", Duration::seconds(-3600));
    let token = svc.issue(5).expect("issue failed");
    assert!(matches!(svc.verify(&token), Err(GateError::TokenExpired)));
}

#[test]
fn garbage_input_fails_as_malformed() {
    let svc = TokenService::new("malformed-secret", Duration::days(30));
    for garbage in ["", "not-a-token", "a.b", "a.b.c.d"] {
        assert!(
            matches!(svc.verify(garbage), Err(GateError::TokenMalformed)),
            "expected TokenMalformed for {garbage:?}"
        );
    }
}

#[test]
fn token_signed_with_another_secret_is_invalid() {
    let ours = TokenService::new("secret-one", Duration::days(30));
    let theirs = TokenService::new("secret-two", Duration::days(30));
    let token = theirs.issue(9).expect("issue failed");
    assert!(matches!(ours.verify(&token), Err(GateError::TokenInvalid)));
}
