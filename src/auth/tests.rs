//! Tests for auth module
//!
//! These tests verify core authentication functionality including:
//! - JWT issuance, decoding and the legacy admin claim names
//! - Password hashing and bearer token extraction
//! - Google tokeninfo payload validation
//! - The login, signup, refresh, password reset and profile endpoints

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::common::test_support::{
        access_token, admin_token, insert_user, router, send, send_request, settle, test_config,
        test_state, wait_for_outbox, with_tokeninfo, ADMIN_EMAIL, ADMIN_PASSWORD, TEST_PASSWORD,
    };
    use crate::common::{ApiError, AppState};
    use axum::body::Body;
    use axum::http::{HeaderMap, HeaderValue, Request, StatusCode};
    use chrono::Duration;
    use google::{validate_tokeninfo, GoogleError};
    use models::{Claims, TokenKind};
    use serde_json::json;
    use tokens::*;

    fn legacy_claims(is_admin: Option<bool>, user_type: Option<&str>, role: Option<&str>) -> Claims {
        let mut claims = build_claims("U1", "a@b.com", None, TokenKind::Access, Duration::hours(1));
        claims.is_admin = is_admin;
        claims.user_type = user_type.map(str::to_string);
        claims.role = role.map(str::to_string);
        claims
    }

    #[test]
    fn test_role_from_any_legacy_claim() {
        assert_eq!(legacy_claims(None, None, Some("admin")).role(), Role::Admin);
        assert_eq!(legacy_claims(Some(true), None, None).role(), Role::Admin);
        assert_eq!(legacy_claims(None, Some("admin"), None).role(), Role::Admin);
        assert_eq!(legacy_claims(Some(false), Some("user"), Some("user")).role(), Role::User);
        assert_eq!(legacy_claims(None, None, None).role(), Role::User);
    }

    #[test]
    fn test_jwt_encoding_and_decoding() {
        let config = test_config();
        let (access, refresh) = issue_login_tokens(&config, "U123", "a@b.com", Role::Admin).unwrap();

        let claims = decode_claims(&access, &config.jwt_secret, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, "U123");
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.role(), Role::Admin);

        let claims = decode_claims(&refresh, &config.jwt_secret, TokenKind::Refresh).unwrap();
        assert_eq!(claims.token_type, TokenKind::Refresh);
    }

    #[test]
    fn test_jwt_validation_fails_with_wrong_secret() {
        let config = test_config();
        let (access, _) = issue_login_tokens(&config, "U1", "a@b.com", Role::User).unwrap();
        let result = decode_claims(&access, "wrong_secret_key", TokenKind::Access);
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let config = test_config();
        let (_, refresh) = issue_login_tokens(&config, "U1", "a@b.com", Role::User).unwrap();
        assert!(decode_claims(&refresh, &config.jwt_secret, TokenKind::Access).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = test_config();
        let claims = build_claims("U1", "a@b.com", Some(Role::User), TokenKind::Access, Duration::hours(-2));
        let token = encode_claims(&claims, &config.jwt_secret).unwrap();
        assert!(decode_claims(&token, &config.jwt_secret, TokenKind::Access).is_err());
    }

    #[test]
    fn test_token_without_token_type_is_access() {
        let raw = json!({ "sub": "U1", "exp": 9999999999u64, "is_admin": true });
        let claims: Claims = serde_json::from_value(raw).unwrap();
        assert_eq!(claims.token_type, TokenKind::Access);
        assert_eq!(claims.role(), Role::Admin);
    }

    #[test]
    fn test_password_fingerprint_tracks_hash() {
        assert_eq!(password_fingerprint(Some("abcdefghijklmnopqrstuvwxyz")), "klmnopqrstuvwxyz");
        assert_eq!(password_fingerprint(Some("short")), "short");
        assert_eq!(password_fingerprint(None), "");
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = password::hash_password("s3cure-password").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(password::verify_password("s3cure-password", &hash));
        assert!(!password::verify_password("other-password", &hash));
        assert!(!password::verify_password("s3cure-password", "not-a-hash"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(password::constant_time_eq("abc", "abc"));
        assert!(!password::constant_time_eq("abc", "abd"));
        assert!(!password::constant_time_eq("abc", "abcd"));
    }

    #[test]
    fn test_bearer_token_sources() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("admin-authorization", HeaderValue::from_static("Bearer admintok"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("admintok"));

        headers.insert("authorization", HeaderValue::from_static("primarytok"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("primarytok"));
    }

    #[test]
    fn test_tokeninfo_accepts_valid_payload() {
        let body = json!({
            "email": "Person@Gmail.com",
            "sub": "google-sub-1",
            "aud": "client-123",
            "exp": "2000000000",
            "email_verified": "true",
            "given_name": "Pat",
            "family_name": "Lee"
        });
        let identity = validate_tokeninfo(&body, Some("client-123"), 1_900_000_000).unwrap();
        assert_eq!(identity.email, "person@gmail.com");
        assert_eq!(identity.subject.as_deref(), Some("google-sub-1"));
        assert!(identity.email_verified);
        assert_eq!(identity.given_name.as_deref(), Some("Pat"));
    }

    #[test]
    fn test_tokeninfo_rejections() {
        let base = json!({ "email": "p@gmail.com", "aud": "client-123", "exp": 2000 });

        assert!(matches!(
            validate_tokeninfo(&base, Some("other"), 1000),
            Err(GoogleError::AudienceMismatch)
        ));
        assert!(matches!(
            validate_tokeninfo(&base, None, 3000),
            Err(GoogleError::Expired)
        ));
        assert!(matches!(
            validate_tokeninfo(&json!({ "sub": "x" }), None, 0),
            Err(GoogleError::MissingEmail)
        ));
        assert!(validate_tokeninfo(&base, None, 1000).is_ok());
    }

    // ---- HTTP ----

    #[tokio::test]
    async fn test_hardcoded_admin_login() {
        let state = test_state().await;
        let app = router(&state);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL.to_uppercase(), "password": ADMIN_PASSWORD })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], HARDCODED_ADMIN_ID);
        assert_eq!(body["role"], "admin");
        assert_eq!(body["is_staff"], true);

        let access = body["access"].as_str().unwrap();
        let (status, profile) = send(&app, "GET", "/api/auth/profile", Some(access), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["email"], ADMIN_EMAIL);
        assert_eq!(profile["role"], "admin");
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let state = test_state().await;
        insert_user(&state.db, "user@example.com", Role::User).await;
        let app = router(&state);

        for (email, password) in [
            ("user@example.com", "wrong-password"),
            ("nobody@example.com", TEST_PASSWORD),
            (ADMIN_EMAIL, "not-the-admin-password"),
        ] {
            let (status, body) = send(
                &app,
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["error"], "Invalid credentials");
        }
    }

    #[tokio::test]
    async fn test_login_role_from_admin_email_list() {
        let state = test_state().await;
        insert_user(&state.db, "staff@example.com", Role::User).await;
        let app = router(&state);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "staff@example.com", "password": TEST_PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "admin");
    }

    #[tokio::test]
    async fn test_signup_flow() {
        let state = test_state().await;
        let app = router(&state);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({ "email": "New@Example.com", "password": "longenough1", "password2": "longenough1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "User created successfully");
        assert_eq!(body["user"]["email"], "new@example.com");
        assert!(body["user"].get("password_hash").is_none());
        assert!(body["token"].is_string());

        let outbox = wait_for_outbox(&state, 1).await;
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].to, "new@example.com");
        assert!(outbox[0].text_body.contains("http://frontend.test/verify-email/"));

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({ "email": "new@example.com", "password": "longenough1", "password2": "longenough1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_signup_rejects_bad_passwords() {
        let state = test_state().await;
        let app = router(&state);

        for (password, password2) in [("longenough1", "different1"), ("short1", "short1"), ("12345678", "12345678")] {
            let (status, _) = send(
                &app,
                "POST",
                "/api/auth/signup",
                None,
                Some(json!({ "email": "p@example.com", "password": password, "password2": password2 })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_verify_email() {
        let state = test_state().await;
        let user_id = insert_user(&state.db, "v@example.com", Role::User).await;
        sqlx::query("UPDATE users SET email_verified = 0 WHERE id = ?")
            .bind(&user_id)
            .execute(&state.db)
            .await
            .unwrap();
        let app = router(&state);

        let token = issue_email_verification_token(&state.config, &user_id, "v@example.com").unwrap();
        let (status, _) = send(&app, "POST", "/api/auth/verify-email", None, Some(json!({ "token": token }))).await;
        assert_eq!(status, StatusCode::OK);

        let verified: bool = sqlx::query_scalar("SELECT email_verified FROM users WHERE id = ?")
            .bind(&user_id)
            .fetch_one(&state.db)
            .await
            .unwrap();
        assert!(verified);

        let access = access_token(&state, &user_id, "v@example.com", Role::User);
        let (status, _) = send(&app, "POST", "/api/auth/verify-email", None, Some(json!({ "token": access }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_refresh() {
        let state = test_state().await;
        let app = router(&state);
        let (access, refresh) =
            issue_login_tokens(&state.config, "U1", "a@b.com", Role::User).unwrap();

        let (status, body) = send(&app, "POST", "/api/auth/refresh", None, Some(json!({ "refresh": refresh }))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["access"].is_string());

        let (status, body) = send(&app, "POST", "/api/auth/refresh", None, Some(json!({ "refresh": access }))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token. Please log in again.");
    }

    #[tokio::test]
    async fn test_profile_requires_auth() {
        let state = test_state().await;
        let app = router(&state);

        let (status, _) = send(&app, "GET", "/api/auth/profile", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "GET", "/api/auth/profile", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Valid signature, but the user does not exist
        let ghost = access_token(&state, "UGHOST", "ghost@example.com", Role::User);
        let (status, _) = send(&app, "GET", "/api/auth/profile", Some(&ghost), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_forged_hardcoded_admin_token_rejected() {
        let state = test_state().await;
        let app = router(&state);

        let forged = access_token(&state, HARDCODED_ADMIN_ID, "someone@example.com", Role::Admin);
        let (status, _) = send(&app, "GET", "/api/auth/profile", Some(&forged), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let real = admin_token(&state);
        let (status, _) = send(&app, "POST", "/api/auth/logout", Some(&real), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_password_reset_round() {
        let state = test_state().await;
        let user_id = insert_user(&state.db, "reset@example.com", Role::User).await;
        let app = router(&state);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/password-reset",
            None,
            Some(json!({ "email": "reset@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Password reset email has been sent.");

        let outbox = wait_for_outbox(&state, 1).await;
        assert_eq!(outbox.len(), 1);
        let prefix = format!("http://frontend.test/reset-password/{}/", user_id);
        let start = outbox[0].text_body.find(&prefix).unwrap() + prefix.len();
        let token: String = outbox[0].text_body[start..]
            .chars()
            .take_while(|c| !c.is_whitespace())
            .collect();

        let uri = format!("/api/auth/password-reset/{}/{}", user_id, token);
        let new_password = json!({ "password": "brand-new-pass", "password2": "brand-new-pass" });

        let (status, body) = send(&app, "POST", &uri, None, Some(new_password.clone())).await;
        assert_eq!(status, StatusCode::OK, "{}", body);

        // Single use: the stored hash changed
        let (status, body) = send(&app, "POST", &uri, None, Some(new_password)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid token");

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "reset@example.com", "password": "brand-new-pass" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_password_reset_unknown_email_is_silent() {
        let state = test_state().await;
        let app = router(&state);

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/password-reset",
            None,
            Some(json!({ "email": "missing@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        settle().await;
        assert!(state.email_service.outbox().is_empty());
    }

    #[tokio::test]
    async fn test_google_requires_credential() {
        let state = test_state().await;
        let app = router(&state);

        let (status, body) = send(&app, "POST", "/api/auth/google", None, Some(json!({ "action": "login" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Google credential is required");
    }

    async fn user_count(state: &AppState) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&state.db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_signup_cannot_claim_hardcoded_admin_email() {
        let state = test_state().await;
        let app = router(&state);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({ "email": ADMIN_EMAIL.to_uppercase(), "password": "longenough1", "password2": "longenough1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.get("token").is_none());
        assert_eq!(user_count(&state).await, 0);
    }

    #[tokio::test]
    async fn test_admin_email_list_requires_verified_address() {
        let state = test_state().await;
        let app = router(&state);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({ "email": "staff@example.com", "password": "longenough1", "password2": "longenough1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let token = body["token"].as_str().unwrap().to_string();
        let user_id = body["user"]["id"].as_str().unwrap().to_string();

        let (status, _) = send(&app, "GET", "/api/admin/stats", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let login = json!({ "email": "staff@example.com", "password": "longenough1" });
        let (_, body) = send(&app, "POST", "/api/auth/login", None, Some(login.clone())).await;
        assert_eq!(body["role"], "user");

        let verification =
            issue_email_verification_token(&state.config, &user_id, "staff@example.com").unwrap();
        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/verify-email",
            None,
            Some(json!({ "token": verification })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "POST", "/api/auth/login", None, Some(login)).await;
        assert_eq!(body["role"], "admin");
        let (status, _) = send(&app, "GET", "/api/admin/stats", body["access"].as_str(), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_google_signup_cannot_claim_hardcoded_admin_email() {
        let base = test_state().await;
        let state = with_tokeninfo(
            &base,
            json!({ "email": ADMIN_EMAIL, "sub": "google-admin", "email_verified": "true" }),
        )
        .await;
        let app = router(&state);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/google",
            None,
            Some(json!({ "credential": "id-token", "action": "signup" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["needs_login"], true);
        assert_eq!(user_count(&state).await, 0);
    }

    async fn linked_google_id(state: &AppState, user_id: &str) -> Option<String> {
        sqlx::query_scalar("SELECT google_id FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(&state.db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_google_login_links_only_verified_email() {
        let base = test_state().await;
        let user_id = insert_user(&base.db, "jane@example.com", Role::User).await;
        let request = json!({ "credential": "id-token", "action": "login" });

        let unverified = with_tokeninfo(
            &base,
            json!({ "email": "jane@example.com", "sub": "google-jane", "email_verified": "false" }),
        )
        .await;
        let (status, body) = send(&router(&unverified), "POST", "/api/auth/google", None, Some(request.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Google account email is not verified");
        assert_eq!(linked_google_id(&base, &user_id).await, None);

        let verified = with_tokeninfo(
            &base,
            json!({ "email": "jane@example.com", "sub": "google-jane", "email_verified": "true" }),
        )
        .await;
        let (status, body) = send(&router(&verified), "POST", "/api/auth/google", None, Some(request.clone())).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["user_id"], user_id);
        assert_eq!(body["is_new_user"], false);
        assert_eq!(linked_google_id(&base, &user_id).await.as_deref(), Some("google-jane"));

        // Once linked, the same Google subject keeps working
        let (status, _) = send(&router(&unverified), "POST", "/api/auth/google", None, Some(request)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_resend_verification() {
        let state = test_state().await;
        insert_user(&state.db, "done@example.com", Role::User).await;
        let pending_id = insert_user(&state.db, "pending@example.com", Role::User).await;
        sqlx::query("UPDATE users SET email_verified = 0 WHERE id = ?")
            .bind(&pending_id)
            .execute(&state.db)
            .await
            .unwrap();
        let app = router(&state);

        let mut messages = Vec::new();
        for email in ["missing@example.com", "done@example.com", "Pending@Example.com"] {
            let (status, body) = send(
                &app,
                "POST",
                "/api/auth/resend-verification",
                None,
                Some(json!({ "email": email })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            messages.push(body["message"].clone());
        }
        assert!(messages.iter().all(|m| m == &messages[0]));

        wait_for_outbox(&state, 1).await;
        settle().await;
        let outbox = state.email_service.outbox();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].to, "pending@example.com");
        assert!(outbox[0].text_body.contains("http://frontend.test/verify-email/"));
    }

    #[tokio::test]
    async fn test_admin_authorization_header_fallback() {
        let state = test_state().await;
        let user_id = insert_user(&state.db, "user@example.com", Role::User).await;
        let app = router(&state);
        let admin = admin_token(&state);
        let user = access_token(&state, &user_id, "user@example.com", Role::User);

        let stats = |value: String| {
            Request::builder()
                .method("GET")
                .uri("/api/admin/stats")
                .header("Admin-Authorization", value)
                .body(Body::empty())
                .unwrap()
        };

        let (status, body) = send_request(&app, stats(format!("Bearer {}", admin))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);

        let (status, _) = send_request(&app, stats(admin.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send_request(&app, stats(format!("Bearer {}", user))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
