//! Tests for profile analyses and the dashboard statistics

#[cfg(test)]
mod tests {
    use super::super::handlers::analysis_insert_error;
    use super::super::models::*;
    use super::super::validators::*;
    use crate::auth::Role;
    use crate::common::test_support::{
        access_token, admin_token, insert_user, router, send, test_state,
    };
    use crate::common::{ApiError, AppState};
    use axum::http::StatusCode;
    use serde_json::{json, Map, Value};

    fn body(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    async fn submission(state: &AppState, app: &axum::Router, email: &str) -> String {
        let id = insert_user(&state.db, email, Role::User).await;
        let token = access_token(state, &id, email, Role::User);
        let (status, body) = send(
            app,
            "POST",
            "/api/contact/submit",
            Some(&token),
            Some(json!({ "linkedin_url": "https://linkedin.com/in/someone" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["submission"]["id"].as_str().unwrap().to_string()
    }

    async fn insert_raw_analysis(
        state: &AppState,
        id: &str,
        submission_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO profile_analyses (id, submission_id, created_at, updated_at) VALUES (?, ?, 'now', 'now')",
        )
        .bind(id)
        .bind(submission_id)
        .execute(&state.db)
        .await
        .map(|_| ())
    }

    #[test]
    fn test_signal_defaults() {
        let signals = ProfileSignals::default();
        assert!(signals.has_professional_photo);
        assert!(signals.recent_activity);
        assert!(!signals.newly_created);
        assert_eq!(signals.account_type, "normal");
        assert_eq!(ProfileSignals::from_stored("not json"), signals);
    }

    #[test]
    fn test_apply_is_partial() {
        let base = AnalysisInput::default()
            .apply(&body(json!({ "connections": 300, "summary": "Solid", "score": 70, "risk_level": "low" })))
            .unwrap();
        assert_eq!(base.signals.connections, Some(300));
        assert_eq!(base.risk_level, RiskLevel::Low);

        let next = base.apply(&body(json!({ "has_old_photo": true }))).unwrap();
        assert_eq!(next.signals.connections, Some(300));
        assert!(next.signals.has_old_photo);
        assert_eq!(next.summary, "Solid");
        assert_eq!(next.score, Some(70));

        let cleared = next.apply(&body(json!({ "score": null }))).unwrap();
        assert_eq!(cleared.score, None);
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let input = AnalysisInput::default();

        let err = input.apply(&body(json!({ "score": 101 }))).unwrap_err();
        assert_eq!(err.errors[0].field, "score");

        let err = input.apply(&body(json!({ "risk_level": "extreme" }))).unwrap_err();
        assert_eq!(err.errors[0].field, "risk_level");

        let err = input.apply(&body(json!({ "last_updated": "yesterday" }))).unwrap_err();
        assert_eq!(err.errors[0].field, "signals");

        let err = input.apply(&body(json!({ "connections": -4 }))).unwrap_err();
        assert_eq!(err.errors[0].field, "signals");
    }

    #[tokio::test]
    async fn test_create_analysis_marks_processed() {
        let state = test_state().await;
        let app = router(&state);
        let admin = admin_token(&state);
        let submission_id = submission(&state, &app, "jane@example.com").await;

        let (status, body) = send(
            &app,
            "GET",
            &format!("/api/admin/submissions/{}/analysis-status", submission_id),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "has_analysis": false }));

        let (status, created) = send(
            &app,
            "POST",
            "/api/admin/analyses",
            Some(&admin),
            Some(json!({
                "submission_id": submission_id,
                "connections": 42,
                "last_updated": "2024-03-01",
                "score": 55,
                "risk_level": "high",
                "summary": "Sparse history"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", created);
        assert_eq!(created["submission_email"], "jane@example.com");
        assert_eq!(created["connections"], 42);
        assert_eq!(created["has_professional_photo"], true);
        assert_eq!(created["risk_level"], "high");
        assert_eq!(created["analyzed_by"], "admin");

        let (_, detail) = send(&app, "GET", &format!("/api/admin/submissions/{}", submission_id), Some(&admin), None).await;
        assert_eq!(detail["is_processed"], true);

        let (_, status_body) = send(
            &app,
            "GET",
            &format!("/api/admin/submissions/{}/analysis-status", submission_id),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status_body["has_analysis"], true);
        assert_eq!(status_body["analysis_id"], created["id"]);

        let (status, _) = send(
            &app,
            "POST",
            "/api/admin/analyses",
            Some(&admin),
            Some(json!({ "submission_id": submission_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_create_for_unknown_submission() {
        let state = test_state().await;
        let app = router(&state);
        let admin = admin_token(&state);

        let (status, body) = send(
            &app,
            "POST",
            "/api/admin/analyses",
            Some(&admin),
            Some(json!({ "submission_id": "S_MISSING" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "submission_id: Submission not found");
    }

    #[tokio::test]
    async fn test_lost_insert_race_is_a_conflict() {
        let state = test_state().await;
        let app = router(&state);
        let submission_id = submission(&state, &app, "jane@example.com").await;

        insert_raw_analysis(&state, "A_FIRST", &submission_id).await.unwrap();
        let err = insert_raw_analysis(&state, "A_SECOND", &submission_id)
            .await
            .unwrap_err();

        match analysis_insert_error(err, &submission_id) {
            ApiError::Conflict(message) => {
                assert_eq!(message, "An analysis already exists for this submission")
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_and_delete_analysis() {
        let state = test_state().await;
        let app = router(&state);
        let admin = admin_token(&state);
        let submission_id = submission(&state, &app, "jane@example.com").await;

        let (_, created) = send(
            &app,
            "POST",
            "/api/admin/analyses",
            Some(&admin),
            Some(json!({ "submission_id": submission_id, "summary": "first" })),
        )
        .await;
        let uri = format!("/api/admin/analyses/{}", created["id"].as_str().unwrap());
        assert_eq!(created["risk_level"], "medium");

        let (status, updated) = send(&app, "PUT", &uri, Some(&admin), Some(json!({ "low_connections": true }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["low_connections"], true);
        assert_eq!(updated["summary"], "first");

        let (status, _) = send(&app, "PUT", &uri, Some(&admin), Some(json!({ "score": 500 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, "DELETE", &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, _) = send(&app, "GET", &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Deleting the analysis does not reopen the submission
        let (_, detail) = send(&app, "GET", &format!("/api/admin/submissions/{}", submission_id), Some(&admin), None).await;
        assert_eq!(detail["is_processed"], true);
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let state = test_state().await;
        let app = router(&state);
        let admin = admin_token(&state);

        let first = submission(&state, &app, "a@example.com").await;
        let second = submission(&state, &app, "b@example.com").await;
        submission(&state, &app, "c@example.com").await;

        for (id, risk) in [(&first, "low"), (&second, "high")] {
            let (status, _) = send(
                &app,
                "POST",
                "/api/admin/analyses",
                Some(&admin),
                Some(json!({ "submission_id": id, "risk_level": risk })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, stats) = send(&app, "GET", "/api/admin/dashboard/stats", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            stats,
            json!({
                "total_submissions": 3,
                "processed_submissions": 2,
                "pending_submissions": 1,
                "analyzed_submissions": 2,
                "risk_distribution": { "low": 1, "medium": 0, "high": 1 }
            })
        );
    }
}
