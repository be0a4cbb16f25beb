//! API layer - HTTP entry points.
//!
//! Every response body is the `{status, data, message}` envelope from
//! `statedb_shared`. Game-state routes live under `/state`, key management
//! under `/auth`, pass-through calls to peer services under `/proxy`.

use std::sync::Arc;

use axum::{middleware, Json, Router};
use statedb_shared::ApiResponse;

use crate::app::App;

pub mod auth;
pub mod error;
pub mod extract;
mod health;
mod inquiry;
mod manage;
mod proxy;
mod scenario;
mod session;
mod state;
mod trace;
mod update;

pub use error::ApiError;

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub(crate) fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

pub(crate) fn ok_with<T>(data: T, message: impl Into<String>) -> ApiResult<T> {
    Ok(Json(ApiResponse::success_with_message(data, message)))
}

/// Build the full router.
pub fn router(app: Arc<App>) -> Router {
    let gate = middleware::from_fn_with_state(app.clone(), auth::require_api_key);

    let state_routes = Router::new()
        .merge(scenario::routes())
        .merge(session::routes())
        .merge(inquiry::routes())
        .merge(update::routes())
        .merge(manage::routes())
        .merge(state::routes())
        .merge(trace::routes())
        .route_layer(gate);

    Router::new()
        .merge(health::routes())
        .nest("/state", state_routes)
        .nest("/proxy", proxy::routes())
        .nest("/auth", auth::routes())
        .with_state(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Repositories;
    use crate::infrastructure::ports::{
        MockApiKeyRepo, MockEntityRepo, MockGmPort, MockHealthRepo, MockPlayerRepo,
        MockProgressRepo, MockRandomPort, MockRuleEnginePort, MockScenarioRepo, MockSessionRepo,
        MockTraceRepo, ProxyError, RepoError,
    };
    use crate::use_cases::auth::hash_api_key;
    use crate::use_cases::session::tests::session;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use chrono::Utc;
    use serde_json::{json, Value};
    use statedb_domain::{
        ApiKey, ApiKeyId, EnemyHpUpdate, EnemyId, Phase, PhaseState, PlayerId, SessionId,
        SessionStatus,
    };
    use tower::ServiceExt;

    struct Mocks {
        scenario: MockScenarioRepo,
        session: MockSessionRepo,
        progress: MockProgressRepo,
        player: MockPlayerRepo,
        entity: MockEntityRepo,
        trace: MockTraceRepo,
        api_key: MockApiKeyRepo,
        health: MockHealthRepo,
        rule_engine: MockRuleEnginePort,
        gm: MockGmPort,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                scenario: MockScenarioRepo::new(),
                session: MockSessionRepo::new(),
                progress: MockProgressRepo::new(),
                player: MockPlayerRepo::new(),
                entity: MockEntityRepo::new(),
                trace: MockTraceRepo::new(),
                api_key: MockApiKeyRepo::new(),
                health: MockHealthRepo::new(),
                rule_engine: MockRuleEnginePort::new(),
                gm: MockGmPort::new(),
            }
        }

        fn router(self, require_api_key: bool) -> Router {
            let repositories = Repositories {
                scenario: Arc::new(self.scenario),
                session: Arc::new(self.session),
                progress: Arc::new(self.progress),
                player: Arc::new(self.player),
                entity: Arc::new(self.entity),
                trace: Arc::new(self.trace),
                api_key: Arc::new(self.api_key),
                health: Arc::new(self.health),
            };
            let app = App::new(
                repositories,
                Arc::new(self.rule_engine),
                Arc::new(self.gm),
                Arc::new(MockRandomPort::new()),
                require_api_key,
            );
            router(Arc::new(app))
        }
    }

    async fn send(router: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn health_answers_with_envelope() {
        let (status, body) = send(Mocks::new().router(false), Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["status"], "healthy");
    }

    #[tokio::test]
    async fn malformed_path_uuid_is_400_envelope() {
        let (status, body) = send(
            Mocks::new().router(false),
            Method::GET,
            "/state/session/not-a-uuid",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn missing_session_is_404_envelope() {
        let mut mocks = Mocks::new();
        mocks.session.expect_get().returning(|_| Ok(None));
        let id = SessionId::new();

        let (status, body) = send(
            mocks.router(false),
            Method::GET,
            &format!("/state/session/{id}"),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn changes_with_act_zero_are_rejected_before_any_write() {
        let mut mocks = Mocks::new();
        mocks.progress.expect_set_act().never();
        mocks.progress.expect_set_sequence().never();
        let id = SessionId::new();

        let (status, body) = send(
            mocks.router(false),
            Method::POST,
            &format!("/state/session/{id}/changes"),
            Some(json!({"act": 0, "sequence": 1})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn database_constraint_violation_is_400_not_500() {
        let mut mocks = Mocks::new();
        mocks.player.expect_update_hp().returning(|_, _, _| {
            Err(RepoError::constraint(
                "value \"2147483648\" is out of range for type integer",
            ))
        });
        let id = SessionId::new();
        let player_id = PlayerId::new();

        let (status, body) = send(
            mocks.router(false),
            Method::POST,
            &format!("/state/session/{id}/changes"),
            Some(json!({"player_id": player_id, "player_hp": i32::MAX})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn start_with_malformed_scenario_id_is_400() {
        let (status, body) = send(
            Mocks::new().router(false),
            Method::POST,
            "/state/session/start",
            Some(json!({"scenario_id": "abc"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid scenario_id: abc");
    }

    #[tokio::test]
    async fn resuming_active_session_is_409() {
        let mut mocks = Mocks::new();
        mocks
            .session
            .expect_get()
            .returning(|id| Ok(Some(session(id, SessionStatus::Active))));
        let id = SessionId::new();

        let (status, _) = send(
            mocks.router(false),
            Method::POST,
            &format!("/state/session/{id}/resume"),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn enemy_hp_update_reports_clamped_value() {
        let session_id = SessionId::new();
        let enemy_id = EnemyId::new();
        let mut mocks = Mocks::new();
        mocks
            .entity
            .expect_update_enemy_hp()
            .withf(move |sid, eid, delta| *sid == session_id && *eid == enemy_id && *delta == -35)
            .returning(|_, eid, delta| {
                Ok(Some(EnemyHpUpdate {
                    enemy_instance_id: eid,
                    current_hp: 0,
                    max_hp: 30,
                    hp_change: delta,
                    is_defeated: true,
                }))
            });

        let (status, body) = send(
            mocks.router(false),
            Method::PUT,
            &format!("/state/enemy/{enemy_id}/hp"),
            Some(json!({"session_id": session_id, "hp_change": -35})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["current_hp"], 0);
        assert_eq!(body["data"]["is_defeated"], true);
    }

    #[tokio::test]
    async fn enemies_listing_honours_active_only_flag() {
        let mut mocks = Mocks::new();
        mocks
            .entity
            .expect_session_enemies()
            .withf(|_, active_only| !*active_only)
            .times(1)
            .returning(|_, _| Ok(vec![]));
        let id = SessionId::new();

        let (status, body) = send(
            mocks.router(false),
            Method::GET,
            &format!("/state/session/{id}/enemies?active_only=false"),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn unknown_phase_is_400() {
        let mut mocks = Mocks::new();
        mocks.session.expect_change_phase().never();
        let id = SessionId::new();

        let (status, _) = send(
            mocks.router(false),
            Method::PUT,
            &format!("/state/session/{id}/phase"),
            Some(json!({"new_phase": "sleeping"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn phase_change_and_phase_read_share_a_path() {
        let mut mocks = Mocks::new();
        mocks
            .session
            .expect_change_phase()
            .withf(|_, phase| *phase == Phase::Combat)
            .returning(|id, phase| {
                Ok(Some(PhaseState {
                    session_id: id,
                    current_phase: phase,
                }))
            });
        mocks.session.expect_get_phase().returning(|id| {
            Ok(Some(PhaseState {
                session_id: id,
                current_phase: Phase::Combat,
            }))
        });
        let router = mocks.router(false);
        let id = SessionId::new();
        let uri = format!("/state/session/{id}/phase");

        let (put_status, put_body) = send(
            router.clone(),
            Method::PUT,
            &uri,
            Some(json!({"new_phase": "combat"})),
        )
        .await;
        let (get_status, get_body) = send(router, Method::GET, &uri, None).await;

        assert_eq!(put_status, StatusCode::OK);
        assert_eq!(put_body["message"], "Phase changed to combat");
        assert_eq!(get_status, StatusCode::OK);
        assert_eq!(get_body["data"]["current_phase"], "combat");
    }

    #[tokio::test]
    async fn injection_with_unknown_relation_endpoint_is_400() {
        let mut mocks = Mocks::new();
        mocks.scenario.expect_inject().never();

        let (status, body) = send(
            mocks.router(false),
            Method::POST,
            "/state/scenario/inject",
            Some(json!({
                "title": "T",
                "sequences": [{"id": "seq-1", "name": "Start", "npcs": ["elder"]}],
                "npcs": [{"scenario_npc_id": "elder", "name": "Elder"}],
                "relations": [{"from_id": "elder", "to_id": "ghost"}]
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("ghost"));
    }

    #[tokio::test]
    async fn unreachable_rule_engine_is_503() {
        let mut mocks = Mocks::new();
        mocks.session.expect_get_phase().returning(|id| {
            Ok(Some(PhaseState {
                session_id: id,
                current_phase: Phase::Combat,
            }))
        });
        mocks.rule_engine.expect_validate_action().returning(|_, _| {
            Err(ProxyError::Unavailable {
                base_url: "http://localhost:8050".to_string(),
                detail: "connection refused".to_string(),
            })
        });
        let id = SessionId::new();

        let (status, body) = send(
            mocks.router(false),
            Method::POST,
            &format!("/state/session/{id}/action"),
            Some(json!({"player_id": PlayerId::new(), "action": {"action_type": "attack"}})),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn gate_rejects_missing_key() {
        let mut mocks = Mocks::new();
        mocks.scenario.expect_list().never();

        let (status, body) = send(mocks.router(true), Method::GET, "/state/scenarios", None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Missing X-API-Key header");
    }

    #[tokio::test]
    async fn gate_accepts_active_key() {
        let mut mocks = Mocks::new();
        mocks
            .api_key
            .expect_verify()
            .withf(|hash| hash == hash_api_key("secret"))
            .returning(|_| {
                Ok(Some(ApiKey {
                    api_key_id: ApiKeyId::new(),
                    key_name: "gm".to_string(),
                    created_at: Utc::now(),
                    last_used_at: None,
                    is_active: true,
                }))
            });
        mocks.scenario.expect_list().returning(|| Ok(vec![]));
        let request = Request::builder()
            .uri("/state/scenarios")
            .header(auth::API_KEY_HEADER, "secret")
            .body(Body::empty())
            .unwrap();

        let response = mocks.router(true).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_stays_open_when_gate_is_on() {
        let (status, _) = send(Mocks::new().router(true), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn proxy_health_reports_degraded_peer() {
        let mut mocks = Mocks::new();
        mocks
            .rule_engine
            .expect_health()
            .returning(|| Ok(json!({"status": "ok"})));
        mocks.gm.expect_health().returning(|| {
            Err(ProxyError::Timeout {
                base_url: "http://localhost:8020".to_string(),
                detail: "timed out".to_string(),
            })
        });

        let (status, body) = send(mocks.router(false), Method::GET, "/health/proxy", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "degraded");
        assert_eq!(body["data"]["services"]["rule_engine"], "connected");
    }
}
