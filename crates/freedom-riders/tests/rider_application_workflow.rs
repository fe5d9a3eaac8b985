//! End-to-end checks for the rider application wizard delivering over real HTTP.
//!
//! A local axum server stands in for the intake endpoint so each scenario can count
//! the POSTs it receives and script the reply.

mod common {
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::Router;
    use serde_json::Value;

    use freedom_riders::config::IntakeConfig;
    use freedom_riders::workflows::rider_application::{
        ApplicationFields, ApplicationFormEngine, EmergencyContact, Gender, HttpIntake,
        LicenseExperience, MotorbikeCondition, MotorbikeDetails, PersonalInfo, Region,
        VehicleInfo, WizardStep, WorkPreferences, WorkingHours, WorkingModel,
    };

    #[derive(Clone)]
    pub(super) enum Reply {
        Json(u16, Value),
        Text(u16, &'static str),
    }

    #[derive(Clone)]
    struct MockState {
        reply: Reply,
        received: Arc<Mutex<Vec<Value>>>,
    }

    /// Running stand-in for the intake endpoint.
    pub(super) struct MockIntake {
        pub(super) endpoint: String,
        received: Arc<Mutex<Vec<Value>>>,
    }

    impl MockIntake {
        pub(super) async fn start(reply: Reply) -> Self {
            let received = Arc::new(Mutex::new(Vec::new()));
            let state = MockState {
                reply,
                received: received.clone(),
            };
            let app = Router::new()
                .route("/api/v2/riders/apply", post(apply))
                .with_state(state);

            let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
                .await
                .expect("bind mock intake");
            let addr = listener.local_addr().expect("local addr");
            tokio::spawn(async move {
                axum::serve(listener, app).await.expect("mock intake serves");
            });

            Self {
                endpoint: format!("http://{addr}/api/v2/riders/apply"),
                received,
            }
        }

        pub(super) fn received(&self) -> Vec<Value> {
            self.received.lock().expect("mock mutex poisoned").clone()
        }
    }

    async fn apply(State(state): State<MockState>, axum::Json(body): axum::Json<Value>) -> Response {
        state
            .received
            .lock()
            .expect("mock mutex poisoned")
            .push(body);

        match state.reply {
            Reply::Json(status, body) => (
                StatusCode::from_u16(status).expect("valid status"),
                axum::Json(body),
            )
                .into_response(),
            Reply::Text(status, body) => {
                (StatusCode::from_u16(status).expect("valid status"), body).into_response()
            }
        }
    }

    pub(super) fn http_intake(endpoint: &str) -> Arc<HttpIntake> {
        let config = IntakeConfig::new(endpoint, Some(Duration::from_secs(5))).expect("valid url");
        Arc::new(HttpIntake::new(&config).expect("client builds"))
    }

    pub(super) fn application(has_motorbike: bool) -> ApplicationFields {
        ApplicationFields {
            personal: PersonalInfo {
                first_name: "Akosua".to_string(),
                last_name: "Asante".to_string(),
                email: "akosua.asante@example.com".to_string(),
                phone: "+233 26 444 9090".to_string(),
                date_of_birth: "1996-07-02".to_string(),
                gender: Some(Gender::Female),
                address: "18 Liberation Road".to_string(),
                city: "Takoradi".to_string(),
                region: Some(Region::Western),
            },
            work: WorkPreferences {
                working_model: Some(WorkingModel::External),
                preferred_working_hours: Some(WorkingHours::Flexible),
            },
            vehicle: VehicleInfo {
                has_motorbike: Some(has_motorbike),
                motorbike_details: if has_motorbike {
                    MotorbikeDetails {
                        make: "Yamaha".to_string(),
                        model: "Crux".to_string(),
                        year: "2022".to_string(),
                        registration_number: "WR 3310-22".to_string(),
                        condition: Some(MotorbikeCondition::Excellent),
                    }
                } else {
                    MotorbikeDetails::default()
                },
                interested_in_ownership_program: !has_motorbike,
            },
            license: LicenseExperience {
                license_number: "GH-DL-771204".to_string(),
                license_expiry_date: "2028-02-14".to_string(),
                years_of_riding_experience: "5".to_string(),
                has_commercial_experience: false,
            },
            emergency_contact: EmergencyContact {
                first_name: "Kojo".to_string(),
                last_name: "Asante".to_string(),
                phone: "+233 20 888 1212".to_string(),
                relationship: "Father".to_string(),
            },
        }
    }

    pub(super) fn engine_at_final_step(
        intake: Arc<HttpIntake>,
        fields: ApplicationFields,
    ) -> ApplicationFormEngine<HttpIntake> {
        let mut engine = ApplicationFormEngine::with_fields(intake, fields);
        while engine.current_step() != WizardStep::LAST {
            let before = engine.current_step();
            assert_ne!(engine.next_step(), before, "fixture must pass every step");
        }
        engine
    }
}

mod delivery {
    use super::common::*;
    use serde_json::json;

    use freedom_riders::workflows::rider_application::{
        ApplicationFormEngine, FieldPath, SubmissionStatus, WizardStep, NETWORK_ERROR_MESSAGE,
        SUBMISSION_FAILED_MESSAGE,
    };

    #[tokio::test]
    async fn accepted_application_is_posted_exactly_once() {
        let mock = MockIntake::start(Reply::Json(
            201,
            json!({ "success": true, "message": "Application received" }),
        ))
        .await;
        let mut engine = engine_at_final_step(http_intake(&mock.endpoint), application(true));

        assert_eq!(engine.submit().await, &SubmissionStatus::Succeeded);
        assert_eq!(engine.submit().await, &SubmissionStatus::Succeeded);

        let received = mock.received();
        assert_eq!(received.len(), 1);
        let body = &received[0];
        assert_eq!(body["firstName"], "Akosua");
        assert_eq!(body["region"], "Western");
        assert_eq!(body["workingModel"], "external");
        assert_eq!(body["yearsOfRidingExperience"], json!(5));
        assert_eq!(body["motorbikeDetails"]["year"], json!(2022));
        assert_eq!(body["motorbikeDetails"]["condition"], "excellent");
        assert_eq!(body["emergencyContact"]["relationship"], "Father");
    }

    #[tokio::test]
    async fn riders_without_a_motorbike_send_no_details() {
        let mock = MockIntake::start(Reply::Json(200, json!({ "success": true }))).await;
        let mut engine = engine_at_final_step(http_intake(&mock.endpoint), application(false));

        engine.submit().await;

        let received = mock.received();
        assert_eq!(received.len(), 1);
        assert!(received[0].get("motorbikeDetails").is_none());
        assert_eq!(received[0]["hasMotorbike"], json!(false));
        assert_eq!(received[0]["interestedInOwnershipProgram"], json!(true));
    }

    #[tokio::test]
    async fn rejection_message_is_surfaced() {
        let mock = MockIntake::start(Reply::Json(
            422,
            json!({ "success": false, "message": "License has expired" }),
        ))
        .await;
        let mut engine = engine_at_final_step(http_intake(&mock.endpoint), application(true));

        assert_eq!(
            engine.submit().await,
            &SubmissionStatus::Failed {
                message: "License has expired".to_string()
            }
        );
    }

    #[tokio::test]
    async fn ok_status_with_unsuccessful_body_fails_generically() {
        let mock = MockIntake::start(Reply::Json(200, json!({ "success": false }))).await;
        let mut engine = engine_at_final_step(http_intake(&mock.endpoint), application(false));

        assert_eq!(
            engine.submit().await,
            &SubmissionStatus::Failed {
                message: SUBMISSION_FAILED_MESSAGE.to_string()
            }
        );
    }

    #[tokio::test]
    async fn non_json_reply_counts_as_network_error() {
        let mock = MockIntake::start(Reply::Text(502, "<html>Bad Gateway</html>")).await;
        let mut engine = engine_at_final_step(http_intake(&mock.endpoint), application(false));

        assert_eq!(
            engine.submit().await,
            &SubmissionStatus::Failed {
                message: NETWORK_ERROR_MESSAGE.to_string()
            }
        );
        assert_eq!(mock.received().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_endpoint_counts_as_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let intake = http_intake(&format!("http://{addr}/api/v2/riders/apply"));
        let mut engine = engine_at_final_step(intake, application(true));

        assert_eq!(
            engine.submit().await,
            &SubmissionStatus::Failed {
                message: NETWORK_ERROR_MESSAGE.to_string()
            }
        );
    }

    #[tokio::test]
    async fn incomplete_final_step_never_reaches_the_network() {
        let mock = MockIntake::start(Reply::Json(201, json!({ "success": true }))).await;
        let mut engine = engine_at_final_step(http_intake(&mock.endpoint), application(true));
        engine
            .update_field(FieldPath::EmergencyRelationship, "")
            .expect("text field");

        assert_eq!(engine.submit().await, &SubmissionStatus::Idle);
        assert_eq!(
            engine.validation_errors().get(FieldPath::EmergencyRelationship),
            Some("Relationship is required")
        );
        assert!(mock.received().is_empty());
    }

    #[tokio::test]
    async fn applicant_walks_the_wizard_with_a_missing_make() {
        let mock = MockIntake::start(Reply::Json(201, json!({ "success": true }))).await;
        let mut fields = application(true);
        fields.vehicle.motorbike_details.make.clear();
        let mut engine = ApplicationFormEngine::with_fields(http_intake(&mock.endpoint), fields);

        assert_eq!(engine.next_step(), WizardStep::WorkPreferences);
        assert_eq!(engine.next_step(), WizardStep::Vehicle);
        assert_eq!(engine.next_step(), WizardStep::Vehicle);
        assert_eq!(
            engine.validation_errors().iter().collect::<Vec<_>>(),
            vec![(FieldPath::MotorbikeMake, "Motorbike make is required")]
        );

        engine
            .update_field(FieldPath::MotorbikeMake, "Yamaha")
            .expect("text field");
        assert!(engine.validation_errors().is_empty());
        assert_eq!(engine.next_step(), WizardStep::LicenseExperience);
        assert_eq!(engine.next_step(), WizardStep::EmergencyContact);
        assert_eq!(engine.submit().await, &SubmissionStatus::Succeeded);
        assert_eq!(mock.received().len(), 1);
    }
}

mod http_sessions {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    use freedom_riders::workflows::rider_application::{form_router, FormSessionStore};

    async fn call(router: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).expect("serialize")))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = router
            .clone()
            .oneshot(request)
            .await
            .expect("router dispatch");
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).expect("json")
        };
        (status, payload)
    }

    #[tokio::test]
    async fn draft_session_submits_through_http_intake() {
        let mock = MockIntake::start(Reply::Json(201, json!({ "success": true }))).await;
        let store = Arc::new(FormSessionStore::new(http_intake(&mock.endpoint)));
        let session = store.open_with_fields(application(true)).await;
        let id = session.lock().await.id.to_string();
        let router = form_router(store.clone());
        let base = format!("/api/v1/rider-applications/sessions/{id}");

        let (status, payload) = call(&router, "POST", &format!("{base}/submit"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["submission"]["state"], "idle");
        assert!(mock.received().is_empty());

        for _ in 1..5 {
            call(&router, "POST", &format!("{base}/next"), None).await;
        }
        let (_, payload) = call(&router, "POST", &format!("{base}/submit"), None).await;
        assert_eq!(payload["submission"]["state"], "succeeded");
        assert_eq!(mock.received().len(), 1);

        let (status, _) = call(&router, "DELETE", &base, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, payload) = call(&router, "GET", &base, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(payload["error"].as_str().is_some_and(|e| e.contains(&id)));
    }

    #[tokio::test]
    async fn malformed_field_updates_are_unprocessable() {
        let store = Arc::new(FormSessionStore::new(http_intake(
            "http://127.0.0.1:9/api/v2/riders/apply",
        )));
        let router = form_router(store);
        let (status, payload) = call(&router, "POST", "/api/v1/rider-applications/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = payload["sessionId"].as_str().expect("id").to_string();
        let fields = format!("/api/v1/rider-applications/sessions/{id}/fields");

        let (status, _) = call(
            &router,
            "PATCH",
            &fields,
            Some(json!({ "path": "region", "value": "Lagos" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, payload) = call(
            &router,
            "PATCH",
            &fields,
            Some(json!({ "path": "motorbikeDetails.year", "value": 2020 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["fields"]["motorbikeDetails"]["year"], "2020");
    }
}
