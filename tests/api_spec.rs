use speculate2::speculate;

speculate! {
    use std::future::Future;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use uuid::Uuid;

    use velocoach::api::{create_router, AppState};
    use velocoach::coach::{CompletionRequest, OpenAiClient, Oracle, OracleError, RacePlanGenerator};
    use velocoach::config::OracleConfig;
    use velocoach::db::Database;
    use velocoach::models::{PlanSection, UpsertUserInput};

    enum Reply {
        Text(&'static str),
        Unauthorized,
        Unreachable,
    }

    /// Answers every call the same way.
    struct FixedOracle(Reply);

    #[async_trait]
    impl Oracle for FixedOracle {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, OracleError> {
            match self.0 {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::Unauthorized => Err(OracleError::Unauthorized(401)),
                Reply::Unreachable => Err(OracleError::Network("connection refused".into())),
            }
        }
    }

    fn run<F: Future>(future: F) -> F::Output {
        tokio::runtime::Runtime::new().unwrap().block_on(future)
    }

    fn setup_db() -> Database {
        let db = Database::open_in_memory().expect("Failed to open database");
        db.migrate().expect("Failed to migrate");
        db
    }

    fn create_user(db: &Database) -> Uuid {
        let id = Uuid::new_v4();
        db.upsert_user(UpsertUserInput {
            id,
            strava_athlete_id: None,
            display_name: "Marianne".into(),
            email: None,
        })
        .expect("Failed to create user");
        id
    }

    fn create_activity(db: &Database, user_id: Uuid, id: &str) {
        db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO activities (id, user_id, strava_activity_id, name, sport_type, started_at, created_at)
                 VALUES (?1, ?2, 9, 'Paris-Roubaix Challenge', 'Ride', '2026-04-11T07:00:00Z', '2026-04-11T16:00:00Z')",
                [id.to_string(), user_id.to_string()],
            )?;
            Ok(())
        })
        .expect("Failed to create activity");
    }

    fn state(db: Database, oracle: Arc<dyn Oracle>) -> AppState {
        let generator = RacePlanGenerator::new(oracle).with_retry_delay(Duration::from_millis(1));
        AppState::new(db, generator)
    }

    fn server(db: Database, oracle: Arc<dyn Oracle>) -> TestServer {
        TestServer::new(create_router(state(db, oracle))).unwrap()
    }

    fn fixed(reply: Reply) -> Arc<dyn Oracle> {
        Arc::new(FixedOracle(reply))
    }

    fn race_request() -> Value {
        json!({
            "routeAnalysis": {
                "distance": 142.0,
                "elevationGain": 2100,
                "elevationLoss": 2100,
                "climbs": [
                    { "name": "Mont Ventoux", "category": "HC", "averageGradient": 7.5, "elevationGain": 1600, "startDistance": 120 }
                ]
            },
            "riderProfile": { "type": "Climber", "ftp": 285, "weight": 68 }
        })
    }

    describe "health" {
        it "reports ok" {
            run(async {
                let server = server(setup_db(), fixed(Reply::Text("")));
                let response = server.get("/api/health").await;

                response.assert_status_ok();
                assert_eq!(response.json::<Value>()["status"], "ok");
            });
        }
    }

    describe "race plan" {
        it "returns every section plus the raw text" {
            run(async {
                let reply = r#"{"overallStrategy":"Save everything for Ventoux","finalPush":"Empty the tank at Chalet Reynard"}"#;
                let server = server(setup_db(), fixed(Reply::Text(reply)));

                let response = server.post("/api/race-plan").json(&race_request()).await;
                response.assert_status_ok();

                let body = response.json::<Value>();
                for section in PlanSection::ALL {
                    assert!(body.get(section.key()).is_some(), "missing {}", section.key());
                }
                assert_eq!(body["overallStrategy"], "Save everything for Ventoux");
                assert_eq!(body["nutrition"], "");
                assert_eq!(body["fullText"], reply);
            });
        }

        it "parses header-structured text" {
            run(async {
                let reply = "Overall Strategy\nPatience.\nNutrition & Hydration\n90 g carbs per hour.";
                let server = server(setup_db(), fixed(Reply::Text(reply)));

                let body = server
                    .post("/api/race-plan")
                    .json(&race_request())
                    .await
                    .json::<Value>();

                assert_eq!(body["overallStrategy"], "Patience.");
                assert_eq!(body["nutrition"], "90 g carbs per hour.");
            });
        }

        it "rejects a request without routeAnalysis" {
            run(async {
                let server = server(setup_db(), fixed(Reply::Text("unused")));

                let response = server
                    .post("/api/race-plan")
                    .json(&json!({ "riderProfile": { "ftp": 250 } }))
                    .await;

                response.assert_status(StatusCode::BAD_REQUEST);
                let body = response.json::<Value>();
                assert_eq!(body["error_code"], "VALIDATION_ERROR");
                assert_eq!(body["message"], "routeAnalysis is required");
            });
        }

        it "rejects a routeAnalysis that does not deserialize" {
            run(async {
                let server = server(setup_db(), fixed(Reply::Text("unused")));

                let response = server
                    .post("/api/race-plan")
                    .json(&json!({ "routeAnalysis": { "elevationGain": 300 } }))
                    .await;

                response.assert_status(StatusCode::BAD_REQUEST);
                let body = response.json::<Value>();
                assert_eq!(body["error_code"], "VALIDATION_ERROR");
                assert!(body["message"].as_str().unwrap().contains("distance"));
            });
        }

        it "rejects a body that is not JSON" {
            run(async {
                let server = server(setup_db(), fixed(Reply::Text("unused")));

                let response = server
                    .post("/api/race-plan")
                    .text("{ routeAnalysis")
                    .content_type("application/json")
                    .await;

                response.assert_status(StatusCode::BAD_REQUEST);
                assert_eq!(response.json::<Value>()["error_code"], "VALIDATION_ERROR");
            });
        }

        it "reports a missing API key as a configuration error" {
            run(async {
                let client = OpenAiClient::new(OracleConfig::default()).unwrap();
                let server = server(setup_db(), Arc::new(client));

                let response = server.post("/api/race-plan").json(&race_request()).await;

                response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
                let body = response.json::<Value>();
                assert_eq!(body["error_code"], "CONFIG_MISSING_API_KEY");
                assert!(body.get("details").is_none());
            });
        }

        it "reports oracle failures with their own code" {
            run(async {
                let server = server(setup_db(), fixed(Reply::Unauthorized));

                let response = server.post("/api/race-plan").json(&race_request()).await;

                response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(response.json::<Value>()["error_code"], "ORACLE_AUTH_FAILED");
            });
        }

        it "reports an unreachable oracle after retrying" {
            run(async {
                let server = server(setup_db(), fixed(Reply::Unreachable));

                let response = server.post("/api/race-plan").json(&race_request()).await;

                response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(response.json::<Value>()["error_code"], "ORACLE_UNAVAILABLE");
            });
        }
    }

    describe "preferences" {
        it "creates defaults on first write and applies partial updates" {
            run(async {
                let db = setup_db();
                let user_id = create_user(&db);
                let server = server(db, fixed(Reply::Text("")));
                let path = format!("/api/users/{user_id}/preferences");

                server.get(&path).await.assert_status(StatusCode::NOT_FOUND);

                let created = server.put(&path).json(&json!({ "ftp": 260 })).await;
                created.assert_status_ok();
                let body = created.json::<Value>();
                assert_eq!(body["ftp"], 260);
                assert_eq!(body["theme"], "system");

                let updated = server.put(&path).json(&json!({ "theme": "dark" })).await.json::<Value>();
                assert_eq!(updated["ftp"], 260);
                assert_eq!(updated["theme"], "dark");

                server.get(&path).await.assert_status_ok();
            });
        }

        it "clears nullable fields with an explicit null" {
            run(async {
                let db = setup_db();
                let user_id = create_user(&db);
                let server = server(db, fixed(Reply::Text("")));
                let path = format!("/api/users/{user_id}/preferences");

                server
                    .put(&path)
                    .json(&json!({ "ftp": 260, "timezone": "Europe/Paris" }))
                    .await
                    .assert_status_ok();

                let body = server.put(&path).json(&json!({ "ftp": null })).await.json::<Value>();
                assert!(body["ftp"].is_null());
                assert_eq!(body["timezone"], "Europe/Paris");
            });
        }

        it "rejects a malformed user id" {
            run(async {
                let server = server(setup_db(), fixed(Reply::Text("")));

                let response = server.get("/api/users/not-a-uuid/preferences").await;
                response.assert_status(StatusCode::BAD_REQUEST);
                assert_eq!(response.json::<Value>()["error_code"], "VALIDATION_ERROR");
            });
        }

        it "returns 404 for an unknown user" {
            run(async {
                let server = server(setup_db(), fixed(Reply::Text("")));
                let path = format!("/api/users/{}/preferences", Uuid::new_v4());

                let response = server.put(&path).json(&json!({ "ftp": 260 })).await;
                response.assert_status(StatusCode::NOT_FOUND);
                assert_eq!(response.json::<Value>()["error_code"], "NOT_FOUND");
            });
        }
    }

    describe "training plans" {
        it "creates, lists, fetches and deletes" {
            run(async {
                let db = setup_db();
                let user_id = create_user(&db);
                let server = server(db, fixed(Reply::Text("")));

                let created = server
                    .post(&format!("/api/users/{user_id}/training-plans"))
                    .json(&json!({
                        "event_name": "Marmotte",
                        "event_date": "2027-07-04",
                        "event_type": "gran_fondo",
                        "target_rider_type": "climber",
                        "plan": { "weeks": 12 }
                    }))
                    .await;
                created.assert_status(StatusCode::CREATED);
                let plan = created.json::<Value>();
                let id = plan["id"].as_str().unwrap().to_string();
                assert_eq!(plan["event_date"], "2027-07-04");

                let listed = server
                    .get(&format!("/api/users/{user_id}/training-plans"))
                    .await
                    .json::<Vec<Value>>();
                assert_eq!(listed.len(), 1);

                let fetched = server.get(&format!("/api/training-plans/{id}")).await;
                fetched.assert_status_ok();
                assert_eq!(fetched.json::<Value>()["plan"]["weeks"], 12);

                server
                    .delete(&format!("/api/training-plans/{id}"))
                    .await
                    .assert_status(StatusCode::NO_CONTENT);
                server
                    .delete(&format!("/api/training-plans/{id}"))
                    .await
                    .assert_status(StatusCode::NOT_FOUND);
            });
        }

        it "includes error details on storage failures when enabled" {
            run(async {
                let db = setup_db();
                let user_id = create_user(&db);
                db.with_connection(|conn| {
                    conn.execute_batch("DROP TABLE training_plans;")?;
                    Ok(())
                })
                .unwrap();
                let app = create_router(state(db, fixed(Reply::Text(""))).with_error_details(true));
                let server = TestServer::new(app).unwrap();

                let response = server.get(&format!("/api/users/{user_id}/training-plans")).await;

                response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
                let body = response.json::<Value>();
                assert_eq!(body["error_code"], "INTERNAL_ERROR");
                assert!(body["details"].as_str().unwrap().contains("training_plans"));
            });
        }

        it "rejects an empty event name" {
            run(async {
                let db = setup_db();
                let user_id = create_user(&db);
                let server = server(db, fixed(Reply::Text("")));

                let response = server
                    .post(&format!("/api/users/{user_id}/training-plans"))
                    .json(&json!({ "event_name": "  ", "plan": {} }))
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
            });
        }
    }

    describe "race tags" {
        it "tags an activity and classifies it later" {
            run(async {
                let db = setup_db();
                let user_id = create_user(&db);
                create_activity(&db, user_id, "act-9");
                let server = server(db, fixed(Reply::Text("")));

                let created = server
                    .post(&format!("/api/users/{user_id}/race-tags"))
                    .json(&json!({ "activity_id": "act-9", "race_type": null }))
                    .await;
                created.assert_status(StatusCode::CREATED);
                let id = created.json::<Value>()["id"].as_str().unwrap().to_string();

                let updated = server
                    .put(&format!("/api/race-tags/{id}/race-type"))
                    .json(&json!({ "race_type": "gran_fondo" }))
                    .await;
                updated.assert_status_ok();
                assert_eq!(updated.json::<Value>()["race_type"], "gran_fondo");

                let tags = server
                    .get(&format!("/api/users/{user_id}/race-tags"))
                    .await
                    .json::<Vec<Value>>();
                assert_eq!(tags.len(), 1);

                server
                    .delete(&format!("/api/race-tags/{id}"))
                    .await
                    .assert_status(StatusCode::NO_CONTENT);
            });
        }

        it "refuses to tag the same activity twice" {
            run(async {
                let db = setup_db();
                let user_id = create_user(&db);
                create_activity(&db, user_id, "act-9");
                let server = server(db, fixed(Reply::Text("")));
                let path = format!("/api/users/{user_id}/race-tags");

                server
                    .post(&path)
                    .json(&json!({ "activity_id": "act-9", "race_type": "criterium" }))
                    .await
                    .assert_status(StatusCode::CREATED);

                let response = server
                    .post(&path)
                    .json(&json!({ "activity_id": "act-9", "race_type": "road_race" }))
                    .await;
                response.assert_status(StatusCode::CONFLICT);
                assert_eq!(response.json::<Value>()["error_code"], "CONFLICT");
            });
        }

        it "returns 404 when the activity is unknown" {
            run(async {
                let db = setup_db();
                let user_id = create_user(&db);
                let server = server(db, fixed(Reply::Text("")));

                let response = server
                    .post(&format!("/api/users/{user_id}/race-tags"))
                    .json(&json!({ "activity_id": "act-missing", "race_type": null }))
                    .await;
                response.assert_status(StatusCode::NOT_FOUND);
                assert_eq!(response.json::<Value>()["message"], "activity not found");
            });
        }

        it "returns 404 when classifying an unknown tag" {
            run(async {
                let server = server(setup_db(), fixed(Reply::Text("")));

                server
                    .put(&format!("/api/race-tags/{}/race-type", Uuid::new_v4()))
                    .json(&json!({ "race_type": "criterium" }))
                    .await
                    .assert_status(StatusCode::NOT_FOUND);
            });
        }
    }
}
