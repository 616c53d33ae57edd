//! End-to-End-Tests der REST-API gegen In-Memory-Backends

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use pforte_api::{api_router, ApiState};
use pforte_auth::{
    AuthEinstellungen, AuthService, JwtAussteller, JwtKonfig, OrganisationService,
    SpeicherSessionCache,
};
use pforte_db::SqliteDb;
use pforte_observability::{ereignis, HealthState, PforteMetrics};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    aussteller: Arc<JwtAussteller>,
    metriken: PforteMetrics,
}

async fn test_app(auth_erforderlich: bool) -> TestApp {
    let db = Arc::new(SqliteDb::in_memory().await.expect("In-Memory DB"));
    let cache = SpeicherSessionCache::neu();
    let aussteller = Arc::new(
        JwtAussteller::neu(&JwtKonfig::neu("http-test-secret-mit-mindestens-32-bytes"))
            .expect("Aussteller"),
    );
    let metriken = PforteMetrics::neu().expect("Metriken");

    let auth = Arc::new(AuthService::neu(
        db.clone(),
        cache,
        aussteller.clone(),
        AuthEinstellungen::default(),
    ));
    let organisationen = Arc::new(OrganisationService::neu(db.clone(), db));

    let state = ApiState::neu(
        auth,
        organisationen,
        metriken.clone(),
        HealthState::neu(),
        auth_erforderlich,
    );

    TestApp {
        router: api_router(state),
        aussteller,
        metriken,
    }
}

impl TestApp {
    async fn senden(&self, req: Request<Body>) -> (StatusCode, Value) {
        let antwort = self.router.clone().oneshot(req).await.unwrap();
        let status = antwort.status();
        let bytes = axum::body::to_bytes(antwort.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn json(
        &self,
        methode: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(methode).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.senden(req).await
    }

    async fn refresh(&self, formular: &str) -> (StatusCode, Value) {
        let req = Request::post("/refresh-token")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(formular.to_string()))
            .unwrap();
        self.senden(req).await
    }

    async fn registrieren(&self, name: &str, email: &str, passwort: &str) -> StatusCode {
        let body = json!({ "name": name, "email": email, "password": passwort });
        self.json(Method::POST, "/signup", Some(body), None).await.0
    }

    async fn anmelden(&self, email: &str, passwort: &str) -> (StatusCode, Value) {
        let body = json!({ "email": email, "password": passwort });
        self.json(Method::POST, "/signin", Some(body), None).await
    }

    /// Registriert und meldet an, gibt das Access-Token zurueck
    async fn access_token(&self, email: &str) -> String {
        assert_eq!(self.registrieren("Tester", email, "pw").await, StatusCode::CREATED);
        let (status, body) = self.anmelden(email, "pw").await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn organisation_erstellen(&self, token: &str, body: Value) -> String {
        let (status, antwort) = self
            .json(Method::POST, "/organization", Some(body), Some(token))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{antwort}");
        antwort["organization_id"].as_str().unwrap().to_string()
    }
}

// ---------------------------------------------------------------------------
// Registrierung & Anmeldung
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signup_erfolgreich_und_doppelt() {
    let app = test_app(true).await;

    let body = json!({ "name": "Ada", "email": "ada@example.com", "password": "pw" });
    let (status, antwort) = app.json(Method::POST, "/signup", Some(body), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(antwort, json!({ "message": "user created successfully" }));

    assert_eq!(
        app.registrieren("Ada", "ADA@example.com", "anderes").await,
        StatusCode::CONFLICT
    );
}

#[tokio::test]
async fn signup_mit_kaputtem_body() {
    let app = test_app(true).await;

    let req = Request::post("/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ kein json"))
        .unwrap();
    let (status, antwort) = app.senden(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(antwort["error"].is_string());

    let (status, _) = app
        .json(Method::POST, "/signup", Some(json!({ "name": "Ada" })), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(
        app.registrieren("Ada", "keine-email", "pw").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn signin_liefert_zwei_verschiedene_tokens() {
    let app = test_app(true).await;
    app.registrieren("Ada", "ada@example.com", "geheim").await;

    let (status, antwort) = app.anmelden("ada@example.com", "geheim").await;
    assert_eq!(status, StatusCode::OK);

    let access = antwort["access_token"].as_str().unwrap();
    let refresh = antwort["refresh_token"].as_str().unwrap();
    assert!(!access.is_empty() && !refresh.is_empty());
    assert_ne!(access, refresh);

    let access_claims = app.aussteller.verifizieren(access).unwrap();
    let refresh_claims = app.aussteller.verifizieren(refresh).unwrap();
    assert_eq!(access_claims.user_id, refresh_claims.user_id);
    assert!(access_claims.exp < refresh_claims.exp);

    let erfolge = app
        .metriken
        .auth_ereignisse_total
        .with_label_values(&[ereignis::ANMELDUNG_ERFOLG])
        .get();
    assert_eq!(erfolge, 1);
}

#[tokio::test]
async fn signin_fehler_sind_identisch() {
    let app = test_app(true).await;
    app.registrieren("Ada", "ada@example.com", "richtig").await;

    let unbekannt = app.anmelden("niemand@example.com", "richtig").await;
    let falsch = app.anmelden("ada@example.com", "falsch").await;

    assert_eq!(unbekannt.0, StatusCode::UNAUTHORIZED);
    assert_eq!(unbekannt, falsch);
    assert_eq!(unbekannt.1, json!({ "error": "invalid credentials" }));
}

// ---------------------------------------------------------------------------
// Token-Erneuerung
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_behaelt_identitaet() {
    let app = test_app(true).await;
    app.registrieren("Ada", "ada@example.com", "pw").await;
    let (_, paar) = app.anmelden("ada@example.com", "pw").await;
    let refresh = paar["refresh_token"].as_str().unwrap();

    let (status, antwort) = app.refresh(&format!("refresh_token={refresh}")).await;
    assert_eq!(status, StatusCode::OK);

    let neu = antwort["access_token"].as_str().unwrap();
    assert_eq!(
        app.aussteller.verifizieren(neu).unwrap().user_id,
        app.aussteller.verifizieren(refresh).unwrap().user_id
    );
}

#[tokio::test]
async fn refresh_fehlerfaelle() {
    let app = test_app(true).await;

    let (status, antwort) = app.refresh("").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(antwort, json!({ "error": "refresh_token is required" }));

    let (status, _) = app.refresh("refresh_token=kein.gueltiges.token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Korrekt signiert, aber nie ueber /signin ausgegeben
    let fremd = app.aussteller.refresh_token_ausstellen("irgendwer").unwrap();
    let (status, _) = app.refresh(&format!("refresh_token={fremd}")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Organisationen
// ---------------------------------------------------------------------------

#[tokio::test]
async fn organisationen_brauchen_access_token() {
    let app = test_app(true).await;

    let (status, _) = app.json(Method::GET, "/organization", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .json(Method::GET, "/organization", None, Some("kaputt"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.access_token("ada@example.com").await;
    let (status, antwort) = app
        .json(Method::GET, "/organization", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(antwort, json!([]));
}

#[tokio::test]
async fn refresh_token_oeffnet_keine_organisationen() {
    let app = test_app(true).await;
    app.registrieren("Ada", "ada@example.com", "pw").await;
    let (_, paar) = app.anmelden("ada@example.com", "pw").await;
    let refresh = paar["refresh_token"].as_str().unwrap();
    let access = paar["access_token"].as_str().unwrap();

    let (status, antwort) = app
        .json(Method::GET, "/organization", None, Some(refresh))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(antwort, json!({ "error": "invalid token" }));

    // Umgekehrt taugt ein Access-Token nicht fuer /refresh-token
    let (status, _) = app.refresh(&format!("refresh_token={access}")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ohne_auth_pflicht_sind_organisationen_offen() {
    let app = test_app(false).await;
    let (status, _) = app.json(Method::GET, "/organization", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn organisation_erstellen_lesen_auflisten() {
    let app = test_app(true).await;
    let token = app.access_token("ada@example.com").await;

    let id = app
        .organisation_erstellen(
            &token,
            json!({ "name": "Acme", "description": "Raketen und Ambosse" }),
        )
        .await;

    let (status, org) = app
        .json(Method::GET, &format!("/organization/{id}"), None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(org["organization_id"], id.as_str());
    assert_eq!(org["name"], "Acme");
    assert_eq!(org["description"], "Raketen und Ambosse");
    assert_eq!(org["organization_members"], json!([]));

    let (_, liste) = app
        .json(Method::GET, "/organization", None, Some(&token))
        .await;
    assert_eq!(liste.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn organisation_aktualisieren() {
    let app = test_app(true).await;
    let token = app.access_token("ada@example.com").await;
    let id = app
        .organisation_erstellen(&token, json!({ "name": "Alt", "description": "alt" }))
        .await;
    let pfad = format!("/organization/{id}");

    let (status, org) = app
        .json(
            Method::PUT,
            &pfad,
            Some(json!({
                "name": "Neu",
                "description": "neu",
                "organization_members": [
                    { "name": "Ada", "email": "ada@example.com", "access_level": "admin" }
                ],
                "version": 1
            })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(org["name"], "Neu");
    assert_eq!(org["version"], 2);

    // Veraltete Version
    let (status, _) = app
        .json(
            Method::PUT,
            &pfad,
            Some(json!({ "name": "Zu spaet", "version": 1 })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Unbekannte ID
    let (status, antwort) = app
        .json(
            Method::PUT,
            "/organization/gibt-es-nicht",
            Some(json!({ "name": "X" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(antwort, json!({ "error": "organization not found" }));
}

#[tokio::test]
async fn organisation_loeschen() {
    let app = test_app(true).await;
    let token = app.access_token("ada@example.com").await;
    let id = app
        .organisation_erstellen(&token, json!({ "name": "Acme" }))
        .await;
    let pfad = format!("/organization/{id}");

    let (status, antwort) = app.json(Method::DELETE, &pfad, None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(antwort, json!({ "message": "organization deleted successfully" }));

    let (status, _) = app.json(Method::GET, &pfad, None, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Erneutes Loeschen ist kein Fehler
    let (status, _) = app.json(Method::DELETE, &pfad, None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn organisation_mit_vorgegebener_id() {
    let app = test_app(true).await;
    let token = app.access_token("ada@example.com").await;

    let body = json!({ "organization_id": "acme", "name": "Acme" });
    let id = app.organisation_erstellen(&token, body.clone()).await;
    assert_eq!(id, "acme");

    let (status, _) = app
        .json(Method::POST, "/organization", Some(body), Some(&token))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Einladungen
// ---------------------------------------------------------------------------

#[tokio::test]
async fn einladung_haengt_mitglied_an() {
    let app = test_app(true).await;
    let token = app.access_token("ada@example.com").await;
    app.registrieren("Grace", "grace@example.com", "pw").await;

    let id = app
        .organisation_erstellen(
            &token,
            json!({
                "name": "Acme",
                "organization_members": [
                    { "name": "Ada", "email": "ada@example.com", "access_level": "admin" }
                ]
            }),
        )
        .await;
    let pfad = format!("/organization/{id}");

    let (status, antwort) = app
        .json(
            Method::POST,
            &format!("{pfad}/invite"),
            Some(json!({ "user_email": "grace@example.com" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        antwort,
        json!({ "message": "user invited to organization successfully" })
    );

    let (_, org) = app.json(Method::GET, &pfad, None, Some(&token)).await;
    assert_eq!(
        org["organization_members"],
        json!([
            { "name": "Ada", "email": "ada@example.com", "access_level": "admin" },
            { "name": "Grace", "email": "grace@example.com", "access_level": "member" }
        ])
    );

    // Zweite Einladung derselben Person
    let (status, _) = app
        .json(
            Method::POST,
            &format!("{pfad}/invite"),
            Some(json!({ "user_email": "grace@example.com" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn einladung_unbekannter_benutzer_laesst_mitglieder_unveraendert() {
    let app = test_app(true).await;
    let token = app.access_token("ada@example.com").await;
    let id = app
        .organisation_erstellen(&token, json!({ "name": "Acme" }))
        .await;
    let pfad = format!("/organization/{id}");

    let (status, antwort) = app
        .json(
            Method::POST,
            &format!("{pfad}/invite"),
            Some(json!({ "user_email": "niemand@example.com" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(antwort, json!({ "error": "user not found" }));

    let (_, org) = app.json(Method::GET, &pfad, None, Some(&token)).await;
    assert_eq!(org["organization_members"], json!([]));
    assert_eq!(org["version"], 1);
}

#[tokio::test]
async fn einladung_in_unbekannte_organisation() {
    let app = test_app(true).await;
    let token = app.access_token("ada@example.com").await;

    let (status, antwort) = app
        .json(
            Method::POST,
            "/organization/gibt-es-nicht/invite",
            Some(json!({ "user_email": "ada@example.com" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(antwort, json!({ "error": "organization not found" }));
}

#[tokio::test]
async fn einladung_in_unbekannte_organisation_mit_kaputtem_body() {
    let app = test_app(true).await;
    let token = app.access_token("ada@example.com").await;

    let req = Request::post("/organization/gibt-es-nicht/invite")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{kein json"))
        .unwrap();
    let (status, antwort) = app.senden(req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(antwort, json!({ "error": "organization not found" }));

    let org = app
        .organisation_erstellen(&token, json!({ "name": "Acme" }))
        .await;
    let req = Request::post(format!("/organization/{org}/invite"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{kein json"))
        .unwrap();
    let (status, _) = app.senden(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_ist_oeffentlich() {
    let app = test_app(true).await;
    let (status, antwort) = app.json(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(antwort["status"], "healthy");
    assert_eq!(antwort["db_connected"], true);
}
