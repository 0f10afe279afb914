// src/medication_handlers.rs
//! Add / edit / delete routes. Each validates, makes exactly one repository
//! call, and answers with a redirect to the list view on success.

use actix_files::NamedFile;
use actix_web::{http::header, web, HttpResponse};
use std::path::Path;
use std::sync::Arc;
use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::models::{EditMedicationView, MedicationForm};
use crate::repositories::CrudRepository;
use crate::validator::validate_medication;

pub const ADD_FORM_FILE: &str = "add_medication.html";

fn redirect_to_view() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/view"))
        .finish()
}

// ==================== ADD ====================

pub async fn add_medication_form(
    app_state: web::Data<Arc<AppState>>,
) -> ApiResult<NamedFile> {
    let path = Path::new(&app_state.config.server.static_dir).join(ADD_FORM_FILE);
    NamedFile::open(&path).map_err(|e| {
        ApiError::internal(format!("Cannot open {}: {}", path.display(), e))
    })
}

pub async fn add_medication(
    app_state: web::Data<Arc<AppState>>,
    form: web::Form<MedicationForm>,
) -> ApiResult<HttpResponse> {
    let record = validate_medication(&form).map_err(|v| v.to_api_error())?;

    app_state.medications.create(&app_state.db_pool, &record).await?;

    Ok(redirect_to_view())
}

// ==================== DELETE ====================

pub async fn delete_medication(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let medication_id = path.into_inner();

    if !app_state.medications.delete(&app_state.db_pool, medication_id).await? {
        return Err(ApiError::medication_not_found(medication_id));
    }

    log::info!("🗑️ Medication with ID {} deleted", medication_id);
    Ok(redirect_to_view())
}

// ==================== EDIT ====================

pub async fn edit_medication_form(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let medication_id = path.into_inner();

    let medication = app_state
        .medications
        .get_by_id(&app_state.db_pool, medication_id)
        .await?
        .ok_or_else(|| ApiError::medication_not_found(medication_id))?;

    let view = EditMedicationView {
        form: MedicationForm::from(&medication),
        medication,
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
}

pub async fn edit_medication(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<i64>,
    form: web::Form<MedicationForm>,
) -> ApiResult<HttpResponse> {
    let medication_id = path.into_inner();
    let record = validate_medication(&form).map_err(|v| v.to_api_error())?;

    if !app_state.medications.update(&app_state.db_pool, medication_id, &record).await? {
        return Err(ApiError::medication_not_found(medication_id));
    }

    Ok(redirect_to_view())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::Value;
    use crate::config::Config;
    use crate::models::Medication;

    const VALID_BODY: &str = "med_name=Metformin&gen_name=metformin+hcl&med_type=Tablet\
        &manufacturer=Teva&strength=500+mg&expiry_date=2027-08-31&purchase_date=2026-08-01\
        &quantity=60&price=3.20&presc_req=Yes&storage=Room+temperature&side_effects=";

    async fn test_state() -> Arc<AppState> {
        let pool = crate::db::test_pool().await;
        let mut config = Config::default();
        config.server.static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string();
        Arc::new(AppState::new(pool, config))
    }

    fn form_post(uri: &str, body: &str) -> actix_web::test::TestRequest {
        test::TestRequest::post()
            .uri(uri)
            .insert_header((header::CONTENT_TYPE, "application/x-www-form-urlencoded"))
            .set_payload(body.to_string())
    }

    async fn stored(state: &AppState) -> Vec<Medication> {
        state.medications.list_all(&state.db_pool).await.unwrap()
    }

    #[actix_rt::test]
    async fn test_add_then_list() {
        let state = test_state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(crate::configure_routes),
        )
        .await;

        let resp = test::call_service(&app, form_post("/add", VALID_BODY).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/view");

        let req = test::TestRequest::get().uri("/view").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let meds = body["data"].as_array().unwrap();
        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0]["name"], "Metformin");
        assert_eq!(meds[0]["generic_name"], "metformin hcl");
        assert_eq!(meds[0]["expiry_date"], "2027-08-31");
        assert_eq!(meds[0]["quantity_remaining"], 60);
        assert_eq!(meds[0]["prescription_required"], true);
    }

    #[actix_rt::test]
    async fn test_add_rejects_invalid_without_persisting() {
        let state = test_state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(crate::configure_routes),
        )
        .await;

        let bodies = [
            VALID_BODY.replace("med_name=Metformin", "med_name="),
            VALID_BODY.replace("expiry_date=2027-08-31", "expiry_date="),
            VALID_BODY.replace("quantity=60", "quantity=-1"),
            VALID_BODY.replace("&presc_req=Yes", ""),
        ];

        for body in bodies {
            let resp = test::call_service(&app, form_post("/add", &body).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {}", body);
            let json: Value = test::read_body_json(resp).await;
            assert_eq!(json["success"], false);
        }

        assert!(stored(&state).await.is_empty());
    }

    #[actix_rt::test]
    async fn test_add_store_failure_is_500_without_details() {
        let state = test_state().await;
        state.db_pool.close().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(crate::configure_routes),
        )
        .await;

        let resp = test::call_service(&app, form_post("/add", VALID_BODY).to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json: Value = test::read_body_json(resp).await;
        let message = json["message"].as_str().unwrap();
        assert!(!message.to_lowercase().contains("pool"));
    }

    #[actix_rt::test]
    async fn test_add_form_is_served() {
        let state = test_state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/add").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&body).contains("name=\"med_name\""));
    }

    #[actix_rt::test]
    async fn test_edit_roundtrip() {
        let state = test_state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(crate::configure_routes),
        )
        .await;

        test::call_service(&app, form_post("/add", VALID_BODY).to_request()).await;
        let id = stored(&state).await[0].id;

        let req = test::TestRequest::get().uri(&format!("/edit/{}", id)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["form"]["med_name"], "Metformin");
        assert_eq!(body["data"]["form"]["quantity"], "60");
        assert_eq!(body["data"]["medication"]["id"], id);

        let updated = VALID_BODY.replace("quantity=60", "quantity=4").replace("presc_req=Yes", "presc_req=No");
        let resp = test::call_service(&app, form_post(&format!("/edit/{}", id), &updated).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND);

        let meds = stored(&state).await;
        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0].quantity_remaining, 4);
        assert!(!meds[0].prescription_required);
    }

    #[actix_rt::test]
    async fn test_edit_validation_and_missing() {
        let state = test_state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(crate::configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/edit/77").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let resp = test::call_service(&app, form_post("/edit/77", VALID_BODY).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        test::call_service(&app, form_post("/add", VALID_BODY).to_request()).await;
        let id = stored(&state).await[0].id;
        let bad = VALID_BODY.replace("quantity=60", "quantity=-5");
        let resp = test::call_service(&app, form_post(&format!("/edit/{}", id), &bad).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(stored(&state).await[0].quantity_remaining, 60);
    }

    #[actix_rt::test]
    async fn test_edit_get_store_failure_is_not_404() {
        let state = test_state().await;
        state.db_pool.close().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/edit/1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_rt::test]
    async fn test_edit_store_failure_is_500_without_details() {
        let state = test_state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(crate::configure_routes),
        )
        .await;

        test::call_service(&app, form_post("/add", VALID_BODY).to_request()).await;
        let id = stored(&state).await[0].id;
        state.db_pool.close().await;

        let updated = VALID_BODY.replace("quantity=60", "quantity=12");
        let resp = test::call_service(&app, form_post(&format!("/edit/{}", id), &updated).to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json: Value = test::read_body_json(resp).await;
        assert_eq!(json["success"], false);
        let message = json["message"].as_str().unwrap();
        assert!(!message.to_lowercase().contains("pool"));
    }

    #[actix_rt::test]
    async fn test_delete() {
        let state = test_state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(crate::configure_routes),
        )
        .await;

        test::call_service(&app, form_post("/add", VALID_BODY).to_request()).await;
        let id = stored(&state).await[0].id;

        let req = test::TestRequest::get().uri(&format!("/delete/{}", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert!(stored(&state).await.is_empty());

        let req = test::TestRequest::get().uri(&format!("/delete/{}", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
