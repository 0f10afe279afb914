// src/handlers.rs
use actix_web::{web, HttpResponse};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use crate::AppState;
use crate::models::{Alerts, DashboardStats, Medication};
use crate::repositories::CrudRepository;

// ==================== COMMON STRUCTURES ====================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }
}

/// Server-local calendar date. Expiry windows are computed against it.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ==================== DASHBOARD ====================

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum StatCount {
    Count(i64),
    Unavailable(&'static str),
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub total: StatCount,
    pub expiring_month: StatCount,
    pub low_stock: StatCount,
    pub today: NaiveDate,
}

impl DashboardView {
    fn new(stats: Option<DashboardStats>, today: NaiveDate) -> Self {
        match stats {
            Some(s) => Self {
                total: StatCount::Count(s.total),
                expiring_month: StatCount::Count(s.expiring_month),
                low_stock: StatCount::Count(s.low_stock),
                today,
            },
            None => Self {
                total: StatCount::Unavailable("N/A"),
                expiring_month: StatCount::Unavailable("N/A"),
                low_stock: StatCount::Unavailable("N/A"),
                today,
            },
        }
    }
}

pub async fn get_dashboard(
    app_state: web::Data<Arc<AppState>>,
) -> HttpResponse {
    let today = today();
    let stats = app_state
        .medications
        .dashboard_stats(&app_state.db_pool, today)
        .await
        .map_err(|e| log::error!("Error fetching dashboard stats: {}", e))
        .ok();

    HttpResponse::Ok().json(ApiResponse::success(DashboardView::new(stats, today)))
}

// ==================== VIEW ====================

pub async fn view_medications(
    app_state: web::Data<Arc<AppState>>,
) -> HttpResponse {
    let medications: Vec<Medication> = app_state
        .medications
        .list_all(&app_state.db_pool)
        .await
        .unwrap_or_else(|e| {
            log::error!("Error fetching medications: {}", e);
            Vec::new()
        });

    HttpResponse::Ok().json(ApiResponse::success(medications))
}

// ==================== ALERTS ====================

pub async fn get_alerts(
    app_state: web::Data<Arc<AppState>>,
) -> HttpResponse {
    let alerts = app_state
        .medications
        .alerts(&app_state.db_pool, today())
        .await
        .unwrap_or_else(|e| {
            log::error!("Error fetching alerts: {}", e);
            Alerts::default()
        });

    let message = format!(
        "{} expiring within 30 days, {} low on stock",
        alerts.expiring.len(),
        alerts.low_stock.len()
    );
    HttpResponse::Ok().json(ApiResponse::success_with_message(alerts, message))
}
