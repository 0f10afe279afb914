// src/models/medication.rs
use serde::{Deserialize, Serialize};
use strum::Display;
use validator::Validate;
use chrono::NaiveDate;

/// Quantities strictly below this count as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 10;
/// Width of the near-expiry alert window, inclusive on both ends.
pub const EXPIRY_ALERT_DAYS: i64 = 30;
pub const EXPIRY_CRITICAL_DAYS: i64 = 7;

// ==================== MEDICATION ====================

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Medication {
    #[sqlx(rename = "medication_id")]
    pub id: i64,
    #[sqlx(rename = "medication_name")]
    pub name: String,
    pub generic_name: String,
    #[sqlx(rename = "medication_type")]
    pub med_type: String,
    pub manufacturer: String,
    pub strength: String,
    pub expiry_date: NaiveDate,
    pub purchase_date: Option<NaiveDate>,
    pub quantity_remaining: i64,
    pub price: Option<f64>,
    pub prescription_required: bool,
    pub storage_instructions: String,
    pub side_effects: String,
}

/// Every column except the key. Used for both insert and full-overwrite update.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct MedicationRecord {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    #[validate(length(max = 255, message = "Generic name cannot exceed 255 characters"))]
    pub generic_name: String,

    #[validate(length(min = 1, max = 100, message = "Type must be between 1 and 100 characters"))]
    pub med_type: String,

    #[validate(length(max = 255, message = "Manufacturer cannot exceed 255 characters"))]
    pub manufacturer: String,

    #[validate(length(max = 100, message = "Strength cannot exceed 100 characters"))]
    pub strength: String,

    pub expiry_date: NaiveDate,
    pub purchase_date: Option<NaiveDate>,

    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity_remaining: i64,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,

    pub prescription_required: bool,

    #[validate(length(max = 1000, message = "Storage instructions cannot exceed 1000 characters"))]
    pub storage_instructions: String,

    #[validate(length(max = 1000, message = "Side effects cannot exceed 1000 characters"))]
    pub side_effects: String,
}

impl From<Medication> for MedicationRecord {
    fn from(m: Medication) -> Self {
        Self {
            name: m.name,
            generic_name: m.generic_name,
            med_type: m.med_type,
            manufacturer: m.manufacturer,
            strength: m.strength,
            expiry_date: m.expiry_date,
            purchase_date: m.purchase_date,
            quantity_remaining: m.quantity_remaining,
            price: m.price,
            prescription_required: m.prescription_required,
            storage_instructions: m.storage_instructions,
            side_effects: m.side_effects,
        }
    }
}

// ==================== FORM ====================

/// Raw urlencoded body of the add and edit forms. Everything is optional
/// here so that a missing field becomes a validation message, not a
/// deserialization failure.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MedicationForm {
    pub med_name: Option<String>,
    pub gen_name: Option<String>,
    pub med_type: Option<String>,
    pub manufacturer: Option<String>,
    pub strength: Option<String>,
    pub expiry_date: Option<String>,
    pub purchase_date: Option<String>,
    pub quantity: Option<String>,
    pub price: Option<String>,
    pub presc_req: Option<String>,
    pub storage: Option<String>,
    pub side_effects: Option<String>,
}

impl From<&Medication> for MedicationForm {
    fn from(m: &Medication) -> Self {
        Self {
            med_name: Some(m.name.clone()),
            gen_name: Some(m.generic_name.clone()),
            med_type: Some(m.med_type.clone()),
            manufacturer: Some(m.manufacturer.clone()),
            strength: Some(m.strength.clone()),
            expiry_date: Some(m.expiry_date.format("%Y-%m-%d").to_string()),
            purchase_date: m.purchase_date.map(|d| d.format("%Y-%m-%d").to_string()),
            quantity: Some(m.quantity_remaining.to_string()),
            price: m.price.map(|p| format!("{:.2}", p)),
            presc_req: Some(if m.prescription_required { "Yes" } else { "No" }.to_string()),
            storage: Some(m.storage_instructions.clone()),
            side_effects: Some(m.side_effects.clone()),
        }
    }
}

/// Payload of `GET /edit/{id}`: the stored row plus the same values keyed
/// by form field name.
#[derive(Debug, Serialize)]
pub struct EditMedicationView {
    pub medication: Medication,
    pub form: MedicationForm,
}

// ==================== DASHBOARD & ALERTS ====================

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: i64,
    pub expiring_month: i64,
    pub low_stock: i64,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Expired,
    ExpiringCritical,
    ExpiringSoon,
    Ok,
}

impl ExpiryStatus {
    pub fn from_days_left(days_left: i64) -> Self {
        if days_left < 0 {
            ExpiryStatus::Expired
        } else if days_left <= EXPIRY_CRITICAL_DAYS {
            ExpiryStatus::ExpiringCritical
        } else if days_left <= EXPIRY_ALERT_DAYS {
            ExpiryStatus::ExpiringSoon
        } else {
            ExpiryStatus::Ok
        }
    }
}

#[derive(Debug, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct ExpiringMedication {
    #[sqlx(rename = "medication_id")]
    pub id: i64,
    #[sqlx(rename = "medication_name")]
    pub name: String,
    pub expiry_date: NaiveDate,
    #[sqlx(skip)]
    pub days_left: i64,
    #[sqlx(skip)]
    pub status: Option<ExpiryStatus>,
}

impl ExpiringMedication {
    pub fn annotate(mut self, today: NaiveDate) -> Self {
        self.days_left = (self.expiry_date - today).num_days();
        self.status = Some(ExpiryStatus::from_days_left(self.days_left));
        self
    }
}

#[derive(Debug, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct LowStockMedication {
    #[sqlx(rename = "medication_id")]
    pub id: i64,
    #[sqlx(rename = "medication_name")]
    pub name: String,
    pub quantity_remaining: i64,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct Alerts {
    pub expiring: Vec<ExpiringMedication>,
    pub low_stock: Vec<LowStockMedication>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Medication {
        Medication {
            id: 3,
            name: "Amoxicillin".to_string(),
            generic_name: "amoxicillin trihydrate".to_string(),
            med_type: "Capsule".to_string(),
            manufacturer: "Sandoz".to_string(),
            strength: "500 mg".to_string(),
            expiry_date: NaiveDate::from_ymd_opt(2027, 3, 1).unwrap(),
            purchase_date: None,
            quantity_remaining: 40,
            price: Some(12.5),
            prescription_required: true,
            storage_instructions: "Below 25C".to_string(),
            side_effects: "Nausea".to_string(),
        }
    }

    #[test]
    fn test_expiry_status_boundaries() {
        assert_eq!(ExpiryStatus::from_days_left(-1), ExpiryStatus::Expired);
        assert_eq!(ExpiryStatus::from_days_left(0), ExpiryStatus::ExpiringCritical);
        assert_eq!(ExpiryStatus::from_days_left(7), ExpiryStatus::ExpiringCritical);
        assert_eq!(ExpiryStatus::from_days_left(8), ExpiryStatus::ExpiringSoon);
        assert_eq!(ExpiryStatus::from_days_left(30), ExpiryStatus::ExpiringSoon);
        assert_eq!(ExpiryStatus::from_days_left(31), ExpiryStatus::Ok);
        assert_eq!(ExpiryStatus::ExpiringSoon.to_string(), "expiring_soon");
    }

    #[test]
    fn test_annotate_days_left() {
        let today = NaiveDate::from_ymd_opt(2027, 2, 20).unwrap();
        let item = ExpiringMedication {
            id: 1,
            name: "Insulin".to_string(),
            expiry_date: NaiveDate::from_ymd_opt(2027, 3, 2).unwrap(),
            days_left: 0,
            status: None,
        }
        .annotate(today);

        assert_eq!(item.days_left, 10);
        assert_eq!(item.status, Some(ExpiryStatus::ExpiringSoon));
    }

    #[test]
    fn test_form_prefill_from_medication() {
        let form = MedicationForm::from(&sample());
        assert_eq!(form.med_name.as_deref(), Some("Amoxicillin"));
        assert_eq!(form.expiry_date.as_deref(), Some("2027-03-01"));
        assert_eq!(form.purchase_date, None);
        assert_eq!(form.quantity.as_deref(), Some("40"));
        assert_eq!(form.price.as_deref(), Some("12.50"));
        assert_eq!(form.presc_req.as_deref(), Some("Yes"));
    }
}
