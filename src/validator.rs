// src/validator.rs - Centralized validation for the add and edit forms
use std::collections::BTreeMap;
use serde::Serialize;
use chrono::{Datelike, NaiveDate};
use validator::Validate;
use crate::error::ApiError;
use crate::models::{MedicationForm, MedicationRecord};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ==================== VALIDATION RESULT ====================

#[derive(Debug, Default, Serialize)]
pub struct ValidationResult {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    #[cfg(test)]
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Flattened `field: message` list, one entry per violation.
    pub fn violations(&self) -> Vec<String> {
        self.errors
            .iter()
            .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{}: {}", field, m)))
            .collect()
    }

    pub fn merge_validator_errors(&mut self, errors: &validator::ValidationErrors) {
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value ({})", error.code));
                self.add_error(form_field_name(&field), message);
            }
        }
    }

    pub fn to_api_error(&self) -> ApiError {
        ApiError::ValidationError(self.violations().join("; "))
    }
}

/// Maps record field names back to the names the form posts.
fn form_field_name(record_field: &str) -> &str {
    match record_field {
        "name" => "med_name",
        "generic_name" => "gen_name",
        "quantity_remaining" => "quantity",
        "prescription_required" => "presc_req",
        "storage_instructions" => "storage",
        other => other,
    }
}

// ==================== FIELD VALIDATORS ====================

pub struct FieldValidator;

impl FieldValidator {
    pub fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, String> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(format!("{} is required", field)),
        }
    }

    /// Dates are stored as TEXT and compared lexically, so only
    /// four-digit years keep that order consistent with the calendar.
    pub fn date(value: &str) -> Result<NaiveDate, String> {
        let value = value.trim();
        let date = NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map_err(|_| format!("Invalid date '{}' (expected YYYY-MM-DD)", value))?;
        if !(1..=9999).contains(&date.year()) {
            return Err(format!("Date '{}' must have a year between 0001 and 9999", value));
        }
        Ok(date)
    }

    pub fn quantity(value: &str) -> Result<i64, String> {
        let quantity: i64 = value
            .trim()
            .parse()
            .map_err(|_| format!("Quantity '{}' is not a whole number", value.trim()))?;
        if quantity < 0 {
            return Err("Quantity cannot be negative".to_string());
        }
        Ok(quantity)
    }

    pub fn price(value: &str) -> Result<f64, String> {
        let price: f64 = value
            .trim()
            .parse()
            .map_err(|_| format!("Price '{}' is not a number", value.trim()))?;
        if !price.is_finite() || price < 0.0 {
            return Err("Price must be a non-negative number".to_string());
        }
        Ok(price)
    }

    pub fn flag(value: &str) -> Result<bool, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "1" | "on" => Ok(true),
            "no" | "n" | "false" | "0" | "off" => Ok(false),
            other => Err(format!("Prescription flag '{}' must be yes or no", other)),
        }
    }
}

/// Blank optional inputs mean "absent".
fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn text(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

// ==================== MEDICATION FORM ====================

/// The single validation path shared by add and edit. Collects every
/// violation instead of stopping at the first one.
pub fn validate_medication(form: &MedicationForm) -> Result<MedicationRecord, ValidationResult> {
    let mut result = ValidationResult::new();

    let name = FieldValidator::required(form.med_name.as_deref(), "Name")
        .map_err(|e| result.add_error("med_name", e))
        .ok();

    let med_type = FieldValidator::required(form.med_type.as_deref(), "Type")
        .map_err(|e| result.add_error("med_type", e))
        .ok();

    let expiry_date = FieldValidator::required(form.expiry_date.as_deref(), "Expiry date")
        .and_then(FieldValidator::date)
        .map_err(|e| result.add_error("expiry_date", e))
        .ok();

    let quantity = FieldValidator::required(form.quantity.as_deref(), "Quantity")
        .and_then(FieldValidator::quantity)
        .map_err(|e| result.add_error("quantity", e))
        .ok();

    let prescription_required = FieldValidator::required(form.presc_req.as_deref(), "Prescription flag")
        .and_then(FieldValidator::flag)
        .map_err(|e| result.add_error("presc_req", e))
        .ok();

    let purchase_date = match optional(&form.purchase_date).map(FieldValidator::date) {
        Some(Ok(date)) => Some(date),
        Some(Err(e)) => {
            result.add_error("purchase_date", e);
            None
        }
        None => None,
    };

    let price = match optional(&form.price).map(FieldValidator::price) {
        Some(Ok(price)) => Some(price),
        Some(Err(e)) => {
            result.add_error("price", e);
            None
        }
        None => None,
    };

    let (Some(name), Some(med_type), Some(expiry_date), Some(quantity_remaining), Some(prescription_required)) =
        (name, med_type, expiry_date, quantity, prescription_required)
    else {
        return Err(result);
    };

    let record = MedicationRecord {
        name: name.to_string(),
        generic_name: text(&form.gen_name),
        med_type: med_type.to_string(),
        manufacturer: text(&form.manufacturer),
        strength: text(&form.strength),
        expiry_date,
        purchase_date,
        quantity_remaining,
        price,
        prescription_required,
        storage_instructions: text(&form.storage),
        side_effects: text(&form.side_effects),
    };

    if let Err(errors) = record.validate() {
        result.merge_validator_errors(&errors);
    }

    if result.is_valid() {
        Ok(record)
    } else {
        Err(result)
    }
}
