use crate::models::overtime::{SubtractionConfig, SubtractionModel};
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The slice of a user record the ledger needs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub overtime_subtraction_model: SubtractionModel,
    pub overtime_subtraction_amount: f64,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            overtime_subtraction_model: SubtractionModel::None,
            overtime_subtraction_amount: 0.0,
            created_at: now,
        }
    }

    pub fn with_subtraction(mut self, model: SubtractionModel, amount: f64) -> Self {
        self.overtime_subtraction_model = model;
        self.overtime_subtraction_amount = amount;
        self
    }

    pub fn subtraction_config(&self) -> SubtractionConfig {
        SubtractionConfig {
            model: self.overtime_subtraction_model,
            amount: self.overtime_subtraction_amount,
        }
    }
}
