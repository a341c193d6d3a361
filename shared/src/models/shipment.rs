//! Shipment models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// Delivery state of a shipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "shipment_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Preparing,
    InTransit,
    Delivered,
    Canceled,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Preparing => "PREPARING",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::Delivered => "DELIVERED",
            ShipmentStatus::Canceled => "CANCELED",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown shipment status: {0}")]
pub struct UnknownShipmentStatus(pub String);

impl std::str::FromStr for ShipmentStatus {
    type Err = UnknownShipmentStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PREPARING" => Ok(ShipmentStatus::Preparing),
            "IN_TRANSIT" => Ok(ShipmentStatus::InTransit),
            "DELIVERED" => Ok(ShipmentStatus::Delivered),
            "CANCELED" | "CANCELLED" => Ok(ShipmentStatus::Canceled),
            _ => Err(UnknownShipmentStatus(s.to_string())),
        }
    }
}

/// A shipment of an order. Never outlives its order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Shipment {
    pub id: Uuid,
    pub code: String,
    pub order_id: Uuid,
    pub status: ShipmentStatus,
    pub employee_id: Option<Uuid>,
    pub notes: Option<String>,
    pub delivery_photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Input for creating a shipment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateShipmentInput {
    pub order_id: Uuid,
    #[validate(length(min = 1, max = 64, message = "Shipment code is required"))]
    pub code: String,
    pub employee_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Input for updating a shipment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateShipmentInput {
    pub status: Option<ShipmentStatus>,
    pub employee_id: Option<Uuid>,
    pub notes: Option<String>,
    pub delivery_photo: Option<String>,
}

impl Shipment {
    /// Apply an update. Moving into `Delivered` stamps the delivery time once.
    pub fn updated(&self, input: &UpdateShipmentInput, now: DateTime<Utc>) -> Shipment {
        let status = input.status.unwrap_or(self.status);
        let delivered_at = match (status, self.delivered_at) {
            (ShipmentStatus::Delivered, None) => Some(now),
            (_, stamped) => stamped,
        };

        Shipment {
            status,
            employee_id: input.employee_id.or(self.employee_id),
            notes: input.notes.clone().or_else(|| self.notes.clone()),
            delivery_photo: input
                .delivery_photo
                .clone()
                .or_else(|| self.delivery_photo.clone()),
            delivered_at,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipment() -> Shipment {
        Shipment {
            id: Uuid::new_v4(),
            code: "SHP-001".to_string(),
            order_id: Uuid::new_v4(),
            status: ShipmentStatus::Preparing,
            employee_id: None,
            notes: None,
            delivery_photo: None,
            created_at: Utc::now(),
            delivered_at: None,
        }
    }

    #[test]
    fn test_status_round_trip_through_str() {
        for status in [
            ShipmentStatus::Preparing,
            ShipmentStatus::InTransit,
            ShipmentStatus::Delivered,
            ShipmentStatus::Canceled,
        ] {
            assert_eq!(status.as_str().parse::<ShipmentStatus>().unwrap(), status);
        }
        assert!("LOST".parse::<ShipmentStatus>().is_err());
    }

    #[test]
    fn test_delivered_stamps_time_once() {
        let first = Utc::now();
        let delivered = shipment().updated(
            &UpdateShipmentInput {
                status: Some(ShipmentStatus::Delivered),
                ..Default::default()
            },
            first,
        );
        assert_eq!(delivered.delivered_at, Some(first));

        let later = first + chrono::Duration::hours(1);
        let again = delivered.updated(
            &UpdateShipmentInput {
                notes: Some("left at door".to_string()),
                ..Default::default()
            },
            later,
        );
        assert_eq!(again.delivered_at, Some(first));
        assert_eq!(again.notes.as_deref(), Some("left at door"));
    }
}
