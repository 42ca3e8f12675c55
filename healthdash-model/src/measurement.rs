use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A named, unit-bearing measurement category, e.g. Weight/kg. Reference
/// data; rows are created out of band and never change.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeasurementType {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
}

/// A stored measurement annotated with its type's name and unit, as returned
/// by reads.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeasurementRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub measurement_type_id: Uuid,
    pub value: f64,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub type_name: String,
    pub unit: String,
}

/// A measurement as submitted over the wire. The user is not part of the
/// payload; it comes from the authenticated handle on the request.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SaveMeasurement {
    pub measurement_type_id: Uuid,
    pub value: f64,
    pub date: NaiveDate,
    #[cfg_attr(feature = "serde", serde(default))]
    pub created_at: Option<NaiveDateTime>,
}

/// A measurement ready to be stored, scoped to a user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeasurement {
    pub user_id: Uuid,
    pub measurement_type_id: Uuid,
    pub value: f64,
    pub date: NaiveDate,
    pub created_at: Option<NaiveDateTime>,
}

impl NewMeasurement {
    pub fn from_save(user_id: Uuid, save: SaveMeasurement) -> Self {
        Self {
            user_id,
            measurement_type_id: save.measurement_type_id,
            value: save.value,
            date: save.date,
            created_at: save.created_at,
        }
    }
}
