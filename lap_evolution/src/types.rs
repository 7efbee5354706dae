use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type RaceId = i64;
pub type DriverId = i64;
pub type ConstructorId = i64;

/// Canonical circuit key.
///
/// The source tables carry `circuitId` either as a number or as text holding
/// the same number. Both forms collapse to `Id` at deserialization, so the
/// rest of the pipeline compares keys with plain `==`. Text that is not a
/// number is kept verbatim as `Ref`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum CircuitId {
    Id(i64),
    Ref(String),
}

impl CircuitId {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "\\N" {
            return None;
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return Some(CircuitId::Id(n));
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if let Some(id) = integral(f) {
                return Some(CircuitId::Id(id));
            }
        }
        Some(CircuitId::Ref(trimmed.to_string()))
    }
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

impl fmt::Display for CircuitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitId::Id(n) => write!(f, "{n}"),
            CircuitId::Ref(s) => f.write_str(s),
        }
    }
}

impl From<i64> for CircuitId {
    fn from(n: i64) -> Self {
        CircuitId::Id(n)
    }
}

impl From<&str> for CircuitId {
    fn from(raw: &str) -> Self {
        CircuitId::parse(raw).unwrap_or_else(|| CircuitId::Ref(raw.to_string()))
    }
}

struct CircuitIdVisitor;

impl<'de> Visitor<'de> for CircuitIdVisitor {
    type Value = Option<CircuitId>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a circuit id as number or string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(CircuitId::Id(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .map(|n| Some(CircuitId::Id(n)))
            .map_err(|_| E::custom(format!("circuit id {v} out of range")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(integral(v).map(CircuitId::Id))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(CircuitId::parse(v))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        d.deserialize_any(CircuitIdVisitor)
    }
}

/// Lenient form used for record fields: absent, `\N` and empty cells become `None`.
fn optional_circuit_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<CircuitId>, D::Error> {
    d.deserialize_any(CircuitIdVisitor)
}

impl<'de> Deserialize<'de> for CircuitId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        optional_circuit_id(d)?.ok_or_else(|| de::Error::custom("empty circuit id"))
    }
}

// ---------- Input tables ----------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    pub race_id: RaceId,
    pub year: i32,
    #[serde(default, deserialize_with = "optional_circuit_id")]
    pub circuit_id: Option<CircuitId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Circuit {
    pub circuit_id: CircuitId,
    #[serde(default)]
    pub circuit_ref: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LapTime {
    pub race_id: RaceId,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub driver_id: Option<DriverId>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub lap: Option<i32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub milliseconds: Option<i64>,
    #[serde(default)]
    pub time: Option<String>,
}

impl LapTime {
    /// Milliseconds of a lap usable for aggregation; absent or non-positive laps yield `None`.
    pub fn valid_milliseconds(&self) -> Option<i64> {
        self.milliseconds.filter(|ms| *ms > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constructor {
    pub constructor_id: ConstructorId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorResult {
    pub race_id: RaceId,
    pub constructor_id: ConstructorId,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub points: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circuit_id_normalizes_numeric_forms() {
        assert_eq!(CircuitId::parse("5"), Some(CircuitId::Id(5)));
        assert_eq!(CircuitId::parse(" 5 "), Some(CircuitId::Id(5)));
        assert_eq!(CircuitId::parse("5.0"), Some(CircuitId::Id(5)));
        assert_eq!(CircuitId::parse("monaco"), Some(CircuitId::Ref("monaco".into())));
        assert_eq!(CircuitId::parse("\\N"), None);
        assert_eq!(CircuitId::parse(""), None);
    }

    #[test]
    fn circuit_id_from_json_number_or_string() {
        let a: CircuitId = serde_json::from_str("6").unwrap();
        let b: CircuitId = serde_json::from_str("\"6\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "6");
    }

    #[test]
    fn race_tolerates_missing_circuit() {
        let race: Race = serde_json::from_str(r#"{"raceId":1,"year":2001,"circuitId":null}"#).unwrap();
        assert_eq!(race.circuit_id, None);
        let race: Race = serde_json::from_str(r#"{"raceId":1,"year":2001,"circuitId":"14"}"#).unwrap();
        assert_eq!(race.circuit_id, Some(CircuitId::Id(14)));
    }

    #[test]
    fn lap_validity() {
        let mut lap = LapTime { race_id: 1, driver_id: Some(1), lap: Some(1), milliseconds: Some(0), time: None };
        assert_eq!(lap.valid_milliseconds(), None);
        lap.milliseconds = Some(-5);
        assert_eq!(lap.valid_milliseconds(), None);
        lap.milliseconds = None;
        assert_eq!(lap.valid_milliseconds(), None);
        lap.milliseconds = Some(81_234);
        assert_eq!(lap.valid_milliseconds(), Some(81_234));
    }
}
