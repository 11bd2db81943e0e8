use rust_decimal::Decimal;
use serde::Deserialize;

/// Body returned by the latest-prices endpoint.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PricesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<PriceItem>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl PricesResponse {
    /// True when the API reported success and returned at least one item.
    pub fn has_data(&self) -> bool {
        self.success && !self.data.is_empty()
    }
}

/// One entry of `data`. Everything is optional so a single odd item never
/// fails the whole response; the collector decides what to skip.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PriceItem {
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub depart_date: Option<String>,
    #[serde(default)]
    pub value: Option<Decimal>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<PriceItem>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<PriceItem>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_typical_payload() {
        let body = r#"{
            "success": true,
            "currency": "usd",
            "data": [
                {"origin": "NYC", "destination": "LHR", "depart_date": "2025-03-01T00:00:00Z",
                 "return_date": null, "value": 450, "number_of_changes": 0, "gate": "x"},
                {"depart_date": "2025-03-02", "value": 399.5}
            ]
        }"#;

        let response: PricesResponse = serde_json::from_str(body).unwrap();

        assert!(response.has_data());
        assert_eq!(response.data.len(), 2);
        assert_eq!(response.data[0].origin.as_deref(), Some("NYC"));
        assert_eq!(response.data[0].value, Some(Decimal::from(450)));
        assert_eq!(response.data[1].value, Some(Decimal::from_str("399.5").unwrap()));
        assert_eq!(response.data[1].origin, None);
    }

    #[test]
    fn test_failure_and_null_data() {
        let response: PricesResponse =
            serde_json::from_str(r#"{"success": false, "data": null, "error": "bad token"}"#)
                .unwrap();

        assert!(!response.has_data());
        assert!(response.data.is_empty());
        assert_eq!(response.error.as_deref(), Some("bad token"));
    }

    #[test]
    fn test_success_without_items_has_no_data() {
        let response: PricesResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(!response.has_data());
    }
}
