//! Wire records exchanged with the storefront backend.

use std::fmt;

use jiff::{Timestamp, civil::Date, tz::TimeZone};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::products::ProductStatus;

/// Product as served by the catalog endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    /// Serial number; may be blank in malformed records
    #[serde(default)]
    pub serial_number: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Price per unit; required, checked when the record is converted
    #[serde(default)]
    pub unit_price: Option<Decimal>,

    /// Standing markdown in percent points
    #[serde(default)]
    pub discount_percent: Option<Decimal>,

    /// Unit label
    #[serde(default)]
    pub per: String,

    /// Category tag
    #[serde(default)]
    pub product_type: String,

    /// Listing status; required, checked when the record is converted
    #[serde(default)]
    pub status: Option<ProductStatus>,
}

/// Promotion as served by the promotion directory endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionRecord {
    /// Promotion code
    #[serde(default)]
    pub code: String,

    /// Discount in percent points; required, checked when the record is converted
    #[serde(default)]
    pub discount_percent: Option<Decimal>,

    /// Minimum qualifying total
    #[serde(default)]
    pub min_amount: Option<Decimal>,

    /// Restricts the promotion to one product type
    #[serde(default)]
    pub product_type: Option<String>,

    /// Last day the code is valid, sent as a date or a timestamp
    #[serde(default, deserialize_with = "deserialize_expiry")]
    pub expiry: Option<Date>,
}

/// Read an expiry sent either as a calendar date or as a timestamp.
///
/// Timestamps are converted to their UTC date.
///
/// # Errors
///
/// Returns an error if `raw` is neither a date nor a timestamp.
pub fn parse_expiry(raw: &str) -> Result<Date, jiff::Error> {
    let raw = raw.trim();

    match raw.parse::<Date>() {
        Ok(date) => Ok(date),
        Err(_err) => Ok(raw.parse::<Timestamp>()?.to_zoned(TimeZone::UTC).date()),
    }
}

fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_expiry(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

/// Decode a list of records element by element.
///
/// Elements that do not fit `T` are dropped with a warning so that one bad record
/// cannot empty the whole list.
pub fn decode_records<T: DeserializeOwned>(what: &str, values: Vec<serde_json::Value>) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(error) => {
                warn!(what, position, %error, "skipping unreadable record");
                None
            }
        })
        .collect()
}

/// Identifier the backend assigns to a submitted booking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Wrap a raw order identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Response body of a successful booking submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    /// Generated order identifier
    pub order_id: OrderId,
}

/// Booking as returned by the order-status lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    /// Order identifier
    pub order_id: OrderId,

    /// Free-form status, e.g. "booked", "dispatched"
    pub status: String,

    /// Customer name on the order
    #[serde(default)]
    pub customer_name: Option<String>,

    /// Payable total recorded by the backend
    #[serde(default)]
    pub total: Option<Decimal>,

    /// When the booking was created
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn product_record_reads_camel_case_json() -> TestResult {
        let json = r#"{
            "serialNumber": "SP-07",
            "name": "7cm Electric Sparklers",
            "unitPrice": "45.50",
            "discountPercent": 5,
            "per": "box",
            "productType": "sparklers",
            "status": "on"
        }"#;

        let record: ProductRecord = serde_json::from_str(json)?;

        assert_eq!(record.serial_number, "SP-07");
        assert_eq!(record.unit_price, Some(dec!(45.50)));
        assert_eq!(record.discount_percent, Some(dec!(5)));
        assert_eq!(record.status, Some(ProductStatus::On));

        Ok(())
    }

    #[test]
    fn promotion_record_optional_fields_default_to_none() -> TestResult {
        let record: PromotionRecord =
            serde_json::from_str(r#"{"code": "DIWALI", "discountPercent": 12}"#)?;

        assert_eq!(record.code, "DIWALI");
        assert!(record.min_amount.is_none());
        assert!(record.product_type.is_none());
        assert!(record.expiry.is_none());

        Ok(())
    }

    #[test]
    fn promotion_record_parses_expiry_date() -> TestResult {
        let record: PromotionRecord = serde_json::from_str(
            r#"{"code": "EARLY", "discountPercent": 5, "expiry": "2026-10-20"}"#,
        )?;

        assert_eq!(record.expiry, Some(jiff::civil::date(2026, 10, 20)));

        Ok(())
    }

    #[test]
    fn promotion_record_reads_timestamp_expiry_as_its_date() -> TestResult {
        let record: PromotionRecord = serde_json::from_str(
            r#"{"code": "PONGAL20", "discountPercent": 20, "expiry": "2024-01-16T00:00:00Z"}"#,
        )?;

        assert_eq!(record.expiry, Some(jiff::civil::date(2024, 1, 16)));

        Ok(())
    }

    #[test]
    fn blank_expiry_means_no_expiry() -> TestResult {
        let record: PromotionRecord =
            serde_json::from_str(r#"{"code": "ANY", "discountPercent": 5, "expiry": ""}"#)?;

        assert!(record.expiry.is_none());

        Ok(())
    }

    #[test]
    fn unreadable_product_is_skipped_among_good_ones() -> TestResult {
        let values: Vec<serde_json::Value> = serde_json::from_str(
            r#"[
                {"serialNumber": "SP-07", "name": "Sparklers", "unitPrice": 45.5, "status": "on"},
                {"serialNumber": "RK-10", "name": "Rockets", "unitPrice": 350, "status": "archived"},
                {"serialNumber": "FP-02", "name": "Flower Pots", "unitPrice": "lots", "status": "on"},
                {"serialNumber": "GC-01", "name": "Ground Chakkar", "unitPrice": 80, "status": "on"}
            ]"#,
        )?;

        let records: Vec<ProductRecord> = decode_records("products", values);
        let serials: Vec<&str> = records.iter().map(|r| r.serial_number.as_str()).collect();

        assert_eq!(serials, ["SP-07", "GC-01"]);

        Ok(())
    }

    #[test]
    fn unreadable_promotion_is_skipped_among_good_ones() -> TestResult {
        let values: Vec<serde_json::Value> = serde_json::from_str(
            r#"[
                {"code": "DIWALI10", "discountPercent": 10, "minAmount": 1000},
                {"code": "BROKEN", "discountPercent": 5, "expiry": "next tuesday"},
                {"code": "PONGAL20", "discountPercent": 20, "expiry": "2024-01-16T00:00:00Z"}
            ]"#,
        )?;

        let records: Vec<PromotionRecord> = decode_records("promotions", values);
        let codes: Vec<&str> = records.iter().map(|r| r.code.as_str()).collect();

        assert_eq!(codes, ["DIWALI10", "PONGAL20"]);

        Ok(())
    }

    #[test]
    fn order_id_is_a_bare_string_on_the_wire() -> TestResult {
        let response: BookingResponse = serde_json::from_str(r#"{"orderId": "ORD-1042"}"#)?;

        assert_eq!(response.order_id.as_str(), "ORD-1042");
        assert_eq!(response.order_id.to_string(), "ORD-1042");

        Ok(())
    }
}
