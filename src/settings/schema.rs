//! Translation between canonical records and external (persisted) documents
//!
//! Each domain has a fixed table mapping canonical keys to the field names
//! already stored in the remote documents, plus the default used whenever a
//! field is absent. Decoding and encoding are pure and never fail: values
//! that cannot be interpreted fall back to the default (decode) or to zero
//! (encode).

use serde_json::{Number, Value};
use tracing::warn;

use crate::remote::ExternalRecord;
use crate::settings::domain::SettingsDomain;
use crate::settings::error::SettingsError;
use crate::settings::record::{CanonicalRecord, FieldKind, FieldValue};

/// Default value of a canonical field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Flag(bool),
    Quantity(&'static str),
}

impl FieldDefault {
    pub fn to_value(self) -> FieldValue {
        match self {
            FieldDefault::Flag(value) => FieldValue::Flag(value),
            FieldDefault::Quantity(text) => FieldValue::quantity(text),
        }
    }
}

/// One row of a domain's schema table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Canonical key used by the panel and mutator
    pub key: &'static str,
    /// Field name written to the remote document
    pub external: &'static str,
    /// Older field names still accepted when decoding
    pub legacy: &'static [&'static str],
    pub default: FieldDefault,
    pub label: &'static str,
    pub description: &'static str,
}

impl FieldSpec {
    pub fn kind(&self) -> FieldKind {
        match self.default {
            FieldDefault::Flag(_) => FieldKind::Flag,
            FieldDefault::Quantity(_) => FieldKind::Quantity,
        }
    }

    /// Convert raw user input into a value of this field's kind
    pub fn parse_input(&self, raw: &str) -> Result<FieldValue, SettingsError> {
        match self.kind() {
            FieldKind::Quantity => Ok(FieldValue::quantity(raw.trim())),
            FieldKind::Flag => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(FieldValue::Flag(true)),
                "false" | "no" | "off" | "0" => Ok(FieldValue::Flag(false)),
                _ => Err(SettingsError::InvalidFlag {
                    key: self.key.to_string(),
                    value: raw.to_string(),
                }),
            },
        }
    }

    /// Find this field in an external document: primary name first, then legacy names
    fn lookup<'a>(&self, external: &'a ExternalRecord) -> Option<(&'static str, &'a Value)> {
        std::iter::once(self.external)
            .chain(self.legacy.iter().copied())
            .find_map(|name| external.get(name).map(|value| (name, value)))
    }
}

const NOTIFICATION_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "newOrders",
        external: "newOrderAlerts",
        legacy: &[],
        default: FieldDefault::Flag(true),
        label: "New Orders",
        description: "Get notified when new orders arrive",
    },
    FieldSpec {
        key: "orderStatus",
        external: "orderStatusUpdates",
        legacy: &[],
        default: FieldDefault::Flag(true),
        label: "Order Status Updates",
        description: "Updates about order status changes",
    },
    FieldSpec {
        key: "lowStock",
        external: "lowStockAlerts",
        legacy: &[],
        default: FieldDefault::Flag(true),
        label: "Low Stock Alerts",
        description: "Alert when menu items are running low",
    },
    FieldSpec {
        key: "driverUpdates",
        external: "driverUpdates",
        legacy: &[],
        default: FieldDefault::Flag(false),
        label: "Driver Updates",
        description: "Notifications about driver availability",
    },
    FieldSpec {
        key: "weeklyReports",
        external: "weeklyReports",
        legacy: &[],
        default: FieldDefault::Flag(true),
        label: "Weekly Reports",
        description: "Receive weekly business analytics reports",
    },
];

const MENU_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "autoDisable",
        external: "autoDisableOutOfStock",
        legacy: &[],
        default: FieldDefault::Flag(true),
        label: "Auto-disable Out of Stock Items",
        description: "Automatically mark items as unavailable when stock runs out",
    },
    FieldSpec {
        key: "showRatings",
        external: "showRatings",
        legacy: &[],
        default: FieldDefault::Flag(true),
        label: "Show Ratings on Menu",
        description: "Display customer ratings for each dish",
    },
    FieldSpec {
        key: "displayPrepTime",
        external: "displayPrepTime",
        legacy: &[],
        default: FieldDefault::Flag(true),
        label: "Display Prep Time",
        description: "Show estimated preparation time for items",
    },
    FieldSpec {
        key: "taxRate",
        external: "taxRate",
        legacy: &[],
        default: FieldDefault::Quantity("8.5"),
        label: "Tax Rate (%)",
        description: "Tax applied to menu prices",
    },
];

const DELIVERY_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "minOrder",
        external: "minimumOrderAmount",
        legacy: &["Minimum Order Amount"],
        default: FieldDefault::Quantity("10"),
        label: "Minimum Order Amount",
        description: "Smallest order accepted for delivery",
    },
    FieldSpec {
        key: "deliveryFee",
        external: "deliveryFee",
        legacy: &["Delivery Fee"],
        default: FieldDefault::Quantity("8"),
        label: "Delivery Fee",
        description: "Flat fee added to delivered orders",
    },
    FieldSpec {
        key: "deliveryRadius",
        external: "deliveryRadius",
        legacy: &["Delivery Radius (miles)"],
        default: FieldDefault::Quantity("10"),
        label: "Delivery Radius (miles)",
        description: "Furthest distance a driver will travel",
    },
    FieldSpec {
        key: "avgPrepTime",
        external: "averagePrepTime",
        legacy: &["Average Preparation Time (minutes)"],
        default: FieldDefault::Quantity("20"),
        label: "Average Preparation Time (minutes)",
        description: "Typical kitchen time per order",
    },
    FieldSpec {
        key: "avgDeliveryTime",
        external: "averageDeliveryTime",
        legacy: &["Average Delivery Time (minutes)"],
        default: FieldDefault::Quantity("20"),
        label: "Average Delivery Time (minutes)",
        description: "Typical time from pickup to doorstep",
    },
];

/// Stateless mapper between canonical records and external documents
pub struct SchemaMapper;

impl SchemaMapper {
    /// Schema table of `domain`, in display order
    pub fn fields(domain: SettingsDomain) -> &'static [FieldSpec] {
        match domain {
            SettingsDomain::Notifications => NOTIFICATION_FIELDS,
            SettingsDomain::Menu => MENU_FIELDS,
            SettingsDomain::Delivery => DELIVERY_FIELDS,
        }
    }

    pub fn field(domain: SettingsDomain, key: &str) -> Result<&'static FieldSpec, SettingsError> {
        Self::fields(domain)
            .iter()
            .find(|spec| spec.key == key)
            .ok_or_else(|| SettingsError::UnknownField {
                domain,
                key: key.to_string(),
            })
    }

    /// The complete defaults table of `domain`
    pub fn defaults(domain: SettingsDomain) -> CanonicalRecord {
        let mut record = CanonicalRecord::new(domain);
        for spec in Self::fields(domain) {
            record.insert_unchecked(spec.key, spec.default.to_value());
        }
        record
    }

    /// Decode an external document into a complete canonical record.
    ///
    /// `None` means the document does not exist and yields the defaults table.
    /// A field is replaced by its default only when it is absent or cannot be
    /// interpreted; `false` and `0` are kept.
    pub fn decode(domain: SettingsDomain, external: Option<&ExternalRecord>) -> CanonicalRecord {
        let Some(external) = external else {
            return Self::defaults(domain);
        };

        let mut record = CanonicalRecord::new(domain);
        for spec in Self::fields(domain) {
            let value = spec
                .lookup(external)
                .and_then(|(name, raw)| {
                    let decoded = decode_value(spec.kind(), raw);
                    if decoded.is_none() && !raw.is_null() {
                        warn!(
                            %domain,
                            field = name,
                            value = %raw,
                            "Unreadable settings field, using default"
                        );
                    }
                    decoded
                })
                .unwrap_or_else(|| spec.default.to_value());
            record.insert_unchecked(spec.key, value);
        }
        record
    }

    /// Encode a canonical record into one external field per schema row.
    ///
    /// Keys missing from `record` are filled from the defaults table. Quantities
    /// are parsed to numbers; text that does not parse becomes `0`.
    pub fn encode(domain: SettingsDomain, record: &CanonicalRecord) -> ExternalRecord {
        let mut external = ExternalRecord::new();
        for spec in Self::fields(domain) {
            let value = match record.get(spec.key) {
                Some(value) if value.kind() == spec.kind() => value.clone(),
                _ => spec.default.to_value(),
            };
            let encoded = match value {
                FieldValue::Flag(flag) => Value::Bool(flag),
                FieldValue::Quantity(text) => number_value(parse_quantity(&text)),
            };
            external.insert(spec.external.to_string(), encoded);
        }
        external
    }
}

fn decode_value(kind: FieldKind, raw: &Value) -> Option<FieldValue> {
    match (kind, raw) {
        (FieldKind::Flag, Value::Bool(flag)) => Some(FieldValue::Flag(*flag)),
        (FieldKind::Quantity, Value::Number(number)) => {
            Some(FieldValue::Quantity(format_number(number)))
        }
        (FieldKind::Quantity, Value::String(text)) => Some(FieldValue::quantity(text.as_str())),
        _ => None,
    }
}

/// Render a stored number as editable decimal text (`25.0` → `"25"`)
fn format_number(number: &Number) -> String {
    if let Some(int) = number.as_i64() {
        return int.to_string();
    }
    if let Some(uint) = number.as_u64() {
        return uint.to_string();
    }
    match number.as_f64() {
        Some(float) if is_whole(float) => format!("{}", float as i64),
        Some(float) => float.to_string(),
        None => number.to_string(),
    }
}

/// Parse decimal text; empty, unparsable and non-finite input all become 0
pub fn parse_quantity(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Whole numbers are written as integers, everything else as floats
fn number_value(value: f64) -> Value {
    if is_whole(value) {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map(Value::Number).unwrap_or_else(|| Value::from(0))
    }
}

fn is_whole(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15
}
