//! Records fed to the bulk body formatter.

use std::collections::HashMap;
use std::fmt;

/// A scalar cell value.
///
/// `Display` is the canonical string form written into the CSV body.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// No value; renders as the record's null default.
    Null,
    /// Text written verbatim.
    String(String),
    /// Signed integer in plain decimal.
    Integer(i64),
    /// Float in its shortest round-trip decimal form.
    Float(f64),
    /// `true` or `false`.
    Boolean(bool),
}

impl FieldValue {
    /// True for [`FieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::String(s) => f.write_str(s),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Float(n) => write!(f, "{}", n),
            FieldValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<f32> for FieldValue {
    /// Widens through the f32's shortest decimal text, so `0.1f32` stays `0.1`.
    fn from(value: f32) -> Self {
        FieldValue::Float(
            value
                .to_string()
                .parse()
                .unwrap_or_else(|_| f64::from(value)),
        )
    }
}

macro_rules! integer_field_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::Integer(i64::from(value))
                }
            }
        )*
    };
}

integer_field_value!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! wide_integer_field_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue {
                // Values outside i64 keep their exact decimal text.
                fn from(value: $ty) -> Self {
                    i64::try_from(value)
                        .map_or_else(|_| FieldValue::String(value.to_string()), FieldValue::Integer)
                }
            }
        )*
    };
}

wide_integer_field_value!(u64, usize, isize);

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                // u64 above i64::MAX and floats keep serde_json's rendering
                None => FieldValue::String(n.to_string()),
            },
            Value::String(s) => FieldValue::String(s),
            nested => FieldValue::String(nested.to_string()),
        }
    }
}

/// A record that can be written as one row of a bulk ingest body.
pub trait Record {
    /// Field name to value. Names not in the formatter's schema are ignored.
    fn fields(&self) -> HashMap<String, FieldValue>;

    /// Whether absent or null fields render as `#N/A` (clear the field in
    /// Salesforce) rather than an empty cell (leave it untouched).
    fn insert_null(&self) -> bool;
}

/// A map-backed record.
///
/// ```
/// use stampede_bulk::bulk::BulkRecord;
///
/// let record = BulkRecord::new()
///     .with_field("Name", "Acme")
///     .with_field("NumberOfEmployees", 250)
///     .with_insert_null(true);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkRecord {
    fields: HashMap<String, FieldValue>,
    insert_null: bool,
}

impl BulkRecord {
    /// An empty record that leaves absent fields untouched.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Sets the null insertion policy.
    pub fn with_insert_null(mut self, insert_null: bool) -> Self {
        self.insert_null = insert_null;
        self
    }

    /// Sets a field value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }
}

impl Record for BulkRecord {
    fn fields(&self) -> HashMap<String, FieldValue> {
        self.fields.clone()
    }

    fn insert_null(&self) -> bool {
        self.insert_null
    }
}

/// JSON objects (e.g. REST query results) as records. Never inserts nulls.
impl Record for serde_json::Map<String, serde_json::Value> {
    fn fields(&self) -> HashMap<String, FieldValue> {
        self.iter()
            .map(|(name, value)| (name.clone(), FieldValue::from(value.clone())))
            .collect()
    }

    fn insert_null(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_strings() {
        assert_eq!(FieldValue::from("001xx").to_string(), "001xx");
        assert_eq!(FieldValue::from(42).to_string(), "42");
        assert_eq!(FieldValue::from(-7i64).to_string(), "-7");
        assert_eq!(FieldValue::from(2.5).to_string(), "2.5");
        assert_eq!(FieldValue::from(3.0).to_string(), "3");
        assert_eq!(FieldValue::from(true).to_string(), "true");
        assert_eq!(FieldValue::from(false).to_string(), "false");
        assert_eq!(FieldValue::Null.to_string(), "");
    }

    #[test]
    fn test_f32_keeps_shortest_form() {
        assert_eq!(FieldValue::from(0.1f32).to_string(), "0.1");
        assert_eq!(FieldValue::from(1.5f32).to_string(), "1.5");
        assert_eq!(FieldValue::from(16777216f32).to_string(), "16777216");
        assert_eq!(FieldValue::from(f32::NAN).to_string(), "NaN");
    }

    #[test]
    fn test_wide_integers() {
        assert_eq!(FieldValue::from(7u64), FieldValue::Integer(7));
        assert_eq!(FieldValue::from(8usize), FieldValue::Integer(8));
        assert_eq!(FieldValue::from(-9isize), FieldValue::Integer(-9));
        assert_eq!(
            FieldValue::from(u64::MAX),
            FieldValue::String("18446744073709551615".into())
        );
        assert_eq!(FieldValue::from(u64::MAX).to_string(), "18446744073709551615");
    }

    #[test]
    fn test_option_maps_none_to_null() {
        assert!(FieldValue::from(None::<String>).is_null());
        assert_eq!(FieldValue::from(Some("x")), FieldValue::String("x".into()));
    }

    #[test]
    fn test_from_json_value() {
        assert!(FieldValue::from(json!(null)).is_null());
        assert_eq!(FieldValue::from(json!(12)), FieldValue::Integer(12));
        assert_eq!(FieldValue::from(json!(1.5)).to_string(), "1.5");
        assert_eq!(FieldValue::from(json!(true)), FieldValue::Boolean(true));
        assert_eq!(FieldValue::from(json!("a")), FieldValue::String("a".into()));
        assert_eq!(FieldValue::from(json!([1, 2])).to_string(), "[1,2]");
    }

    #[test]
    fn test_bulk_record_builder() {
        let mut record = BulkRecord::new()
            .with_field("Id", "001")
            .with_field("Name", None::<&str>)
            .with_insert_null(true);
        record.set("Amount", 10);

        let fields = record.fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["Id"], FieldValue::String("001".into()));
        assert!(fields["Name"].is_null());
        assert_eq!(fields["Amount"], FieldValue::Integer(10));
        assert!(record.insert_null());
    }

    #[test]
    fn test_json_map_record() {
        let value = json!({"Id": "001", "Active__c": true, "Parent": null});
        let map = value.as_object().unwrap().clone();

        let fields = map.fields();
        assert_eq!(fields["Id"].to_string(), "001");
        assert_eq!(fields["Active__c"].to_string(), "true");
        assert!(fields["Parent"].is_null());
        assert!(!map.insert_null());
    }
}
