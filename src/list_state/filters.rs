use std::collections::BTreeMap;
use std::fmt;

use super::ListStateError;

/// A filter value as it appears in a URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// The accepted shape of a filter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any non-empty string.
    Text,
    /// One of a closed set of strings.
    Choice(&'static [&'static str]),
    Integer,
    Bool,
}

/// One managed filter parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterField {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Value assumed when the parameter is absent. Never serialized.
    pub default: Option<Scalar>,
}

impl FilterField {
    #[must_use]
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            default: None,
        }
    }

    #[must_use]
    pub const fn choice(name: &'static str, choices: &'static [&'static str]) -> Self {
        Self {
            name,
            kind: FieldKind::Choice(choices),
            default: None,
        }
    }

    #[must_use]
    pub const fn integer(name: &'static str, default: Option<i64>) -> Self {
        Self {
            name,
            kind: FieldKind::Integer,
            default: match default {
                Some(n) => Some(Scalar::Integer(n)),
                None => None,
            },
        }
    }

    #[must_use]
    pub const fn boolean(name: &'static str, default: bool) -> Self {
        Self {
            name,
            kind: FieldKind::Bool,
            default: Some(Scalar::Bool(default)),
        }
    }

    /// Parses a raw URL value. Empty strings count as absent.
    fn parse(&self, raw: &str) -> Result<Option<Scalar>, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let value = match self.kind {
            FieldKind::Text => Scalar::Text(raw.to_string()),
            FieldKind::Choice(choices) => {
                if !choices.contains(&raw) {
                    return Err(format!("expected one of {}", choices.join(", ")));
                }
                Scalar::Text(raw.to_string())
            }
            FieldKind::Integer => Scalar::Integer(raw.parse().map_err(|e| format!("{e}"))?),
            FieldKind::Bool => match raw {
                "true" => Scalar::Bool(true),
                "false" => Scalar::Bool(false),
                _ => return Err("expected true or false".to_string()),
            },
        };
        Ok(Some(value))
    }

    /// Checks a programmatic value against the field kind.
    fn validate(&self, value: Scalar) -> Result<Option<Scalar>, String> {
        match (&self.kind, value) {
            (FieldKind::Text | FieldKind::Choice(_), Scalar::Text(s)) => self.parse(&s),
            (FieldKind::Integer, value @ Scalar::Integer(_))
            | (FieldKind::Bool, value @ Scalar::Bool(_)) => Ok(Some(value)),
            (kind, value) => Err(format!("{value:?} does not fit {kind:?}")),
        }
    }
}

/// Ordered set of managed filter fields. Order defines URL order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSchema {
    fields: Vec<FilterField>,
}

impl FilterSchema {
    #[must_use]
    pub const fn new(fields: Vec<FilterField>) -> Self {
        Self { fields }
    }

    /// Filters of the pet listing.
    #[must_use]
    pub fn pets() -> Self {
        Self::new(vec![
            FilterField::text("breed"),
            FilterField::choice("gender", &["male", "female"]),
            FilterField::choice("age_range", &["puppy", "adult", "senior"]),
            FilterField::text("location"),
            FilterField::text("search"),
            FilterField::text("breeder_id"),
            FilterField::integer("min_price", Some(0)),
            FilterField::integer("max_price", Some(500_000)),
            FilterField::boolean("is_available", true),
            FilterField::boolean("is_featured", false),
        ])
    }

    pub fn fields(&self) -> impl Iterator<Item = &FilterField> {
        self.fields.iter()
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FilterField> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// Non-default filter values, keyed by field name.
///
/// Values equal to the field default are never stored, so two states that
/// mean the same thing always compare equal and serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    values: BTreeMap<String, Scalar>,
}

impl FilterState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The explicit value of `name`, if it differs from the default.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.values.get(name)
    }

    /// The explicit value, or the schema default.
    #[must_use]
    pub fn effective<'a>(&'a self, schema: &'a FilterSchema, name: &str) -> Option<&'a Scalar> {
        self.values
            .get(name)
            .or_else(|| schema.field(name).and_then(|f| f.default.as_ref()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Sets a field, or resets it to its default with `None`.
    ///
    /// # Errors
    ///
    /// [`ListStateError::UnknownField`] for names outside the schema and
    /// [`ListStateError::InvalidValue`] for values that do not fit the field.
    pub fn set(
        &mut self,
        schema: &FilterSchema,
        name: &str,
        value: Option<Scalar>,
    ) -> Result<(), ListStateError> {
        let field = schema
            .field(name)
            .ok_or_else(|| ListStateError::UnknownField(name.to_string()))?;
        let value = match value {
            Some(value) => {
                let shown = value.to_string();
                field
                    .validate(value)
                    .map_err(|reason| ListStateError::InvalidValue {
                        field: field.name,
                        value: shown,
                        reason,
                    })?
            }
            None => None,
        };
        self.store(field, value);
        Ok(())
    }

    fn store(&mut self, field: &FilterField, value: Option<Scalar>) {
        match value {
            Some(value) if field.default.as_ref() != Some(&value) => {
                self.values.insert(field.name.to_string(), value);
            }
            _ => {
                self.values.remove(field.name);
            }
        }
    }

    /// Reads every schema field from URL pairs. Malformed values fall back
    /// to the default.
    pub(crate) fn from_pairs(schema: &FilterSchema, pairs: &[(String, String)]) -> Self {
        let mut state = Self::new();
        for field in schema.fields() {
            let Some((_, raw)) = pairs.iter().rev().find(|(k, _)| k == field.name) else {
                continue;
            };
            match field.parse(raw) {
                Ok(value) => state.store(field, value),
                Err(reason) => {
                    tracing::debug!(field = field.name, value = %raw, %reason, "ignoring malformed filter");
                }
            }
        }
        state
    }

    /// URL pairs in schema order.
    pub(crate) fn to_pairs(&self, schema: &FilterSchema) -> Vec<(String, String)> {
        schema
            .fields()
            .filter_map(|field| {
                self.values
                    .get(field.name)
                    .map(|value| (field.name.to_string(), value.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_are_not_stored() {
        let schema = FilterSchema::pets();
        let mut state = FilterState::new();
        state
            .set(&schema, "is_available", Some(Scalar::Bool(true)))
            .expect("valid value");
        state
            .set(&schema, "min_price", Some(Scalar::Integer(0)))
            .expect("valid value");
        assert!(state.is_empty());
        assert_eq!(
            state.effective(&schema, "max_price"),
            Some(&Scalar::Integer(500_000))
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let schema = FilterSchema::pets();
        let mut state = FilterState::new();

        let err = state
            .set(&schema, "gender", Some("unicorn".into()))
            .expect_err("unknown choice");
        assert!(matches!(err, ListStateError::InvalidValue { field: "gender", .. }));

        let err = state
            .set(&schema, "min_price", Some("cheap".into()))
            .expect_err("text for integer field");
        assert!(matches!(err, ListStateError::InvalidValue { field: "min_price", .. }));

        let err = state
            .set(&schema, "colour", Some("brown".into()))
            .expect_err("unknown field");
        assert_eq!(err, ListStateError::UnknownField("colour".to_string()));
    }

    #[test]
    fn test_from_pairs_skips_malformed() {
        let schema = FilterSchema::pets();
        let state = FilterState::from_pairs(
            &schema,
            &pairs(&[
                ("breed", "Poodle"),
                ("min_price", "abc"),
                ("is_featured", "true"),
                ("search", ""),
                ("utm_source", "mail"),
            ]),
        );
        assert_eq!(state.get("breed"), Some(&Scalar::Text("Poodle".to_string())));
        assert_eq!(state.get("min_price"), None);
        assert_eq!(state.get("is_featured"), Some(&Scalar::Bool(true)));
        assert_eq!(state.get("search"), None);
        assert_eq!(state.get("utm_source"), None);
    }

    #[test]
    fn test_to_pairs_follows_schema_order() {
        let schema = FilterSchema::pets();
        let mut state = FilterState::new();
        state.set(&schema, "is_featured", Some(true.into())).expect("valid");
        state.set(&schema, "breed", Some("Poodle".into())).expect("valid");
        state.set(&schema, "max_price", Some(1000_i64.into())).expect("valid");

        assert_eq!(
            state.to_pairs(&schema),
            pairs(&[("breed", "Poodle"), ("max_price", "1000"), ("is_featured", "true")])
        );
    }
}
