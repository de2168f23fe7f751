//! Declarative backend configuration schemas.
//!
//! A backend describes the properties it accepts as a [`ConfigSchema`]. Raw
//! configuration arrives as a JSON object; [`ConfigSchema::resolve`] checks it
//! against the schema, fills in defaults and returns a canonical object that
//! the backend deserializes into its own typed config.
//!
//! Property names are matched case-insensitively. Scalars may be given either
//! as JSON values or as strings (`"8080"` is a valid int).
//!
//! ```rust
//! use iofacade::{ConfigSchema, FieldDescriptor};
//! use serde_json::json;
//!
//! let schema = ConfigSchema::new()
//!     .field(FieldDescriptor::string("host"))
//!     .field(FieldDescriptor::int("port").with_default(21));
//!
//! let raw = json!({ "HOST": "example.org" });
//! let resolved = schema.resolve(raw.as_object().unwrap()).unwrap();
//! assert_eq!(resolved, json!({ "host": "example.org", "port": 21 }));
//! ```

use serde_json::{Map, Number, Value};

use crate::FsError;

/// Type of a configuration property.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Text.
    String,
    /// Signed integer.
    Int,
    /// Floating point number.
    Double,
    /// List of texts.
    StringArray,
    /// List of integers.
    IntArray,
    /// List of floating point numbers.
    DoubleArray,
    /// Opaque secret. Never defaulted; passed through as given and masked by
    /// [`ConfigSchema::redacted`].
    Password,
    /// A nested group of properties. Never defaulted as a whole.
    Nested(ConfigSchema),
}

impl FieldKind {
    fn accepts_default(&self) -> bool {
        !matches!(self, FieldKind::Password | FieldKind::Nested(_))
    }
}

/// One property of a [`ConfigSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    default: Option<Value>,
    optional: bool,
}

impl FieldDescriptor {
    /// A required property without default.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            optional: false,
        }
    }

    /// A [`FieldKind::String`] property.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    /// A [`FieldKind::Int`] property.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Int)
    }

    /// A [`FieldKind::Double`] property.
    pub fn double(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Double)
    }

    /// A [`FieldKind::Password`] property.
    pub fn password(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Password)
    }

    /// A [`FieldKind::Nested`] property.
    pub fn nested(name: impl Into<String>, schema: ConfigSchema) -> Self {
        Self::new(name, FieldKind::Nested(schema))
    }

    /// Value used when the property is absent.
    ///
    /// Ignored for passwords and nested groups.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Allow the property to be absent without a default.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Canonical property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Property type.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Effective default, if any.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref().filter(|_| self.kind.accepts_default())
    }

    /// Whether the property may be absent.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    fn invalid(&self, details: impl Into<String>) -> FsError {
        FsError::InvalidConfig {
            name: self.name.clone(),
            details: details.into(),
        }
    }

    fn convert(&self, value: &Value) -> Result<Value, FsError> {
        match &self.kind {
            FieldKind::String | FieldKind::Password => self.string_value(value),
            FieldKind::Int => self.int_value(value),
            FieldKind::Double => self.double_value(value),
            FieldKind::StringArray => self.array(value, Self::string_value),
            FieldKind::IntArray => self.array(value, Self::int_value),
            FieldKind::DoubleArray => self.array(value, Self::double_value),
            FieldKind::Nested(schema) => {
                let Value::Object(object) = value else {
                    return Err(self.invalid("expected an object"));
                };
                schema.resolve(object).map_err(|e| self.nest(e))
            }
        }
    }

    fn string_value(&self, value: &Value) -> Result<Value, FsError> {
        match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(self.invalid("expected a string")),
        }
    }

    fn int_value(&self, value: &Value) -> Result<Value, FsError> {
        let parsed = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed
            .map(Value::from)
            .ok_or_else(|| self.invalid(format!("expected an integer, got {value}")))
    }

    fn double_value(&self, value: &Value) -> Result<Value, FsError> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| self.invalid(format!("expected a number, got {value}")))
    }

    fn array(
        &self,
        value: &Value,
        element: fn(&Self, &Value) -> Result<Value, FsError>,
    ) -> Result<Value, FsError> {
        let Value::Array(items) = value else {
            return Err(self.invalid("expected an array"));
        };
        items
            .iter()
            .map(|item| element(self, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    /// Qualify an error raised inside a nested group with this field's name.
    fn nest(&self, error: FsError) -> FsError {
        match error {
            FsError::MissingProperty { name } => FsError::MissingProperty {
                name: format!("{}.{name}", self.name),
            },
            FsError::InvalidConfig { name, details } => FsError::InvalidConfig {
                name: format!("{}.{name}", self.name),
                details,
            },
            other => other,
        }
    }
}

/// The set of properties a backend accepts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSchema {
    fields: Vec<FieldDescriptor>,
}

impl ConfigSchema {
    /// An empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// All properties, in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Check `input` against this schema and return the canonical object.
    ///
    /// The result is keyed by canonical field names and contains every field
    /// that was given or defaulted. Properties not in the schema are ignored.
    ///
    /// # Errors
    ///
    /// - [`FsError::MissingProperty`] if a required field is absent and has no default
    /// - [`FsError::InvalidConfig`] if a value has the wrong shape
    pub fn resolve(&self, input: &Map<String, Value>) -> Result<Value, FsError> {
        let mut resolved = Map::new();
        for field in &self.fields {
            let given = input
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(&field.name))
                .map(|(_, value)| value)
                .filter(|value| !value.is_null());

            let value = match (given, field.default_value()) {
                (Some(value), _) => field.convert(value)?,
                (None, Some(default)) => field.convert(default)?,
                (None, None) if field.optional => continue,
                (None, None) => {
                    return Err(FsError::MissingProperty {
                        name: field.name.clone(),
                    });
                }
            };
            resolved.insert(field.name.clone(), value);
        }
        Ok(Value::Object(resolved))
    }

    /// Copy of a [`resolve`](Self::resolve)d object with every
    /// [`FieldKind::Password`] value, nested ones included, masked.
    ///
    /// This is the form configuration is logged in.
    pub fn redacted(&self, resolved: &Value) -> Value {
        let Value::Object(map) = resolved else {
            return resolved.clone();
        };
        let mut masked = map.clone();
        for field in &self.fields {
            let Some(value) = masked.get_mut(&field.name) else {
                continue;
            };
            match &field.kind {
                FieldKind::Password => *value = Value::String(REDACTED.into()),
                FieldKind::Nested(schema) => *value = schema.redacted(value),
                _ => {}
            }
        }
        Value::Object(masked)
    }
}

const REDACTED: &str = "***";
