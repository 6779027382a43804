//! Extension descriptors.
//!
//! An extension contributes named, typed fields to the settings record.
//! Each field is described by a [`FieldSpec`] whose [`FieldKind`] turns raw
//! environment text into a [`Value`] before the record is built.
use serde::de::DeserializeOwned;
use serde_value::Value;

/// Checks a coerced value, returning a human readable reason on rejection.
pub type Validator = fn(&Value) -> Result<(), String>;

/// The value type of an extension field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Bool,
    /// An integer within `min..=max`, the range of the declared Rust type.
    Integer { min: i128, max: i128 },
    Float,
    Path,
}

impl FieldKind {
    /// Any integer representable as an `i64`.
    pub const INTEGER: FieldKind = FieldKind::integer(i64::MIN as i128, i64::MAX as i128);

    pub const fn integer(min: i128, max: i128) -> Self {
        FieldKind::Integer { min, max }
    }

    /// Converts raw environment text into a typed value.
    pub fn coerce(self, raw: &str) -> Result<Value, String> {
        match self {
            FieldKind::String | FieldKind::Path => Ok(Value::String(raw.to_string())),
            FieldKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
                "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
                _ => Err(format!("expected a boolean, got '{raw}'")),
            },
            FieldKind::Integer { min, max } => {
                let n = raw
                    .trim()
                    .parse::<i128>()
                    .map_err(|_| format!("expected an integer, got '{raw}'"))?;
                if n < min || n > max {
                    return Err(format!("{n} is out of range {min}..={max}"));
                }
                match i64::try_from(n) {
                    Ok(n) => Ok(Value::I64(n)),
                    Err(_) => u64::try_from(n)
                        .map(Value::U64)
                        .map_err(|_| format!("{n} does not fit a 64-bit integer")),
                }
            }
            FieldKind::Float => raw
                .trim()
                .parse::<f64>()
                .map(Value::F64)
                .map_err(|_| format!("expected a number, got '{raw}'")),
        }
    }
}

/// Describes one field contributed by an extension.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    key: Option<String>,
    kind: FieldKind,
    required: bool,
    default: Option<String>,
    validator: Option<Validator>,
}

impl FieldSpec {
    /// A required field read from the merged environment under `name`.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            key: None,
            kind,
            required: true,
            default: None,
            validator: None,
        }
    }

    /// Marks the field as optional: absence is not a validation failure.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Raw default used when no source defines the field.
    pub fn default_value(mut self, raw: impl Into<String>) -> Self {
        self.default = Some(raw.into());
        self
    }

    /// Reads the field from `key` instead of its name.
    pub fn env_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The merged-environment key this field is read from.
    pub fn key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required && self.default.is_none()
    }

    pub fn default_raw(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Coerces `raw` and runs the validator.
    pub(crate) fn parse(&self, raw: &str) -> Result<Value, String> {
        let value = self.kind.coerce(raw)?;
        if let Some(validate) = self.validator {
            validate(&value)?;
        }
        Ok(value)
    }
}

/// A named group of fields folded into the settings schema.
#[derive(Debug, Clone)]
pub struct ExtensionDescriptor {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl ExtensionDescriptor {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// A typed settings extension.
///
/// Usually implemented with `#[derive(Extension)]`, which maps each struct
/// field to a [`FieldSpec`]. The typed view is read back with
/// [`Settings::extension`](crate::Settings::extension).
pub trait Extension: DeserializeOwned + 'static {
    const NAME: &'static str;

    fn fields() -> Vec<FieldSpec>;

    fn descriptor() -> ExtensionDescriptor {
        ExtensionDescriptor::new(Self::NAME, Self::fields())
    }
}

/// Link-time registration entry collected by the global registry.
pub struct RegisteredExtension {
    pub descriptor: fn() -> ExtensionDescriptor,
}

impl RegisteredExtension {
    pub const fn new<E: Extension>() -> Self {
        Self {
            descriptor: E::descriptor,
        }
    }
}

inventory::collect!(RegisteredExtension);

/// Registers an extension type with the process-wide registry used by
/// [`init_settings`](crate::init_settings).
#[macro_export]
macro_rules! submit_extension {
    ($extension_type:ty) => {
        $crate::inventory::submit! {
            $crate::RegisteredExtension::new::<$extension_type>()
        }
    };
}
