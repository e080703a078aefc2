//! Declared argument types, checked before a function body runs

use super::table::Arg;
use jmespath::RuntimeError;
use serde_json::Value;
use std::fmt;

/// The type a function argument must have
#[derive(Debug, Clone, PartialEq)]
pub enum ArgType {
    Any,
    Null,
    String,
    Number,
    Bool,
    Object,
    Array,
    Expref,
    /// An array whose elements all have the inner type
    TypedArray(Box<ArgType>),
    Union(Vec<ArgType>),
}

impl ArgType {
    pub fn accepts(&self, arg: &Arg<'_>) -> bool {
        match (self, arg) {
            (ArgType::Any, _) => true,
            (ArgType::Union(types), arg) => types.iter().any(|t| t.accepts(arg)),
            (ArgType::Expref, Arg::Expref(_)) => true,
            (_, Arg::Expref(_)) | (ArgType::Expref, _) => false,
            (ty, Arg::Value(value)) => ty.accepts_value(value),
        }
    }

    fn accepts_value(&self, value: &Value) -> bool {
        match self {
            ArgType::Any => true,
            ArgType::Null => value.is_null(),
            ArgType::String => value.is_string(),
            ArgType::Number => value.is_number(),
            ArgType::Bool => value.is_boolean(),
            ArgType::Object => value.is_object(),
            ArgType::Array => value.is_array(),
            ArgType::Expref => false,
            ArgType::TypedArray(inner) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|item| inner.accepts_value(item))),
            ArgType::Union(types) => types.iter().any(|t| t.accepts_value(value)),
        }
    }

    pub fn array_of(inner: ArgType) -> Self {
        ArgType::TypedArray(Box::new(inner))
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgType::Any => write!(f, "any"),
            ArgType::Null => write!(f, "null"),
            ArgType::String => write!(f, "string"),
            ArgType::Number => write!(f, "number"),
            ArgType::Bool => write!(f, "boolean"),
            ArgType::Object => write!(f, "object"),
            ArgType::Array => write!(f, "array"),
            ArgType::Expref => write!(f, "expref"),
            ArgType::TypedArray(inner) => write!(f, "array[{}]", inner),
            ArgType::Union(types) => {
                let names: Vec<String> = types.iter().map(ToString::to_string).collect();
                write!(f, "{}", names.join("|"))
            }
        }
    }
}

/// Positional argument types plus an optional type for any extra arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub inputs: Vec<ArgType>,
    pub variadic: Option<ArgType>,
}

impl Signature {
    pub fn new(inputs: Vec<ArgType>, variadic: Option<ArgType>) -> Self {
        Signature { inputs, variadic }
    }

    /// Check the argument count first, then each argument's type
    pub fn validate(&self, args: &[Arg<'_>]) -> Result<(), RuntimeError> {
        let expected = self.inputs.len();
        let actual = args.len();

        if actual < expected {
            return Err(RuntimeError::NotEnoughArguments { expected, actual });
        }
        if actual > expected && self.variadic.is_none() {
            return Err(RuntimeError::TooManyArguments { expected, actual });
        }

        for (position, arg) in args.iter().enumerate() {
            let Some(ty) = self.inputs.get(position).or(self.variadic.as_ref()) else {
                continue;
            };
            if !ty.accepts(arg) {
                return Err(RuntimeError::InvalidType {
                    expected: ty.to_string(),
                    actual: arg.type_name().to_owned(),
                    position,
                });
            }
        }

        Ok(())
    }
}
