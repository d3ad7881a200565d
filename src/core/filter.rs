// Filter trait shared by every value transformer

use crate::models::{FilterError, Value};

/// A value transformer
///
/// Filters take ownership of the value and hand back either a transformed
/// value or the original one when its shape is not something they handle.
pub trait Filter: Send + Sync {
    fn filter(&self, value: Value) -> Result<Value, FilterError>;
}

/// Plain closures can be attached anywhere a filter is expected
impl<F> Filter for F
where
    F: Fn(Value) -> Result<Value, FilterError> + Send + Sync,
{
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        self(value)
    }
}

/// Apply a text transform to every scalar in a value
///
/// Lists and maps are walked recursively; null stays null.
pub fn map_scalars<F>(value: Value, transform: &F) -> Value
where
    F: Fn(&str) -> String,
{
    match value {
        Value::List(items) => Value::List(items.into_iter().map(|v| map_scalars(v, transform)).collect()),
        Value::Map(map) => Value::Map(
            map.into_iter()
                .map(|(k, v)| (k, map_scalars(v, transform)))
                .collect(),
        ),
        scalar => match scalar.as_text() {
            Some(text) => Value::Str(transform(&text)),
            None => scalar,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn test_closure_is_filter() {
        let shout = |value: Value| -> Result<Value, FilterError> {
            Ok(match value {
                Value::Str(s) => Value::Str(format!("{}!", s)),
                other => other,
            })
        };
        assert_eq!(shout.filter(Value::from("hi")).unwrap(), Value::from("hi!"));
        assert_eq!(shout.filter(Value::Int(3)).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_map_scalars_recurses() {
        let mut map = IndexMap::new();
        map.insert("a".to_string(), Value::from("x"));
        map.insert("b".to_string(), Value::List(vec![Value::from("y"), Value::Null, Value::Int(1)]));

        let result = map_scalars(Value::Map(map), &|s: &str| s.to_uppercase());

        let result = result.as_map().unwrap();
        assert_eq!(result["a"], Value::from("X"));
        assert_eq!(
            result["b"],
            Value::List(vec![Value::from("Y"), Value::Null, Value::from("1")])
        );
    }
}
