/// Builds a document-style [`DsonValue`](crate::DsonValue) from JSON-like syntax.
///
/// Integer literals become `Int32`, float literals `Double`; any other
/// expression goes through `DsonValue::from`. Negative numbers must be
/// parenthesized inside arrays and objects.
///
/// ```rust
/// use dson::{dson, DsonValue};
///
/// let value = dson!({ "name": "Alice", "scores": [1, (-2), 3.5], "admin": false });
/// let object = value.as_object().unwrap();
/// assert_eq!(object.get("name").and_then(DsonValue::as_str), Some("Alice"));
/// ```
#[macro_export]
macro_rules! dson {
    (null) => {
        $crate::DsonValue::<::std::string::String>::Null
    };

    (true) => {
        $crate::DsonValue::<::std::string::String>::Bool(true)
    };

    (false) => {
        $crate::DsonValue::<::std::string::String>::Bool(false)
    };

    ([]) => {
        $crate::DsonValue::<::std::string::String>::Array($crate::DsonArray::new())
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::DsonValue::<::std::string::String>::Array($crate::DsonArray::with_values(
            vec![$($crate::dson!($elem)),*],
        ))
    };

    ({}) => {
        $crate::DsonValue::<::std::string::String>::Object($crate::DsonObject::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::DsonObject::<::std::string::String>::new();
        $(
            object.insert($key.to_string(), $crate::dson!($value));
        )*
        $crate::DsonValue::Object(object)
    }};

    ($other:expr) => {
        $crate::DsonValue::<::std::string::String>::from($other)
    };
}

#[cfg(test)]
mod tests {
    use crate::{DsonArray, DsonObject, DsonValue};

    #[test]
    fn test_dson_macro_primitives() {
        assert_eq!(dson!(null), DsonValue::Null);
        assert_eq!(dson!(true), DsonValue::Bool(true));
        assert_eq!(dson!(false), DsonValue::Bool(false));
        assert_eq!(dson!(42), DsonValue::Int32(42));
        assert_eq!(dson!(3.5), DsonValue::Double(3.5));
        assert_eq!(dson!("hello"), DsonValue::String("hello".to_string()));
        assert_eq!(dson!(-7i64), DsonValue::Int64(-7));
    }

    #[test]
    fn test_dson_macro_arrays() {
        assert_eq!(dson!([]), DsonValue::Array(DsonArray::new()));

        let arr = dson!([1, "two", null]);
        match arr {
            DsonValue::Array(array) => {
                assert_eq!(array.len(), 3);
                assert_eq!(array.values[0], DsonValue::Int32(1));
                assert_eq!(array.values[1], DsonValue::String("two".to_string()));
                assert_eq!(array.values[2], DsonValue::Null);
                assert!(array.header.is_empty());
            }
            _ => panic!("Expected array"),
        }
    }

    #[test]
    fn test_dson_macro_objects() {
        assert_eq!(dson!({}), DsonValue::Object(DsonObject::new()));

        let obj = dson!({
            "name": "Alice",
            "nested": { "depth": 2 }
        });

        match obj {
            DsonValue::Object(object) => {
                assert_eq!(object.len(), 2);
                assert_eq!(object.get("name"), Some(&DsonValue::String("Alice".to_string())));
                let nested = object.get("nested").and_then(DsonValue::as_object).unwrap();
                assert_eq!(nested.get("depth"), Some(&DsonValue::Int32(2)));
            }
            _ => panic!("Expected object"),
        }
    }
}
