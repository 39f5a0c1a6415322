//! value representation
//!
//! Resource attributes are built from the following data types
//! - boolean (true/false)
//! - integer (signed, i64)
//! - string (utf-8, emitted verbatim)
//! - template (string containing a `${...}` interpolation, e.g. a reference to another resource)
//! - keyword (a bare reference like `subnet_ids` or `aws_internet_gateway.main`, as used in
//!   `depends_on` and `lifecycle.ignore_changes`)
//! - array ("list" of values)
//! - object (order-preserving "map"/"dictionary", where the key is of type string)
//!
//! There is no `null`/`None` value. Optional attributes are simply left out of a resource.
//!
//! In terraform JSON templates and keywords are plain strings. In native syntax a template becomes a
//! quoted template expression and a keyword becomes a traversal.
use indexmap::IndexMap;
use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serializer,
};

/// All possible value types
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    String(String),
    Template(String),
    Keyword(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Plain string content, regardless of string flavour
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Template(s) | Value::Keyword(s) => Some(s),
            _ => None,
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<K: ToString, V: Into<Value>> From<IndexMap<K, V>> for Value {
    fn from(value: IndexMap<K, V>) -> Self {
        Value::Object(
            value
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
        )
    }
}

impl From<Value> for hcl::Expression {
    fn from(value: Value) -> Self {
        use hcl::Expression;

        match value {
            Value::Boolean(bool) => Expression::Bool(bool),
            Value::Integer(int) => Expression::Number(int.into()),
            Value::String(s) => Expression::String(s),
            Value::Template(template) => {
                Expression::TemplateExpr(Box::new(hcl::TemplateExpr::QuotedString(template)))
            }
            Value::Keyword(keyword) => keyword_traversal(&keyword),
            Value::Array(array) => Expression::Array(array.into_iter().map(Into::into).collect()),
            Value::Object(object) => Expression::Object(
                object
                    .into_iter()
                    .map(|(k, v)| (hcl::ObjectKey::Expression(Expression::String(k)), v.into()))
                    .collect(),
            ),
        }
    }
}

/// Turns `a.b.c` into a traversal expression
fn keyword_traversal(keyword: &str) -> hcl::Expression {
    let mut path = keyword.split('.');
    let root = path.next().unwrap_or(keyword);

    let mut traversal = hcl::Traversal::builder(hcl::Variable::unchecked(root));
    let mut has_operators = false;
    for element in path {
        traversal = traversal.attr(hcl::Identifier::unchecked(element));
        has_operators = true;
    }

    if !has_operators {
        return hcl::Expression::Variable(hcl::Variable::unchecked(root));
    }

    traversal.build().into()
}

impl serde::ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Boolean(value) => serializer.serialize_bool(*value),
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::String(value) | Value::Template(value) | Value::Keyword(value) => {
                serializer.serialize_str(value)
            }
            Value::Array(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
            Value::Object(value) => {
                let mut ser = serializer.serialize_map(Some(value.len()))?;
                for (element_key, element_value) in value {
                    ser.serialize_entry(element_key, element_value)?;
                }
                ser.end()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn json_flattens_string_flavours() {
        let value = Value::Array(vec![
            Value::from("plain"),
            Value::Template("${aws_vpc.main.id}".to_string()),
            Value::Keyword("subnet_ids".to_string()),
            Value::from(3_i64),
            Value::from(true),
        ]);

        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            serde_json::json!(["plain", "${aws_vpc.main.id}", "subnet_ids", 3, true])
        );
    }

    #[test]
    fn keyword_with_path_becomes_traversal() {
        let expected: hcl::Expression =
            hcl::Traversal::builder(hcl::Variable::unchecked("aws_internet_gateway"))
                .attr("main-igw")
                .build()
                .into();

        let expr: hcl::Expression = Value::Keyword("aws_internet_gateway.main-igw".into()).into();
        assert_eq!(expr, expected);
    }

    #[test]
    fn single_keyword_becomes_variable() {
        let expr: hcl::Expression = Value::Keyword("subnet_ids".into()).into();
        assert_eq!(
            expr,
            hcl::Expression::Variable(hcl::Variable::unchecked("subnet_ids"))
        );
    }

    #[test]
    fn object_keeps_order() {
        let tags: IndexMap<&str, &str> = [("Name", "main"), ("Env", "dev")].into_iter().collect();
        let json = serde_json::to_string(&Value::from(tags)).unwrap();
        assert_eq!(json, r#"{"Name":"main","Env":"dev"}"#);
    }
}
