//! Command arguments and their shape checks.
//!
//! Every command takes a flat JSON object of required, non-empty string
//! fields. Anything else (a non-object, a missing or non-string field, an
//! empty string, an unexpected key) is rejected with
//! [`ProductError::Validation`] before the store is touched.

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use axum_helpers::AppError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::error::{ProductError, ProductResult};

const EXPECTED_STRING: &str = "String";
const EXPECTED_NON_EMPTY: &str = "non-empty String";
const EXPECTED_NOTHING: &str = "nothing (not allowed by schema)";

/// Arguments of a single command.
pub trait CommandArgs: DeserializeOwned + Validate {
    /// Wire names of the fields, in the order they are checked
    const FIELDS: &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertArgs {
    /// Locale for the default name, e.g. `en` or `fr-CA`
    #[validate(length(min = 1))]
    #[schema(example = "en")]
    pub locale: String,
}

impl CommandArgs for InsertArgs {
    const FIELDS: &'static [&'static str] = &["locale"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductIdArgs {
    #[validate(length(min = 1))]
    pub product_id: String,
}

impl CommandArgs for ProductIdArgs {
    const FIELDS: &'static [&'static str] = &["productId"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNameArgs {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(length(min = 1))]
    #[schema(example = "Groceries")]
    pub new_name: String,
}

impl CommandArgs for UpdateNameArgs {
    const FIELDS: &'static [&'static str] = &["productId", "newName"];
}

/// Checks that `value` is an object holding exactly `fields`, all strings.
pub fn check_shape(value: &Value, fields: &[&str]) -> ProductResult<()> {
    let Some(object) = value.as_object() else {
        return Err(ProductError::validation("arguments", "Object"));
    };

    if let Some(unknown) = object.keys().find(|key| !fields.contains(&key.as_str())) {
        return Err(ProductError::validation(unknown.as_str(), EXPECTED_NOTHING));
    }

    for field in fields {
        match object.get(*field) {
            Some(Value::String(_)) => {}
            _ => return Err(ProductError::validation(*field, EXPECTED_STRING)),
        }
    }

    Ok(())
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn first_invalid_field(errors: &ValidationErrors, fields: &[&str]) -> String {
    let invalid: Vec<String> = errors
        .field_errors()
        .keys()
        .map(|key| camel_case(key))
        .collect();

    fields
        .iter()
        .find(|field| invalid.iter().any(|f| f == *field))
        .map(|field| field.to_string())
        .or_else(|| invalid.into_iter().next())
        .unwrap_or_else(|| "arguments".to_string())
}

/// Shape check, then deserialize, then content rules.
pub fn parse<T: CommandArgs>(value: Value) -> ProductResult<T> {
    check_shape(&value, T::FIELDS)?;

    let args: T = serde_json::from_value(value)
        .map_err(|e| ProductError::Internal(format!("arguments passed the shape check: {e}")))?;

    args.validate().map_err(|errors| {
        ProductError::validation(first_invalid_field(&errors, T::FIELDS), EXPECTED_NON_EMPTY)
    })?;

    Ok(args)
}

/// Extractor for command arguments from a JSON body.
///
/// Malformed JSON is rejected as a JSON extraction error; well-formed JSON
/// of the wrong shape as a validation error.
pub struct Args<T>(pub T);

impl<S, T> FromRequest<S> for Args<T>
where
    S: Send + Sync,
    T: CommandArgs,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state).await?;
        Ok(Args(parse(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expect_validation(result: ProductResult<impl std::fmt::Debug>) -> (String, String) {
        match result {
            Err(ProductError::Validation { field, expected }) => (field, expected),
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_valid() {
        let args: UpdateNameArgs =
            parse(json!({ "productId": "p1", "newName": "Groceries" })).unwrap();
        assert_eq!(args.product_id, "p1");
        assert_eq!(args.new_name, "Groceries");
    }

    #[test]
    fn test_missing_field() {
        let (field, expected) =
            expect_validation(parse::<UpdateNameArgs>(json!({ "productId": "p1" })));
        assert_eq!(field, "newName");
        assert_eq!(expected, "String");
    }

    #[test]
    fn test_wrong_type() {
        let (field, expected) =
            expect_validation(parse::<ProductIdArgs>(json!({ "productId": 42 })));
        assert_eq!(field, "productId");
        assert_eq!(expected, "String");

        let (field, _) = expect_validation(parse::<ProductIdArgs>(json!({ "productId": null })));
        assert_eq!(field, "productId");
    }

    #[test]
    fn test_empty_string() {
        let (field, expected) =
            expect_validation(parse::<UpdateNameArgs>(json!({ "productId": "p1", "newName": "" })));
        assert_eq!(field, "newName");
        assert_eq!(expected, "non-empty String");
    }

    #[test]
    fn test_unknown_key() {
        let (field, expected) = expect_validation(parse::<ProductIdArgs>(
            json!({ "productId": "p1", "userId": "someone-else" }),
        ));
        assert_eq!(field, "userId");
        assert_eq!(expected, "nothing (not allowed by schema)");
    }

    #[test]
    fn test_not_an_object() {
        let (field, expected) = expect_validation(parse::<InsertArgs>(json!(["en"])));
        assert_eq!(field, "arguments");
        assert_eq!(expected, "Object");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("product_id"), "productId");
        assert_eq!(camel_case("locale"), "locale");
    }
}
