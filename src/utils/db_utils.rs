use crate::error::AppError;
use chrono::NaiveDate;
use serde_json::Value;
use sqlx::MySqlPool;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    F64(f64),
    Date(NaiveDate),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
///
/// `allowed` maps JSON keys to column names; any other key is rejected so
/// callers never interpolate user input into the statement.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[(&str, &str)],
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, AppError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| AppError::bad_request("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(AppError::bad_request("No fields provided for update"));
    }

    let mut columns = Vec::with_capacity(obj.len());
    let mut values = Vec::with_capacity(obj.len() + 1);

    for (key, value) in obj {
        let column = allowed
            .iter()
            .find(|(json_key, _)| json_key == key)
            .map(|(_, column)| *column)
            .ok_or_else(|| AppError::bad_request(format!("Field '{key}' cannot be updated")))?;

        columns.push(format!("{column} = ?"));
        values.push(to_sql_value(key, value)?);
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table,
        columns.join(", "),
        id_column
    );

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

fn to_sql_value(key: &str, value: &Value) -> Result<SqlValue, AppError> {
    match value {
        Value::String(s) => Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(SqlValue::Date)
            .unwrap_or_else(|_| SqlValue::String(s.trim().to_string()))),
        Value::Number(n) => n
            .as_u64()
            .map(SqlValue::U64)
            .or_else(|| n.as_f64().map(SqlValue::F64))
            .ok_or_else(|| AppError::bad_request(format!("Field '{key}' has an invalid number"))),
        Value::Null => Ok(SqlValue::Null),
        _ => Err(AppError::bad_request(format!(
            "Field '{key}' has an unsupported value type"
        ))),
    }
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALLOWED: &[(&str, &str)] = &[("fullName", "full_name"), ("phone", "phone")];

    #[test]
    fn builds_statement_from_whitelisted_keys() {
        let update = build_update_sql(
            "employees",
            &json!({ "fullName": " Ada Lovelace ", "phone": null }),
            ALLOWED,
            "id",
            7,
        )
        .unwrap();

        assert_eq!(
            update.sql,
            "UPDATE employees SET full_name = ?, phone = ? WHERE id = ?"
        );
        assert_eq!(
            update.values,
            vec![
                SqlValue::String("Ada Lovelace".to_string()),
                SqlValue::Null,
                SqlValue::U64(7),
            ]
        );
    }

    #[test]
    fn rejects_unknown_keys_and_empty_payloads() {
        let err = build_update_sql("employees", &json!({ "salary": 1 }), ALLOWED, "id", 1)
            .unwrap_err();
        assert_eq!(err.to_string(), "Field 'salary' cannot be updated");

        assert!(build_update_sql("employees", &json!({}), ALLOWED, "id", 1).is_err());
        assert!(build_update_sql("employees", &json!([1, 2]), ALLOWED, "id", 1).is_err());
    }

    #[test]
    fn rejects_nested_values() {
        let err = build_update_sql(
            "employees",
            &json!({ "phone": { "mobile": "1" } }),
            ALLOWED,
            "id",
            1,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
