//! 查询结果行
//!
//! 每一行是“列名 -> JSON 值”的映射

use serde_json::{Map, Value};

/// 单行结果
pub type Row = Map<String, Value>;

/// 多行结果
pub type Rows = Vec<Row>;

/// 读取整数列，兼容以字符串形式返回的数字
pub fn get_i64(row: &Row, column: &str) -> Option<i64> {
    match row.get(column)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// 读取字符串列
pub fn get_str<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.get(column).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_accessors() {
        let row: Row = json!({"id": 7, "balance": "42", "username": "alice"})
            .as_object()
            .cloned()
            .unwrap();

        assert_eq!(get_i64(&row, "id"), Some(7));
        assert_eq!(get_i64(&row, "balance"), Some(42));
        assert_eq!(get_str(&row, "username"), Some("alice"));
        assert_eq!(get_i64(&row, "missing"), None);
    }
}
