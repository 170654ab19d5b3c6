//! Row filters and ordering
//!
//! A small subset of PostgREST's query grammar: equality, membership and a
//! single sort column. [`Query::to_params`] renders it for the REST store,
//! [`Query::matches`] and [`Query::sort`] evaluate it in memory.

use serde_json::Value;
use std::cmp::Ordering;

/// A condition on one column
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq { column: String, value: String },
    /// `column IN (values)`
    In { column: String, values: Vec<String> },
}

/// Sort order on one column
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Filters and ordering for a select
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: require `column = value`
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Eq {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Builder method: require `column` to be one of `values`
    pub fn any_of<I, S>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.push(Filter::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Builder method: sort by `column`
    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    /// Render as PostgREST query parameters
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|filter| match filter {
                Filter::Eq { column, value } => (column.clone(), format!("eq.{}", value)),
                Filter::In { column, values } => {
                    let quoted: Vec<String> = values
                        .iter()
                        .map(|v| format!("\"{}\"", v.replace('"', "\\\"")))
                        .collect();
                    (column.clone(), format!("in.({})", quoted.join(",")))
                }
            })
            .collect();

        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }

        params
    }

    /// Check whether a row satisfies every filter
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|filter| match filter {
            Filter::Eq { column, value } => {
                column_text(row, column).as_deref() == Some(value.as_str())
            }
            Filter::In { column, values } => column_text(row, column)
                .map(|text| values.iter().any(|v| *v == text))
                .unwrap_or(false),
        })
    }

    /// Sort rows in place by the query's order, if any
    ///
    /// Nulls sort last in both directions. The sort is stable, so rows with
    /// equal keys keep store order.
    pub fn sort(&self, rows: &mut [Value]) {
        if let Some(order) = &self.order {
            rows.sort_by(|a, b| {
                let a = a.get(&order.column).filter(|v| !v.is_null());
                let b = b.get(&order.column).filter(|v| !v.is_null());
                match (a, b) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Greater,
                    (Some(_), None) => Ordering::Less,
                    (Some(a), Some(b)) => {
                        let ord = compare_values(a, b);
                        if order.ascending {
                            ord
                        } else {
                            ord.reverse()
                        }
                    }
                }
            });
        }
    }
}

/// Text form of a column, the way PostgREST compares filter values
fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        _ => None,
    }
}

/// Numbers numerically; everything else as text
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (x, y) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_params() {
        let query = Query::new()
            .eq("shop_id", "abc")
            .any_of("table_id", ["t1", "t2"])
            .order_by("created_at", false);

        let params = query.to_params();
        assert_eq!(params[0], ("shop_id".to_string(), "eq.abc".to_string()));
        assert_eq!(
            params[1],
            ("table_id".to_string(), "in.(\"t1\",\"t2\")".to_string())
        );
        assert_eq!(params[2], ("order".to_string(), "created_at.desc".to_string()));
    }

    #[test]
    fn test_matches() {
        let row = json!({"shop_id": "abc", "number": 5, "table_id": null});

        assert!(Query::new().eq("shop_id", "abc").matches(&row));
        assert!(!Query::new().eq("shop_id", "xyz").matches(&row));
        assert!(Query::new().eq("number", "5").matches(&row));
        assert!(Query::new().any_of("shop_id", ["x", "abc"]).matches(&row));
        assert!(!Query::new().any_of("missing", ["abc"]).matches(&row));
    }

    #[test]
    fn test_sort_descending_nulls_last() {
        let mut rows = vec![
            json!({"n": "1"}),
            json!({"n": null}),
            json!({"n": "3"}),
            json!({"n": "2"}),
        ];
        Query::new().order_by("n", false).sort(&mut rows);
        let order: Vec<_> = rows.iter().map(|r| r["n"].clone()).collect();
        assert_eq!(order, vec![json!("3"), json!("2"), json!("1"), json!(null)]);
    }
}
