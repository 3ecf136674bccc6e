use serde_json::Value;
use std::io::{self, Write};

use super::{record_array, result_of};

/// Write output as CSV to stdout.
///
/// A result carrying a record array (schedule periods, comparison rows)
/// is written one row per record; anything else as field,value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Err(e) = write_csv(&mut wtr, result_of(value)) {
        eprintln!("CSV write error: {}", e);
    }
    let _ = wtr.flush();
}

fn write_csv<W: Write>(wtr: &mut csv::Writer<W>, value: &Value) -> csv::Result<()> {
    match value {
        Value::Object(map) => {
            if let Some((_, records)) = record_array(map) {
                write_array_csv(wtr, records)
            } else {
                wtr.write_record(["field", "value"])?;
                for (key, val) in map {
                    wtr.write_record([key.as_str(), &format_csv_value(val)])?;
                }
                Ok(())
            }
        }
        Value::Array(arr) => write_array_csv(wtr, arr),
        _ => wtr.write_record([&format_csv_value(value)]),
    }
}

fn write_array_csv<W: Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            wtr.write_record([&format_csv_value(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    wtr.write_record(&headers)?;
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_csv(&mut wtr, result_of(value)).unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_schedule_periods_become_rows() {
        let out = render(&json!({
            "result": {
                "monthly_payment": "100.00",
                "periods": [
                    {"index": 1, "ending_balance": "100.00"},
                    {"index": 2, "ending_balance": "0.00"}
                ]
            }
        }));
        assert_eq!(out, "index,ending_balance\n1,100.00\n2,0.00\n");
    }

    #[test]
    fn test_scalar_result_is_field_value_pairs() {
        let out = render(&json!({"result": {"max_loan_amount": "281050.54"}}));
        assert_eq!(out, "field,value\nmax_loan_amount,281050.54\n");
    }
}
