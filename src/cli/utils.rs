use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&success_json(message, data))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// `{"success": true, "message": ...}` with the fields of `data` merged in
fn success_json(message: &str, data: Option<Value>) -> Value {
    let mut response = json!({
        "success": true,
        "message": message
    });

    if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
        target.extend(extra);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_json_merges_data() {
        let value = success_json("Sent rent reminders for 2 leases", Some(json!({"leases": 2})));
        assert_eq!(value["success"], true);
        assert_eq!(value["leases"], 2);
        assert_eq!(value["message"], "Sent rent reminders for 2 leases");

        let value = success_json("done", Some(json!([1, 2])));
        assert!(value.get("0").is_none());
    }
}
