use serde::Serialize;

pub const SUBMITTED: &str = "Form submitted successfully!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormMessage {
    pub kind: &'static str,
    pub message: String,
}

/// Accepts any form; nothing leaves the process.
pub fn submit_form(form_id: &str, fields: &[(String, String)]) -> FormMessage {
    let fields: Vec<String> = fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
    tracing::info!(form = form_id, fields = ?fields, "form submitted");
    FormMessage {
        kind: "success",
        message: SUBMITTED.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyCheck {
    pub valid: bool,
    pub message: &'static str,
}

/// Placeholder check: any key longer than ten characters passes.
pub fn validate_api_key(key: &str) -> KeyCheck {
    tracing::info!(length = key.len(), "validating api key");
    if key.chars().count() > 10 {
        KeyCheck {
            valid: true,
            message: "API key is valid",
        }
    } else {
        KeyCheck {
            valid: false,
            message: "Invalid API key",
        }
    }
}
