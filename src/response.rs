//! Transport-neutral view of an extraction result.
//!
//! HTTP front-ends only need to copy `HttpReply::status` and the JSON body
//! onto their response; the CLI uses [`ExtractOutcome`] for `--json` output.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::config::{Capabilities, ExtractConfig};
use crate::ExtractionResult;

/// The shared `extractText` result shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExtractOutcome {
    Success {
        success: bool,
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Failure {
        success: bool,
        error_kind: String,
        message: String,
    },
}

impl From<&ExtractionResult> for ExtractOutcome {
    fn from(result: &ExtractionResult) -> Self {
        match result {
            Ok(extracted) => Self::Success {
                success: true,
                text: extracted.text.clone(),
            },
            Err(e) => Self::Failure {
                success: false,
                error_kind: e.kind().to_string(),
                message: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Value,
}

impl HttpReply {
    fn error(status: u16, error: &str, details: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": error, "details": details.into() }),
        }
    }
}

/// Map an extraction result onto a status code and JSON body.
///
/// Successful extractions shorter than `config.min_text_length` characters
/// (after trimming) are rejected with a 400.
pub fn reply_for(filename: &str, result: &ExtractionResult, config: &ExtractConfig) -> HttpReply {
    match result {
        Ok(extracted) => {
            let length = extracted.text.trim().chars().count();

            if length < config.min_text_length {
                warn!("Insufficient text extracted from {}: {} characters", filename, length);
                return HttpReply::error(
                    400,
                    "Insufficient text content extracted from file",
                    format!("Only {} characters extracted", length),
                );
            }

            HttpReply {
                status: 200,
                body: json!({
                    "success": true,
                    "text": extracted.text,
                    "originalFilename": filename,
                    "extractedLength": extracted.char_count(),
                }),
            }
        }
        Err(e) if e.is_client_error() => {
            let error = match e.kind() {
                "UnsupportedType" => "Unsupported file type",
                _ => "Failed to process file",
            };
            HttpReply::error(400, error, e.to_string())
        }
        Err(e) => HttpReply::error(500, "Failed to process file", e.to_string()),
    }
}

/// Reply for a request that carried no file part
pub fn missing_file_reply() -> HttpReply {
    HttpReply {
        status: 400,
        body: json!({ "error": "No file uploaded" }),
    }
}

pub fn health(capabilities: &Capabilities) -> Value {
    json!({
        "status": "ok",
        "capabilities": capabilities,
        "supportedTypes": capabilities.supported_extensions(),
    })
}
