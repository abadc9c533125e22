//! Runs the backend script the way a web server would: one process per
//! request, form parameters in `QUERY_STRING` or on stdin, CGI headers
//! followed by the JSON body on stdout.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Instant;

use clue_sync::{FormRequest, Method, Transport, TransportError};
use tracing::{Level, event};

use crate::config::BackendConfig;

const TARGET: &str = "clue_app::cgi";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub struct CgiTransport {
    command: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    method: Method,
    timeout_warn_ms: Option<u64>,
}

impl CgiTransport {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            working_dir: config.working_dir.clone(),
            method: config.method,
            timeout_warn_ms: config.timeout_warn_ms,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    fn build_command(&self, query: &str) -> Command {
        let mut cmd = Command::new(&self.command);
        if !self.args.is_empty() {
            cmd.args(&self.args);
        }
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.env("GATEWAY_INTERFACE", "CGI/1.1")
            .env("SERVER_PROTOCOL", "HTTP/1.0")
            .env("SCRIPT_NAME", &self.command)
            .env("REQUEST_METHOD", self.method.as_str());
        match self.method {
            Method::Get => {
                cmd.env("QUERY_STRING", query).env_remove("CONTENT_LENGTH");
            }
            Method::Post => {
                cmd.env("QUERY_STRING", "")
                    .env("CONTENT_TYPE", FORM_CONTENT_TYPE)
                    .env("CONTENT_LENGTH", query.len().to_string());
            }
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Transport for CgiTransport {
    fn send(&mut self, request: &FormRequest) -> Result<String, TransportError> {
        let query = request.encode();
        let action = request.action().as_str();
        let start = Instant::now();

        let mut child = self
            .build_command(&query)
            .spawn()
            .map_err(|err| unavailable(format!("failed to start {}: {err}", self.command)))?;
        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| unavailable("backend stdin unavailable".to_string()))?;
            if self.method == Method::Post {
                stdin
                    .write_all(query.as_bytes())
                    .map_err(|err| unavailable(format!("writing request body: {err}")))?;
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|err| unavailable(format!("waiting for backend: {err}")))?;

        if !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            event!(
                target: TARGET,
                Level::DEBUG,
                action,
                stderr = %stderr.trim_end(),
                "backend wrote to stderr"
            );
        }
        if !output.status.success() {
            return Err(unavailable(format!("backend exited with {}", output.status)));
        }

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        if let Some(limit) = self.timeout_warn_ms
            && elapsed_ms > limit as f64
        {
            event!(
                target: TARGET,
                Level::WARN,
                action,
                elapsed_ms,
                timeout_warn_ms = limit,
                "backend reply was slow"
            );
        } else {
            event!(target: TARGET, Level::TRACE, action, elapsed_ms, "backend replied");
        }

        parse_cgi_output(&output.stdout)
    }
}

fn unavailable(message: String) -> TransportError {
    TransportError::Unreachable(message)
}

/// Splits CGI output into headers and body. A `Status:` header other than
/// 200 is a transport failure. Output without a header block is taken as
/// the bare body.
pub fn parse_cgi_output(raw: &[u8]) -> Result<String, TransportError> {
    let text = String::from_utf8_lossy(raw);
    let Some((head, body)) = split_headers(&text) else {
        return Ok(text.into_owned());
    };
    for line in head.lines() {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("status") {
            let code = value
                .split_whitespace()
                .next()
                .and_then(|code| code.parse::<u16>().ok())
                .ok_or_else(|| unavailable(format!("malformed CGI status line '{}'", line.trim())))?;
            if code != 200 {
                return Err(TransportError::Status(code));
            }
        }
    }
    Ok(body.to_string())
}

fn split_headers(text: &str) -> Option<(&str, &str)> {
    let first = text.lines().next()?;
    if !first.contains(':') || first.trim_start().starts_with('{') {
        return None;
    }
    for separator in ["\r\n\r\n", "\n\n"] {
        if let Some(index) = text.find(separator) {
            return Some((&text[..index], &text[index + separator.len()..]));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_content_type_header() {
        let raw = b"Content-type: application/json\n\n{\"errorStatus\": 0}";
        assert_eq!(parse_cgi_output(raw).unwrap(), "{\"errorStatus\": 0}");
    }

    #[test]
    fn crlf_headers_are_supported() {
        let raw = b"Status: 200 OK\r\nContent-Type: application/json\r\n\r\n{}";
        assert_eq!(parse_cgi_output(raw).unwrap(), "{}");
    }

    #[test]
    fn non_200_status_is_transport_error() {
        let raw = b"Status: 500 Internal Server Error\n\noops";
        assert_eq!(parse_cgi_output(raw), Err(TransportError::Status(500)));
    }

    #[test]
    fn bare_json_is_returned_untouched() {
        let raw = b"{\"errorStatus\": 0, \"session\": \"a:b\"}";
        assert_eq!(
            parse_cgi_output(raw).unwrap(),
            "{\"errorStatus\": 0, \"session\": \"a:b\"}"
        );
    }

    #[test]
    fn garbled_status_is_unavailable() {
        let raw = b"Status: abc\n\n";
        assert!(matches!(
            parse_cgi_output(raw),
            Err(TransportError::Unreachable(_))
        ));
    }

    #[test]
    fn missing_program_is_unavailable() {
        let config = BackendConfig {
            command: "/nonexistent/clue.cgi".to_string(),
            ..BackendConfig::default()
        };
        let mut transport = CgiTransport::new(&config);
        let request =
            clue_sync::protocol::new_game_request(&clue_core::model::roster::Roster::default());
        assert!(matches!(
            transport.send(&request),
            Err(TransportError::Unreachable(_))
        ));
    }
}
