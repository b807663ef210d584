//! HTTP client for the ISY variable REST API.
//!
//! Reads are `GET /rest/vars/get/{table}/{id}` returning an XML envelope
//! with `<val>` (current) and `<init>` (power-up) elements. Writes are also
//! GETs, `/rest/vars/set/{table}/{id}/{value}` for the current value and
//! `/rest/vars/init/{table}/{id}/{value}` for the init value.

use vdev_app::ports::VariableClient;
use vdev_domain::error::BackendError;
use vdev_domain::variable::{VarAccess, VarRef};

/// REST client for one ISY controller. Cheap to clone; clones share the
/// HTTP connection pool.
#[derive(Debug, Clone)]
pub struct IsyClient {
    base: String,
    credentials: Option<(String, String)>,
    http: reqwest::Client,
}

/// Pull the text content of the first `<tag>…</tag>` element. The envelope
/// is small and flat, so a scanner beats a full XML parser here.
fn extract_tag<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let start = xml.find(&open)?;
    let rest = &xml[start..];
    let content_start = rest.find('>')? + 1;
    let content_end = rest.find(&close)?;
    (content_start <= content_end).then(|| rest[content_start..content_end].trim())
}

/// Variable values go into the URL path; whole numbers must not carry a
/// fractional suffix or the controller rejects them.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

impl IsyClient {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        host: &str,
        credentials: Option<(String, String)>,
    ) -> Self {
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", host.trim_end_matches('/'))
        };
        Self {
            base,
            credentials,
            http,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base
    }

    async fn get(&self, path: &str) -> Result<String, BackendError> {
        let url = format!("{}/{path}", self.base);
        let mut request = self.http.get(&url);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }
        let response = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(fail)?;
        response.text().await.map_err(fail)
    }
}

fn fail(err: reqwest::Error) -> BackendError {
    BackendError::new("variables", err.to_string())
}

impl VariableClient for IsyClient {
    async fn read(&self, var: VarRef) -> Result<f64, BackendError> {
        let body = self
            .get(&format!("rest/vars/get/{}/{}", var.access.table(), var.id))
            .await?;
        let tag = if var.access.is_init() { "init" } else { "val" };
        let text = extract_tag(&body, tag).ok_or_else(|| {
            BackendError::new(
                "variables",
                format!("variable {} response carries no <{tag}> element", var.id),
            )
        })?;
        text.parse().map_err(|_| {
            BackendError::new(
                "variables",
                format!("variable {} carries non-numeric value {text:?}", var.id),
            )
        })
    }

    async fn write(&self, var: VarRef, value: f64) -> Result<(), BackendError> {
        let action = if var.access.is_init() { "init" } else { "set" };
        self.get(&format!(
            "rest/vars/{action}/{}/{}/{}",
            var.access.table(),
            var.id,
            format_value(value)
        ))
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENVELOPE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<var type="2" id="14"><init>0</init><prec>0</prec><val>104</val></var>"#;

    #[test]
    fn should_extract_current_value_element() {
        assert_eq!(extract_tag(ENVELOPE, "val"), Some("104"));
    }

    #[test]
    fn should_extract_init_value_element() {
        assert_eq!(extract_tag(ENVELOPE, "init"), Some("0"));
    }

    #[test]
    fn should_return_none_for_missing_element() {
        assert_eq!(extract_tag(ENVELOPE, "missing"), None);
    }

    #[test]
    fn should_trim_whitespace_inside_element() {
        assert_eq!(extract_tag("<var><val> 7 </val></var>", "val"), Some("7"));
    }

    #[test]
    fn should_format_whole_values_without_fraction() {
        assert_eq!(format_value(100.0), "100");
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(-3.0), "-3");
    }

    #[test]
    fn should_keep_fractional_values() {
        assert_eq!(format_value(72.5), "72.5");
    }

    #[test]
    fn should_prefix_bare_host_with_http() {
        let client = IsyClient::new(reqwest::Client::new(), "192.168.1.20", None);
        assert_eq!(client.base_url(), "http://192.168.1.20");
    }

    #[test]
    fn should_keep_explicit_scheme() {
        let client = IsyClient::new(reqwest::Client::new(), "https://isy.local/", None);
        assert_eq!(client.base_url(), "https://isy.local");
    }
}
