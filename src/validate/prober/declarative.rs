//! Declarative HTTP prober (C10): a single generic prober driven by a YAML
//! validator definition — templated URL/body/headers, pluggable auth
//! modes, and status-code-to-outcome mapping.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::scan::types::Match;
use crate::validate::extractor::is_loopback_or_private;
use crate::validate::registry::Prober;
use crate::validate::types::{now_unix, ValidationResult};

#[derive(Debug, Clone, Deserialize)]
pub struct HeaderDef {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum AuthDef {
    None,
    Bearer {
        secret_group: String,
    },
    Basic {
        secret_group: String,
        username: Option<String>,
    },
    Header {
        secret_group: String,
        header_name: String,
    },
    Query {
        secret_group: String,
        query_param: String,
    },
    ApiKey {
        secret_group: String,
        #[serde(default = "default_key_prefix")]
        key_prefix: String,
    },
}

fn default_key_prefix() -> String {
    "key=".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpDef {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub headers: Vec<HeaderDef>,
    pub auth: AuthDef,
    pub success_codes: Vec<u16>,
    pub failure_codes: Vec<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorDef {
    pub name: String,
    pub rule_ids: Vec<String>,
    pub http: HttpDef,
}

#[derive(Debug, Deserialize)]
struct ValidatorFile {
    validators: Vec<ValidatorDef>,
}

/// Parses a validator-file YAML document (`{validators: [...]}`).
pub fn parse_validator_file(yaml: &str) -> Result<Vec<ValidatorDef>, anyhow::Error> {
    let file: ValidatorFile = serde_yaml_bw::from_str(yaml)?;
    Ok(file.validators)
}

static TEMPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*\.?([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("static regex"));

/// Resolves `{{name}}`, `{{ name }}`, `{{.name}}`, `{{ .name }}` against
/// `named_groups`. An unresolved placeholder is left as an empty string.
fn render_template(template: &str, named_groups: &BTreeMap<String, Vec<u8>>) -> String {
    TEMPLATE
        .replace_all(template, |caps: &regex::Captures| {
            let key = &caps[1];
            named_groups
                .get(key)
                .map(|v| String::from_utf8_lossy(v).into_owned())
                .unwrap_or_default()
        })
        .into_owned()
}

/// A single generic prober driven by a declarative [`ValidatorDef`].
pub struct DeclarativeProber {
    def: ValidatorDef,
    client: Client,
    allow_private_hosts: bool,
}

impl DeclarativeProber {
    pub fn new(def: ValidatorDef, client: Client) -> Self {
        Self {
            def,
            client,
            allow_private_hosts: false,
        }
    }

    /// Builds a prober with the loopback/private-network guard disabled.
    /// The default registry never constructs one of these; it exists so a
    /// validator definition can be driven end to end against a local mock
    /// server in tests.
    pub fn new_unguarded(def: ValidatorDef, client: Client) -> Self {
        Self {
            def,
            client,
            allow_private_hosts: true,
        }
    }

    fn secret_for(&self, named_groups: &BTreeMap<String, Vec<u8>>, secret_group: &str) -> Option<String> {
        named_groups
            .get(secret_group)
            .map(|v| String::from_utf8_lossy(v).into_owned())
    }
}

#[async_trait]
impl Prober for DeclarativeProber {
    fn name(&self) -> &str {
        &self.def.name
    }

    fn can_validate(&self, rule_id: &str) -> bool {
        self.def.rule_ids.iter().any(|r| r == rule_id)
    }

    async fn validate(&self, ctx: &CancellationToken, m: &Match) -> ValidationResult {
        let now = now_unix();
        let http = &self.def.http;

        let url = render_template(&http.url, &m.named_groups);
        if !self.allow_private_hosts {
            if let Ok(parsed) = url::Url::parse(&url) {
                if let Some(host) = parsed.host_str() {
                    if is_loopback_or_private(host) {
                        return ValidationResult::undetermined(
                            "refusing to probe loopback/private address",
                            now,
                        );
                    }
                }
            }
        }

        let method = match http.method.to_uppercase().as_str() {
            "GET" => reqwest::Method::GET,
            "POST" => reqwest::Method::POST,
            "PUT" => reqwest::Method::PUT,
            "DELETE" => reqwest::Method::DELETE,
            "PATCH" => reqwest::Method::PATCH,
            "HEAD" => reqwest::Method::HEAD,
            other => return ValidationResult::undetermined(format!("unsupported http method '{other}'"), now),
        };

        let mut request = self.client.request(method, &url);
        for header in &http.headers {
            request = request.header(&header.name, render_template(&header.value, &m.named_groups));
        }
        if let Some(body) = &http.body {
            request = request.body(render_template(body, &m.named_groups));
        }

        request = match &http.auth {
            AuthDef::None => request,
            AuthDef::Bearer { secret_group } => match self.secret_for(&m.named_groups, secret_group) {
                Some(secret) => request.bearer_auth(secret),
                None => return ValidationResult::undetermined("partial credentials: missing secret", now),
            },
            AuthDef::Basic {
                secret_group,
                username,
            } => match self.secret_for(&m.named_groups, secret_group) {
                Some(secret) => {
                    let user = username
                        .as_ref()
                        .map(|u| render_template(u, &m.named_groups))
                        .unwrap_or_else(|| secret.clone());
                    request.basic_auth(user, Some(secret))
                }
                None => return ValidationResult::undetermined("partial credentials: missing secret", now),
            },
            AuthDef::Header {
                secret_group,
                header_name,
            } => match self.secret_for(&m.named_groups, secret_group) {
                Some(secret) => request.header(header_name, secret),
                None => return ValidationResult::undetermined("partial credentials: missing secret", now),
            },
            AuthDef::Query {
                secret_group,
                query_param,
            } => match self.secret_for(&m.named_groups, secret_group) {
                Some(secret) => request.query(&[(query_param.as_str(), secret.as_str())]),
                None => return ValidationResult::undetermined("partial credentials: missing secret", now),
            },
            AuthDef::ApiKey {
                secret_group,
                key_prefix,
            } => match self.secret_for(&m.named_groups, secret_group) {
                Some(secret) => {
                    let header_value = format!("{key_prefix}{secret}");
                    request.header("Authorization", header_value)
                }
                None => return ValidationResult::undetermined("partial credentials: missing secret", now),
            },
        };

        tracing::debug!(rule_id = %m.rule_id, provider = self.name(), "probing declarative validator");

        let send = request.send();
        let response = tokio::select! {
            res = send => res,
            _ = ctx.cancelled() => return ValidationResult::undetermined("context cancelled", now),
        };

        match response {
            Ok(resp) => {
                let status = resp.status().as_u16();
                let _ = resp.bytes().await;
                if http.success_codes.contains(&status) {
                    ValidationResult::valid(format!("provider returned status {status}"), now)
                } else if http.failure_codes.contains(&status) {
                    ValidationResult::invalid(format!("provider returned status {status}"), now)
                } else {
                    ValidationResult::undetermined_semantic(
                        format!("provider returned unmapped status {status}"),
                        now,
                    )
                }
            }
            Err(err) => ValidationResult::undetermined(format!("request failed: {err}"), now),
        }
    }
}
