// Copyright 2025 OptiBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! OpenStack Swift implementation of the artifact store.
//!
//! Authentication is Keystone v3 password auth: one `POST /auth/tokens`
//! scoped to the project, the token arrives in the `X-Subject-Token`
//! response header, and the object-store endpoint is taken from the
//! service catalog (public interface) unless the credentials carry an
//! explicit storage URL override.
//!
//! Credentials are handed in as a struct built by the configuration layer;
//! the gateway never reads the environment itself. Calls are synchronous
//! and are not retried; only a connect timeout bounds them.

use crate::key::ObjectKey;
use crate::{ArtifactStore, Result, StoreError};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const SUBJECT_TOKEN_HEADER: &str = "x-subject-token";

/// Credentials for a Keystone-v3-fronted Swift deployment.
#[derive(Debug, Clone)]
pub struct SwiftCredentials {
    /// Keystone base URL, e.g. `https://identity.example.org:5000/v3`.
    pub auth_url: String,
    /// User name.
    pub username: String,
    /// User password.
    pub password: String,
    /// Project (tenant) to scope the token to.
    pub project_name: String,
    /// Domain of both the user and the project.
    pub user_domain_name: String,
    /// Object-store endpoint override; when unset the endpoint comes from
    /// the service catalog.
    pub storage_url: Option<String>,
}

/// Swift-backed [`ArtifactStore`].
pub struct SwiftStore {
    client: Client,
    token: String,
    storage_url: String,
    container: String,
}

impl SwiftStore {
    /// Authenticate against Keystone and bind the store to one container.
    ///
    /// # Errors
    ///
    /// [`StoreError::Auth`] on rejected credentials or a catalog without an
    /// object-store endpoint; [`StoreError::Unavailable`] when Keystone
    /// cannot be reached.
    pub fn connect(credentials: &SwiftCredentials, container: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let url = format!("{}/auth/tokens", credentials.auth_url.trim_end_matches('/'));
        debug!(url = %url, "requesting keystone token");
        let response = client
            .post(&url)
            .json(&auth_payload(credentials))
            .send()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StoreError::Auth(format!(
                "keystone rejected the credentials ({status})"
            )));
        }
        if !status.is_success() {
            return Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let token = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| StoreError::Auth("keystone response carried no subject token".into()))?;

        let catalog: TokenResponse = response
            .json()
            .map_err(|e| StoreError::Auth(format!("malformed keystone response: {e}")))?;

        let storage_url = credentials
            .storage_url
            .clone()
            .or_else(|| object_store_endpoint(&catalog))
            .ok_or_else(|| {
                StoreError::Auth("service catalog has no public object-store endpoint".into())
            })?;

        Ok(SwiftStore {
            client,
            token,
            storage_url,
            container: container.into(),
        })
    }

    /// Create the container if it does not exist yet.
    ///
    /// Swift's container PUT is idempotent, so this is safe to call on
    /// every upload.
    pub fn ensure_container(&self) -> Result<()> {
        let url = format!(
            "{}/{}",
            self.storage_url.trim_end_matches('/'),
            self.container
        );
        let response = self
            .client
            .put(&url)
            .header(AUTH_TOKEN_HEADER, &self.token)
            .send()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        self.check_status(response.status(), &url)
    }

    fn object_url(&self, key: &ObjectKey) -> String {
        format!(
            "{}/{}/{}",
            self.storage_url.trim_end_matches('/'),
            self.container,
            key
        )
    }

    fn check_status(&self, status: StatusCode, url: &str) -> Result<()> {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StoreError::Auth(format!("token rejected ({status})")));
        }
        if !status.is_success() {
            return Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(())
    }
}

impl ArtifactStore for SwiftStore {
    fn put(&self, key: &ObjectKey, contents: &[u8]) -> Result<()> {
        let url = self.object_url(key);
        info!(key = %key, "uploading result object");
        let response = self
            .client
            .put(&url)
            .header(AUTH_TOKEN_HEADER, &self.token)
            .header(CONTENT_TYPE, "application/json")
            .body(contents.to_vec())
            .send()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        self.check_status(response.status(), &url)?;
        info!(key = %key, "result object uploaded");
        Ok(())
    }

    fn get(&self, key: &ObjectKey) -> Result<Vec<u8>> {
        let url = self.object_url(key);
        info!(key = %key, "downloading result object");
        let response = self
            .client
            .get(&url)
            .header(AUTH_TOKEN_HEADER, &self.token)
            .send()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(key.to_string()));
        }
        self.check_status(response.status(), &url)?;
        let bytes = response
            .bytes()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

fn auth_payload(credentials: &SwiftCredentials) -> serde_json::Value {
    json!({
        "auth": {
            "identity": {
                "methods": ["password"],
                "password": {
                    "user": {
                        "name": credentials.username,
                        "domain": { "name": credentials.user_domain_name },
                        "password": credentials.password,
                    }
                }
            },
            "scope": {
                "project": {
                    "name": credentials.project_name,
                    "domain": { "name": credentials.user_domain_name },
                }
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Deserialize)]
struct CatalogEndpoint {
    interface: String,
    url: String,
}

fn object_store_endpoint(response: &TokenResponse) -> Option<String> {
    response
        .token
        .catalog
        .iter()
        .filter(|entry| entry.service_type == "object-store")
        .flat_map(|entry| entry.endpoints.iter())
        .find(|endpoint| endpoint.interface == "public")
        .map(|endpoint| endpoint.url.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> SwiftCredentials {
        SwiftCredentials {
            auth_url: "https://identity.example.org:5000/v3/".to_string(),
            username: "ci".to_string(),
            password: "secret".to_string(),
            project_name: "benchmarks".to_string(),
            user_domain_name: "Default".to_string(),
            storage_url: None,
        }
    }

    #[test]
    fn test_auth_payload_shape() {
        let payload = auth_payload(&credentials());
        assert_eq!(payload["auth"]["identity"]["methods"][0], "password");
        assert_eq!(payload["auth"]["identity"]["password"]["user"]["name"], "ci");
        assert_eq!(
            payload["auth"]["identity"]["password"]["user"]["domain"]["name"],
            "Default"
        );
        assert_eq!(payload["auth"]["scope"]["project"]["name"], "benchmarks");
    }

    #[test]
    fn test_catalog_endpoint_prefers_public_object_store() {
        let response: TokenResponse = serde_json::from_value(serde_json::json!({
            "token": {
                "catalog": [
                    {
                        "type": "identity",
                        "endpoints": [{"interface": "public", "url": "https://identity.example.org"}]
                    },
                    {
                        "type": "object-store",
                        "endpoints": [
                            {"interface": "internal", "url": "https://swift.internal"},
                            {"interface": "public", "url": "https://swift.example.org/v1/AUTH_x"}
                        ]
                    }
                ]
            }
        }))
        .unwrap();

        assert_eq!(
            object_store_endpoint(&response).as_deref(),
            Some("https://swift.example.org/v1/AUTH_x")
        );
    }

    #[test]
    fn test_catalog_without_object_store_yields_none() {
        let response: TokenResponse =
            serde_json::from_value(serde_json::json!({"token": {"catalog": []}})).unwrap();
        assert!(object_store_endpoint(&response).is_none());
    }
}
