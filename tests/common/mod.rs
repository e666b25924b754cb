//! Shared helpers for the integration tests.
//!
//! The tool uses blocking HTTP clients, so the wiremock server is driven from
//! a dedicated tokio runtime while the code under test runs on the test
//! thread.

#![allow(dead_code)]

use anyhow::Result;
use chrono::Utc;
use purview_inventory::auth::{Credential, Session};
use purview_inventory::config::Settings;
use purview_inventory::ui::Terminal;
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use tokio::runtime::Runtime;
use wiremock::{Mock, MockServer};

pub const TENANT: &str = "tenant-1";

/// A mock Purview/identity backend on localhost.
pub struct Backend {
    // Dropped before the runtime so expectations are verified while it runs.
    pub server: MockServer,
    rt: Runtime,
}

impl Backend {
    pub fn start() -> Self {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        Self { server, rt }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    pub fn verify(&self) {
        self.rt.block_on(self.server.verify());
    }

    pub fn request_count(&self) -> usize {
        self.rt
            .block_on(self.server.received_requests())
            .map(|r| r.len())
            .unwrap_or(0)
    }

    /// Settings pointing both the catalog and the identity authority at this
    /// server.
    pub fn settings(&self) -> Settings {
        let mut values = HashMap::new();
        values.insert("TENANT_ID", TENANT.to_string());
        values.insert("CLIENT_ID", "client-1".to_string());
        values.insert("CLIENT_SECRET", "secret-1".to_string());
        values.insert("SUBSCRIPTION_ID", "sub-1".to_string());
        values.insert("PURVIEW_ACCOUNT_NAME", "contoso".to_string());
        values.insert("PURVIEW_ENDPOINT", self.uri());
        values.insert("AZURE_AUTHORITY_HOST", self.uri());
        Settings::from_lookup(|key| values.get(key).cloned()).unwrap()
    }
}

pub fn session(token: &str) -> Session {
    Session::new(Credential::new(token, Utc::now() + chrono::Duration::hours(1))).unwrap()
}

pub fn token_body(token: &str) -> serde_json::Value {
    serde_json::json!({
        "token_type": "Bearer",
        "expires_in": 3599,
        "ext_expires_in": 3599,
        "access_token": token
    })
}

/// Feeds scripted input lines and captures everything written.
#[derive(Default)]
pub struct ScriptedTerminal {
    pub inputs: VecDeque<String>,
    pub output: Vec<u8>,
    pub prompts: Vec<String>,
    pub clears: usize,
}

impl ScriptedTerminal {
    pub fn with_inputs(inputs: &[&str]) -> Self {
        Self {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl Terminal for ScriptedTerminal {
    fn out(&mut self) -> &mut dyn Write {
        &mut self.output
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.inputs.pop_front())
    }

    fn clear(&mut self) -> Result<()> {
        self.clears += 1;
        Ok(())
    }
}
