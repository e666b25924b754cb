// Application wiring: acquire the first session, build the menu, and route
// each chosen report to its implementation with the arguments it was bound
// to.

use crate::api::{CatalogClient, QueryHelper};
use crate::auth::{CredentialProvider, Session};
use crate::config::Settings;
use crate::error::{AuthError, ReportError};
use crate::reports;
use crate::ui::{Dispatcher, MenuController, Report, Terminal};
use anyhow::{Context, Result};
use reqwest::blocking::Client;

/// Runs reports against the live service.
pub struct LiveDispatcher {
    provider: CredentialProvider,
    http: QueryHelper,
    classification_keyword: String,
    classification_entity_type: String,
}

impl LiveDispatcher {
    pub fn new(provider: CredentialProvider, http: QueryHelper, settings: &Settings) -> Self {
        Self {
            provider,
            http,
            classification_keyword: settings.classification_keyword.clone(),
            classification_entity_type: settings.classification_entity_type.clone(),
        }
    }

    fn catalog(&self, endpoint: &str, credential: &crate::auth::Credential) -> CatalogClient {
        CatalogClient::new(self.http.client().clone(), endpoint, credential.clone())
    }
}

impl Dispatcher for LiveDispatcher {
    fn run_report(&mut self, report: &Report, term: &mut dyn Terminal) -> Result<(), ReportError> {
        match report {
            Report::DataSources { endpoint, headers } => {
                reports::list_data_sources(&self.http, endpoint, headers, term)
            }
            Report::IntegrationRuntimes { endpoint, headers } => {
                reports::list_integration_runtimes(&self.http, endpoint, headers, term)
            }
            Report::ManagedAttributes {
                endpoint,
                credential,
            } => reports::list_managed_attributes(&self.catalog(endpoint, credential), term),
            Report::Typedefs { endpoint, headers } => {
                reports::list_typedefs(&self.http, endpoint, headers, term)
            }
            Report::Classifications {
                endpoint,
                credential,
                headers,
            } => reports::list_classifications(
                &self.catalog(endpoint, credential),
                &self.http,
                endpoint,
                headers,
                &self.classification_keyword,
                &self.classification_entity_type,
                term,
            ),
            Report::QueryMap {
                endpoint,
                credential,
                headers,
            } => reports::query_map(
                &self.catalog(endpoint, credential),
                &self.http,
                endpoint,
                headers,
                term,
            ),
        }
    }

    fn refresh(&mut self) -> Result<Session, AuthError> {
        self.provider.acquire()
    }
}

/// Authenticate, then run the menu until the user exits. Failing to get the
/// first token is fatal.
pub fn run(settings: &Settings, term: &mut dyn Terminal) -> Result<()> {
    let client = Client::builder()
        .build()
        .context("Failed to build HTTP client")?;
    let provider = CredentialProvider::new(settings)?;

    let spinner = term.spinner("Acquiring access token...");
    let session = provider.acquire();
    spinner.finish_and_clear();
    let session = session.context("Failed to acquire an access token")?;
    tracing::info!(
        account = %settings.account_name,
        expires_at = %session.credential.expires_at(),
        "authenticated"
    );

    let mut menu = MenuController::new(&settings.endpoint, &session).with_subtitle(format!(
        "Account: {}    Subscription: {}",
        settings.account_name, settings.subscription_id
    ));
    let mut dispatcher = LiveDispatcher::new(provider, QueryHelper::new(client), settings);
    menu.run(term, &mut dispatcher)
}
