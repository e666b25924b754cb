//! Menu controller behaviour: choice parsing, dispatch of the bound
//! reports, and rebinding after a credential refresh.

mod common;

use common::{session, ScriptedTerminal};
use purview_inventory::auth::Session;
use purview_inventory::error::{AuthError, ReportError};
use purview_inventory::ui::{
    Dispatcher, Handler, MenuController, MenuOption, Report, Terminal, TITLE,
};
use reqwest::header::HeaderMap;
use std::io::Write;

const ENDPOINT: &str = "https://contoso.purview.azure.com";

/// Records every dispatched report and hands out numbered sessions on
/// refresh.
#[derive(Default)]
struct Recorder {
    reports: Vec<Report>,
    refreshes: usize,
    fail_reports: bool,
    fail_refresh: bool,
}

impl Dispatcher for Recorder {
    fn run_report(&mut self, report: &Report, term: &mut dyn Terminal) -> Result<(), ReportError> {
        self.reports.push(report.clone());
        writeln!(term.out(), "partial output")?;
        if self.fail_reports {
            return Err(ReportError::missing("value"));
        }
        Ok(())
    }

    fn refresh(&mut self) -> Result<Session, AuthError> {
        if self.fail_refresh {
            return Err(AuthError::TokenRequest("denied".into()));
        }
        self.refreshes += 1;
        Ok(session(&format!("token-{}", self.refreshes + 1)))
    }
}

fn header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(reqwest::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start_matches("Bearer "))
}

fn bound_token(option: &MenuOption) -> Option<&str> {
    match &option.handler {
        Handler::Report(Report::DataSources { headers, .. })
        | Handler::Report(Report::IntegrationRuntimes { headers, .. })
        | Handler::Report(Report::Typedefs { headers, .. }) => header(headers),
        Handler::Report(Report::ManagedAttributes { credential, .. }) => Some(credential.token()),
        Handler::Report(Report::Classifications {
            credential, headers, ..
        })
        | Handler::Report(Report::QueryMap {
            credential, headers, ..
        }) => {
            assert_eq!(header(headers), Some(credential.token()));
            Some(credential.token())
        }
        Handler::RefreshCredentials | Handler::Exit => None,
    }
}

#[test]
fn each_index_dispatches_its_bound_report() {
    let initial = session("token-1");
    for index in 1..=6 {
        let mut menu = MenuController::new(ENDPOINT, &initial);
        let expected = match &menu.options()[index - 1].handler {
            Handler::Report(report) => report.clone(),
            other => panic!("option {} is {:?}", index, other),
        };
        let mut term = ScriptedTerminal::with_inputs(&[&index.to_string(), "", "8"]);
        let mut recorder = Recorder::default();

        menu.run(&mut term, &mut recorder).unwrap();

        assert_eq!(recorder.reports, vec![expected]);
        assert!(term.text().ends_with("Exiting...\n"));
    }
}

#[test]
fn invalid_input_reprompts_without_dispatch() {
    let mut menu = MenuController::new(ENDPOINT, &session("token-1"));
    let mut term = ScriptedTerminal::with_inputs(&["abc", "0", "9", "-1", "", "8"]);
    let mut recorder = Recorder::default();

    menu.run(&mut term, &mut recorder).unwrap();

    assert!(recorder.reports.is_empty());
    assert_eq!(recorder.refreshes, 0);
    let text = term.text();
    assert_eq!(text.matches("Invalid input. Please enter a number.").count(), 3);
    assert_eq!(text.matches("Please enter a number between 1 and 8.").count(), 2);
    assert_eq!(term.prompts.len(), 6);
}

#[test]
fn refresh_rebinds_every_report() {
    let mut menu = MenuController::new(ENDPOINT, &session("token-1"));
    let mut term = ScriptedTerminal::with_inputs(&["7", ""]);
    let mut recorder = Recorder::default();

    // Input ends after the acknowledgement, which leaves the loop.
    menu.run(&mut term, &mut recorder).unwrap();

    assert_eq!(recorder.refreshes, 1);
    assert_eq!(menu.options().len(), 8);
    for option in &menu.options()[..6] {
        assert_eq!(bound_token(option), Some("token-2"), "{}", option.label);
    }
    assert!(term.text().contains("Credentials refreshed successfully."));
}

#[test]
fn failed_refresh_keeps_previous_bindings() {
    let mut menu = MenuController::new(ENDPOINT, &session("token-1"));
    let mut term = ScriptedTerminal::with_inputs(&["7", "", "8"]);
    let mut recorder = Recorder {
        fail_refresh: true,
        ..Default::default()
    };

    menu.run(&mut term, &mut recorder).unwrap();

    for option in &menu.options()[..6] {
        assert_eq!(bound_token(option), Some("token-1"));
    }
    assert!(term.text().contains("Failed to refresh credentials"));
}

#[test]
fn report_failure_prints_one_line_after_partial_output() {
    let mut menu = MenuController::new(ENDPOINT, &session("token-1"));
    let mut term = ScriptedTerminal::with_inputs(&["3", "", "8"]);
    let mut recorder = Recorder {
        fail_reports: true,
        ..Default::default()
    };

    menu.run(&mut term, &mut recorder).unwrap();

    let text = term.text();
    let partial = text.find("partial output").unwrap();
    let failure = text
        .find("Failed to list assets with managed attributes.")
        .unwrap();
    assert!(partial < failure);
}

#[test]
fn menu_lists_numbered_options() {
    let menu =
        MenuController::new(ENDPOINT, &session("token-1")).with_subtitle("Account: contoso");
    let mut term = ScriptedTerminal::default();
    menu.show_menu(&mut term).unwrap();
    assert_eq!(term.clears, 1);
    let text = term.text();
    assert!(text.contains(TITLE));
    assert!(text.contains("Account: contoso"));
    assert!(text.contains("\t1. List Purview Data Sources"));
    assert!(text.contains("\t7. Refresh Credentials"));
    assert!(text.contains("Exit"));
}

#[test]
fn end_of_input_leaves_the_loop_like_exit() {
    let mut menu = MenuController::new(ENDPOINT, &session("token-1"));
    let mut term = ScriptedTerminal::default();
    let mut recorder = Recorder::default();

    menu.run(&mut term, &mut recorder).unwrap();

    assert!(recorder.reports.is_empty());
    assert_eq!(term.prompts, vec!["Choose an option: ".to_string()]);
    assert_eq!(term.clears, 1);
}
