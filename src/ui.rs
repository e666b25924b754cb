// UI layer: the numbered option menu and the terminal abstraction the
// reports write through. The controller owns the option list and replaces it
// wholesale whenever the credentials are refreshed.

use crate::auth::{Credential, Session};
use crate::error::{AuthError, ReportError};
use anyhow::Result;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use dialoguer::theme::Theme;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::HeaderMap;
use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};
use std::time::Duration;

pub const TITLE: &str = "Purview Inventory Tool";

/// Console surface used by the menu and the reports.
pub trait Terminal {
    fn out(&mut self) -> &mut dyn Write;

    /// Prompt for one line of input. `None` means the input stream ended.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    fn clear(&mut self) -> Result<()>;

    /// Block until the user acknowledges with Enter.
    fn pause(&mut self) -> Result<()> {
        self.read_line("Press Enter to continue...").map(|_| ())
    }

    /// Spinner for long calls; hidden unless the terminal can draw one.
    fn spinner(&mut self, _message: &str) -> ProgressBar {
        ProgressBar::hidden()
    }
}

/// The real console: stdout for output, `dialoguer` for prompts when a
/// user is attached, plain line reads from stdin otherwise.
pub struct StdTerminal {
    stdout: io::Stdout,
    interactive: bool,
}

impl StdTerminal {
    pub fn new() -> Self {
        // dialoguer draws on stderr and returns empty answers when it is not
        // a terminal, so redirected stderr or stdin means plain reads.
        let interactive = io::stderr().is_terminal() && io::stdin().is_terminal();
        tracing::debug!(interactive, "terminal detected");
        Self {
            stdout: io::stdout(),
            interactive,
        }
    }
}

impl Default for StdTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for StdTerminal {
    fn out(&mut self) -> &mut dyn Write {
        &mut self.stdout
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        if !self.interactive {
            return Ok(read_plain_line(&mut io::stdin().lock(), &mut self.stdout, prompt)?);
        }

        self.stdout.flush()?;
        let answer: io::Result<String> = Input::with_theme(&PromptTheme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text();
        match answer {
            Ok(line) => Ok(Some(line)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&mut self) -> Result<()> {
        execute!(self.stdout, Clear(ClearType::All), MoveTo(0, 0))?;
        Ok(())
    }

    fn spinner(&mut self, message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }
}

/// Write `prompt`, then read one line from `input`. `None` at end of input;
/// the line ending is stripped.
pub fn read_plain_line(
    input: &mut dyn BufRead,
    output: &mut dyn Write,
    prompt: &str,
) -> io::Result<Option<String>> {
    write!(output, "{}", prompt)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}

/// Shows prompts in red exactly as written. dialoguer's default theme adds
/// its own `": "` after every prompt.
pub struct PromptTheme;

impl Theme for PromptTheme {
    fn format_input_prompt(
        &self,
        f: &mut dyn fmt::Write,
        prompt: &str,
        _default: Option<&str>,
    ) -> fmt::Result {
        write!(f, "{}", prompt.red())
    }

    fn format_input_prompt_selection(
        &self,
        f: &mut dyn fmt::Write,
        prompt: &str,
        sel: &str,
    ) -> fmt::Result {
        write!(f, "{}{}", prompt.red(), sel)
    }
}

/// A report together with the arguments it was bound to when the menu was
/// built.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    DataSources {
        endpoint: String,
        headers: HeaderMap,
    },
    IntegrationRuntimes {
        endpoint: String,
        headers: HeaderMap,
    },
    ManagedAttributes {
        endpoint: String,
        credential: Credential,
    },
    Typedefs {
        endpoint: String,
        headers: HeaderMap,
    },
    Classifications {
        endpoint: String,
        credential: Credential,
        headers: HeaderMap,
    },
    QueryMap {
        endpoint: String,
        credential: Credential,
        headers: HeaderMap,
    },
}

impl Report {
    /// The single line shown when the report stops on an error.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Report::DataSources { .. } => "Failed to list data sources.",
            Report::IntegrationRuntimes { .. } => "Failed to list integration runtimes.",
            Report::ManagedAttributes { .. } => {
                "Failed to list assets with managed attributes. Please check the endpoint URL and try again."
            }
            Report::Typedefs { .. } => "Failed to list type definitions.",
            Report::Classifications { .. } | Report::QueryMap { .. } => {
                "Failed to list assets details."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Handler {
    Report(Report),
    RefreshCredentials,
    Exit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuOption {
    pub label: &'static str,
    pub handler: Handler,
}

/// Build the option list with every report bound to `session`. Exit is
/// always last.
pub fn menu_contents(endpoint: &str, session: &Session) -> Vec<MenuOption> {
    let endpoint = endpoint.to_string();
    let headers = &session.headers;
    let credential = &session.credential;
    let report = |label, report| MenuOption {
        label,
        handler: Handler::Report(report),
    };

    vec![
        report(
            "List Purview Data Sources",
            Report::DataSources {
                endpoint: endpoint.clone(),
                headers: headers.clone(),
            },
        ),
        report(
            "List Integration Runtimes",
            Report::IntegrationRuntimes {
                endpoint: endpoint.clone(),
                headers: headers.clone(),
            },
        ),
        report(
            "List Assets with Managed Attributes",
            Report::ManagedAttributes {
                endpoint: endpoint.clone(),
                credential: credential.clone(),
            },
        ),
        report(
            "List Typedefs",
            Report::Typedefs {
                endpoint: endpoint.clone(),
                headers: headers.clone(),
            },
        ),
        report(
            "List Asset Classifications",
            Report::Classifications {
                endpoint: endpoint.clone(),
                credential: credential.clone(),
                headers: headers.clone(),
            },
        ),
        report(
            "Query Map",
            Report::QueryMap {
                endpoint,
                credential: credential.clone(),
                headers: headers.clone(),
            },
        ),
        MenuOption {
            label: "Refresh Credentials",
            handler: Handler::RefreshCredentials,
        },
        MenuOption {
            label: "Exit",
            handler: Handler::Exit,
        },
    ]
}

/// What the menu calls into once an option is chosen.
pub trait Dispatcher {
    fn run_report(&mut self, report: &Report, term: &mut dyn Terminal) -> Result<(), ReportError>;

    /// Acquire a fresh session.
    fn refresh(&mut self) -> Result<Session, AuthError>;
}

pub struct MenuController {
    endpoint: String,
    subtitle: Option<String>,
    options: Vec<MenuOption>,
}

impl MenuController {
    pub fn new(endpoint: &str, session: &Session) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            subtitle: None,
            options: menu_contents(endpoint, session),
        }
    }

    /// Extra line printed under the title, e.g. the account in use.
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn options(&self) -> &[MenuOption] {
        &self.options
    }

    pub fn show_menu(&self, term: &mut dyn Terminal) -> Result<()> {
        term.clear()?;
        let out = term.out();
        writeln!(out, "\n\n{}\n", format!("{:^60}", TITLE).green())?;
        if let Some(subtitle) = &self.subtitle {
            writeln!(out, "{}\n", subtitle)?;
        }
        writeln!(out, "Option Menu:\n")?;
        for (i, option) in self.options.iter().enumerate() {
            if option.handler == Handler::Exit {
                writeln!(out, "\t{}. {}\n", i + 1, option.label.red())?;
            } else {
                writeln!(out, "\t{}. {}", i + 1, option.label)?;
            }
        }
        Ok(())
    }

    /// Read a choice in `1..=N`, re-prompting on anything else. `None` when
    /// input ends.
    pub fn get_choice(&self, term: &mut dyn Terminal) -> Result<Option<usize>> {
        let count = self.options.len();
        loop {
            let Some(line) = term.read_line("Choose an option: ")? else {
                return Ok(None);
            };
            match line.trim().parse::<usize>() {
                Ok(choice) if (1..=count).contains(&choice) => return Ok(Some(choice)),
                Ok(_) => writeln!(term.out(), "Please enter a number between 1 and {}.", count)?,
                Err(_) => writeln!(term.out(), "Invalid input. Please enter a number.")?,
            }
        }
    }

    /// Display, read, dispatch, repeat until Exit or end of input.
    pub fn run(&mut self, term: &mut dyn Terminal, dispatcher: &mut dyn Dispatcher) -> Result<()> {
        loop {
            self.show_menu(term)?;
            let Some(choice) = self.get_choice(term)? else {
                break;
            };

            match self.options[choice - 1].handler.clone() {
                Handler::Exit => {
                    writeln!(term.out(), "Exiting...")?;
                    break;
                }
                Handler::RefreshCredentials => {
                    match dispatcher.refresh() {
                        Ok(session) => {
                            self.options = menu_contents(&self.endpoint, &session);
                            tracing::debug!(
                                expires_at = %session.credential.expires_at(),
                                "credentials refreshed"
                            );
                            let message = "Credentials refreshed successfully.".green();
                            writeln!(term.out(), "{}", message)?;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "credential refresh failed");
                            let message = format!("Failed to refresh credentials: {}", e);
                            writeln!(term.out(), "{}", message.red())?;
                        }
                    }
                    term.pause()?;
                }
                Handler::Report(report) => {
                    if let Err(e) = dispatcher.run_report(&report, term) {
                        tracing::warn!(error = %e, "report failed");
                        writeln!(term.out(), "{}", report.failure_message())?;
                    }
                    term.pause()?;
                }
            }
        }
        Ok(())
    }
}
