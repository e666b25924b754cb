// Library root
// -----------
// The binary (`main.rs`) is a thin shell around these modules.
//
// Module responsibilities:
// - `config`: loads `purview.env` and resolves endpoints.
// - `auth`: client-credentials token acquisition and the request headers
//   derived from it.
// - `api`: the raw GET helper and the catalog search/entity client.
// - `reports`: the six read-only reports and their text formatting.
// - `ui`: terminal abstraction and the numbered menu controller.
// - `app`: wires the pieces together for a live session.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod reports;
pub mod ui;
