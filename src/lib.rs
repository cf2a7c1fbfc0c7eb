//! # Copiclone
//!
//! `copiclone` is a small HTTP service that clones a Power Platform copilot by
//! driving the Microsoft `pac` CLI. A clone request names the source
//! environment/bot and the display name, schema name and solution for the
//! clone; the service then authenticates the CLI with a service principal,
//! extracts the source copilot into a transient template file and recreates it
//! under the new identity.
//!
//! The `pac` tool performs every actual platform operation. This crate is the
//! orchestration around it: request validation, subprocess execution with
//! bounded timeouts, scraping the new copilot id/URL out of the CLI's text
//! output, and mapping each step to an HTTP response.

pub mod cli;
pub mod copiclone;
