//! The transition table (C5): a pure, total function from `(State, Event)`
//! to the next `State`. No I/O, no mutation of anything outside the value
//! it returns — see the design note in spec.md §9 ("the transition
//! function must be a pure, total mapping").
//!
//! "Newer" license-link detection (row `ValidateStatus -> ValidatedStatus`)
//! is resolved here as: the server only ever includes a `license` link on
//! a Status Document when a fresher license is available, so presence of
//! the link plus the "not already fetched this run" guard is sufficient —
//! no additional timestamp comparison is needed, and none is performed, so
//! the function stays a pure read of its inputs.

use std::sync::Arc;

use crate::document::{LicenseOutcome, StatusDocument, ValidatedDocuments, REL_REGISTER};
use crate::error::LcpError;
use crate::event::Event;
use crate::state::{RunContext, State};

/// Advances `state` given `event`. Illegal `(state, event)` pairs map to
/// `Failure(IllegalTransition)` rather than panicking — see spec.md §3's
/// "programmer error" invariant.
pub fn transition(state: State, event: Event) -> State {
    match (state, event) {
        (State::Start, Event::RetrievedLicenseData(data)) => State::ValidateLicense {
            data,
            ctx: RunContext::default(),
        },
        (State::Start, Event::RetrievedStatusData(data)) => State::ValidateStatus {
            data,
            ctx: RunContext::default(),
        },

        (State::ValidateLicense { ctx, .. }, Event::ValidatedLicense(license)) => {
            State::FetchStatus {
                license: license.clone(),
                ctx: ctx.with_license(license),
            }
        }

        (State::FetchStatus { ctx, .. }, Event::RetrievedStatusData(data)) => {
            State::ValidateStatus { data, ctx }
        }
        (State::FetchStatus { license, .. }, Event::Failed(_)) => State::CheckLicenseStatus {
            license,
            status: None,
        },

        (State::ValidateStatus { ctx, .. }, Event::ValidatedStatus(status)) => {
            validated_status(ctx, status)
        }

        (State::FetchLicense { ctx, .. }, Event::RetrievedLicenseData(data)) => {
            State::ValidateLicense { data, ctx }
        }
        (State::FetchLicense { ctx, .. }, Event::Failed(e)) => match ctx.license.clone() {
            Some(license) => State::CheckLicenseStatus {
                license,
                status: ctx.status.clone(),
            },
            None => State::Failure(e),
        },

        (State::CheckLicenseStatus { license, status }, Event::CheckedLicenseStatus(None)) => {
            State::RetrievePassphrase { license, status }
        }
        (
            State::CheckLicenseStatus { license, status },
            Event::CheckedLicenseStatus(Some(err)),
        ) => State::Valid(ValidatedDocuments {
            license,
            outcome: LicenseOutcome::Status(err),
            status,
        }),

        (State::RetrievePassphrase { license, status }, Event::RetrievedPassphrase(p)) => {
            State::ValidateIntegrity {
                license,
                passphrase: p,
                status,
            }
        }
        (State::RetrievePassphrase { .. }, Event::Cancelled) => State::Cancelled,

        (
            State::ValidateIntegrity {
                license, status, ..
            },
            Event::ValidatedIntegrity(drm),
        ) => {
            let register_link = status
                .as_deref()
                .and_then(|s| s.url(REL_REGISTER, None));
            let documents = ValidatedDocuments {
                license,
                outcome: LicenseOutcome::Context(drm),
                status,
            };
            match register_link {
                Some(link) => State::RegisterDevice { documents, link },
                None => State::Valid(documents),
            }
        }

        (State::RegisterDevice { documents, .. }, Event::RegisteredDevice(_)) => {
            State::Valid(documents)
        }

        // Every other non-terminal state tolerates a generic failure.
        (s, Event::Failed(e)) if !s.is_terminal() => State::Failure(e),

        // Anything else is an illegal (state, event) pair.
        (s, e) => {
            let state_label = s.label().to_string();
            let event_label = e.label().to_string();
            State::Failure(LcpError::IllegalTransition(state_label, event_label))
        }
    }
}

fn validated_status(ctx: RunContext, status: Arc<dyn StatusDocument>) -> State {
    if !ctx.status_already_fetched && status.license_link().is_some() {
        let ctx = ctx.with_status(status.clone()).mark_fetched();
        return State::FetchLicense { status, ctx };
    }
    match ctx.license.clone() {
        Some(license) => State::CheckLicenseStatus {
            license,
            status: Some(status),
        },
        None => State::Failure(LcpError::LicenseIntegrityFailed(
            "status document carries no license link and no license was supplied".to_string(),
        )),
    }
}
