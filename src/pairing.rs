// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pairing handshake state.
//!
//! Before the thermostat answers retrieve and update requests it has to
//! accept this client. The first pair request shows a prompt on the
//! thermostat's display; until someone confirms it, the thermostat keeps
//! replying "waiting".
//!
//! ```text
//! Unpaired ──pair──▶ Pending ──acc_status 2──▶ Paired
//!                      │ ▲
//!        other code    │ └── 0, 1, 3 or no status
//!                      ▼
//!                    Failed ──pair──▶ Pending
//! ```

use std::fmt;

use crate::error::{Error, Result};

/// `acc_status` value meaning the request was accepted.
pub const ACC_STATUS_ACCEPTED: i64 = 2;

/// Where the handshake stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PairingStatus {
    /// No pair request sent yet.
    #[default]
    Unpaired,
    /// A pair request was sent and is not accepted yet.
    Pending,
    /// The thermostat accepted this client. Terminal for the session.
    Paired,
    /// The thermostat rejected the last pair request.
    Failed,
}

impl fmt::Display for PairingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unpaired => "unpaired",
            Self::Pending => "pending",
            Self::Paired => "paired",
            Self::Failed => "failed",
        })
    }
}

/// How a pair reply was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairReply {
    /// `acc_status` 2.
    Accepted,
    /// `acc_status` 1 or 3: someone has to confirm on the thermostat.
    AwaitingConfirmation(i64),
    /// `acc_status` 0 or missing.
    NoStatus,
}

/// Tracks the pairing handshake of one session.
#[derive(Debug, Default)]
pub struct PairingState {
    status: PairingStatus,
}

impl PairingState {
    /// Starts in [`PairingStatus::Paired`] when the device is already known.
    #[must_use]
    pub fn new(paired: bool) -> Self {
        Self {
            status: if paired {
                PairingStatus::Paired
            } else {
                PairingStatus::Unpaired
            },
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> PairingStatus {
        self.status
    }

    /// Returns `true` once the thermostat accepted this client.
    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.status == PairingStatus::Paired
    }

    /// Records that a pair request is about to be sent.
    pub fn on_request_sent(&mut self) {
        if !self.is_paired() {
            self.status = PairingStatus::Pending;
        }
    }

    /// Interprets the `acc_status` of a pair reply.
    ///
    /// An accepted reply leaves the status [`Pending`](PairingStatus::Pending)
    /// until [`on_confirmed`](Self::on_confirmed), so the device id can be
    /// fetched first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] and moves to
    /// [`Failed`](PairingStatus::Failed) for any code other than 0 to 3.
    pub fn on_reply(&mut self, acc_status: Option<i64>) -> Result<PairReply> {
        if self.is_paired() {
            return Ok(PairReply::Accepted);
        }

        match acc_status {
            Some(ACC_STATUS_ACCEPTED) => Ok(PairReply::Accepted),
            Some(code @ (1 | 3)) => {
                self.status = PairingStatus::Pending;
                Ok(PairReply::AwaitingConfirmation(code))
            }
            Some(0) | None => {
                self.status = PairingStatus::Pending;
                Ok(PairReply::NoStatus)
            }
            Some(code) => {
                self.status = PairingStatus::Failed;
                Err(Error::Unauthorized(format!(
                    "pairing rejected by thermostat (acc_status {code})"
                )))
            }
        }
    }

    /// Completes the handshake.
    pub fn on_confirmed(&mut self) {
        self.status = PairingStatus::Paired;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn starts_unpaired() {
        let state = PairingState::default();
        assert_eq!(state.status(), PairingStatus::Unpaired);
        assert!(!state.is_paired());
        assert!(PairingState::new(true).is_paired());
    }

    #[test]
    fn accepted_waits_for_confirmation() {
        let mut state = PairingState::default();
        state.on_request_sent();
        assert_eq!(state.on_reply(Some(2)).unwrap(), PairReply::Accepted);
        assert_eq!(state.status(), PairingStatus::Pending);

        state.on_confirmed();
        assert_eq!(state.status(), PairingStatus::Paired);
    }

    #[test]
    fn waiting_codes_stay_pending() {
        for code in [1, 3] {
            let mut state = PairingState::default();
            state.on_request_sent();
            assert_eq!(
                state.on_reply(Some(code)).unwrap(),
                PairReply::AwaitingConfirmation(code)
            );
            assert_eq!(state.status(), PairingStatus::Pending);
        }
    }

    #[test]
    fn missing_status_stays_pending() {
        let mut state = PairingState::default();
        state.on_request_sent();
        assert_eq!(state.on_reply(None).unwrap(), PairReply::NoStatus);
        assert_eq!(state.on_reply(Some(0)).unwrap(), PairReply::NoStatus);
        assert_eq!(state.status(), PairingStatus::Pending);
    }

    #[test]
    fn other_codes_fail() {
        let mut state = PairingState::default();
        state.on_request_sent();
        let err = state.on_reply(Some(4)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(state.status(), PairingStatus::Failed);

        let err = state.on_reply(Some(-1)).unwrap_err();
        assert!(err.to_string().contains("acc_status -1"));
    }

    #[test]
    fn failed_can_retry() {
        let mut state = PairingState::default();
        state.on_request_sent();
        let _ = state.on_reply(Some(7));

        state.on_request_sent();
        assert_eq!(state.status(), PairingStatus::Pending);
        assert_eq!(state.on_reply(Some(2)).unwrap(), PairReply::Accepted);
    }

    #[test]
    fn paired_is_terminal() {
        let mut state = PairingState::new(true);
        state.on_request_sent();
        assert_eq!(state.on_reply(Some(9)).unwrap(), PairReply::Accepted);
        assert!(state.is_paired());
    }
}
