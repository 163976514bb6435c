//! Connection state translation.

use std::fmt;

use serde::Serialize;
use wagate_core::{ConnectionState, SessionRecord};

/// Session status in the vocabulary clients expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExternalStatus {
    /// The session is connected.
    #[serde(rename = "CONNECTED")]
    Connected,
    /// A QR code is waiting to be scanned.
    #[serde(rename = "scancode")]
    ScanCode,
    /// Anything else.
    #[serde(rename = "starting")]
    Starting,
}

impl ExternalStatus {
    /// Translates a connection state and optional QR code.
    ///
    /// `open` wins over a QR code; an empty QR code counts as absent.
    pub fn translate(state: &ConnectionState, qr_code: Option<&str>) -> Self {
        if state.is_open() {
            Self::Connected
        } else if qr_code.is_some_and(|qr| !qr.is_empty()) {
            Self::ScanCode
        } else {
            Self::Starting
        }
    }

    /// Translates a session record.
    pub fn of(session: &SessionRecord) -> Self {
        Self::translate(&session.connection, session.qr())
    }

    /// Returns the wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "CONNECTED",
            Self::ScanCode => "scancode",
            Self::Starting => "starting",
        }
    }
}

impl fmt::Display for ExternalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
