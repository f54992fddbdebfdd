//! Update-client identification.
//!
//! The ESP8266/ESP32 `httpUpdate` clients announce themselves with a
//! `<ARCH>-http-Update` user agent and a fixed set of `x-<ARCH>-*` headers
//! describing the device. Only the presence of those headers is checked;
//! their values are never interpreted.

use std::fmt;

use axum::http::{header, HeaderMap};

/// Microcontroller family of the requesting update client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    Esp8266,
    Esp32,
}

const ESP8266_HEADERS: [&str; 7] = [
    "x-ESP8266-STA-MAC",
    "x-ESP8266-AP-MAC",
    "x-ESP8266-FREE-SPACE",
    "x-ESP8266-SKETCH-SIZE",
    "x-ESP8266-SKETCH-MD5",
    "x-ESP8266-CHIP-SIZE",
    "x-ESP8266-SDK-VERSION",
];

const ESP32_HEADERS: [&str; 7] = [
    "x-ESP32-STA-MAC",
    "x-ESP32-AP-MAC",
    "x-ESP32-FREE-SPACE",
    "x-ESP32-SKETCH-SIZE",
    "x-ESP32-SKETCH-MD5",
    "x-ESP32-CHIP-SIZE",
    "x-ESP32-SDK-VERSION",
];

impl Architecture {
    pub const ALL: [Architecture; 2] = [Self::Esp8266, Self::Esp32];

    pub fn tag(self) -> &'static str {
        match self {
            Self::Esp8266 => "ESP8266",
            Self::Esp32 => "ESP32",
        }
    }

    fn user_agent(self) -> &'static str {
        match self {
            Self::Esp8266 => "ESP8266-http-Update",
            Self::Esp32 => "ESP32-http-Update",
        }
    }

    /// Headers every genuine updater of this family sends.
    pub fn required_headers(self) -> &'static [&'static str] {
        match self {
            Self::Esp8266 => &ESP8266_HEADERS,
            Self::Esp32 => &ESP32_HEADERS,
        }
    }

    /// Match a raw `User-Agent` value, anchored at its start. Bytes after
    /// the prefix are not inspected and need not be UTF-8.
    pub fn from_user_agent(user_agent: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|arch| user_agent.starts_with(arch.user_agent().as_bytes()))
    }
}

/// Identity a request claims through its `User-Agent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestIdentity {
    Updater(Architecture),
    Unrecognized,
}

impl RequestIdentity {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(header::USER_AGENT)
            .and_then(|v| Architecture::from_user_agent(v.as_bytes()))
            .map_or(Self::Unrecognized, Self::Updater)
    }
}

/// Why a request was refused. Only ever logged; clients get a generic 403.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotHttpUpdate(Option<String>),
    MissingHeader(&'static str),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotHttpUpdate(Some(ua)) => write!(f, "User-Agent {ua:?} is not HTTPUpdate"),
            Self::NotHttpUpdate(None) => f.write_str("User-Agent is missing"),
            Self::MissingHeader(name) => {
                write!(f, "Missing header {name} to identify a legitimate request")
            }
        }
    }
}

/// Decide whether the headers belong to a genuine ESP8266/ESP32 updater.
///
/// Header names are matched case-insensitively, as `HeaderMap` does.
pub fn classify(headers: &HeaderMap) -> Result<Architecture, Rejection> {
    let arch = match RequestIdentity::from_headers(headers) {
        RequestIdentity::Updater(arch) => arch,
        RequestIdentity::Unrecognized => {
            let ua = headers
                .get(header::USER_AGENT)
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
            return Err(Rejection::NotHttpUpdate(ua));
        }
    };

    match arch
        .required_headers()
        .iter()
        .find(|name| !headers.contains_key(**name))
    {
        Some(missing) => Err(Rejection::MissingHeader(*missing)),
        None => Ok(arch),
    }
}
