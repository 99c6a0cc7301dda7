// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport layer for the Nature Remo cloud API.
//!
//! - [`ApiClient`]: one HTTPS request per call to `GET /1/devices`
//! - [`SingleFlightRequester`]: shares one in-flight request between
//!   concurrent callers
//!
//! Failures are classified here into a [`FetchErrorKind`](crate::error::FetchErrorKind)
//! so callers can tell timeouts from other errors without inspecting
//! messages.

mod http;
mod single_flight;

pub use http::{ApiClient, ApiConfig};
pub use single_flight::{FetchOptions, SingleFlightRequester};
