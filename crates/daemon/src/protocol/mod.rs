// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol: one JSON object per line, UTF-8, `\n`-terminated.
//!
//! `{id, method, params}` in, `{id, result}` or `{id, error}` out — an
//! open envelope rather than a closed, tagged message catalogue, since
//! the method name is an arbitrary string resolved at dispatch time
//! (`tools.call` aliasing, dotted/underscored/camelCase equivalence).

mod dispatch;
mod envelope;

pub use dispatch::dispatch;
pub use envelope::{normalize_method, ErrorBody, Request, Response};

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod dispatch_tests;

#[cfg(test)]
#[path = "property_tests.rs"]
mod property_tests;
