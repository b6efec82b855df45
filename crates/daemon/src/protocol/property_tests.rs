// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for method-name normalization and envelope decoding.

use proptest::prelude::*;

use super::envelope::normalize_method;
use super::Request;

fn arb_method_segment() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9]{0,15}"
}

proptest! {
    #[test]
    fn normalize_method_is_idempotent(method in arb_method_segment()) {
        let once = normalize_method(&method);
        let twice = normalize_method(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn lldb_dot_and_lldb_underscore_prefixes_normalize_the_same_as_bare(method in arb_method_segment()) {
        let bare = normalize_method(&method);
        let dotted = normalize_method(&format!("lldb.{method}"));
        let underscored = normalize_method(&format!("lldb_{method}"));
        prop_assert_eq!(&bare, &dotted);
        prop_assert_eq!(&bare, &underscored);
    }

    #[test]
    fn request_decodes_with_whatever_method_and_id_were_sent(
        id in "[a-zA-Z0-9-]{1,12}",
        method in arb_method_segment(),
    ) {
        let line = serde_json::json!({ "id": id, "method": method, "params": {} }).to_string();
        let request: Request = serde_json::from_str(&line).expect("decode");
        prop_assert_eq!(request.id, id);
        prop_assert_eq!(request.method, method);
    }

    #[test]
    fn request_without_params_defaults_to_null(id in "[a-zA-Z0-9-]{1,12}", method in arb_method_segment()) {
        let line = serde_json::json!({ "id": id, "method": method }).to_string();
        let request: Request = serde_json::from_str(&line).expect("decode");
        prop_assert!(request.params.is_null());
    }
}
