// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![no_main]
#![forbid(unsafe_code)]

use libfuzzer_sys::fuzz_target;
use bluecarbon::core::types::{
    decode_canonical_limited, encode_canonical, Alert, AuditEntry, ComplianceRecord, MAX_ENCODED_ITEM,
};

fuzz_target!(|data: &[u8]| {
    if let Ok(r) = decode_canonical_limited::<ComplianceRecord>(data, MAX_ENCODED_ITEM) {
        let again = encode_canonical(&r).expect("encode");
        let back: ComplianceRecord = decode_canonical_limited(&again, MAX_ENCODED_ITEM).expect("decode");
        assert_eq!(back.project_id, r.project_id);
        assert_eq!(back.compliance_status, r.compliance_status);
    }
    let _ = decode_canonical_limited::<Alert>(data, MAX_ENCODED_ITEM);
    let _ = decode_canonical_limited::<AuditEntry>(data, MAX_ENCODED_ITEM);
});
