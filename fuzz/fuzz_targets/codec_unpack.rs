//! Fuzz target for codec::unpack
//!
//! Feeds arbitrary bytes to the multi-part decoder to find:
//! - Panics on zero or oversized length-of-length headers
//! - Integer overflow in declared part lengths
//! - Out-of-bounds slicing on truncated buffers
//!
//! Whatever decodes must re-encode to a buffer that decodes to the same
//! parts (non-minimal length fields may change the bytes, never the parts).

#![no_main]

use libfuzzer_sys::fuzz_target;
use prism_proto::codec;

fuzz_target!(|data: &[u8]| {
    if let Ok(parts) = codec::unpack(data) {
        let repacked = codec::pack(&parts);
        assert!(repacked.len() <= data.len(), "minimal encoding never grows");
        assert_eq!(codec::unpack(&repacked).ok(), Some(parts));
    }
});
