// cargo fuzz run decode corpus/decode -- -timeout=30

#![no_main]

use std::io::Cursor;
use libfuzzer_sys::fuzz_target;

use gifdec::Decoder;

fuzz_target!(|data: &[u8]| {
    if let Ok(doc) = Decoder::new(Cursor::new(data)).decode_best_effort() {
        for frame in doc.iter() {
            let _ = frame.resolve_pixels();
        }
    }
});
