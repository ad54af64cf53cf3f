#![no_main]

use libfuzzer_sys::fuzz_target;
use rspscope::ScopeStream;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Any byte sequence must end in a clean end-of-stream or an error
    let mut stream = ScopeStream::from_reader(Cursor::new(data));
    while let Ok(Some(scope)) = stream.next_scope() {
        let _ = scope.to_string();
    }
    let _ = stream.next_scope();
});
