#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Intents are produced locally but the authority echoes them back in
    // debugging tools, so the deserialization path must hold up too.
    let _ = serde_json::from_slice::<quizwire_client::protocol::ClientIntent>(data);

    if let Ok(s) = std::str::from_utf8(data) {
        let _ = serde_json::from_str::<quizwire_client::protocol::ClientIntent>(s);
    }
});
