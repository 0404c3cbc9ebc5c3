#![no_main]

use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;

static PASSWORD: Lazy<&'static str> = Lazy::new(|| "correct horse battery staple");

fn no_progress(_: u8, _: encimg::Phase) {}

fuzz_target!(|data: &[u8]| {
    let _ = encimg::pipeline::decrypt_envelope(data, &PASSWORD, no_progress);
});
