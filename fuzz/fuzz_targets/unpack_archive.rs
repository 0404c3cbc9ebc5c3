#![no_main]

use libfuzzer_sys::fuzz_target;

fn no_progress(_: u8, _: encimg::Phase) {}

fuzz_target!(|data: &[u8]| {
    let _ = encimg::pipeline::unarchive(data, no_progress);
});
