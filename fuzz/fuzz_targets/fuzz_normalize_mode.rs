#![no_main]
use libfuzzer_sys::fuzz_target;
use modeswitch::device::ModeReport;
use modeswitch::normalizer::ModeNormalizer;
use modeswitch::schedule::TimeOfDay;

fuzz_target!(|data: &[u8]| {
    let normalizer = ModeNormalizer::default();

    // Leading eight bytes double as a numeric code
    if let Some(head) = data.get(..8) {
        let mut code = [0u8; 8];
        code.copy_from_slice(head);
        let _ = normalizer.normalize_report(&ModeReport::Code(i64::from_be_bytes(code)));
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let _ = normalizer.normalize_report(&ModeReport::Name(text.to_string()));

        // Anything that parses must print back to itself
        if let Ok(time) = text.parse::<TimeOfDay>() {
            assert_eq!(time.to_string(), text);
        }
    }
});
