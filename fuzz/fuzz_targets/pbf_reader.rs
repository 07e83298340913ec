#![no_main]

use libfuzzer_sys::fuzz_target;
use pbf::Reader;

fuzz_target!(|data: &[u8]| {
    let mut reader = Reader::new(data);
    let mut idx = 0usize;

    // Use input bytes to drive a bounded sequence of operations.
    while idx < data.len() && idx < 1024 {
        let op = data[idx] % 6;
        idx += 1;

        match op {
            0 => {
                let _ = reader.read_varint();
            }
            1 => {
                let _ = reader.read_varint32();
            }
            2 => {
                let _ = reader.read_fixed32();
            }
            3 => {
                let _ = reader.read_fixed64();
            }
            4 => {
                let _ = reader.read_double();
            }
            _ => match reader.next_field() {
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => break,
            },
        }
    }
});
