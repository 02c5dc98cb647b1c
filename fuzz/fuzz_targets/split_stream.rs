//! Fuzz target driving a split stream with arbitrary operations.
//!
//! Run with: cargo +nightly fuzz run split_stream
//!
//! Every operation is mirrored on a flat `Vec<u8>`. After each step the
//! stream's size must match the model, and at the end the volumes read back
//! must equal the model byte for byte.

#![no_main]

use std::io::{Read, Seek, SeekFrom, Write};

use libfuzzer_sys::fuzz_target;
use zipspan::volume::{MIN_PART_SIZE, MemoryVolumeDirectory, SplitVolumeStream};

fuzz_target!(|data: &[u8]| {
    let Some((&first, ops)) = data.split_first() else {
        return;
    };
    let part_size = MIN_PART_SIZE + u64::from(first);
    let Ok(directory) = MemoryVolumeDirectory::new(part_size) else {
        return;
    };
    let Ok(mut stream) = SplitVolumeStream::new(directory) else {
        return;
    };
    let mut model: Vec<u8> = Vec::new();
    let mut position = 0usize;

    for op in ops.chunks(3) {
        let [kind, a, b] = match op {
            [kind, a, b] => [*kind, *a, *b],
            _ => break,
        };
        let arg = usize::from(u16::from_le_bytes([a, b]) % 1024);
        match kind % 4 {
            0 => {
                let bytes = vec![a; arg];
                stream.write_all(&bytes).expect("write");
                let end = position + bytes.len();
                if end > model.len() {
                    model.resize(end, 0);
                }
                model[position..end].copy_from_slice(&bytes);
                position = end;
            }
            1 => {
                position = stream
                    .seek(SeekFrom::Start(arg as u64))
                    .expect("seek") as usize;
                assert_eq!(position, arg.min(model.len()));
            }
            2 => {
                stream.set_size(arg as u64).expect("set_size");
                if arg < model.len() {
                    position = arg;
                }
                model.resize(arg, 0);
            }
            _ => {
                if position == model.len() {
                    stream.start_new_volume().expect("start_new_volume");
                } else {
                    assert!(stream.start_new_volume().is_err());
                }
            }
        }
        assert_eq!(stream.total_size(), model.len() as u64);
        assert_eq!(stream.position(), position as u64);
    }

    let mut directory = stream.into_directory();
    zipspan::VolumeDirectory::finalize_write(&mut directory).expect("finalize");
    let volumes = directory.into_volumes();
    let mut reader = SplitVolumeStream::new(MemoryVolumeDirectory::from_volumes(volumes))
        .expect("reopen");
    let mut restored = Vec::new();
    reader.read_to_end(&mut restored).expect("read");
    assert_eq!(restored, model);
});
