// src/io/mod.rs
//
// File boundary: decoding, WAV export, JSON documents, reference libraries.
pub mod decode;
pub mod library;
pub mod report;
pub mod wav;

pub use decode::decode_file;
pub use library::{load_library_dir, load_library_files};
pub use report::{load_json, load_note_rows, save_json};
pub use wav::write_wav;
