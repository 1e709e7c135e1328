// jstage-core/tests/common/mod.rs
#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Builder, EntryType, Header};
use xz2::write::XzEncoder;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub enum Entry<'a> {
    Dir(&'a str),
    File(&'a str, &'a [u8]),
    Symlink(&'a str, &'a str),
}

pub enum Payload {
    Gzip,
    Xz,
}

pub fn tar_bytes(entries: &[Entry<'_>]) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());
    for entry in entries {
        let mut header = Header::new_gnu();
        match entry {
            Entry::Dir(path) => {
                header.set_entry_type(EntryType::Directory);
                header.set_size(0);
                header.set_mode(0o755);
                builder.append_data(&mut header, path, &[][..]).unwrap();
            }
            Entry::File(path, body) => {
                header.set_entry_type(EntryType::Regular);
                header.set_size(body.len() as u64);
                header.set_mode(0o644);
                builder.append_data(&mut header, path, *body).unwrap();
            }
            Entry::Symlink(path, target) => {
                header.set_entry_type(EntryType::Symlink);
                header.set_size(0);
                header.set_mode(0o777);
                builder.append_link(&mut header, path, target).unwrap();
            }
        }
    }
    builder.into_inner().unwrap()
}

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(bytes).unwrap();
    enc.finish().unwrap()
}

pub fn xz(bytes: &[u8]) -> Vec<u8> {
    let mut enc = XzEncoder::new(Vec::new(), 6);
    enc.write_all(bytes).unwrap();
    enc.finish().unwrap()
}

/// A Debian package with the usual three members.
pub fn deb_bytes(entries: &[Entry<'_>], payload: Payload) -> Vec<u8> {
    let data = tar_bytes(entries);
    let (name, body) = match payload {
        Payload::Gzip => ("data.tar.gz", gzip(&data)),
        Payload::Xz => ("data.tar.xz", xz(&data)),
    };
    let control = gzip(&tar_bytes(&[Entry::File("./control", b"Package: test\n")]));

    let mut builder = ar::Builder::new(Vec::new());
    for (member, bytes) in [
        ("debian-binary", b"2.0\n".to_vec()),
        ("control.tar.gz", control),
        (name, body),
    ] {
        let header = ar::Header::new(member.as_bytes().to_vec(), bytes.len() as u64);
        builder.append(&header, Cursor::new(bytes)).unwrap();
    }
    builder.into_inner().unwrap()
}

pub fn write_deb(path: &Path, entries: &[Entry<'_>], payload: Payload) {
    fs::write(path, deb_bytes(entries, payload)).unwrap();
}

pub fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in files {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Every regular file under `root` as (relative path, contents), sorted.
pub fn snapshot(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut out: Vec<_> = walkdir::WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .into_owned();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect();
    out.sort();
    out
}
