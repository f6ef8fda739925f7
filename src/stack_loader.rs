use crate::{
    decode::ImageDecodeService,
    enums::Plane,
    metadata::MetadataExtractor,
    scheduler::Scheduler,
    stack::{ImageHandle, Stack, StackSlice},
};

use log::{debug, info, warn};
use std::{cmp::Ordering, fs, path::Path};
use web_time::Instant;

/// Raw bytes of one image and the name it was stored under.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub filename: String,
    pub data: Vec<u8>,
}

impl SourceFile {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }
}

pub struct StackLoader<'a, D, S> {
    service: &'a D,
    scheduler: &'a S,
    extractor: MetadataExtractor,
}

impl<'a, D: ImageDecodeService, S: Scheduler> StackLoader<'a, D, S> {
    pub fn new(service: &'a D, scheduler: &'a S) -> Self {
        Self {
            service,
            scheduler,
            extractor: MetadataExtractor::default(),
        }
    }

    pub fn with_extractor(mut self, extractor: MetadataExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Register, sort and describe the images of one plane.
    ///
    /// Files that fail to register are logged and dropped. An empty input
    /// gives an empty stack; whether that is fatal is up to the caller.
    /// The loader yields after each registration so two loads awaited
    /// together make progress in turns.
    pub async fn load(&self, plane: Plane, files: Vec<SourceFile>) -> Stack {
        let started = Instant::now();
        let total = files.len();
        let mut handles = Vec::with_capacity(total);

        for file in files {
            match self.service.register(&file.data) {
                Ok(id) => {
                    debug!("{plane}: registered {} as {id}", file.filename);
                    handles.push(ImageHandle {
                        id,
                        filename: file.filename,
                    });
                }
                Err(err) => warn!("{plane}: dropping {}: {err}", file.filename),
            }
            self.scheduler.yield_once().await;
        }

        Self::sort_handles(&mut handles);

        // Extraction runs over the final order.
        let slices: Vec<_> = handles
            .into_iter()
            .map(|handle| StackSlice {
                metadata: self.extractor.extract(self.service, &handle),
                handle,
            })
            .collect();

        info!(
            "{plane}: loaded {} of {total} images in {:?}",
            slices.len(),
            started.elapsed()
        );
        Stack::new(slices)
    }

    fn sort_handles(handles: &mut [ImageHandle]) {
        // `sort_by` is stable, equal names keep their input order
        handles.sort_by(|a, b| natural_cmp(&a.filename, &b.filename));
    }
}

/// Compare two strings so that runs of ASCII digits compare by numeric value
/// ("2.dcm" < "10.dcm"). Leading zeros do not affect the order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a;
    let mut right = b;
    loop {
        match (left.chars().next(), right.chars().next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let (l_run, l_rest) = split_digits(left);
                let (r_run, r_rest) = split_digits(right);
                let ordering = compare_digit_runs(l_run, r_run);
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left = l_rest;
                right = r_rest;
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left = &left[l.len_utf8()..];
                right = &right[r.len_utf8()..];
            }
        }
    }
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    s.split_at(end)
}

// Digit runs can exceed any integer type, so compare them as strings once
// leading zeros are gone.
fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Read every `.dcm` file of a directory into memory.
pub fn read_directory(path: impl AsRef<Path>) -> std::io::Result<Vec<SourceFile>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(path.as_ref())?.filter_map(Result::ok) {
        let path = entry.path();
        let is_dicom = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"));
        if !is_dicom {
            continue;
        }
        let Some(filename) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        files.push(SourceFile::new(filename, fs::read(&path)?));
    }
    Ok(files)
}
