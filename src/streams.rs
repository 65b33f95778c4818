//! Stream topologies: single stream, in-place file edits, many-to-one
//! merges, and one-to-many tees
//!
//! Every topology is driven by the same chunk loop; they differ only in
//! where the rule counters reset and where output fans out. File edits
//! go through a sibling temp file that atomically replaces the original
//! on success, so a failed edit never leaves a half-written file.

use crate::error::{EditError, EditResult};
use crate::options::{AbortHandle, EditOptions};
use crate::transform::{ChunkOutcome, StreamTransform};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

const CHUNK_SIZE: usize = 64 * 1024;

/// Write one output piece, reporting a destination that went away as a
/// premature close rather than a bare I/O error.
fn write_piece<W: Write>(dest: &mut W, piece: &str) -> EditResult<()> {
    dest.write_all(piece.as_bytes()).map_err(|e| {
        if e.kind() == io::ErrorKind::BrokenPipe || e.kind() == io::ErrorKind::WriteZero {
            EditError::PrematureClose {
                what: "destination stream",
            }
        } else {
            e.into()
        }
    })
}

/// Pump one source through a transform, handing each output string to
/// `sink`. Runs the transform's full lifecycle including the
/// post-completion rule assertions.
fn drive<R: Read>(
    source: &mut R,
    transform: &mut StreamTransform,
    abort: Option<&AbortHandle>,
    sink: &mut dyn FnMut(&str) -> EditResult<()>,
) -> EditResult<()> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut outputs = Vec::new();

    loop {
        if let Some(handle) = abort {
            if handle.is_aborted() {
                return Err(EditError::Aborted);
            }
        }
        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        outputs.clear();
        let outcome = transform.push_chunk(&buf[..n], &mut outputs)?;
        for piece in &outputs {
            sink(piece)?;
        }
        if outcome == ChunkOutcome::Ended {
            debug!("stream truncated at replacement limit");
            transform.finalize_rules()?;
            return Ok(());
        }
    }

    outputs.clear();
    transform.finish(&mut outputs)?;
    for piece in &outputs {
        sink(piece)?;
    }
    transform.finalize_rules()?;
    Ok(())
}

/// Edit one readable source into one writable destination.
pub fn process_streaming<R: Read, W: Write>(
    source: &mut R,
    dest: &mut W,
    options: &EditOptions,
) -> EditResult<()> {
    let mut transform = StreamTransform::new(options)?;
    drive(source, &mut transform, options.abort.as_ref(), &mut |s| {
        write_piece(dest, s)
    })?;
    dest.flush()?;
    Ok(())
}

/// Run an edit and hand each processed part to a callback instead of a
/// writer. Useful when the parts are consumed as values.
pub fn for_each_part<R: Read, F>(source: &mut R, options: &EditOptions, mut f: F) -> EditResult<()>
where
    F: FnMut(&str) -> EditResult<()>,
{
    let mut transform = StreamTransform::new(options)?;
    drive(source, &mut transform, options.abort.as_ref(), &mut f)
}

/// Edit a file in place through a sibling temp file.
pub fn edit_file(path: impl AsRef<Path>, options: &EditOptions) -> EditResult<()> {
    let path = path.as_ref();
    let metadata = fs::metadata(path).map_err(|e| EditError::InvalidFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !metadata.is_file() {
        return Err(EditError::InvalidFile {
            path: path.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }

    // temp file lives next to the target so persist stays on one filesystem
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    let temp = NamedTempFile::new_in(parent.unwrap_or_else(|| Path::new(".")))?;
    {
        let input = File::open(path)?;
        let mut reader = BufReader::new(input);
        let mut writer = BufWriter::new(temp.as_file());
        process_streaming(&mut reader, &mut writer, options)?;
    }
    temp.persist(path).map_err(|e| EditError::Io(e.error))?;
    info!("edited {} in place", path.display());
    Ok(())
}

/// Edit several files in place. Rule counters reset per file, so limits
/// and match-count requirements apply to each file independently.
pub fn edit_files<P: AsRef<Path>>(paths: &[P], options: &EditOptions) -> EditResult<()> {
    for path in paths {
        edit_file(path, options)?;
    }
    Ok(())
}

/// Concatenate several sources into one destination, editing each with a
/// fresh transform and writing `content_join` between them.
pub fn merge_sources<R: Read, W: Write>(
    sources: &mut [R],
    dest: &mut W,
    options: &EditOptions,
) -> EditResult<()> {
    if sources.is_empty() {
        return Err(EditError::config("merge requires at least one source"));
    }
    let last = sources.len() - 1;
    for (i, source) in sources.iter_mut().enumerate() {
        let mut transform = StreamTransform::new(options)?;
        drive(source, &mut transform, options.abort.as_ref(), &mut |s| {
            write_piece(dest, s)
        })?;
        if i < last {
            dest.write_all(options.content_join.as_bytes())?;
        }
    }
    dest.flush()?;
    Ok(())
}

/// Edit one source into several destinations at once.
pub fn tee_stream<R: Read, W: Write>(
    source: &mut R,
    destinations: &mut [W],
    options: &EditOptions,
) -> EditResult<()> {
    if destinations.is_empty() {
        return Err(EditError::config("tee requires at least one destination"));
    }
    let mut transform = StreamTransform::new(options)?;
    drive(source, &mut transform, options.abort.as_ref(), &mut |s| {
        for dest in destinations.iter_mut() {
            write_piece(dest, s)?;
        }
        Ok(())
    })?;
    for dest in destinations.iter_mut() {
        dest.flush()?;
    }
    Ok(())
}
