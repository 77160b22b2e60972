//! Concurrent draining of child-process output streams.
//!
//! One lightweight reader thread per stream feeds a shared channel, so the
//! collecting loop never blocks on a stream that has no data and notices
//! end-of-output promptly; stdout and stderr are interleaved fairly without
//! starving either side. Partial output is surfaced to the logging hook as
//! it arrives so long-running commands stay observable.

use std::io::{self, Read, Write};
use std::process::Child;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use crate::report::Reporter;

/// Login banner printed by EdgeRoute routers on every SSH session.
///
/// Lines of stderr exactly matching this string are stripped before the
/// output is logged or returned; stdout is never filtered.
pub const LOGIN_BANNER: &str = "Welcome to EdgeRoute";

const READ_CHUNK: usize = 8192;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum StreamKind {
    Out,
    Err,
}

/// Accumulated output of a fully drained child process.
pub(super) struct DrainedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Drains both output streams of `child` until they close.
///
/// Each chunk is forwarded to the reporter immediately and echoed to the
/// matching terminal stream when `verbose` is set. Returns once every
/// reader has hung up; the caller then waits on the child for its exit
/// status.
pub(super) fn drain(child: &mut Child, reporter: &Reporter, verbose: bool) -> DrainedOutput {
    let (tx, rx) = mpsc::channel();
    let mut readers: Vec<JoinHandle<()>> = Vec::with_capacity(2);
    if let Some(out) = child.stdout.take() {
        readers.push(spawn_reader(StreamKind::Out, out, tx.clone()));
    }
    if let Some(err) = child.stderr.take() {
        readers.push(spawn_reader(StreamKind::Err, err, tx.clone()));
    }
    // The collecting loop owns no sender; recv() disconnects once both
    // readers are done.
    drop(tx);

    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut filter = BannerFilter::default();

    while let Ok((kind, chunk)) = rx.recv() {
        match kind {
            StreamKind::Out => {
                surface(reporter, verbose, StreamKind::Out, &chunk);
                stdout.push_str(&chunk);
            }
            StreamKind::Err => {
                let kept = filter.push(&chunk);
                if !kept.is_empty() {
                    surface(reporter, verbose, StreamKind::Err, &kept);
                    stderr.push_str(&kept);
                }
            }
        }
    }

    let tail = filter.finish();
    if !tail.is_empty() {
        surface(reporter, verbose, StreamKind::Err, &tail);
        stderr.push_str(&tail);
    }

    for reader in readers {
        reader.join().ok();
    }
    DrainedOutput { stdout, stderr }
}

fn surface(reporter: &Reporter, verbose: bool, kind: StreamKind, chunk: &str) {
    reporter.answer(chunk);
    if !verbose {
        return;
    }
    match kind {
        StreamKind::Out => {
            let mut out = io::stdout().lock();
            write!(out, "{chunk}").ok();
            out.flush().ok();
        }
        StreamKind::Err => {
            let mut err = io::stderr().lock();
            write!(err, "{chunk}").ok();
            err.flush().ok();
        }
    }
}

fn spawn_reader<R>(kind: StreamKind, mut source: R, tx: Sender<(StreamKind, String)>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = [0_u8; READ_CHUNK];
        loop {
            match source.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    let text =
                        String::from_utf8_lossy(buf.get(..n).unwrap_or_default()).into_owned();
                    if tx.send((kind, text)).is_err() {
                        break;
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                // A failed read yields no data for this cycle and ends the
                // stream; the process exit code is the source of truth.
                Err(_) => break,
            }
        }
    })
}

/// Line-oriented filter that removes login-banner lines from stderr.
///
/// Chunks can split lines at arbitrary byte positions, so a trailing
/// partial line is held back until its newline (or `finish`) arrives.
#[derive(Debug, Default)]
struct BannerFilter {
    pending: String,
}

impl BannerFilter {
    /// Feeds a chunk and returns the filtered text ready to surface.
    fn push(&mut self, chunk: &str) -> String {
        self.pending.push_str(chunk);
        let mut kept = String::new();
        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            if line.trim_end_matches('\n') != LOGIN_BANNER {
                kept.push_str(&line);
            }
        }
        kept
    }

    /// Flushes any held partial line once the stream has closed.
    fn finish(&mut self) -> String {
        let rest = std::mem::take(&mut self.pending);
        if rest == LOGIN_BANNER {
            return String::new();
        }
        rest
    }
}
