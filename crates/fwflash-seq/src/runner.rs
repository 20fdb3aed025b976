//! Running external commands
//!
//! [`CommandRunner`] is the seam between the sequencer and the operating
//! system. [`SystemRunner`] really spawns processes; [`DryRunRunner`] only
//! records what would have run.

use crate::tools::Invocation;
use std::io::{self, Read};
use std::process::Stdio;
use std::sync::mpsc::{self, Sender};
use std::thread;

/// Read buffer size for child output
const READ_CHUNK_SIZE: usize = 4096;

/// Result of one finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Whether the process exited successfully
    pub success: bool,
    /// Exit code, `None` if killed by a signal
    pub code: Option<i32>,
    /// Merged stdout/stderr, one line per output line
    pub output: String,
}

/// Runs an [`Invocation`] to completion
pub trait CommandRunner {
    /// Run `invocation`, calling `on_line` for each output line as it
    /// arrives
    ///
    /// An `Err` means the process could not be started or waited for; a
    /// process that ran and failed is an `Ok` with `success == false`.
    fn run(
        &mut self,
        invocation: &Invocation,
        on_line: &mut dyn FnMut(&str),
    ) -> io::Result<ProcessOutput>;
}

/// Runs commands as child processes
///
/// stdout and stderr are read on two helper threads and merged into one
/// stream; `on_line` is always called on the caller's thread. Both `\n` and
/// `\r` end a line so in-place progress updates come through.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &mut self,
        invocation: &Invocation,
        on_line: &mut dyn FnMut(&str),
    ) -> io::Result<ProcessOutput> {
        log::debug!("Spawning: {}", invocation);

        let mut child = invocation
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let mut lines = Vec::new();

        thread::scope(|s| {
            let (tx, rx) = mpsc::channel();
            if let Some(out) = stdout {
                let tx = tx.clone();
                s.spawn(move || pump(out, tx));
            }
            if let Some(err) = stderr {
                let tx = tx.clone();
                s.spawn(move || pump(err, tx));
            }
            drop(tx);

            for line in rx {
                on_line(&line);
                lines.push(line);
            }
        });

        let status = child.wait()?;
        log::debug!("{} exited with {}", invocation.program.display(), status);

        Ok(ProcessOutput {
            success: status.success(),
            code: status.code(),
            output: lines.join("\n"),
        })
    }
}

/// Forward lines from `reader` until EOF or the receiver goes away
fn pump<R: Read>(mut reader: R, tx: Sender<String>) {
    let mut buf = [0u8; READ_CHUNK_SIZE];
    let mut pending = Vec::new();

    let flush = |pending: &mut Vec<u8>| -> bool {
        if pending.is_empty() {
            return true;
        }
        let line = String::from_utf8_lossy(pending).into_owned();
        pending.clear();
        tx.send(line).is_ok()
    };

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::debug!("Reading child output failed: {}", e);
                break;
            }
        };

        for &byte in &buf[..n] {
            if byte == b'\n' || byte == b'\r' {
                if !flush(&mut pending) {
                    return;
                }
            } else {
                pending.push(byte);
            }
        }
    }

    flush(&mut pending);
}

/// Records invocations instead of running them
#[derive(Debug, Default, Clone)]
pub struct DryRunRunner {
    /// Everything that would have run, in order
    pub invocations: Vec<Invocation>,
}

impl DryRunRunner {
    /// Create an empty dry-run recorder
    pub fn new() -> Self {
        Self::default()
    }
}

impl CommandRunner for DryRunRunner {
    fn run(
        &mut self,
        invocation: &Invocation,
        on_line: &mut dyn FnMut(&str),
    ) -> io::Result<ProcessOutput> {
        let line = format!("would run: {}", invocation);
        on_line(&line);
        self.invocations.push(invocation.clone());
        Ok(ProcessOutput {
            success: true,
            code: Some(0),
            output: line,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pump_splits_lines() {
        let (tx, rx) = mpsc::channel();
        let output: &[u8] = b"Connecting....\r\n\
            Writing at 0x00001000... (10 %)\r\
            Writing at 0x00002000... (20 %)\n\
            done";
        pump(output, tx);
        let lines: Vec<String> = rx.into_iter().collect();
        assert_eq!(
            lines,
            vec![
                "Connecting....",
                "Writing at 0x00001000... (10 %)",
                "Writing at 0x00002000... (20 %)",
                "done"
            ]
        );
    }

    #[test]
    fn test_dry_run_records() {
        let mut runner = DryRunRunner::new();
        let inv = Invocation::new("esptool").arg("version");
        let mut seen = Vec::new();
        let out = runner.run(&inv, &mut |l| seen.push(l.to_string())).unwrap();
        assert!(out.success);
        assert_eq!(runner.invocations, vec![inv]);
        assert_eq!(seen, vec!["would run: esptool version"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_merges_output() {
        let inv = Invocation::new("sh")
            .arg("-c")
            .arg("echo out; echo err 1>&2; exit 3");
        let mut seen = Vec::new();
        let out = SystemRunner
            .run(&inv, &mut |l| seen.push(l.to_string()))
            .unwrap();

        assert!(!out.success);
        assert_eq!(out.code, Some(3));
        seen.sort();
        assert_eq!(seen, vec!["err", "out"]);
        assert!(out.output.contains("out"));
        assert!(out.output.contains("err"));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_env_and_cwd() {
        let dir = tempfile::TempDir::new().unwrap();
        let inv = Invocation::new("sh")
            .args(["-c", "echo $FWFLASH_TEST_VAR; pwd"])
            .env("FWFLASH_TEST_VAR", "hello")
            .current_dir(dir.path());
        let out = SystemRunner.run(&inv, &mut |_| {}).unwrap();

        assert!(out.success);
        let lines: Vec<&str> = out.output.lines().collect();
        assert_eq!(lines[0], "hello");
        let pwd = std::path::Path::new(lines[1]).canonicalize().unwrap();
        assert_eq!(pwd, dir.path().canonicalize().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_streams_lines() {
        use std::time::{Duration, Instant};

        let inv = Invocation::new("sh").args(["-c", "echo a; sleep 1; echo b"]);
        let mut seen = Vec::new();
        let out = SystemRunner
            .run(&inv, &mut |l| seen.push((l.to_string(), Instant::now())))
            .unwrap();
        let exited = Instant::now();

        assert!(out.success);
        let lines: Vec<&str> = seen.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(lines, vec!["a", "b"]);
        // The first line arrives while the child is still sleeping
        assert!(exited.duration_since(seen[0].1) >= Duration::from_millis(500));
        assert!(seen[1].1.duration_since(seen[0].1) >= Duration::from_millis(500));
    }

    #[test]
    fn test_system_runner_missing_program() {
        let inv = Invocation::new("/nonexistent/fwflash-test-tool");
        assert!(SystemRunner.run(&inv, &mut |_| {}).is_err());
    }
}
