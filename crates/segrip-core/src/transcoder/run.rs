//! Runs the transcoder and consumes its progress stream.

use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};

use super::progress::{apply_progress_line, TranscodeProgress};
use super::TranscodeError;

/// Spawns `cmd` with stdout piped and folds every stdout line into a
/// [`TranscodeProgress`], calling `on_update` after each line. Blocks until
/// the process exits. A non-zero exit is an error.
pub fn run_with_progress<F>(
    cmd: &mut Command,
    mut on_update: F,
) -> Result<TranscodeProgress, TranscodeError>
where
    F: FnMut(&TranscodeProgress),
{
    let program = cmd.get_program().to_string_lossy().into_owned();
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|source| TranscodeError::Spawn {
            program: program.clone(),
            source,
        })?;

    let mut state = TranscodeProgress::default();
    if let Some(stdout) = child.stdout.take() {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = match reader.read_until(b'\n', &mut buf) {
                Ok(n) => n,
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(TranscodeError::Io(e));
                }
            };
            if n == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            state = apply_progress_line(state, &line);
            on_update(&state);
        }
    }

    let status = child.wait()?;
    if !status.success() {
        tracing::error!(program = %program, %status, "transcoder failed");
        return Err(TranscodeError::Exit { status });
    }
    Ok(state)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut c = Command::new("sh");
        c.arg("-c").arg(script);
        c
    }

    #[test]
    fn progress_lines_are_folded_in_order() {
        let mut updates = 0;
        let state = run_with_progress(
            &mut sh("printf 'frame=1\\nframe=2\\nnoise\\ntotal_size=2500000\\nspeed=3x\\nprogress=end\\n'"),
            |_| updates += 1,
        )
        .unwrap();
        assert_eq!(updates, 6);
        assert_eq!(state.frame, 2);
        assert_eq!(state.human_size(), "2.5 MB");
        assert_eq!(state.speed, "3x");
    }

    #[test]
    fn non_zero_exit_is_fatal() {
        let err = run_with_progress(&mut sh("echo frame=7; exit 3"), |_| {}).unwrap_err();
        assert_eq!(err.exit_code(), Some(3));
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let err = run_with_progress(&mut Command::new("/nonexistent/segrip-ffmpeg"), |_| {})
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Spawn { .. }));
    }
}
