//! Interactive check of a terminal session.
//!
//! Prints the initial size and every window change, rings the bell on `b`,
//! and exits on `q`. Logs go to stderr, filtered by `TERMIO_LOG`
//! (default `info`).

use std::process::ExitCode;

#[cfg(unix)]
fn main() -> ExitCode {
    use std::sync::Arc;
    use std::sync::mpsc::{self, RecvTimeoutError};
    use std::time::Duration;

    use termio_core::{LatestSize, SessionOptions};
    use termio_tty::TtySession;
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TERMIO_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let latest = Arc::new(LatestSize::new());
    let mut session = TtySession::new(SessionOptions::default(), latest.clone());
    if let Err(err) = session.init() {
        tracing::error!(error = %err, "cannot take over the terminal");
        return ExitCode::FAILURE;
    }

    let (tx, rx) = mpsc::channel();
    if let Err(err) = session.start_input(tx) {
        tracing::error!(error = %err, "cannot start input reader");
        session.fini();
        return ExitCode::FAILURE;
    }

    let say = |session: &TtySession, line: String| {
        if let Err(err) = session.write_all(format!("{line}\r\n").as_bytes()) {
            tracing::warn!(error = %err, "write failed");
        }
    };

    say(&session, "termio-probe: b = bell, q = quit".to_owned());
    loop {
        if let Some(dims) = latest.take() {
            say(&session, format!("size {dims}"));
        }
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(bytes) => {
                if bytes.contains(&b'b') {
                    session.beep();
                }
                if bytes.contains(&b'q') {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    session.fini();
    ExitCode::SUCCESS
}

#[cfg(not(unix))]
fn main() -> ExitCode {
    eprintln!("termio-probe requires a Unix terminal");
    ExitCode::FAILURE
}
