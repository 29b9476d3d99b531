use std::io::Write;
use std::net::TcpListener;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;

#[test]
fn exits_on_connection_failure_while_stdin_stays_open() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "endpoint: ws://{addr}/__ws/{{session}}").unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_livepatch"))
        .arg("s1")
        .env("LIVEPATCH_CONFIG", config.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn livepatch");
    // Held open for the whole test, like an idle terminal.
    let _stdin = child.stdin.take();

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("livepatch kept running after its connection failed");
        }
        std::thread::sleep(Duration::from_millis(20));
    };
    assert!(!status.success());
}
