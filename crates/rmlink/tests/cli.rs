#![cfg(feature = "cli")]

use std::process::{Command, Output};
use std::sync::Arc;
use std::time::Duration;

use rmlink::frame::channel;
use rmlink::session::{FakeReply, FakeRobot};

fn rmlink(args: Vec<String>) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rmlink"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .env_remove("RMLINK_HOST")
        .env_remove("RMLINK_PORT")
        .output()
        .expect("rmlink should run")
}

fn args(fake: &FakeRobot, rest: &[&str]) -> Vec<String> {
    let (command, tail) = rest.split_first().expect("subcommand required");
    let mut out = vec![
        "--format".to_string(),
        "json".to_string(),
        command.to_string(),
        "--host".to_string(),
        "127.0.0.1".to_string(),
        "--port".to_string(),
        fake.addr().port().to_string(),
        "--timeout".to_string(),
        "2s".to_string(),
    ];
    out.extend(tail.iter().map(|s| s.to_string()));
    out
}

async fn run(args: Vec<String>) -> Output {
    tokio::task::spawn_blocking(move || rmlink(args))
        .await
        .expect("cli task should not panic")
}

#[tokio::test(flavor = "multi_thread")]
async fn send_prints_reply_as_json() {
    let fake = FakeRobot::spawn().await.unwrap();
    let output = run(args(&fake, &["send", "version", "?"])).await;

    assert!(output.status.success(), "{output:?}");
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("send should emit json");
    assert_eq!(payload["reply"], "00.00.00.60");
    assert_eq!(payload["command"], "version ?");
    assert!(payload["schema_id"]
        .as_str()
        .is_some_and(|id| id.ends_with("command-reply.schema.json")));
    assert_eq!(fake.received(), vec!["command", "version ?", "quit"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn device_fault_exits_70() {
    let fake = FakeRobot::with_responder(|cmd| match cmd {
        "robotic_gripper open 1" => FakeReply::Fault("no gripper".to_string()),
        _ => FakeReply::Ok,
    })
    .await
    .unwrap();
    let output = run(args(&fake, &["send", "robotic_gripper", "open", "1"])).await;

    assert_eq!(output.status.code(), Some(70));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no gripper"));
}

#[tokio::test(flavor = "multi_thread")]
async fn info_reports_robot_state() {
    let fake = FakeRobot::spawn().await.unwrap();
    let output = run(args(&fake, &["info"])).await;

    assert!(output.status.success(), "{output:?}");
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("info should emit json");
    assert_eq!(payload["version"], "00.00.00.60");
    assert_eq!(payload["mode"], "free");
    assert_eq!(payload["connected"], true);
    assert_eq!(payload["status"]["is_static"], true);
}

#[tokio::test(flavor = "multi_thread")]
async fn watch_prints_pushed_readings() {
    let fake = Arc::new(FakeRobot::spawn().await.unwrap());
    let pusher = {
        let fake = Arc::clone(&fake);
        tokio::spawn(async move {
            while !fake
                .received()
                .iter()
                .any(|cmd| cmd == "chassis push position on pfreq 10")
            {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            fake.push(channel::CHASSIS_POSITION, "0.1 0 0");
            fake.push(channel::CHASSIS_POSITION, "0.2 0 0");
        })
    };

    let output = run(args(&fake, &["watch", "position", "--count", "2"])).await;
    pusher.await.unwrap();

    assert!(output.status.success(), "{output:?}");
    let lines: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("one json reading per line"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["channel"], "position");
    assert_eq!(lines[1]["seq"], 2);
    assert_eq!(lines[1]["value"]["forwards"], 0.2);
    assert!(fake
        .received()
        .contains(&"chassis push position off".to_string()));
}

#[test]
fn refused_connection_exits_3() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .unwrap();

    let output = rmlink(vec![
        "send".to_string(),
        "--host".to_string(),
        "127.0.0.1".to_string(),
        "--port".to_string(),
        port.to_string(),
        "version".to_string(),
        "?".to_string(),
    ]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn invalid_timeout_is_usage_error() {
    let output = rmlink(vec![
        "info".to_string(),
        "--timeout".to_string(),
        "0s".to_string(),
    ]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_prints_package_version() {
    let output = rmlink(vec!["version".to_string()]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("rmlink {}", env!("CARGO_PKG_VERSION"))
    );
}
