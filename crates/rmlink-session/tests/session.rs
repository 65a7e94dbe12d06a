use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use rmlink_frame::{channel, encode_frame, Command, Frame};
use rmlink_session::{
    FakeReply, FakeRobot, Session, SessionConfig, SessionError, SessionState,
};

fn config() -> SessionConfig {
    SessionConfig::default().with_timeout(Duration::from_secs(2))
}

async fn open(fake: &FakeRobot) -> Session {
    Session::connect(fake.endpoint(), config())
        .await
        .expect("session should open against fake robot")
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn handshake_issue_and_close() {
    let fake = FakeRobot::spawn().await.unwrap();
    let session = open(&fake).await;
    assert_eq!(session.state(), SessionState::Open);

    let reply = session.issue(&Command::new("version ?")).await.unwrap();
    assert_eq!(reply.get_str(0).unwrap(), "00.00.00.60");

    session.close().await;
    assert_eq!(session.state(), SessionState::Closed);
    session.close().await;

    assert_eq!(fake.received(), vec!["command", "version ?", "quit"]);
}

#[tokio::test]
async fn refused_handshake_is_connection_error() {
    let fake = FakeRobot::with_responder(|cmd| match cmd {
        "command" => FakeReply::Fault("sdk busy".to_string()),
        _ => FakeReply::Ok,
    })
    .await
    .unwrap();

    let err = Session::connect(fake.endpoint(), config()).await.unwrap_err();
    assert!(matches!(err, SessionError::Connection(ref msg) if msg.contains("sdk busy")));
    assert!(!fake.received().contains(&"quit".to_string()));
}

#[tokio::test]
async fn silent_handshake_times_out() {
    let fake = FakeRobot::with_responder(|_| FakeReply::Silent).await.unwrap();
    let config = SessionConfig {
        handshake_timeout: Duration::from_millis(100),
        ..config()
    };
    let err = Session::connect(fake.endpoint(), config).await.unwrap_err();
    assert!(matches!(err, SessionError::Connection(_)));
}

#[tokio::test]
async fn unexpected_handshake_reply_is_rejected() {
    let fake = FakeRobot::with_responder(|_| FakeReply::Text("error".to_string()))
        .await
        .unwrap();
    let err = Session::connect(fake.endpoint(), config()).await.unwrap_err();
    assert!(matches!(err, SessionError::Connection(ref msg) if msg.contains("error")));
}

#[tokio::test]
async fn close_fails_pending_command_promptly() {
    let fake = FakeRobot::with_responder(|cmd| {
        if cmd.starts_with("chassis move") {
            FakeReply::Silent
        } else {
            FakeReply::Ok
        }
    })
    .await
    .unwrap();
    let session = Arc::new(open(&fake).await);

    let waiting = {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            let cmd = Command::new("chassis move").param("x", 1.0);
            session.issue_with_timeout(&cmd, Duration::from_secs(30)).await
        })
    };
    wait_until(|| session.pending_commands() == 1).await;

    session.close().await;
    let result = tokio::time::timeout(Duration::from_secs(1), waiting)
        .await
        .expect("pending command must resolve after close")
        .unwrap();
    assert!(matches!(result, Err(SessionError::SessionClosed)));

    let err = session.issue(&Command::new("version ?")).await.unwrap_err();
    assert!(matches!(err, SessionError::SessionClosed));
}

#[tokio::test]
async fn replies_match_commands_out_of_order() {
    let fake = FakeRobot::with_responder(|cmd| match cmd {
        "chassis position ?" => FakeReply::Delayed(Duration::from_millis(150), "1 2 3".into()),
        "chassis attitude ?" => FakeReply::Text("4 5 6".to_string()),
        _ => FakeReply::Ok,
    })
    .await
    .unwrap();
    let session = open(&fake).await;

    let position = Command::new("chassis position ?");
    let attitude = Command::new("chassis attitude ?");
    let (slow, fast) = tokio::join!(session.issue(&position), session.issue(&attitude));

    assert_eq!(slow.unwrap().text(), "1 2 3");
    assert_eq!(fast.unwrap().text(), "4 5 6");
}

#[tokio::test]
async fn unanswered_command_times_out_and_session_survives() {
    let fake = FakeRobot::with_responder(|cmd| match cmd {
        "robot mode ?" => FakeReply::Silent,
        _ => FakeReply::Ok,
    })
    .await
    .unwrap();
    let session = open(&fake).await;

    let started = tokio::time::Instant::now();
    let err = session
        .issue_with_timeout(&Command::new("robot mode ?"), Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(matches!(err, SessionError::Timeout { .. }));
    assert_eq!(session.pending_commands(), 0);

    assert!(session.issue(&Command::new("robot mode free")).await.unwrap().is_ok());
}

#[tokio::test]
async fn device_fault_is_local_to_its_command() {
    let fake = FakeRobot::with_responder(|cmd| match cmd {
        "robotic_gripper open 1" => FakeReply::Fault("no gripper".to_string()),
        _ => FakeReply::Ok,
    })
    .await
    .unwrap();
    let session = open(&fake).await;

    let err = session
        .issue(&Command::new("robotic_gripper open 1"))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Device { ref message, .. } if message == "no gripper"));
    assert_eq!(session.state(), SessionState::Open);
}

#[tokio::test]
async fn corrupt_frame_counts_one_anomaly_and_stream_continues() {
    let fake = FakeRobot::spawn().await.unwrap();
    let session = open(&fake).await;
    let attitude = session.telemetry().attitude();

    let mut corrupt = BytesMut::new();
    encode_frame(&Frame::push(channel::CHASSIS_ATTITUDE, "9 9 9"), &mut corrupt).unwrap();
    let last = corrupt.len() - 1;
    corrupt[last] ^= 0x55;
    fake.send_raw(corrupt.freeze());
    fake.push(channel::CHASSIS_ATTITUDE, "1 2 3");

    let reading = attitude.next_value().await.unwrap().unwrap();
    assert_eq!((reading.pitch, reading.roll, reading.yaw), (1.0, 2.0, 3.0));
    assert_eq!(session.protocol_anomalies(), 1);
    assert!(attitude.is_empty());
}

#[tokio::test]
async fn stray_reply_and_unknown_channel_are_anomalies() {
    let fake = FakeRobot::spawn().await.unwrap();
    let session = open(&fake).await;
    let arm = session.telemetry().arm();

    fake.send_frame(Frame::reply(0x7777, "ok"));
    fake.push(0x0999, "1");
    fake.push(channel::ARM_POSITION, "not numbers");
    fake.push(channel::ARM_POSITION, "5 6");

    let reading = arm.next_value().await.unwrap().unwrap();
    assert_eq!((reading.x, reading.y), (5.0, 6.0));
    assert_eq!(session.protocol_anomalies(), 3);
    assert_eq!(session.state(), SessionState::Open);
}

#[tokio::test]
async fn pushes_arrive_in_order_per_channel() {
    let fake = FakeRobot::spawn().await.unwrap();
    let session = open(&fake).await;
    let ir = session.telemetry().ir_distance(1).unwrap();
    let ir_channel = channel::ir_distance(1).unwrap();

    for mm in 0..20 {
        fake.push(ir_channel, mm.to_string());
    }
    for expected in 0..20 {
        assert_eq!(ir.next_value().await.unwrap(), Some(f64::from(expected)));
    }
}

#[tokio::test]
async fn robot_disconnect_closes_session() {
    let fake = FakeRobot::spawn().await.unwrap();
    let session = open(&fake).await;
    let line = session.telemetry().line();
    let mut state = session.subscribe_state();

    fake.push(channel::LINE, "1 0.1 0.2 0.3 0.4");
    fake.disconnect();

    tokio::time::timeout(
        Duration::from_secs(2),
        state.wait_for(|s| *s == SessionState::Closed),
    )
    .await
    .expect("session should observe EOF")
    .unwrap();

    assert!(line.next_value().await.unwrap().is_some());
    assert_eq!(line.next_value().await.unwrap(), None);
    let err = session.issue(&Command::new("version ?")).await.unwrap_err();
    assert!(matches!(err, SessionError::SessionClosed));
}

#[tokio::test]
async fn dropping_session_ends_feeds() {
    let fake = FakeRobot::spawn().await.unwrap();
    let session = open(&fake).await;
    let status = session.telemetry().status();
    drop(session);

    let end = tokio::time::timeout(Duration::from_secs(1), status.next_value())
        .await
        .expect("feed must end when the session is dropped");
    assert_eq!(end.unwrap(), None);
}

#[tokio::test]
async fn connect_refused_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let endpoint = rmlink_transport::Endpoint::networked("127.0.0.1").with_port(port);
    let err = Session::connect(endpoint, config()).await.unwrap_err();
    assert!(matches!(err, SessionError::Transport(_)));
}
