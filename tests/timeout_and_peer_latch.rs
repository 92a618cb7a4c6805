//! Timeout and peer-identity-latch behavior that doesn't depend on a
//! live peer answering requests.

use std::time::Duration;

use icap::api::ApplicationInstance;
use icap::callbacks::ApplicationCallbacks;
use icap::config::InstanceConfig;
use icap::error::IcapError;
use icap::transport::memory::MemoryTransport;
use icap::transport::Transport;

#[tokio::test(start_paused = true)]
async fn request_times_out_when_nobody_answers() {
    let (app_transport, _dev_transport) = MemoryTransport::pair(b"app".to_vec(), b"dev".to_vec());
    let config = InstanceConfig {
        msg_timeout: Duration::from_millis(50),
        ..InstanceConfig::default()
    };
    let app = ApplicationInstance::init(app_transport, ApplicationCallbacks::new(), config)
        .await
        .unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), app.get_dev_num()).await.unwrap();
    assert_eq!(result, Err(IcapError::Timeout));
}

#[tokio::test]
async fn deinit_wakes_pending_waiters_with_timeout() {
    let (app_transport, _dev_transport) = MemoryTransport::pair(b"app".to_vec(), b"dev".to_vec());
    let app = std::sync::Arc::new(
        ApplicationInstance::init(
            app_transport,
            ApplicationCallbacks::new(),
            InstanceConfig {
                msg_timeout: Duration::from_secs(30),
                ..InstanceConfig::default()
            },
        )
        .await
        .unwrap(),
    );

    let app_for_request = app.clone();
    let request = tokio::spawn(async move { app_for_request.get_dev_num().await });

    // Give the request a moment to register its waiter before deinit
    // drains the table.
    tokio::time::sleep(Duration::from_millis(20)).await;
    app.deinit().await.unwrap();

    assert_eq!(request.await.unwrap(), Err(IcapError::Timeout));
}

#[tokio::test]
async fn transport_latches_first_peer_and_rejects_a_different_one() {
    let (mut a, _b) = MemoryTransport::pair(b"a".to_vec(), b"b".to_vec());
    assert!(a.verify_peer(&b"first-peer".to_vec()).is_ok());
    assert!(a.verify_peer(&b"first-peer".to_vec()).is_ok());
    assert_eq!(a.verify_peer(&b"second-peer".to_vec()), Err(IcapError::RemoteAddr));
}

#[tokio::test]
async fn a_malformed_frame_does_not_latch_its_sender_as_peer() {
    let (app_transport, _dev_transport) = MemoryTransport::pair(b"app".to_vec(), b"dev".to_vec());
    let app = ApplicationInstance::init(app_transport, ApplicationCallbacks::new(), InstanceConfig::default())
        .await
        .unwrap();

    // protocol_version = 2 fails Header::decode with `Protocol` before
    // verify_peer ever runs, so "evil" must never get latched.
    let mut bad = vec![0u8; icap::wire::HEADER_LEN];
    bad[0..4].copy_from_slice(&2u32.to_le_bytes());
    let result = app.dispatch_now(b"evil".to_vec(), bad).await;
    assert_eq!(result, Err(IcapError::Protocol));

    // A well-formed frame from a different sender still gets to latch,
    // proving the rejected frame above never claimed the peer slot.
    let good = icap::wire::Frame::new(1, icap::wire::Cmd::GetDevNum as u32, icap::wire::MsgType::Ack, icap::wire::Payload::Empty)
        .unwrap()
        .to_bytes();
    assert_eq!(app.dispatch_now(b"legit".to_vec(), good).await, Ok(()));
}

#[tokio::test]
async fn deinit_twice_is_idempotent() {
    let (app_transport, _dev_transport) = MemoryTransport::pair(b"app".to_vec(), b"dev".to_vec());
    let app = ApplicationInstance::init(app_transport, ApplicationCallbacks::new(), InstanceConfig::default())
        .await
        .unwrap();
    app.deinit().await.unwrap();
    app.deinit().await.unwrap();
}
