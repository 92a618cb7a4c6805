//! Many in-flight requests against one device, driven concurrently, to
//! exercise the pending table's sequence allocation and lookup under
//! contention.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use icap::api::{ApplicationInstance, DeviceInstance};
use icap::callbacks::{DeviceCallbacks, Outcome};
use icap::config::InstanceConfig;
use icap::transport::memory::MemoryTransport;
use icap::ApplicationCallbacks;

#[tokio::test]
async fn concurrent_requests_all_resolve_to_their_own_reply() {
    let (app_transport, dev_transport) = MemoryTransport::pair(b"app".to_vec(), b"dev".to_vec());

    let device_callbacks = DeviceCallbacks::new().on_get_dev_features(|device_id| {
        Outcome::ok(icap::wire::DeviceFeatures {
            playback: 1,
            record: 0,
            channels: device_id,
            pcm_formats: 0,
            rates: 0,
        })
    });

    let app = Arc::new(
        ApplicationInstance::init(app_transport, ApplicationCallbacks::new(), InstanceConfig { max_pending: 64, ..InstanceConfig::default() })
            .await
            .unwrap(),
    );
    let device = Arc::new(
        DeviceInstance::init(dev_transport, device_callbacks, InstanceConfig { max_pending: 64, ..InstanceConfig::default() })
            .await
            .unwrap(),
    );

    let app_for_pump = app.clone();
    tokio::spawn(async move { while app_for_pump.pump().await.is_ok() {} });
    let device_for_pump = device.clone();
    tokio::spawn(async move { while device_for_pump.pump().await.is_ok() {} });

    let completed = Arc::new(AtomicU32::new(0));
    let mut handles = Vec::new();
    for device_id in 0..32u32 {
        let app = app.clone();
        let completed = completed.clone();
        handles.push(tokio::spawn(async move {
            let features = app.get_dev_features(device_id).await.unwrap();
            assert_eq!(features.channels, device_id);
            completed.fetch_add(1, Ordering::SeqCst);
        }));
    }
    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(completed.load(Ordering::SeqCst), 32);
}
