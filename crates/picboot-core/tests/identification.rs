//! End-to-end identification against a scripted device (S3: construction
//! plus a short wait leaves every profile field populated).

use std::time::Duration;

use picboot_core::{BootloaderInterface, SettleConfig};
use picboot_harness::{ScriptedDevice, loopback_pair};

fn seed_identification_responses(device: &mut ScriptedDevice<picboot_harness::LoopbackTransport>) {
    device.on(0x00, vec![0x00, b'P', b'I', b'C', b'2', b'4']);
    device.on(0x01, vec![0x01, b'1', b'.', b'2']);
    device.on(0x02, vec![0x02, 0x40, 0x00]);
    device.on(0x03, vec![0x03, 0x00, 0x02]);
    device.on(0x04, vec![0x04, 0x2A, 0x00]);
    device.on(0x05, vec![0x05, 0x80, 0x00]);
    device.on(0x07, vec![0x07, 0x00, 0x04]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn identification_completes_and_populates_every_field() {
    let (host, device_transport) = loopback_pair();
    let mut device = ScriptedDevice::new(device_transport);
    seed_identification_responses(&mut device);

    let bli = BootloaderInterface::spawn(host, SettleConfig::default());

    for _ in 0..200 {
        device.service();
        tokio::time::advance(Duration::from_millis(10)).await;
        tokio::task::yield_now().await;
        if bli.device_identified() {
            break;
        }
    }

    assert!(bli.device_identified());
    let profile = bli.profile().expect("profile should be populated once identified");
    assert_eq!(profile.platform, "PIC24");
    assert_eq!(profile.version, "1.2");
    assert_eq!(profile.row_length, 0x40);
    assert_eq!(profile.page_length, 0x200);
    assert_eq!(profile.prog_length, 0x2A);
    assert_eq!(profile.max_prog_size, 0x80);
    assert_eq!(profile.app_start_addr, 0x400);

    bli.shutdown(false).await.unwrap();
}
