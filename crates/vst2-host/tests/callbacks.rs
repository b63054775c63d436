mod common;

use std::sync::Arc;

use common::{install, stub_entry, StubConfig};
use parking_lot::Mutex;
use vst2_host::ffi;
use vst2_host::{CallbackRequest, DefaultHost, HostConfig, StandardHost, Vst2Plugin};

#[test]
fn default_host_answers_version_during_entry_and_after() {
    let log = install(StubConfig::default());
    let mut plugin =
        unsafe { Vst2Plugin::from_entry(stub_entry, DefaultHost) }.expect("instantiate");
    plugin.open();

    let log = log.lock();
    assert_eq!(
        log.host_answers,
        vec![
            (ffi::audioMasterVersion, 2400, false),
            (ffi::audioMasterVersion, 2400, true),
            (ffi::audioMasterGetSampleRate, 0, true),
        ]
    );
}

#[test]
fn custom_host_sees_every_callback() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let host = {
        let seen = seen.clone();
        move |request: &CallbackRequest| -> isize {
            seen.lock().push((request.opcode, request.effect.is_some()));
            7
        }
    };

    let log = install(StubConfig::default());
    let mut plugin = unsafe { Vst2Plugin::from_entry(stub_entry, host) }.expect("instantiate");
    plugin.open();

    assert_eq!(
        *seen.lock(),
        vec![
            (ffi::audioMasterVersion, false),
            (ffi::audioMasterVersion, true),
            (ffi::audioMasterGetSampleRate, true),
        ]
    );
    assert!(log.lock().host_answers.iter().all(|(_, answer, _)| *answer == 7));
}

#[test]
fn standard_host_reports_configured_sample_rate() {
    let log = install(StubConfig::default());
    let host = StandardHost::new(HostConfig::default().with_sample_rate(96_000.0));
    let mut plugin = unsafe { Vst2Plugin::from_entry(stub_entry, host) }.expect("instantiate");
    plugin.open();

    let log = log.lock();
    assert!(log
        .host_answers
        .contains(&(ffi::audioMasterGetSampleRate, 96_000, true)));
}

#[test]
fn instances_route_to_their_own_hosts() {
    let first_log = install(StubConfig::default());
    let mut first = unsafe {
        Vst2Plugin::from_entry(stub_entry, |_: &CallbackRequest| -> isize { 1 })
    }
    .expect("first");
    let second_log = install(StubConfig::default());
    let mut second = unsafe {
        Vst2Plugin::from_entry(stub_entry, |_: &CallbackRequest| -> isize { 2 })
    }
    .expect("second");

    second.open();
    first.open();

    assert!(first_log
        .lock()
        .host_answers
        .iter()
        .all(|(_, answer, _)| *answer == 1));
    assert!(second_log
        .lock()
        .host_answers
        .iter()
        .all(|(_, answer, _)| *answer == 2));
}

#[test]
fn panicking_host_does_not_unwind_into_the_plugin() {
    let log = install(StubConfig::default());
    let host = |request: &CallbackRequest| -> isize {
        if request.opcode == ffi::audioMasterGetSampleRate {
            panic!("host bug");
        }
        ffi::kVstVersion as isize
    };
    let mut plugin = unsafe { Vst2Plugin::from_entry(stub_entry, host) }.expect("instantiate");
    plugin.open();

    let log = log.lock();
    assert_eq!(
        log.host_answers.last(),
        Some(&(ffi::audioMasterGetSampleRate, 0, true))
    );
}
