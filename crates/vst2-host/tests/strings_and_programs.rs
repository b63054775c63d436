mod common;

use common::{install, stub_entry, StubConfig};
use vst2_host::ffi;
use vst2_host::{DefaultHost, HostError, SnapshotOptions, Vst2Plugin};

fn instantiate(config: StubConfig) -> (Vst2Plugin, common::SharedLog) {
    let log = install(config);
    let plugin = unsafe { Vst2Plugin::from_entry(stub_entry, DefaultHost) }.expect("instantiate");
    (plugin, log)
}

#[test]
fn name_queries_decode_up_to_terminator() {
    let (plugin, _log) = instantiate(StubConfig::default());
    assert_eq!(plugin.name(), "Stub");
    assert_eq!(plugin.vendor(), "Stub Audio");
    assert_eq!(plugin.product(), "Stub Product");
    assert_eq!(plugin.vendor_version(), "1.2.3");
}

#[test]
fn unterminated_name_is_decoded_to_full_capacity() {
    let (plugin, _log) = instantiate(StubConfig {
        unterminated_name: true,
        ..StubConfig::default()
    });
    assert_eq!(plugin.name(), "A".repeat(ffi::kVstMaxEffectNameLen));
}

#[test]
fn long_names_are_truncated_by_the_plugin_buffer() {
    let (plugin, _log) = instantiate(StubConfig {
        vendor: "V".repeat(100),
        ..StubConfig::default()
    });
    assert_eq!(plugin.vendor().len(), ffi::kVstMaxVendorStrLen - 1);
}

#[test]
fn parameter_strings_use_the_parameter_index() {
    let (plugin, log) = instantiate(StubConfig::default());
    assert_eq!(plugin.parameter_name(1), "Param 1");
    assert_eq!(plugin.parameter_label(1), "dB");
    assert_eq!(plugin.parameter_display(1), "0.25");

    let log = log.lock();
    let indices: Vec<i32> = log.dispatches.iter().map(|d| d.index).collect();
    assert_eq!(indices, vec![1, 1, 1]);
}

#[test]
fn program_selection_round_trips() {
    let (mut plugin, _log) = instantiate(StubConfig::default());
    assert_eq!(plugin.program(), 0);
    assert_eq!(plugin.program_name(), "Init");
    plugin.set_program(2);
    assert_eq!(plugin.program(), 2);
    assert_eq!(plugin.program_name(), "Dark");
}

#[test]
fn program_number_travels_in_value() {
    let (mut plugin, log) = instantiate(StubConfig::default());
    plugin.set_program(2);

    let log = log.lock();
    let set = log
        .dispatches
        .iter()
        .find(|d| d.opcode == ffi::effSetProgram)
        .expect("set program dispatched");
    assert_eq!(set.value, 2);
    assert_eq!(set.index, 0);
}

#[test]
fn indexed_program_names() {
    let (plugin, _log) = instantiate(StubConfig::default());
    assert_eq!(plugin.program_name_indexed(1).expect("valid index"), "Bright");

    let err = plugin.program_name_indexed(3).unwrap_err();
    assert!(matches!(err, HostError::InvalidProgramIndex(3)));
}

#[test]
fn can_do_requires_an_answer_of_exactly_one() {
    let (plugin, _log) = instantiate(StubConfig {
        can_do: vec![
            ("receiveVstEvents", 1),
            ("receiveVstMidiEvent", 2),
            ("receiveVstTimeInfo", 1),
            ("bypass", -1),
        ],
        ..StubConfig::default()
    });
    assert!(plugin.can_do("receiveVstEvents"));
    assert!(!plugin.can_do("receiveVstMidiEvent"));
    assert!(!plugin.can_do("bypass"));
    assert!(!plugin.can_do("unknown"));
    assert!(!plugin.can_do("bad\0string"));
    assert!(!plugin.can_receive_events());
    assert!(plugin.can_receive_time_info());
}

#[test]
fn can_receive_events_needs_both_answers() {
    let (plugin, _log) = instantiate(StubConfig {
        can_do: vec![("receiveVstEvents", 1), ("receiveVstMidiEvent", 1)],
        ..StubConfig::default()
    });
    assert!(plugin.can_receive_events());
}

#[test]
fn properties_snapshot_collects_everything() {
    let (mut plugin, _log) = instantiate(StubConfig::default());
    let props = plugin.properties(SnapshotOptions::default());

    assert_eq!(props.name, "Stub");
    assert_eq!(props.num_params, 2);
    let programs: Vec<&str> = props.programs.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(programs, vec!["Init", "Bright", "Dark"]);
    assert_eq!(props.parameters.len(), 2);
    assert_eq!(props.parameters[0].name, "Param 0");
    assert_eq!(props.parameters[0].value, 0.5);
    assert_eq!(props.parameters[1].display, "0.25");
}

#[test]
fn properties_snapshot_can_skip_sections() {
    let (mut plugin, log) = instantiate(StubConfig::default());
    let props = plugin.properties(SnapshotOptions {
        programs: false,
        parameters: false,
    });
    assert!(props.programs.is_empty());
    assert!(props.parameters.is_empty());
    assert_eq!(log.lock().count(ffi::effGetProgramNameIndexed), 0);
}
