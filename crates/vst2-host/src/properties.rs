//! Read-only snapshot of everything a plug-in reports about itself.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::plugin::Vst2Plugin;

/// Which optional sections a snapshot walks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotOptions {
    pub programs: bool,
    pub parameters: bool,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            programs: true,
            parameters: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProgramInfo {
    pub index: i32,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParameterInfo {
    pub index: i32,
    pub name: String,
    pub display: String,
    pub label: String,
    /// Normalized value in `0.0..=1.0`.
    pub value: f32,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PluginProperties {
    pub name: String,
    pub vendor: String,
    pub product: String,
    pub vendor_version: String,
    pub unique_id: i32,
    pub version: i32,
    pub num_inputs: i32,
    pub num_outputs: i32,
    pub num_params: i32,
    pub num_programs: i32,
    pub latency: i32,
    pub is_synth: bool,
    pub receive_events: bool,
    pub receive_time_info: bool,
    pub no_tail: bool,
    pub has_editor: bool,
    pub program_chunks: bool,
    pub double_precision: bool,
    pub programs: Vec<ProgramInfo>,
    pub parameters: Vec<ParameterInfo>,
}

impl PluginProperties {
    /// Collects the snapshot.
    ///
    /// Program names come from `effGetProgramNameIndexed`. Plug-ins that do
    /// not implement it are walked by switching programs instead, and the
    /// program that was current is restored afterwards.
    pub fn collect(plugin: &mut Vst2Plugin, options: SnapshotOptions) -> Self {
        let programs = if options.programs {
            collect_programs(plugin)
        } else {
            Vec::new()
        };
        let parameters = if options.parameters {
            (0..plugin.num_params())
                .map(|index| ParameterInfo {
                    index,
                    name: plugin.parameter_name(index),
                    display: plugin.parameter_display(index),
                    label: plugin.parameter_label(index),
                    value: plugin.get_parameter(index).unwrap_or_default(),
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            name: plugin.name(),
            vendor: plugin.vendor(),
            product: plugin.product(),
            vendor_version: plugin.vendor_version(),
            unique_id: plugin.unique_id(),
            version: plugin.version(),
            num_inputs: plugin.num_inputs(),
            num_outputs: plugin.num_outputs(),
            num_params: plugin.num_params(),
            num_programs: plugin.num_programs(),
            latency: plugin.latency(),
            is_synth: plugin.is_synth(),
            receive_events: plugin.can_receive_events(),
            receive_time_info: plugin.can_receive_time_info(),
            no_tail: plugin.no_tail(),
            has_editor: plugin.has_editor(),
            program_chunks: plugin.program_chunks(),
            double_precision: plugin.can_process_double(),
            programs,
            parameters,
        }
    }
}

fn collect_programs(plugin: &mut Vst2Plugin) -> Vec<ProgramInfo> {
    let count = plugin.num_programs();
    let indexed: Option<Vec<ProgramInfo>> = (0..count)
        .map(|index| {
            plugin
                .program_name_indexed(index)
                .ok()
                .map(|name| ProgramInfo { index, name })
        })
        .collect();
    if let Some(programs) = indexed {
        return programs;
    }

    let current = i32::try_from(plugin.program()).unwrap_or(0);
    let programs = (0..count)
        .map(|index| {
            plugin.set_program(index);
            ProgramInfo {
                index,
                name: plugin.program_name(),
            }
        })
        .collect();
    plugin.set_program(current);
    programs
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

impl fmt::Display for PluginProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Plugin name: {}", self.name)?;
        writeln!(f, "Vendor name: {}", self.vendor)?;
        writeln!(f, "Product name: {}", self.product)?;
        writeln!(f, "Vendor version: {}", self.vendor_version)?;
        writeln!(f, "uniqueID: {:#010x}", self.unique_id)?;
        writeln!(f)?;
        writeln!(f, "numInputs: {}", self.num_inputs)?;
        writeln!(f, "numOutputs: {}", self.num_outputs)?;
        writeln!(f, "numParams: {}", self.num_params)?;
        writeln!(f, "numPrograms: {}", self.num_programs)?;
        writeln!(f, "latency: {}", self.latency)?;
        writeln!(f)?;
        writeln!(f, "isSynth: {}", flag(self.is_synth))?;
        writeln!(f, "receiveEvents: {}", flag(self.receive_events))?;
        writeln!(f, "receiveTimeInfo: {}", flag(self.receive_time_info))?;
        writeln!(f, "noTail: {}", flag(self.no_tail))?;
        writeln!(f, "hasEditor: {}", flag(self.has_editor))?;
        writeln!(f, "programChunks: {}", flag(self.program_chunks))?;
        writeln!(f, "doublePrecision: {}", flag(self.double_precision))?;

        for program in &self.programs {
            writeln!(f, "Program {:03}: {}", program.index, program.name)?;
        }
        for param in &self.parameters {
            writeln!(
                f,
                "Param {:03}: {} [{} {}] (normalized = {:.6})",
                param.index, param.name, param.display, param.label, param.value
            )?;
        }
        Ok(())
    }
}
