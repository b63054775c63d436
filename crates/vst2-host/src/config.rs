#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Host-side settings reported to plug-ins and applied on activation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HostConfig {
    pub sample_rate: f32,
    pub block_size: usize,
    pub vendor: String,
    pub product: String,
    pub vendor_version: i32,
    /// Strings answered with 1 by `audioMasterCanDo`.
    pub can_do: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100.0,
            block_size: 512,
            vendor: String::from("vst2-host"),
            product: String::from("vst2-host"),
            vendor_version: 1,
            can_do: Vec::new(),
        }
    }
}

impl HostConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = product.into();
        self
    }

    pub fn with_vendor_version(mut self, version: i32) -> Self {
        self.vendor_version = version;
        self
    }

    /// Adds a host capability string, e.g. `"sendVstEvents"`.
    pub fn with_can_do(mut self, what: impl Into<String>) -> Self {
        self.can_do.push(what.into());
        self
    }

    pub fn supports(&self, what: &str) -> bool {
        self.can_do.iter().any(|entry| entry == what)
    }
}
