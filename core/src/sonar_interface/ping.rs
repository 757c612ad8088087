use serde::{Deserialize, Serialize};

/// One decoded transmit/receive cycle handed over by the transport decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ping {
    pub timestamp: String,
    /// Water temperature in degrees Celsius.
    pub temperature: f32,
    /// Instrument-reported depth in meters.
    pub depth: f32,
    /// Raw amplitudes, index 0 is the shallowest bin.
    pub scan_data: Vec<u8>,
}

impl Ping {
    pub fn new(
        timestamp: impl Into<String>,
        temperature: f32,
        depth: f32,
        scan_data: Vec<u8>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            temperature,
            depth,
            scan_data,
        }
    }

    pub fn bins(&self) -> usize {
        self.scan_data.len()
    }
}
