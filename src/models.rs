use time::OffsetDateTime;

/// One decoded notification from the primary data characteristic.
///
/// Particulate concentrations arrive on their own characteristic and are kept
/// next to the reading by the subscriber, see [`ParticulateTriple`].
#[derive(Debug, Clone, PartialEq)]
pub struct LiveReading {
    pub device_id: String,
    pub captured_at: OffsetDateTime,
    /// °C, or the 65535.0 "Off" sentinel
    pub temperature: f64,
    /// %RH, or -1 when the sensor is off
    pub humidity: i16,
    /// hPa
    pub pressure: f64,
    pub voc_index: u16,
    pub voc_ppb: u16,
    pub nox_index: u16,
    pub co2_ppm: u16,
    pub battery: u8,
}

/// Mass concentrations from the particulate characteristic [μg/m³]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParticulateTriple {
    pub pm1_0: f64,
    pub pm2_5: f64,
    pub pm10: f64,
}

/// Feature bitmask carried in the packet-type byte of every history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacketFeatures(pub u8);

impl PacketFeatures {
    pub const VOC: u8 = 1 << 0;
    pub const CO2: u8 = 1 << 1;
    pub const PM: u8 = 1 << 2;
    pub const PARTICLE_COUNT: u8 = 1 << 3;
    pub const GPS: u8 = 1 << 4;
    pub const GPS_EXT: u8 = 1 << 5;

    pub fn has(self, bit: u8) -> bool {
        self.0 & bit != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VocBlock {
    pub voc_index: u16,
    pub voc_ppb: u16,
    pub nox_index: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Co2Block {
    pub co2_ppm: u16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PmBlock {
    pub pm1_0: f64,
    pub pm2_5: f64,
    pub pm10: f64,
}

/// Position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsBlock {
    pub latitude: f64,
    pub longitude: f64,
}

/// Number concentrations per size bin and the typical particle size [μm]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleCountBlock {
    pub pc0_5: u16,
    pub pc1_0: u16,
    pub pc2_5: u16,
    pub pc10: u16,
    pub typical_particle_size: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsExtBlock {
    pub altitude: i16,
    pub satellites_fixed: u8,
    pub satellites_in_view: u8,
    pub accuracy: f64,
}

/// One record decoded from a retrieved history log.
///
/// Each optional block is present exactly when its bit was set in the record's
/// packet-type byte.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalMeasurement {
    pub history_type: u8,
    /// Unix seconds
    pub timestamp: u32,
    pub temperature: f64,
    pub humidity: i16,
    pub pressure: f64,
    pub battery: u8,
    pub status: u16,
    pub flags: Vec<&'static str>,
    pub voc: Option<VocBlock>,
    pub co2: Option<Co2Block>,
    pub pm: Option<PmBlock>,
    pub gps: Option<GpsBlock>,
    pub particle_count: Option<ParticleCountBlock>,
    pub gps_ext: Option<GpsExtBlock>,
}
