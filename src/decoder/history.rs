/// Parsing of history logs retrieved from the device
///
/// A log is a plain concatenation of records with no stream header. Each record is:
/// - Byte 0: History type
/// - Byte 1: Packet type, a feature bitmask (see [`PacketFeatures`])
/// - Core fields, always present: timestamp (u32), temperature (i16, 1/100 °C),
///   humidity (u8), pressure (u32, 1/10 hPa), battery (u8), status (u16)
/// - Optional blocks in bit order VOC, CO2, PM, GPS, particle count, extended GPS
/// - One trailing integrity byte
use log::{debug, warn};

use super::live::{decode_humidity, decode_pm_value, decode_pressure, decode_temperature};
use super::reader::ByteReader;
use crate::models::{
    Co2Block, GpsBlock, GpsExtBlock, HistoricalMeasurement, PacketFeatures, ParticleCountBlock,
    PmBlock, VocBlock,
};

/// Status bit positions and their labels, in ascending bit order. Bit 11 is unused.
pub const STATUS_FLAGS: [(u8, &str); 15] = [
    (0, "Temperature error"),
    (1, "Humidity error"),
    (2, "VOC error"),
    (3, "NOx error"),
    (4, "CO2 error"),
    (5, "Pressure error"),
    (6, "PM error"),
    (7, "GPS error"),
    (8, "Flash error"),
    (9, "Buzzer error"),
    (10, "LED error"),
    (12, "Motion detected"),
    (13, "PM enabled"),
    (14, "Charging"),
    (15, "Fully charged"),
];

const GPS_SCALE: f64 = 1_000_000.0;
const PARTICLE_SIZE_SCALE: f64 = 1000.0;
const GPS_ACCURACY_SCALE: f64 = 100.0;
// Reserved and SNR bytes ahead of the altitude in the extended GPS block
const GPS_EXT_RESERVED: usize = 4;

/// Labels for every tabulated bit set in `status`
pub fn decode_status_flags(status: u16) -> Vec<&'static str> {
    STATUS_FLAGS
        .iter()
        .filter(|(bit, _)| status & (1u16 << bit) != 0)
        .map(|(_, label)| *label)
        .collect()
}

/// Parse every complete record in a history log
///
/// Parsing stops at the first record whose header or fields run past the end
/// of the buffer; that partial record is dropped and everything before it is
/// returned.
pub fn parse_history(data: &[u8]) -> Vec<HistoricalMeasurement> {
    let mut reader = ByteReader::new(data);
    let mut measurements = Vec::new();

    loop {
        let start = reader.position();
        let (history_type, packet_type) = match (reader.read_u8(), reader.read_u8()) {
            (Some(history_type), Some(packet_type)) => (history_type, packet_type),
            _ => break,
        };

        match read_record(&mut reader, history_type, PacketFeatures(packet_type)) {
            Some(measurement) => measurements.push(measurement),
            None => {
                warn!(
                    "Dropping truncated history record at offset {} ({} bytes left)",
                    start,
                    data.len() - start
                );
                break;
            }
        }
    }

    debug!(
        "Parsed {} history records from {} bytes",
        measurements.len(),
        data.len()
    );
    measurements
}

fn read_record(
    reader: &mut ByteReader<'_>,
    history_type: u8,
    features: PacketFeatures,
) -> Option<HistoricalMeasurement> {
    let timestamp = reader.read_u32()?;
    let temperature = decode_temperature(reader.read_i16()?);
    let humidity = decode_humidity(reader.read_u8()?);
    let pressure = decode_pressure(reader.read_u32()?);
    let battery = reader.read_u8()?;
    let status = reader.read_u16()?;

    let voc = if features.has(PacketFeatures::VOC) {
        Some(VocBlock {
            voc_index: reader.read_u16()?,
            voc_ppb: reader.read_u16()?,
            nox_index: reader.read_u16()?,
        })
    } else {
        None
    };

    let co2 = if features.has(PacketFeatures::CO2) {
        Some(Co2Block {
            co2_ppm: reader.read_u16()?,
        })
    } else {
        None
    };

    let pm = if features.has(PacketFeatures::PM) {
        Some(PmBlock {
            pm1_0: decode_pm_value(reader.read_u16()?),
            pm2_5: decode_pm_value(reader.read_u16()?),
            pm10: decode_pm_value(reader.read_u16()?),
        })
    } else {
        None
    };

    let gps = if features.has(PacketFeatures::GPS) {
        Some(GpsBlock {
            latitude: f64::from(reader.read_i32()?) / GPS_SCALE,
            longitude: f64::from(reader.read_i32()?) / GPS_SCALE,
        })
    } else {
        None
    };

    let particle_count = if features.has(PacketFeatures::PARTICLE_COUNT) {
        Some(ParticleCountBlock {
            pc0_5: reader.read_u16()?,
            pc1_0: reader.read_u16()?,
            pc2_5: reader.read_u16()?,
            pc10: reader.read_u16()?,
            typical_particle_size: f64::from(reader.read_u16()?) / PARTICLE_SIZE_SCALE,
        })
    } else {
        None
    };

    let gps_ext = if features.has(PacketFeatures::GPS_EXT) {
        reader.skip(GPS_EXT_RESERVED)?;
        Some(GpsExtBlock {
            altitude: reader.read_i16()?,
            satellites_fixed: reader.read_u8()?,
            satellites_in_view: reader.read_u8()?,
            accuracy: f64::from(reader.read_i16()?) / GPS_ACCURACY_SCALE,
        })
    } else {
        None
    };

    reader.skip_checksum()?;

    Some(HistoricalMeasurement {
        history_type,
        timestamp,
        temperature,
        humidity,
        pressure,
        battery,
        status,
        flags: decode_status_flags(status),
        voc,
        co2,
        pm,
        gps,
        particle_count,
        gps_ext,
    })
}
