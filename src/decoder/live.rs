/// Decoding of the live characteristic notifications
use log::debug;
use time::OffsetDateTime;

use crate::error::DecodeError;
use crate::models::{LiveReading, ParticulateTriple};

pub const LIVE_PACKET_LEN: usize = 16;
pub const PARTICULATE_PACKET_LEN: usize = 6;

/// Temperature reported by a sensor that is switched off
pub const TEMPERATURE_OFF: f64 = 65535.0;

const PM_INTEGER_FLAG: u16 = 0x8000;

/// Decode a raw particulate concentration [μg/m³]
///
/// With bit 15 set the low 15 bits are whole μg/m³, otherwise the field is in
/// tenths of μg/m³.
pub fn decode_pm_value(raw: u16) -> f64 {
    if raw & PM_INTEGER_FLAG != 0 {
        f64::from(raw & !PM_INTEGER_FLAG)
    } else {
        f64::from(raw) / 10.0
    }
}

/// Temperature in 1/100 °C, with 0xFFFF kept as the "Off" sentinel
pub(crate) fn decode_temperature(raw: i16) -> f64 {
    if raw == -1 {
        TEMPERATURE_OFF
    } else {
        f64::from(raw) / 100.0
    }
}

/// Humidity byte, 0xFF meaning the sensor is off
pub(crate) fn decode_humidity(raw: u8) -> i16 {
    if raw == 0xFF {
        -1
    } else {
        i16::from(raw)
    }
}

pub(crate) fn decode_pressure(raw: u32) -> f64 {
    f64::from(raw) / 10.0
}

fn u16_at(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Decode a primary characteristic notification
///
/// Layout, little-endian:
/// - Bytes 0-1: Temperature (1/100 °C, 0xFFFF = off)
/// - Byte 2: Humidity (%, 0xFF = off)
/// - Bytes 3-6: Pressure (1/10 hPa)
/// - Bytes 7-8: VOC index
/// - Bytes 9-10: VOC ppb
/// - Bytes 11-12: NOx index
/// - Bytes 13-14: CO2 ppm
/// - Byte 15: Battery level (%)
///
/// Buffers shorter than 16 bytes are rejected. Longer buffers are accepted and
/// everything past byte 15 is ignored, so the decoded reading never depends on
/// trailing bytes.
///
/// The capture time is taken from the local clock since the packet carries none.
pub fn decode_live_packet(device_id: &str, data: &[u8]) -> Result<LiveReading, DecodeError> {
    if data.len() < LIVE_PACKET_LEN {
        return Err(DecodeError::PacketTooShort {
            expected: LIVE_PACKET_LEN,
            actual: data.len(),
        });
    }
    if data.len() > LIVE_PACKET_LEN {
        debug!(
            "Ignoring {} trailing bytes in live packet from {}",
            data.len() - LIVE_PACKET_LEN,
            device_id
        );
    }

    Ok(LiveReading {
        device_id: device_id.to_string(),
        captured_at: OffsetDateTime::now_utc(),
        temperature: decode_temperature(u16_at(data, 0) as i16),
        humidity: decode_humidity(data[2]),
        pressure: decode_pressure(u32::from_le_bytes([data[3], data[4], data[5], data[6]])),
        voc_index: u16_at(data, 7),
        voc_ppb: u16_at(data, 9),
        nox_index: u16_at(data, 11),
        co2_ppm: u16_at(data, 13),
        battery: data[15],
    })
}

/// Decode a particulate characteristic notification: PM1, PM2.5 and PM10 as
/// three raw 16-bit values. Bytes past the sixth are ignored.
pub fn decode_particulate(data: &[u8]) -> Result<ParticulateTriple, DecodeError> {
    if data.len() < PARTICULATE_PACKET_LEN {
        return Err(DecodeError::PacketTooShort {
            expected: PARTICULATE_PACKET_LEN,
            actual: data.len(),
        });
    }

    Ok(ParticulateTriple {
        pm1_0: decode_pm_value(u16_at(data, 0)),
        pm2_5: decode_pm_value(u16_at(data, 2)),
        pm10: decode_pm_value(u16_at(data, 4)),
    })
}
