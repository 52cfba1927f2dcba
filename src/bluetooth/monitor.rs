/// Bluetooth Low Energy subscription to the live sensor characteristics
use futures_util::{pin_mut, StreamExt};
use log::{debug, error, info, warn};
use tokio::time::{sleep, Duration};

use crate::config::MonitorConfig;
use crate::decoder::{decode_live_packet, decode_particulate};
use crate::models::{LiveReading, ParticulateTriple};
use crate::sentinel::{format_value, FieldKind};
use crate::utils::format_datetime;

const MAX_RETRIES: usize = 100;
const WAIT_BETWEEN_RETRIES: u64 = 5;

/// Latest values seen on both characteristics of one device
#[derive(Debug, Clone, Default)]
pub struct LiveState {
    pub reading: Option<LiveReading>,
    pub particulate: Option<ParticulateTriple>,
}

impl LiveState {
    /// Apply a primary characteristic notification
    pub fn on_data(&mut self, device_name: &str, value: &[u8]) {
        match decode_live_packet(device_name, value) {
            Ok(reading) => self.reading = Some(reading),
            Err(e) => warn!("Invalid live packet from {}: {}", device_name, e),
        }
    }

    /// Apply a particulate characteristic notification
    pub fn on_particulate(&mut self, device_name: &str, value: &[u8]) {
        match decode_particulate(value) {
            Ok(pm) => self.particulate = Some(pm),
            Err(e) => warn!("Invalid particulate packet from {}: {}", device_name, e),
        }
    }

    /// One-line summary with sentinel values spelled out
    pub fn summary(&self) -> Option<String> {
        let r = self.reading.as_ref()?;
        let generic = |v: u16| format_value(Some(f64::from(v)), FieldKind::Generic);
        let pm = self
            .particulate
            .map(|pm| format!("{}/{}/{}", pm.pm1_0, pm.pm2_5, pm.pm10))
            .unwrap_or_else(|| "-".to_string());

        Some(format!(
            "{} @ {}: temp={} hum={} pressure={} voc={} ({} ppb) nox={} co2={} pm1/2.5/10={} battery={}%",
            r.device_id,
            format_datetime(&r.captured_at),
            format_value(Some(r.temperature), FieldKind::Temperature),
            format_value(Some(f64::from(r.humidity)), FieldKind::Humidity),
            format_value(Some(r.pressure), FieldKind::Pressure),
            generic(r.voc_index),
            generic(r.voc_ppb),
            generic(r.nox_index),
            generic(r.co2_ppm),
            pm,
            r.battery,
        ))
    }
}

async fn find_characteristic(
    device: &bluer::Device,
    uuid: bluer::Uuid,
) -> bluer::Result<Option<bluer::gatt::remote::Characteristic>> {
    for service in device.services().await? {
        for characteristic in service.characteristics().await? {
            if characteristic.uuid().await? == uuid {
                return Ok(Some(characteristic));
            }
        }
    }
    Ok(None)
}

/// Connect to one device and log its readings until the link drops
async fn subscribe(
    device: &bluer::Device,
    name: &str,
    data_uuid: bluer::Uuid,
    pm_uuid: bluer::Uuid,
) -> bluer::Result<()> {
    if !device.is_connected().await? {
        info!("Connecting to {} ({})", name, device.address());
        device.connect().await?;
    }

    let data_char = match find_characteristic(device, data_uuid).await? {
        Some(c) => c,
        None => {
            error!("{} has no data characteristic {}", name, data_uuid);
            return Ok(());
        }
    };
    let pm_char = find_characteristic(device, pm_uuid).await?;
    if pm_char.is_none() {
        warn!("{} has no particulate characteristic {}", name, pm_uuid);
    }

    let data_stream = data_char.notify().await?;
    pin_mut!(data_stream);
    let mut pm_stream = match &pm_char {
        Some(c) => Some(Box::pin(c.notify().await?)),
        None => None,
    };

    info!("Subscribed to live data from {}", name);
    let mut state = LiveState::default();

    loop {
        let pm_next = async {
            match pm_stream.as_mut() {
                Some(s) => s.next().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            value = data_stream.next() => match value {
                Some(value) => {
                    state.on_data(name, &value);
                    if let Some(summary) = state.summary() {
                        info!("{}", summary);
                    }
                }
                None => break,
            },
            Some(value) = pm_next => {
                state.on_particulate(name, &value);
                debug!("Particulate update from {}: {:?}", name, state.particulate);
            }
        }
    }

    warn!("Notification stream from {} ended", name);
    Ok(())
}

async fn monitor_device(
    adapter: bluer::Adapter,
    addr: bluer::Address,
    name: String,
    data_uuid: bluer::Uuid,
    pm_uuid: bluer::Uuid,
) {
    for attempt in 0..MAX_RETRIES {
        let device = match adapter.device(addr) {
            Ok(device) => device,
            Err(e) => {
                error!("Attempt {}: device {} unavailable: {}", attempt + 1, name, e);
                sleep(Duration::from_secs(WAIT_BETWEEN_RETRIES)).await;
                continue;
            }
        };

        if let Err(e) = subscribe(&device, &name, data_uuid, pm_uuid).await {
            error!("Attempt {}: subscription to {} failed: {}", attempt + 1, name, e);
        }

        if attempt < MAX_RETRIES - 1 {
            sleep(Duration::from_secs(WAIT_BETWEEN_RETRIES)).await;
        }
    }

    error!("Max retries exceeded for {}", name);
}

/// Discover the configured devices and follow their live characteristics
///
/// Runs until every device task has exhausted its reconnect attempts.
pub async fn run_monitor(config: &MonitorConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize Bluetooth session
    let session = bluer::Session::new().await?;
    let adapter = session.default_adapter().await?;

    // Ensure Bluetooth adapter is powered on
    if let Err(e) = adapter.set_powered(true).await {
        error!("Failed to power on adapter: {}", e);
        return Err(e.into());
    }

    // Configure discovery filter for Low Energy devices only
    let filter = bluer::DiscoveryFilter {
        transport: bluer::DiscoveryTransport::Le,
        duplicate_data: false,
        ..Default::default()
    };
    if let Err(e) = adapter.set_discovery_filter(filter).await {
        warn!("Failed to set discovery filter: {}", e);
    }

    // Let discovery run so the devices are known to BlueZ before connecting
    let discovery_stream = adapter.discover_devices().await?;
    let discovery_handle = tokio::spawn(async move {
        let mut stream = discovery_stream;
        while let Some(event) = stream.next().await {
            debug!("Discovery event: {:?}", event);
        }
    });
    sleep(Duration::from_secs(config.scan_secs)).await;
    discovery_handle.abort();

    let mut handles = Vec::new();
    for (mac, name) in &config.devices {
        let addr: bluer::Address = match mac.parse() {
            Ok(addr) => addr,
            Err(e) => {
                error!("Invalid address {} for {}: {}", mac, name, e);
                continue;
            }
        };
        handles.push(tokio::spawn(monitor_device(
            adapter.clone(),
            addr,
            name.clone(),
            config.data_char_uuid,
            config.pm_char_uuid,
        )));
    }

    if handles.is_empty() {
        return Err("No valid device addresses configured".into());
    }

    for handle in handles {
        if let Err(e) = handle.await {
            error!("Device task failed: {}", e);
        }
    }

    Ok(())
}
