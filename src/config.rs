use log::{debug, warn};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

const DEFAULT_SCAN_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Device MAC address -> display name
    pub devices: HashMap<String, String>,
    pub data_char_uuid: bluer::Uuid,
    pub pm_char_uuid: bluer::Uuid,
    pub scan_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub export_dir: PathBuf,
}

/// Parse `MAC=Name` pairs separated by commas, skipping malformed entries.
/// MAC addresses are upper-cased to match bluer's formatting.
pub fn parse_device_list(list: &str) -> HashMap<String, String> {
    let mut devices = HashMap::new();

    for pair in list.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        match pair.split_once('=') {
            Some((mac, name)) => {
                let mac = mac.trim();
                let name = name.trim();
                debug!("Found MAC: '{}', Name: '{}'", mac, name);
                if !mac.is_empty() && !name.is_empty() {
                    devices.insert(mac.to_uppercase(), name.to_string());
                }
            }
            None => warn!("Failed to split device pair: '{}'", pair),
        }
    }

    devices
}

fn load_devices() -> HashMap<String, String> {
    // Try ENVNODE_DEVICES format first
    if let Ok(list) = env::var("ENVNODE_DEVICES") {
        debug!("Found ENVNODE_DEVICES: '{}'", list);
        return parse_device_list(&list);
    }

    // Fallback to individual environment variables
    debug!("ENVNODE_DEVICES environment variable not found, trying individual variables");
    let mut devices = HashMap::new();
    for (key, value) in env::vars() {
        if let Some(index) = key
            .strip_prefix("ENVNODE_DEVICE_")
            .and_then(|s| s.strip_suffix("_MAC"))
        {
            let name_key = format!("ENVNODE_DEVICE_{}_NAME", index);
            if let Ok(name) = env::var(&name_key) {
                devices.insert(value.trim().to_uppercase(), name);
            }
        }
    }
    devices
}

fn uuid_var(key: &str) -> Result<bluer::Uuid, Box<dyn std::error::Error>> {
    let value = env::var(key).map_err(|_| format!("{} environment variable not set", key))?;
    bluer::Uuid::parse_str(value.trim())
        .map_err(|e| format!("{} is not a valid UUID: {}", key, e).into())
}

impl MonitorConfig {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        let devices = load_devices();
        debug!("Total devices loaded: {}", devices.len());
        for (mac, name) in &devices {
            debug!("Device: {} -> {}", mac, name);
        }

        if devices.is_empty() {
            return Err("No devices configured. Please set ENVNODE_DEVICES or ENVNODE_DEVICE_<N>_MAC/ENVNODE_DEVICE_<N>_NAME environment variables".into());
        }

        let scan_secs = match env::var("ENVNODE_SCAN_SECS") {
            Ok(v) => v
                .trim()
                .parse()
                .map_err(|_| format!("ENVNODE_SCAN_SECS is not a number: '{}'", v))?,
            Err(_) => DEFAULT_SCAN_SECS,
        };

        Ok(MonitorConfig {
            devices,
            data_char_uuid: uuid_var("ENVNODE_DATA_CHAR_UUID")?,
            pm_char_uuid: uuid_var("ENVNODE_PM_CHAR_UUID")?,
            scan_secs,
        })
    }
}

impl ExportConfig {
    /// Load the export settings, letting `output_dir` override `ENVNODE_EXPORT_DIR`
    pub fn new(output_dir: Option<PathBuf>) -> Self {
        dotenv::dotenv().ok();

        let export_dir = output_dir
            .or_else(|| env::var("ENVNODE_EXPORT_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));

        ExportConfig { export_dir }
    }
}
