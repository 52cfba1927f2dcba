use envnode_etl::export::{export_history, history_to_csv, HEADER};
use envnode_etl::parse_history;

fn record(packet_type: u8, timestamp: u32, status: u16, blocks: &[u8]) -> Vec<u8> {
    let mut r = vec![0x02, packet_type];
    r.extend_from_slice(&timestamp.to_le_bytes());
    r.extend_from_slice(&(-550i16).to_le_bytes()); // -5.5 °C
    r.push(72);
    r.extend_from_slice(&9987u32.to_le_bytes()); // 998.7 hPa
    r.push(64);
    r.extend_from_slice(&status.to_le_bytes());
    r.extend_from_slice(blocks);
    r.push(0xC3);
    r
}

fn sample_log() -> Vec<u8> {
    let mut voc_pm = Vec::new();
    for v in [110u16, 240, 1, 0x8019, 0x0064, 0x00C8] {
        voc_pm.extend_from_slice(&v.to_le_bytes());
    }

    let mut gps = Vec::new();
    gps.extend_from_slice(&52_520_008i32.to_le_bytes());
    gps.extend_from_slice(&13_404_954i32.to_le_bytes());

    let mut all = Vec::new();
    for v in [5u16, 6, 7, 900, 0x8005, 0x000A, 0x0014] {
        all.extend_from_slice(&v.to_le_bytes()); // VOC, CO2, PM
    }
    all.extend_from_slice(&60_169_857i32.to_le_bytes());
    all.extend_from_slice(&(-24_938_379i32).to_le_bytes());
    for v in [500u16, 400, 300, 200, 650] {
        all.extend_from_slice(&v.to_le_bytes()); // particle counts, typical size
    }
    all.extend_from_slice(&[0x01, 0x02, 0x03, 0x04]); // reserved
    all.extend_from_slice(&(-12i16).to_le_bytes());
    all.extend_from_slice(&[7, 11]);
    all.extend_from_slice(&250i16.to_le_bytes());

    let mut log = record(0x00, 1_700_000_000, 0, &[]);
    log.extend(record(0x05, 1_700_000_300, 1 << 13, &voc_pm));
    log.extend(record(0x12, 1_700_000_600, 1 << 12, &[&[0xFF, 0xFF][..], gps.as_slice()].concat()));
    log.extend(record(0x3F, 1_700_000_900, 0xC001, &all));
    log
}

const EXPECTED_ROWS: [&str; 4] = [
    "1700000000,2023-11-14 22:13:20,-5.5,72,998.7,64,0,,,,,,,,,,,,,,,,,,,",
    "1700000300,2023-11-14 22:18:20,-5.5,72,998.7,64,8192,110,240,1,,25,10,20,,,,,,,,,,,,PM enabled",
    "1700000600,2023-11-14 22:23:20,-5.5,72,998.7,64,4096,,,,Off,,,,52.520008,13.404954,,,,,,,,,,Motion detected",
    "1700000900,2023-11-14 22:28:20,-5.5,72,998.7,64,49153,5,6,7,900,5,1,2,60.169857,-24.938379,500,400,300,200,0.65,-12,7,11,2.5,Temperature error|Charging|Fully charged",
];

fn read_back(bytes: &[u8]) -> (csv::StringRecord, Vec<csv::StringRecord>) {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader.headers().unwrap().clone();
    let rows = reader.records().map(Result::unwrap).collect();
    (headers, rows)
}

#[test]
fn parse_export_and_read_back() {
    let measurements = parse_history(&sample_log());
    assert_eq!(measurements.len(), 4);

    let bytes = history_to_csv(&measurements).unwrap();
    let (headers, rows) = read_back(&bytes);
    assert_eq!(headers.iter().collect::<Vec<_>>(), HEADER.to_vec());
    assert_eq!(rows.len(), measurements.len());

    for (row, expected) in rows.iter().zip(EXPECTED_ROWS) {
        assert_eq!(
            row.iter().collect::<Vec<_>>(),
            expected.split(',').collect::<Vec<_>>()
        );
    }
}

#[test]
fn every_column_matches_the_measurement() {
    let measurements = parse_history(&sample_log());
    let bytes = history_to_csv(&measurements).unwrap();
    let (_, rows) = read_back(&bytes);

    for (row, m) in rows.iter().zip(&measurements) {
        assert_eq!(row.len(), 26);
        assert_eq!(&row[0], m.timestamp.to_string());
        assert_eq!(&row[5], m.battery.to_string());
        assert_eq!(&row[6], m.status.to_string());
        assert_eq!(&row[25], m.flags.join("|"));

        match m.voc {
            Some(v) => {
                assert_eq!(&row[7], v.voc_index.to_string());
                assert_eq!(&row[8], v.voc_ppb.to_string());
                assert_eq!(&row[9], v.nox_index.to_string());
            }
            None => assert!((7..10).all(|i| row[i].is_empty())),
        }

        match m.co2 {
            Some(c) if c.co2_ppm == u16::MAX => assert_eq!(&row[10], "Off"),
            Some(c) => assert_eq!(&row[10], c.co2_ppm.to_string()),
            None => assert!(row[10].is_empty()),
        }

        match m.pm {
            Some(p) => {
                assert_eq!(&row[11], p.pm1_0.to_string());
                assert_eq!(&row[12], p.pm2_5.to_string());
                assert_eq!(&row[13], p.pm10.to_string());
            }
            None => assert!((11..14).all(|i| row[i].is_empty())),
        }

        match m.gps {
            Some(g) => {
                assert_eq!(&row[14], g.latitude.to_string());
                assert_eq!(&row[15], g.longitude.to_string());
            }
            None => assert!(row[14].is_empty() && row[15].is_empty()),
        }

        match m.particle_count {
            Some(pc) => {
                assert_eq!(&row[16], pc.pc0_5.to_string());
                assert_eq!(&row[17], pc.pc1_0.to_string());
                assert_eq!(&row[18], pc.pc2_5.to_string());
                assert_eq!(&row[19], pc.pc10.to_string());
                assert_eq!(&row[20], pc.typical_particle_size.to_string());
            }
            None => assert!((16..21).all(|i| row[i].is_empty())),
        }

        match m.gps_ext {
            Some(g) => {
                assert_eq!(&row[21], g.altitude.to_string());
                assert_eq!(&row[22], g.satellites_fixed.to_string());
                assert_eq!(&row[23], g.satellites_in_view.to_string());
                assert_eq!(&row[24], g.accuracy.to_string());
            }
            None => assert!((21..25).all(|i| row[i].is_empty())),
        }
    }
}

#[test]
fn export_is_byte_identical_across_runs() {
    let measurements = parse_history(&sample_log());
    let dir = tempfile::tempdir().unwrap();

    let path = export_history(dir.path(), &measurements).unwrap();
    let written = std::fs::read(&path).unwrap();
    assert_eq!(written, history_to_csv(&measurements).unwrap());
    assert!(path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("history_") && n.ends_with(".csv")));
}

#[test]
fn truncated_log_exports_complete_records() {
    let mut log = sample_log();
    log.truncate(log.len() - 3);

    let measurements = parse_history(&log);
    assert_eq!(measurements.len(), 3);

    let text = String::from_utf8(history_to_csv(&measurements).unwrap()).unwrap();
    assert_eq!(text.lines().count(), 4);
}
