//! Linux hidraw transport for USB CO2 monitors.
//!
//! Sensors are discovered through sysfs (`/sys/class/hidraw/hidrawN/device/uevent`)
//! and read through their `/dev/hidrawN` node. Opening a sensor sends the
//! session key as a HID feature report, after which the device streams
//! 8-byte input reports, one value per report.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::PathBuf;

use tracing::{debug, trace, warn};

use co2mon_core::config::DeviceConfig;
use co2mon_core::{Reading, ReportEncoding, SensorDescriptor};

use crate::frame::{self, Encoding, FRAME_LEN, Measurement};
use crate::{DeviceError, SensorHandle, SensorTransport};

/// Enumerates and opens monitors exposed as hidraw nodes.
#[derive(Debug, Clone)]
pub struct HidrawTransport {
    sysfs_root: PathBuf,
    dev_root: PathBuf,
    vendor_id: u16,
    product_id: u16,
    key: [u8; FRAME_LEN],
    encoding: ReportEncoding,
}

impl HidrawTransport {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            sysfs_root: config.sysfs_root.clone(),
            dev_root: config.dev_root.clone(),
            vendor_id: config.vendor_id,
            product_id: config.product_id,
            key: frame::DEFAULT_KEY,
            encoding: config.encoding,
        }
    }

    fn scan(&self) -> io::Result<Vec<SensorDescriptor>> {
        let mut nodes: Vec<String> = fs::read_dir(&self.sysfs_root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("hidraw"))
            .collect();
        // Stable enumeration order: hidraw0, hidraw1, ..., hidraw10.
        nodes.sort_by_key(|name| (name.len(), name.clone()));

        let mut found = Vec::new();
        for node in nodes {
            let uevent_path = self.sysfs_root.join(&node).join("device").join("uevent");
            let uevent = match fs::read_to_string(&uevent_path) {
                Ok(content) => content,
                Err(e) => {
                    debug!(path = ?uevent_path, error = %e, "skipping hidraw node");
                    continue;
                }
            };

            let Some(info) = parse_uevent(&uevent) else {
                continue;
            };
            if info.vendor_id != self.vendor_id || info.product_id != self.product_id {
                continue;
            }

            let path = self.dev_root.join(&node).to_string_lossy().into_owned();
            found.push(SensorDescriptor {
                path,
                serial: info.serial,
            });
        }
        Ok(found)
    }
}

impl SensorTransport for HidrawTransport {
    fn enumerate(&self) -> Vec<SensorDescriptor> {
        match self.scan() {
            Ok(found) => found,
            Err(e) => {
                warn!(root = ?self.sysfs_root, error = %e, "hidraw enumeration failed");
                Vec::new()
            }
        }
    }

    fn open(&self, descriptor: &SensorDescriptor) -> Result<Box<dyn SensorHandle>, DeviceError> {
        let open_err = |source| DeviceError::Open {
            path: descriptor.path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&descriptor.path)
            .map_err(open_err)?;
        send_feature_report(&file, &self.key).map_err(open_err)?;

        debug!(path = %descriptor.path, "hidraw device opened");
        Ok(Box::new(FrameReader::new(file, self.key, self.encoding)))
    }
}

/// HID identity fields parsed from a sysfs uevent file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HidInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial: Option<String>,
}

/// Parse `HID_ID=0003:000004D9:0000A052` and `HID_UNIQ=...` out of a uevent file.
pub fn parse_uevent(content: &str) -> Option<HidInfo> {
    let mut ids = None;
    let mut serial = None;

    for line in content.lines() {
        if let Some(value) = line.strip_prefix("HID_ID=") {
            let mut parts = value.split(':').skip(1);
            let vendor = u32::from_str_radix(parts.next()?, 16).ok()?;
            let product = u32::from_str_radix(parts.next()?, 16).ok()?;
            ids = Some((u16::try_from(vendor).ok()?, u16::try_from(product).ok()?));
        } else if let Some(value) = line.strip_prefix("HID_UNIQ=") {
            let value = value.trim();
            if !value.is_empty() {
                serial = Some(value.to_string());
            }
        }
    }

    let (vendor_id, product_id) = ids?;
    Some(HidInfo {
        vendor_id,
        product_id,
        serial,
    })
}

/// Reads reports until both a temperature and a CO2 value have arrived.
///
/// With [`ReportEncoding::Auto`] the encoding is settled by the first report
/// that is valid in only one encoding; reports valid in both are skipped
/// until then.
pub struct FrameReader<R> {
    inner: R,
    key: [u8; FRAME_LEN],
    encoding: Option<Encoding>,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R, key: [u8; FRAME_LEN], encoding: ReportEncoding) -> Self {
        let encoding = match encoding {
            ReportEncoding::Auto => None,
            ReportEncoding::Plain => Some(Encoding::Plain),
            ReportEncoding::Scrambled => Some(Encoding::Scrambled),
        };
        Self {
            inner,
            key,
            encoding,
        }
    }

    fn next_frame(&mut self) -> Result<[u8; FRAME_LEN], DeviceError> {
        let mut buf = [0u8; FRAME_LEN];
        // hidraw hands out one whole report per read.
        let n = self.inner.read(&mut buf)?;
        match n {
            0 => Err(DeviceError::Disconnected),
            FRAME_LEN => Ok(buf),
            short => Err(DeviceError::ShortFrame(short)),
        }
    }
}

impl<R: Read + Send> SensorHandle for FrameReader<R> {
    fn read(&mut self) -> Result<Reading, DeviceError> {
        let mut temperature = None;
        let mut co2 = None;

        loop {
            let raw = self.next_frame()?;
            let encoding = match self.encoding {
                Some(encoding) => encoding,
                None => match frame::detect(&raw, &self.key)? {
                    Some(encoding) => {
                        debug!(?encoding, "report encoding detected");
                        self.encoding = Some(encoding);
                        encoding
                    }
                    None => {
                        trace!("skipping report valid in both encodings");
                        continue;
                    }
                },
            };

            match frame::decode(&raw, &self.key, encoding)? {
                Measurement::Temperature(t) => temperature = Some(t),
                Measurement::Co2(ppm) => co2 = Some(ppm),
                Measurement::Other(op) => trace!(op, "ignoring report"),
            }

            if let (Some(t), Some(ppm)) = (temperature, co2) {
                return Ok(Reading::new(t, ppm));
            }
        }
    }
}

#[cfg(target_os = "linux")]
fn send_feature_report(file: &File, key: &[u8; FRAME_LEN]) -> io::Result<()> {
    use std::os::fd::AsRawFd;

    // _IOC(_IOC_READ | _IOC_WRITE, 'H', 0x06, 9)
    const HIDIOCSFEATURE_9: u32 = 0xC009_4806;

    let mut report = [0u8; FRAME_LEN + 1];
    report[1..].copy_from_slice(key);

    // SAFETY: the fd is open for the lifetime of `file` and `report` is the
    // 9-byte buffer the request code describes.
    let rc = unsafe {
        libc::ioctl(file.as_raw_fd(), HIDIOCSFEATURE_9 as _, report.as_mut_ptr())
    };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn send_feature_report(_file: &File, _key: &[u8; FRAME_LEN]) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "hidraw feature reports require Linux",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::Path;

    const UEVENT: &str = "DRIVER=hid-generic\n\
HID_ID=0003:000004D9:0000A052\n\
HID_NAME=Holtek USB-zyTemp\n\
HID_PHYS=usb-0000:00:14.0-2/input0\n\
HID_UNIQ=1.40\n\
MODALIAS=hid:b0003g0001v000004D9p0000A052\n";

    /// Valid both as-is and descrambled with the default key.
    const AMBIGUOUS: [u8; FRAME_LEN] = [0x50, 0xe4, 0x50, 0x84, 0x0d, 0x00, 0x00, 0x02];

    fn plain(op: u8, value: u16) -> [u8; FRAME_LEN] {
        let [hi, lo] = value.to_be_bytes();
        [op, hi, lo, op.wrapping_add(hi).wrapping_add(lo), 0x0d, 0, 0, 0]
    }

    fn reader(bytes: Vec<u8>, encoding: ReportEncoding) -> FrameReader<Cursor<Vec<u8>>> {
        FrameReader::new(Cursor::new(bytes), frame::DEFAULT_KEY, encoding)
    }

    fn write_node(root: &Path, node: &str, uevent: &str) {
        let dir = root.join(node).join("device");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("uevent"), uevent).unwrap();
    }

    fn transport(root: &Path) -> HidrawTransport {
        let config = DeviceConfig {
            sysfs_root: root.to_path_buf(),
            dev_root: PathBuf::from("/dev"),
            ..DeviceConfig::default()
        };
        HidrawTransport::new(&config)
    }

    #[test]
    fn parse_uevent_ids_and_serial() {
        let info = parse_uevent(UEVENT).unwrap();
        assert_eq!(info.vendor_id, 0x04d9);
        assert_eq!(info.product_id, 0xa052);
        assert_eq!(info.serial.as_deref(), Some("1.40"));
    }

    #[test]
    fn parse_uevent_empty_serial() {
        let info = parse_uevent("HID_ID=0003:000004D9:0000A052\nHID_UNIQ=\n").unwrap();
        assert_eq!(info.serial, None);
    }

    #[test]
    fn parse_uevent_without_id() {
        assert!(parse_uevent("DRIVER=hid-generic\n").is_none());
        assert!(parse_uevent("HID_ID=garbage\n").is_none());
    }

    #[test]
    fn enumerate_matches_vendor_and_product() {
        let dir = tempfile::tempdir().unwrap();
        write_node(dir.path(), "hidraw1", UEVENT);
        write_node(dir.path(), "hidraw0", "HID_ID=0003:0000046D:0000C52B\n");
        write_node(dir.path(), "hidraw10", UEVENT);
        write_node(dir.path(), "hidraw2", UEVENT);

        let found = transport(dir.path()).enumerate();
        let paths: Vec<&str> = found.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["/dev/hidraw1", "/dev/hidraw2", "/dev/hidraw10"]);
        assert_eq!(found[0].serial.as_deref(), Some("1.40"));
    }

    #[test]
    fn enumerate_missing_root_is_empty() {
        let t = transport(Path::new("/nonexistent/sys/class/hidraw"));
        assert!(t.enumerate().is_empty());
    }

    #[test]
    fn open_missing_node_fails() {
        let dir = tempfile::tempdir().unwrap();
        let t = transport(dir.path());
        let descriptor = SensorDescriptor::new(dir.path().join("hidraw9").to_string_lossy());
        assert!(matches!(t.open(&descriptor), Err(DeviceError::Open { .. })));
    }

    #[test]
    fn frame_reader_pairs_temperature_and_co2() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&plain(0x41, 3000));
        bytes.extend_from_slice(&plain(0x50, 650));
        bytes.extend_from_slice(&plain(0x42, 4714));

        let mut reader = reader(bytes, ReportEncoding::Auto);
        let reading = reader.read().unwrap();
        assert_eq!(reading.co2_ppm, 650);
        assert!((reading.temperature_celsius - 21.475).abs() < 1e-9);
    }

    #[test]
    fn auto_encoding_skips_ambiguous_reports_until_detected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&AMBIGUOUS);
        bytes.extend_from_slice(&plain(0x50, 650));
        bytes.extend_from_slice(&plain(0x42, 4714));

        let reading = reader(bytes, ReportEncoding::Auto).read().unwrap();
        assert_eq!(reading.co2_ppm, 650);
    }

    #[test]
    fn detected_encoding_sticks_for_later_reports() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&plain(0x42, 4714));
        bytes.extend_from_slice(&AMBIGUOUS);
        bytes.extend_from_slice(&plain(0x50, 650));

        // Plain was settled by the first report, so the ambiguous one is
        // decoded as plain rather than skipped.
        let reading = reader(bytes, ReportEncoding::Auto).read().unwrap();
        assert_eq!(reading.co2_ppm, 58448);
    }

    #[test]
    fn configured_scrambled_encoding_never_reads_plain() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&AMBIGUOUS);
        bytes.extend_from_slice(&plain(0x50, 650));

        let mut reader = reader(bytes, ReportEncoding::Scrambled);
        assert!(matches!(reader.read(), Err(DeviceError::Checksum { .. })));
    }

    #[test]
    fn transport_takes_encoding_from_config() {
        let config = DeviceConfig {
            encoding: ReportEncoding::Plain,
            ..DeviceConfig::default()
        };
        assert_eq!(HidrawTransport::new(&config).encoding, ReportEncoding::Plain);
    }

    #[test]
    fn frame_reader_eof_is_disconnect() {
        let mut reader = reader(plain(0x50, 650).to_vec(), ReportEncoding::Auto);
        assert!(matches!(reader.read(), Err(DeviceError::Disconnected)));
    }

    #[test]
    fn frame_reader_short_frame() {
        let mut reader = reader(vec![0x50, 0x02], ReportEncoding::Auto);
        assert!(matches!(reader.read(), Err(DeviceError::ShortFrame(2))));
    }
}
