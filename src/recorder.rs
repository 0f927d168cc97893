use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use chrono::{DateTime, Local, SecondsFormat, Timelike};
use thiserror::Error;
use crate::drivers::{DeviceError, MfcClient};
use crate::types::unix_now;
/// Sessions sharing one start second before `create_file` gives up.
const MAX_COPIES: u32 = 100;
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("no output file; start a session first")]
    NoFile,
    #[error("writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("querying {device}: {source}")]
    Device {
        device: String,
        #[source]
        source: DeviceError,
    },
}
/// A named device the writer queries on every row.
pub struct Channel {
    pub name: String,
    pub client: Box<dyn MfcClient>,
}
/// Writes one tab-separated file per session.
///
/// The writer talks to its own clients, separate from the engines feeding the
/// plots, and blocks while it queries them.
pub struct DataWriter {
    channels: Vec<Channel>,
    data_dir: PathBuf,
    filepath: Option<PathBuf>,
}
impl DataWriter {
    pub fn new(data_dir: impl Into<PathBuf>, channels: Vec<Channel>) -> Self {
        Self {
            channels,
            data_dir: data_dir.into(),
            filepath: None,
        }
    }
    pub fn filepath(&self) -> Option<&Path> {
        self.filepath.as_deref()
    }
    pub fn columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(1 + 2 * self.channels.len());
        columns.push("timestamp".to_owned());
        for ch in &self.channels {
            columns.push(format!("{}_flow", ch.name));
            columns.push(format!("{}_voltage", ch.name));
        }
        columns
    }
    /// Creates `<data_dir>/<date> <seconds since midnight> mfc.txt` with its
    /// header block and makes it the target of [`DataWriter::write`].
    ///
    /// An existing file is never truncated; a second session started within
    /// the same second gets ` (2)`, ` (3)`, ... appended to its name.
    pub fn create_file(&mut self, start_time: DateTime<Local>) -> Result<PathBuf, RecorderError> {
        let stamp = timestamp_path(&start_time);
        fs::create_dir_all(&self.data_dir).map_err(|source| RecorderError::Io {
            path: self.data_dir.clone(),
            source,
        })?;
        let mut copy = 1;
        let (path, mut file) = loop {
            let name = match copy {
                1 => format!("{stamp} mfc.txt"),
                n => format!("{stamp} mfc ({n}).txt"),
            };
            let path = self.data_dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => break (path, file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists && copy < MAX_COPIES => {
                    copy += 1;
                }
                Err(source) => return Err(RecorderError::Io { path, source }),
            }
        };
        file.write_all(self.header(&start_time).as_bytes())
            .map_err(|source| RecorderError::Io {
                path: path.clone(),
                source,
            })?;
        log::info!("💾 Recording to {}", path.display());
        self.filepath = Some(path.clone());
        Ok(path)
    }
    fn header(&self, start_time: &DateTime<Local>) -> String {
        let columns: Vec<String> = self.columns().iter().map(|c| format!("'{c}'")).collect();
        format!(
            "# timestamp: '{}'\n# columns: [{}]\n",
            start_time.to_rfc3339_opts(SecondsFormat::Secs, false),
            columns.join(", ")
        )
    }
    /// Queries every device and appends a row stamped with the current time.
    pub fn write(&mut self) -> Result<(), RecorderError> {
        self.write_at(unix_now())
    }
    pub fn write_at(&mut self, timestamp: f64) -> Result<(), RecorderError> {
        let path = self.filepath.clone().ok_or(RecorderError::NoFile)?;
        let mut fields = Vec::with_capacity(1 + 2 * self.channels.len());
        fields.push(timestamp);
        for ch in self.channels.iter_mut() {
            let device_err = |source| RecorderError::Device {
                device: ch.name.clone(),
                source,
            };
            let flow = ch.client.get_position().map_err(device_err)?;
            let voltage = ch.client.get_native_position().map_err(device_err)?;
            fields.push(flow);
            fields.push(voltage);
        }
        let io_err = |source| RecorderError::Io {
            path: path.clone(),
            source,
        };
        // opened per row so nothing is held between ticks
        let mut file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        file.write_all(format_row(&fields).as_bytes())
            .map_err(io_err)?;
        Ok(())
    }
}
/// `YYYY-MM-DD SSSSS`, the second part counting seconds since local midnight.
pub fn timestamp_path(t: &DateTime<Local>) -> String {
    format!(
        "{} {:05}",
        t.format("%Y-%m-%d"),
        t.num_seconds_from_midnight()
    )
}
/// Every field as `%.6f` followed by a tab, then a newline.
pub fn format_row(fields: &[f64]) -> String {
    let mut row = String::with_capacity(fields.len() * 16);
    for v in fields {
        row.push_str(&format!("{v:.6}\t"));
    }
    row.push('\n');
    row
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::SimulatedMfc;
    use chrono::TimeZone;
    fn fixed_channels() -> Vec<Channel> {
        [(1.0, 1.1), (2.0, 2.1), (3.0, 3.1)]
            .iter()
            .enumerate()
            .map(|(i, &(pos, native))| Channel {
                name: format!("mfc{}", i + 1),
                client: Box::new(SimulatedMfc::fixed(pos, native)),
            })
            .collect()
    }
    struct Broken;
    impl MfcClient for Broken {
        fn get_position(&mut self) -> Result<f64, DeviceError> {
            Err(DeviceError::Disconnected)
        }
        fn get_native_position(&mut self) -> Result<f64, DeviceError> {
            Err(DeviceError::Disconnected)
        }
        fn get_destination(&mut self) -> Result<f64, DeviceError> {
            Err(DeviceError::Disconnected)
        }
        fn set_destination(&mut self, _: f64) -> Result<(), DeviceError> {
            Err(DeviceError::Disconnected)
        }
        fn get_limits(&mut self) -> Result<(f64, f64), DeviceError> {
            Err(DeviceError::Disconnected)
        }
    }
    #[test]
    fn row_format_matches_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = DataWriter::new(dir.path(), fixed_channels());
        let path = writer.create_file(Local::now()).unwrap();
        writer.write_at(1700000000.0).unwrap();
        let text = fs::read_to_string(path).unwrap();
        let row = text.lines().last().unwrap();
        assert_eq!(
            row,
            "1700000000.000000\t1.000000\t1.100000\t2.000000\t2.100000\t3.000000\t3.100000\t"
        );
        assert!(text.ends_with("\t\n"));
    }
    #[test]
    fn header_is_written_once_before_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = DataWriter::new(dir.path(), fixed_channels());
        let path = writer.create_file(Local::now()).unwrap();
        writer.write().unwrap();
        writer.write().unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("# timestamp: '"));
        assert_eq!(
            lines[1],
            "# columns: ['timestamp', 'mfc1_flow', 'mfc1_voltage', 'mfc2_flow', \
             'mfc2_voltage', 'mfc3_flow', 'mfc3_voltage']"
        );
        assert!(lines[2..].iter().all(|l| !l.starts_with('#')));
    }
    #[test]
    fn first_row_is_not_older_than_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = DataWriter::new(dir.path(), fixed_channels());
        let start = Local::now();
        let path = writer.create_file(start).unwrap();
        writer.write().unwrap();
        let text = fs::read_to_string(path).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        let stamp = header
            .trim_start_matches("# timestamp: '")
            .trim_end_matches('\'');
        let header_time = DateTime::parse_from_rfc3339(stamp).unwrap().timestamp() as f64;
        let row = lines.find(|l| !l.starts_with('#')).unwrap();
        let row_time: f64 = row.split('\t').next().unwrap().parse().unwrap();
        assert!(row_time >= header_time, "{row_time} < {header_time}");
    }
    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("mfc-data");
        assert!(!nested.exists());
        let mut writer = DataWriter::new(&nested, fixed_channels());
        let path = writer.create_file(Local::now()).unwrap();
        assert!(nested.is_dir());
        assert!(path.is_file());
        assert_eq!(writer.filepath(), Some(path.as_path()));
    }
    #[test]
    fn filename_uses_seconds_since_midnight() {
        let t = Local.with_ymd_and_hms(2024, 3, 5, 1, 2, 3).unwrap();
        assert_eq!(timestamp_path(&t), "2024-03-05 03723");
    }
    #[test]
    fn write_without_file_fails() {
        let mut writer = DataWriter::new("unused", fixed_channels());
        assert!(matches!(writer.write(), Err(RecorderError::NoFile)));
    }
    #[test]
    fn device_failure_leaves_no_partial_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut channels = fixed_channels();
        channels.push(Channel {
            name: "mfc4".to_owned(),
            client: Box::new(Broken),
        });
        let mut writer = DataWriter::new(dir.path(), channels);
        let path = writer.create_file(Local::now()).unwrap();
        let err = writer.write().unwrap_err();
        assert!(matches!(err, RecorderError::Device { ref device, .. } if device == "mfc4"));
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
    #[test]
    fn restart_in_same_second_keeps_first_session() {
        let dir = tempfile::tempdir().unwrap();
        let start = Local.with_ymd_and_hms(2024, 3, 5, 1, 2, 3).unwrap();
        let mut writer = DataWriter::new(dir.path(), fixed_channels());
        let first = writer.create_file(start).unwrap();
        writer.write_at(1.0).unwrap();
        writer.write_at(2.0).unwrap();
        let second = writer.create_file(start).unwrap();
        assert_ne!(first, second);
        assert_eq!(
            second.file_name().unwrap().to_str().unwrap(),
            "2024-03-05 03723 mfc (2).txt"
        );
        assert_eq!(writer.filepath(), Some(second.as_path()));
        assert_eq!(fs::read_to_string(&first).unwrap().lines().count(), 4);
        writer.write_at(3.0).unwrap();
        let text = fs::read_to_string(&second).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("3.000000\t"));
        let third = writer.create_file(start).unwrap();
        assert!(third.ends_with("2024-03-05 03723 mfc (3).txt"));
    }
}
