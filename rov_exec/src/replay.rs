//! # Log replay
//!
//! Drives the rover executable from a dataset recorded in the simulator's training mode: a
//! `robot_log.csv` file plus the camera images it references.
//!
//! Replay is open loop, the recorded pose is fed in each cycle whatever the demands are. The
//! simulator's log has no sample status, so `near_sample` and `picking_up` are always false.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use chrono::Utc;
use comms_if::eqpt::{
    cam::{CamFrame, ImageFormat},
    drive::DriveDems,
    telem::RoverTelem,
};
use csv::{DeserializeRecordsIntoIter, ReaderBuilder};
use log::trace;
use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Name of the log file inside a dataset directory
pub const LOG_FILE_NAME: &str = "robot_log.csv";

/// Directory inside a dataset holding the camera images
pub const IMG_DIR_NAME: &str = "IMG";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for log replay.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayParams {
    /// Dataset directory containing `robot_log.csv`. Relative paths are relative to the software
    /// root.
    pub dataset_dir: PathBuf,

    /// Simulation time between two log records.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Stop after this many cycles, if set.
    pub max_cycles: Option<u64>,
}

/// One cycle of recorded data.
#[derive(Debug, Clone)]
pub struct ReplayTick {
    /// Telemetry as recorded
    pub telem: RoverTelem,

    /// The camera frame for this cycle
    pub frame: CamFrame,

    /// The demands recorded while a human drove the rover
    pub recorded_dems: DriveDems,
}

/// A single row of `robot_log.csv`.
#[derive(Debug, Deserialize)]
struct LogRecord {
    #[serde(rename = "Path")]
    path: String,

    #[serde(rename = "SteerAngle")]
    steer_deg: f64,

    #[serde(rename = "Throttle")]
    throttle: f64,

    #[serde(rename = "Brake")]
    brake: f64,

    #[serde(rename = "Speed")]
    vel_ms: f64,

    #[serde(rename = "X_Position")]
    pos_x: f64,

    #[serde(rename = "Y_Position")]
    pos_y: f64,

    #[serde(rename = "Pitch")]
    pitch_deg: f64,

    #[serde(rename = "Yaw")]
    yaw_deg: f64,

    #[serde(rename = "Roll")]
    roll_deg: f64,
}

/// Iterator over the cycles of a recorded dataset.
pub struct Replay {
    dataset_dir: PathBuf,

    records: DeserializeRecordsIntoIter<File, LogRecord>,

    cycle_period_s: f64,

    num_cycles: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Cannot open the replay log {0:?}: {1}")]
    OpenError(PathBuf, csv::Error),

    #[error("Cannot read record {0} of the replay log: {1}")]
    RecordError(u64, csv::Error),

    #[error("Cannot read the camera image {0:?}: {1}")]
    ImageReadError(PathBuf, std::io::Error),

    #[error("Unsupported camera image format: {0:?}")]
    UnsupportedImage(PathBuf),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Replay {
    /// Open the dataset in the given directory.
    pub fn open<P: AsRef<Path>>(dataset_dir: P, cycle_period_s: f64) -> Result<Self, ReplayError> {
        let dataset_dir = dataset_dir.as_ref().to_path_buf();
        let log_path = dataset_dir.join(LOG_FILE_NAME);

        let reader = ReaderBuilder::new()
            .delimiter(b';')
            .trim(csv::Trim::All)
            .from_path(&log_path)
            .map_err(|e| ReplayError::OpenError(log_path, e))?;

        Ok(Self {
            dataset_dir,
            records: reader.into_deserialize(),
            cycle_period_s,
            num_cycles: 0,
        })
    }

    /// Resolve an image path from the log.
    ///
    /// The simulator records the path on the machine which made the recording, so if it does not
    /// exist as given (or relative to the dataset) the file name is looked up in the dataset's
    /// `IMG` directory.
    fn image_path(&self, logged: &str) -> PathBuf {
        let as_given = Path::new(logged);
        if as_given.is_absolute() && as_given.exists() {
            return as_given.to_path_buf();
        }

        let in_dataset = self.dataset_dir.join(logged);
        if in_dataset.exists() {
            return in_dataset;
        }

        // Windows recordings use backslashes
        let file_name = logged.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(logged);

        self.dataset_dir.join(IMG_DIR_NAME).join(file_name)
    }

    fn load_tick(&self, record: LogRecord) -> Result<ReplayTick, ReplayError> {
        let path = self.image_path(&record.path);

        let format =
            ImageFormat::from_path(&path).ok_or_else(|| ReplayError::UnsupportedImage(path.clone()))?;
        let data = std::fs::read(&path).map_err(|e| ReplayError::ImageReadError(path.clone(), e))?;

        trace!("Replay cycle {} from {:?}", self.num_cycles, path);

        Ok(ReplayTick {
            telem: RoverTelem {
                position: [record.pos_x, record.pos_y],
                yaw_deg: record.yaw_deg,
                pitch_deg: record.pitch_deg,
                roll_deg: record.roll_deg,
                vel_ms: record.vel_ms,
                near_sample: false,
                picking_up: false,
                total_time_s: self.num_cycles as f64 * self.cycle_period_s,
            },
            frame: CamFrame {
                timestamp: Utc::now(),
                format,
                data,
            },
            recorded_dems: DriveDems {
                throttle: record.throttle,
                brake: record.brake,
                steer_deg: record.steer_deg,
                pickup: false,
            },
        })
    }
}

impl Iterator for Replay {
    type Item = Result<ReplayTick, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(r) => r,
            Err(e) => return Some(Err(ReplayError::RecordError(self.num_cycles, e))),
        };

        let tick = self.load_tick(record);
        self.num_cycles += 1;

        Some(tick)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::cam::CamImage;
    use image::{Rgb, RgbImage};
    use std::fs;

    fn make_dataset(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rov_replay_{}_{}", name, std::process::id()));
        fs::create_dir_all(dir.join(IMG_DIR_NAME)).unwrap();

        let img = CamImage {
            timestamp: Utc::now(),
            image: RgbImage::from_pixel(320, 160, Rgb([200, 190, 180])),
        };
        let frame = img.to_cam_frame(ImageFormat::Png).unwrap();
        fs::write(dir.join(IMG_DIR_NAME).join("robocam_0.png"), &frame.data).unwrap();

        fs::write(
            dir.join(LOG_FILE_NAME),
            "Path;SteerAngle;Throttle;Brake;Speed;X_Position;Y_Position;Pitch;Yaw;Roll\n\
             C:\\recording\\IMG\\robocam_0.png;-15;0.2;0;0.5;99.7;85.6;359.6;56.8;0.3\n\
             IMG/robocam_0.png;0;0;1;0;99.8;85.7;0.1;57;0.2\n",
        )
        .unwrap();

        dir
    }

    #[test]
    fn test_replay() {
        let dir = make_dataset("ok");

        let ticks: Vec<_> = Replay::open(&dir, 0.1)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(ticks.len(), 2);

        assert_eq!(ticks[0].telem.position, [99.7, 85.6]);
        assert_eq!(ticks[0].telem.pitch_deg, 359.6);
        assert_eq!(ticks[0].telem.total_time_s, 0.0);
        assert_eq!(ticks[0].recorded_dems.steer_deg, -15.0);
        assert_eq!(ticks[0].frame.format, ImageFormat::Png);

        assert_eq!(ticks[1].telem.total_time_s, 0.1);
        assert_eq!(ticks[1].recorded_dems.brake, 1.0);

        let img = ticks[1].frame.to_cam_image().unwrap();
        assert_eq!(img.image.dimensions(), (320, 160));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_replay_missing_image() {
        let dir = make_dataset("missing");
        fs::remove_file(dir.join(IMG_DIR_NAME).join("robocam_0.png")).unwrap();

        let mut replay = Replay::open(&dir, 0.1).unwrap();
        assert!(matches!(replay.next(), Some(Err(ReplayError::ImageReadError(_, _)))));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_shipped_params() {
        let params: ReplayParams =
            util::params::load_str(include_str!("../../params/replay.toml")).unwrap();

        assert_eq!(params.cycle_period_s, 0.1);
        assert_eq!(params.max_cycles, None);
        assert!(params.dataset_dir.is_relative());
    }

    #[test]
    fn test_replay_missing_log() {
        let dir = std::env::temp_dir().join("rov_replay_does_not_exist");

        assert!(matches!(Replay::open(&dir, 0.1), Err(ReplayError::OpenError(_, _))));
    }
}
