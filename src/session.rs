//! The connection to the editing application.
//!
//! A [`Session`] owns the connection handle and hands out the current
//! timeline. It reuses one connection across calls and reconnects once when
//! the cached handle turns out to be dead.

use tracing::{info, warn};

use crate::config::TimelineSettings;
use crate::error::{Result, SubtrackError};
use crate::timecode::FrameRate;
use crate::timeline::{HostError, HostResult, Timeline};

pub trait Connector {
    type Connection: Connection;

    /// `Ok(None)` when the application is not running.
    fn connect(&self) -> HostResult<Option<Self::Connection>>;
}

pub trait Connection {
    type Timeline: Timeline;

    /// Name of the open project, `None` when no project is open.
    fn current_project(&self) -> HostResult<Option<String>>;
    fn current_timeline(&self) -> HostResult<Option<Self::Timeline>>;
}

type TimelineOf<C> = <<C as Connector>::Connection as Connection>::Timeline;

/// The timeline a request operates on, with the rate it runs at.
pub struct TimelineContext<T> {
    pub project_name: String,
    pub timeline: T,
    pub frame_rate: FrameRate,
}

pub struct Session<C: Connector> {
    connector: C,
    connection: Option<C::Connection>,
    default_frame_rate: FrameRate,
}

impl<C: Connector> Session<C> {
    pub fn new(connector: C, settings: &TimelineSettings) -> Self {
        Session {
            connector,
            connection: None,
            default_frame_rate: settings.default_frame_rate,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// The cached connection, connecting first if there is none.
    pub fn connection(&mut self) -> Result<&C::Connection> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => self.open()?,
        };
        Ok(self.connection.insert(connection))
    }

    /// Drops the cached connection and connects anew.
    pub fn reconnect(&mut self) -> Result<&C::Connection> {
        self.connection = None;
        self.connection()
    }

    fn open(&self) -> Result<C::Connection> {
        info!("Connecting to the editing application");
        match self.connector.connect() {
            Ok(Some(connection)) => {
                info!("Connected to the editing application");
                Ok(connection)
            }
            Ok(None) => Err(SubtrackError::ConnectionFailed(HostError::new(
                "the editing application is not running",
            ))),
            Err(err) => Err(SubtrackError::ConnectionFailed(err)),
        }
    }

    /// Resolves the open project's current timeline and its frame rate.
    pub fn timeline_context(&mut self) -> Result<TimelineContext<TimelineOf<C>>> {
        let probe = self.connection()?.current_project();
        let project = match probe {
            Ok(project) => project,
            Err(err) => {
                warn!("Connection may have dropped, reconnecting: {}", err);
                self.reconnect()?
                    .current_project()
                    .map_err(SubtrackError::ConnectionFailed)?
            }
        };
        let project_name = project.ok_or(SubtrackError::NoProjectOpen)?;

        let timeline = self
            .connection()?
            .current_timeline()
            .map_err(SubtrackError::host("GetCurrentTimeline"))?
            .ok_or(SubtrackError::NoActiveTimeline)?;
        let frame_rate = timeline_frame_rate(&timeline, self.default_frame_rate);

        Ok(TimelineContext {
            project_name,
            timeline,
            frame_rate,
        })
    }
}

/// The timeline's own rate setting, or `fallback` when it is missing or
/// unreadable.
pub fn timeline_frame_rate<T: Timeline + ?Sized>(timeline: &T, fallback: FrameRate) -> FrameRate {
    let setting = match timeline.frame_rate_setting() {
        Ok(Some(setting)) => setting,
        Ok(None) => {
            warn!("Timeline reports no frame rate, using {}", fallback);
            return fallback;
        }
        Err(err) => {
            warn!("Could not read the timeline frame rate ({}), using {}", err, fallback);
            return fallback;
        }
    };
    match setting.trim().parse::<f64>() {
        Ok(fps) => FrameRate::new(fps),
        Err(_) => {
            warn!("Unreadable frame rate '{}', using {}", setting, fallback);
            fallback
        }
    }
}
