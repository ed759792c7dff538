//! Unified error types for the WaxSteril firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level control loops' error handling uniform. All variants are `Copy`
//! so they can be cheaply passed through mailboxes and the safety
//! supervisor without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A temperature sensor could not be read or returned bad data.
    Sensor(SensorError),
    /// Storage (SD card / VFS) operation failed.
    Storage(StorageError),
    /// A fault code raised against the safety supervisor.
    Fault(FaultCode),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Fault(e) => write!(f, "fault: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// I2C transaction with the sensor failed or timed out.
    BusReadFailed,
    /// Reading is outside the physically plausible range.
    OutOfRange,
    /// Sensor has not finished its first conversion yet.
    NotReady,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusReadFailed => write!(f, "bus read failed"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::NotReady => write!(f, "sensor not ready"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// File could not be created or opened.
    OpenFailed,
    /// Write to an open file failed.
    WriteFailed,
    /// Operation requires an open file but none is open.
    NotOpen,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenFailed => write!(f, "open failed"),
            Self::WriteFailed => write!(f, "write failed"),
            Self::NotOpen => write!(f, "no open file"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Fault codes
// ---------------------------------------------------------------------------

/// Fault codes posted to the safety supervisor.
///
/// Control faults (sensors, fuses, critical temperature, critical rate)
/// latch: the supervisor disables the regulator and errors the sterilizer,
/// and only an external reset clears them. Fuzzification errors are a
/// computation-domain condition — counted and reported, never latched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FaultCode {
    /// Temperature sensor on channel 0 failed.
    Sensor0 = 0b0_0000_0001,
    /// Temperature sensor on channel 1 failed.
    Sensor1 = 0b0_0000_0010,
    /// Temperature sensor on channel 2 failed.
    Sensor2 = 0b0_0000_0100,
    /// Rate of temperature change exceeded the critical slope.
    CriticalRate = 0b0_0000_1000,
    /// A channel reached the critical temperature ceiling.
    CriticalTemp = 0b0_0001_0000,
    /// The fuzzy engine hit an undefined membership evaluation.
    FuzzyLogic = 0b0_0010_0000,
    /// Heater fuse on channel 0 blew.
    Fuse0 = 0b0_0100_0000,
    /// Heater fuse on channel 1 blew.
    Fuse1 = 0b0_1000_0000,
    /// Heater fuse on channel 2 blew.
    Fuse2 = 0b1_0000_0000,
}

impl FaultCode {
    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u16 {
        self as u16
    }

    /// Sensor fault code for a channel index.
    pub const fn sensor(channel: usize) -> Self {
        match channel {
            0 => Self::Sensor0,
            1 => Self::Sensor1,
            _ => Self::Sensor2,
        }
    }

    /// Fuse fault code for a channel index.
    pub const fn fuse(channel: usize) -> Self {
        match channel {
            0 => Self::Fuse0,
            1 => Self::Fuse1,
            _ => Self::Fuse2,
        }
    }

    /// Control faults shut the heater down and latch; computation-domain
    /// faults are diagnostic only.
    pub const fn is_control_fault(self) -> bool {
        !matches!(self, Self::FuzzyLogic)
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor0 => write!(f, "sensor 0 failed"),
            Self::Sensor1 => write!(f, "sensor 1 failed"),
            Self::Sensor2 => write!(f, "sensor 2 failed"),
            Self::CriticalRate => write!(f, "critical temperature slope"),
            Self::CriticalTemp => write!(f, "critical temperature"),
            Self::FuzzyLogic => write!(f, "fuzzification error"),
            Self::Fuse0 => write!(f, "heater fuse 0"),
            Self::Fuse1 => write!(f, "heater fuse 1"),
            Self::Fuse2 => write!(f, "heater fuse 2"),
        }
    }
}

impl From<FaultCode> for Error {
    fn from(e: FaultCode) -> Self {
        Self::Fault(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
